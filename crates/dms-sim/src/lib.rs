//! Driver monitoring simulator
//!
//! Runs synthetic scenarios or recorded landmark traces through a monitoring
//! session with logging-only audio and summarizes what the driver would have
//! heard and seen.

pub mod report;
pub mod scenarios;
pub mod trace;

use std::time::Duration;

use alerting::AlertFeed;
use chrono::Utc;
use dms::effects::{run_effects, ChannelSink, EffectSender, LoggingBackend, SessionEvent};
use dms::source::{run_frame_loop, DetectorResult, FrameFeeder};
use dms::{AlertEvent, DmsConfig, DmsError, FocusLevel, MonitorSession};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

pub use report::{ReportBuilder, SimReport};
pub use scenarios::Scenario;
pub use trace::{read_trace, TraceError};

/// Simulator errors
#[derive(Error, Debug)]
pub enum SimError {
    #[error(transparent)]
    Dms(#[from] DmsError),

    #[error(transparent)]
    Trace(#[from] TraceError),

    #[error("Simulator task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// How frames are handed to the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// Every frame is processed, as fast as possible
    Replay,
    /// Frames arrive on a fixed clock; those that find the monitor busy are dropped
    Realtime { interval_ms: u64 },
}

/// Initialize logging on stderr. `RUST_LOG` overrides `default_level`.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .is_err()
    {
        debug!("Tracing subscriber already installed");
    }
}

/// Run `frames` through a fresh session and summarize it
pub async fn simulate(
    scenario: &str,
    config: DmsConfig,
    frames: Vec<DetectorResult>,
    pacing: Pacing,
) -> Result<SimReport, SimError> {
    let (effects, effect_rx) = EffectSender::channel();
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let audio = tokio::spawn(run_effects(effect_rx, LoggingBackend::default()));
    let dashboard = tokio::spawn(watch_events(events_rx));

    let mut session = MonitorSession::new(config, ChannelSink::new(effects, events_tx))?;
    let (feeder, frame_rx) = FrameFeeder::channel();
    let producer = tokio::spawn(feed_frames(frames, feeder, pacing));

    info!("Running scenario '{}' ({:?})", scenario, pacing);
    let mut builder = ReportBuilder::new(scenario, Utc::now());
    session.start();
    run_frame_loop(frame_rx, &mut session, |analysis| builder.record(analysis)).await;
    session.stop();
    // Closes the effect and event channels
    drop(session);

    let dropped = producer.await?;
    let backend = audio.await?;
    let feed = dashboard.await?;
    debug!("Alarm left {}", if backend.alarm_on() { "on" } else { "off" });

    Ok(builder.finish(dropped, feed.iter()))
}

async fn feed_frames(frames: Vec<DetectorResult>, feeder: FrameFeeder, pacing: Pacing) -> u64 {
    match pacing {
        Pacing::Replay => {
            for result in frames {
                if !feeder.send(result).await {
                    break;
                }
            }
        }
        Pacing::Realtime { interval_ms } => {
            let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms.max(1)));
            for result in frames {
                ticker.tick().await;
                feeder.offer(result);
            }
        }
    }
    feeder.dropped()
}

/// Stand-in presentation layer: logs focus band changes and keeps the recent alert list
async fn watch_events(mut rx: mpsc::UnboundedReceiver<SessionEvent>) -> AlertFeed<AlertEvent> {
    let mut feed = AlertFeed::default();
    let mut level: Option<FocusLevel> = None;

    while let Some(event) = rx.recv().await {
        match event {
            SessionEvent::Focus(focus) => {
                let current = FocusLevel::from_score(focus);
                if level != Some(current) {
                    info!("Focus {} ({:?})", focus, current);
                    level = Some(current);
                }
            }
            SessionEvent::Alert(alert) => feed.push(alert),
        }
    }
    feed
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerting::Severity;
    use dms::AlertKind;

    #[tokio::test]
    async fn test_drowsy_scenario_report() {
        let config = DmsConfig::default();
        let frames = Scenario::Drowsy.frames(config.frame_interval_ms());
        let total = frames.len();

        let report = simulate("drowsy", config, frames, Pacing::Replay).await.unwrap();
        assert_eq!(report.frames, total);
        assert_eq!(report.frames_dropped, 0);

        let severities: Vec<_> = report.alerts.iter().map(|a| a.severity).collect();
        assert_eq!(severities, vec![Severity::High, Severity::Critical]);
        assert_eq!(report.alarm_on_frames.len(), 1);
        assert_eq!(report.alarm_off_frames.len(), 1);
        assert!(report.alarm_off_frames[0] > report.alarm_on_frames[0]);
        assert_eq!(report.focus_max, 100);
        assert!(report.focus_min < 10);
        assert_eq!(report.recent_alerts.len(), 2);
        assert!(report.recent_alerts[0].starts_with("#2"));
    }

    #[tokio::test]
    async fn test_head_turn_scenario_report() {
        let config = DmsConfig::default();
        let frames = Scenario::HeadTurn.frames(config.frame_interval_ms());

        let report = simulate("head-turn", config, frames, Pacing::Replay).await.unwrap();
        assert!(report.alerts.iter().all(|a| a.kind == AlertKind::HeadTurn));
        // Second look-away starts inside the cooldown and fires once it expires
        assert_eq!(report.alerts.len(), 2);
        assert!(report.alerts[1].stream_ms - report.alerts[0].stream_ms >= 5000);
    }

    #[tokio::test]
    async fn test_no_face_scenario_reports_absence() {
        let config = DmsConfig::default();
        let frames = Scenario::NoFace.frames(config.frame_interval_ms());

        let report = simulate("no-face", config, frames, Pacing::Replay).await.unwrap();
        assert_eq!(report.frames_with_face, 60);
        assert_eq!(report.longest_face_absence, 200);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let report = simulate("empty", DmsConfig::default(), Vec::new(), Pacing::Replay)
            .await
            .unwrap();
        assert_eq!(report.frames, 0);
        assert!(report.alerts.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_realtime_pacing_processes_everything_when_idle() {
        let config = DmsConfig::default();
        let frames = Scenario::NoFace.frames(config.frame_interval_ms());
        let total = frames.len();

        let report = simulate("no-face", config, frames, Pacing::Realtime { interval_ms: 33 })
            .await
            .unwrap();
        assert_eq!(report.frames as u64 + report.frames_dropped, total as u64);
        assert_eq!(
            report.alerts.iter().filter(|a| a.kind == AlertKind::NoFace).count(),
            1
        );
    }
}
