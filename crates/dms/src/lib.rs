//! Driver Monitoring System (DMS)
//!
//! Per-frame driver attention analysis over face-mesh landmarks:
//! - Eye closure (blink vs. drowsiness) with hysteresis
//! - Yawn detection
//! - Head turn and absent-face handling
//! - Debounced alerts and a smoothed 0-100 focus score
//!
//! The core is synchronous and deterministic: [`DriverMonitor::process`] takes
//! one optional landmark frame plus an explicit timestamp and returns a
//! [`DmsAnalysis`]. Audio, speech and UI delivery live behind
//! [`session::SessionSink`] and [`effects`].

pub mod analysis;
pub mod config;
pub mod effects;
pub mod focus;
pub mod geometry;
pub mod landmarks;
pub mod session;
pub mod smoothing;
pub mod source;
pub mod state;
pub mod synthetic;

pub use analysis::{AlertEvent, AlertKind, DmsAnalysis};
pub use config::{DmsConfig, SpeechPrompts};
pub use focus::{FocusLevel, FocusMapper};
pub use geometry::MetricSample;
pub use landmarks::{LandmarkFrame, Point};
pub use session::{MonitorSession, SessionSink};
pub use smoothing::{MetricSmoother, SmoothedMetrics};
pub use state::{AlertCondition, AttentionState, DriverState, DriverStatus, EyeState, MouthState};

use alerting::{AlertDebouncer, LatchPolicy};
use thiserror::Error;
use tracing::{debug, info};

/// DMS error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DmsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Keypoints missing for feature calculation: need {required}, got {actual}")]
    KeypointsMissing { required: usize, actual: usize },

    #[error("Landmark {0} is not a finite coordinate")]
    NonFiniteLandmark(usize),
}

/// Driver monitoring state machine (one per monitoring session)
pub struct DriverMonitor {
    config: DmsConfig,
    smoother: MetricSmoother,
    focus: FocusMapper,
    debouncer: AlertDebouncer<AlertCondition>,
    state: DriverState,
    next_alert_id: u64,
}

impl DriverMonitor {
    /// Create a new monitor with configuration
    pub fn new(config: DmsConfig) -> Result<Self, DmsError> {
        config.validate()?;

        let mut debouncer = AlertDebouncer::new();
        for condition in AlertCondition::ALL {
            let policy = match condition {
                AlertCondition::HeadTurn | AlertCondition::NoFace => {
                    LatchPolicy::with_cooldown(config.alert_cooldown_ms)
                }
                AlertCondition::LowFocus => LatchPolicy::repeating(config.low_focus_cooldown_ms),
                _ => LatchPolicy::latch_only(),
            };
            debouncer.register(condition, policy);
        }

        info!(
            "Creating driver monitor: warn after {} frames ({:.1}s), critical after {} frames ({:.1}s)",
            config.warn_frame_threshold,
            config.frames_to_secs(config.warn_frame_threshold),
            config.critical_frame_threshold,
            config.frames_to_secs(config.critical_frame_threshold)
        );

        Ok(Self {
            smoother: MetricSmoother::new(config.smoothing_window_size),
            focus: FocusMapper::new(&config),
            debouncer,
            state: DriverState::default(),
            next_alert_id: 1,
            config,
        })
    }

    /// Analyze one detector result.
    ///
    /// `None`, or a frame that fails validation, is treated as "no face".
    pub fn process(&mut self, frame: Option<&LandmarkFrame>, timestamp_ms: u64) -> DmsAnalysis {
        let alarm_before = self.state.alarm_on;

        let sample = match frame.map(|f| MetricSample::from_frame(f, timestamp_ms)) {
            Some(Ok(sample)) => Some(sample),
            Some(Err(e)) => {
                debug!("Unusable landmark frame at {}ms: {}", timestamp_ms, e);
                None
            }
            None => None,
        };

        let mut out = DmsAnalysis {
            timestamp_ms,
            face_detected: sample.is_some(),
            metrics: sample,
            ..Default::default()
        };

        match sample {
            None => self.no_face(timestamp_ms, &mut out),
            Some(sample) => {
                self.state.face_absent_frames = 0;
                self.state.attention.no_face = false;
                self.debouncer.clear(AlertCondition::NoFace);

                if sample.head_turned(self.config.head_turn_angle_threshold_deg) {
                    self.head_turned(&sample, timestamp_ms, &mut out);
                } else {
                    if self.state.attention.head_turned {
                        info!("Head back toward the road");
                        self.state.attention.head_turned = false;
                        self.debouncer.clear(AlertCondition::HeadTurn);
                    }
                    out.smoothed = Some(self.forward_face(&sample, timestamp_ms, &mut out));
                }

                self.check_low_focus(timestamp_ms, &mut out);
            }
        }

        if self.state.alarm_on != alarm_before {
            info!("Alarm {}", if self.state.alarm_on { "on" } else { "off" });
            out.alarm_change = Some(self.state.alarm_on);
        }

        out.attention = self.state.attention;
        out.closed_frames = self.state.closed_frames;
        out.yawn_frames = self.state.yawn_frames;
        out.face_absent_frames = self.state.face_absent_frames;
        out.focus = self.focus.score();
        out.focus_level = self.focus.level();
        out.alarm_on = self.state.alarm_on;

        let face = if out.face_detected { "true" } else { "false" };
        metrics::counter!("dms_frames_total", "face" => face).increment(1);
        metrics::gauge!("dms_focus_score").set(out.focus as f64);

        out
    }

    fn no_face(&mut self, timestamp_ms: u64, out: &mut DmsAnalysis) {
        if !self.state.attention.no_face {
            info!("Face lost at {}ms", timestamp_ms);
        }
        self.state.face_absent_frames = self.state.face_absent_frames.saturating_add(1);
        self.suspend_face_analysis();
        for condition in [AlertCondition::HeadTurn, AlertCondition::LowFocus] {
            self.debouncer.clear(condition);
        }
        self.state.attention.head_turned = false;
        self.state.attention.no_face = true;

        self.fire(AlertCondition::NoFace, timestamp_ms, out);
        self.focus.force_zero();
    }

    fn head_turned(&mut self, sample: &MetricSample, timestamp_ms: u64, out: &mut DmsAnalysis) {
        if !self.state.attention.head_turned {
            info!(
                "Head turned away: yaw {:.1}, pitch {:.1}",
                sample.yaw_deg, sample.pitch_deg
            );
        }
        self.suspend_face_analysis();
        self.state.attention.head_turned = true;

        self.fire(AlertCondition::HeadTurn, timestamp_ms, out);
        self.focus.ease_toward(0.0);
    }

    /// Zero eye/mouth tracking, drop the smoothing history and silence the alarm
    fn suspend_face_analysis(&mut self) {
        self.state.clear_eye_and_mouth();
        self.smoother.clear();
        for condition in [
            AlertCondition::DrowsyWarn,
            AlertCondition::DrowsyCritical,
            AlertCondition::Yawn,
        ] {
            self.debouncer.clear(condition);
        }
        self.state.alarm_on = false;
    }

    fn forward_face(
        &mut self,
        sample: &MetricSample,
        timestamp_ms: u64,
        out: &mut DmsAnalysis,
    ) -> SmoothedMetrics {
        let smoothed = self.smoother.push(sample);
        debug!(
            "Frame {}ms: ear {:.3} (smoothed {:.3}), mar {:.3} (smoothed {:.3})",
            timestamp_ms, sample.ear, smoothed.ear, sample.mar, smoothed.mar
        );

        self.update_eyes(smoothed.ear, timestamp_ms, out);
        self.update_mouth(smoothed.mar, timestamp_ms, out);
        self.focus.update(self.state.closed_frames, smoothed.ear);

        smoothed
    }

    fn update_eyes(&mut self, ear: f64, timestamp_ms: u64, out: &mut DmsAnalysis) {
        if ear < self.config.ear_low {
            self.state.closed_frames = self.state.closed_frames.saturating_add(1);
        } else if ear > self.config.ear_high {
            if self.state.closed_frames > self.config.blink_max_frames {
                info!("Eyes reopened after {} frames", self.state.closed_frames);
            }
            self.state.closed_frames = 0;
            self.debouncer.clear(AlertCondition::DrowsyWarn);
            self.debouncer.clear(AlertCondition::DrowsyCritical);
            self.state.alarm_on = false;
        }
        // Inside the hysteresis band the counter holds

        let eye = EyeState::from_closed_frames(self.state.closed_frames, &self.config);
        self.state.attention.eye = eye;

        match eye {
            EyeState::DrowsyWarn => {
                if self.fire(AlertCondition::DrowsyWarn, timestamp_ms, out) {
                    self.state.alarm_on = false;
                }
            }
            EyeState::DrowsyCritical => {
                if self.fire(AlertCondition::DrowsyCritical, timestamp_ms, out) {
                    self.state.alarm_on = true;
                }
            }
            _ => {}
        }
    }

    fn update_mouth(&mut self, mar: f64, timestamp_ms: u64, out: &mut DmsAnalysis) {
        if mar > self.config.mar_threshold {
            self.state.yawn_frames = self.state.yawn_frames.saturating_add(1);
        } else {
            self.state.yawn_frames = 0;
            self.debouncer.clear(AlertCondition::Yawn);
        }

        if self.state.yawn_frames >= self.config.yawn_frame_threshold {
            self.state.attention.mouth = MouthState::Yawning;
            self.fire(AlertCondition::Yawn, timestamp_ms, out);
        } else {
            self.state.attention.mouth = MouthState::Normal;
        }
    }

    fn check_low_focus(&mut self, timestamp_ms: u64, out: &mut DmsAnalysis) {
        let Some(threshold) = self.config.low_focus_threshold else {
            return;
        };
        if self.focus.score() < threshold {
            self.fire(AlertCondition::LowFocus, timestamp_ms, out);
        } else {
            self.debouncer.clear(AlertCondition::LowFocus);
        }
    }

    /// Emit an alert and its speech prompt if the debouncer lets `condition` through
    fn fire(&mut self, condition: AlertCondition, timestamp_ms: u64, out: &mut DmsAnalysis) -> bool {
        if !self.debouncer.should_fire(condition, timestamp_ms) {
            return false;
        }

        let event = AlertEvent {
            id: self.next_alert_id,
            kind: condition.kind(),
            severity: condition.severity(),
            message: condition.message().to_string(),
            emitted_at_ms: timestamp_ms,
        };
        self.next_alert_id += 1;

        info!(
            "DMS alert #{}: {} ({}) at {}ms",
            event.id, event.kind, event.severity, timestamp_ms
        );
        metrics::counter!("dms_alerts_total", "kind" => event.kind.as_str()).increment(1);

        out.speech
            .push(self.config.prompts.for_condition(condition).to_string());
        out.alerts.push(event);
        true
    }

    /// Clear counters, windows, latches, cooldown timers, alarm flag and focus.
    ///
    /// Alert ids keep increasing across resets.
    pub fn reset(&mut self) {
        self.state.reset();
        self.smoother.clear();
        self.debouncer.reset();
        self.focus.reset();
    }

    pub fn config(&self) -> &DmsConfig {
        &self.config
    }

    pub fn state(&self) -> &DriverState {
        &self.state
    }

    pub fn focus(&self) -> u8 {
        self.focus.score()
    }

    pub fn alarm_on(&self) -> bool {
        self.state.alarm_on
    }

    /// Whether `condition` has been announced and not yet cleared
    pub fn is_latched(&self, condition: AlertCondition) -> bool {
        self.debouncer.is_latched(condition)
    }
}
