//! Monitoring session lifecycle
//!
//! Wraps a [`DriverMonitor`] and turns each [`DmsAnalysis`] into calls on a
//! [`SessionSink`]. Frames arriving while the session is stopped are ignored.

use tracing::{debug, info};

use crate::analysis::{AlertEvent, DmsAnalysis};
use crate::landmarks::LandmarkFrame;
use crate::source::LandmarkSource;
use crate::{DmsConfig, DmsError, DriverMonitor};

/// Receiver of session output. Every call is fire-and-forget.
pub trait SessionSink {
    fn on_focus_change(&mut self, focus: u8);
    fn on_alert(&mut self, alert: &AlertEvent);
    fn request_speech(&mut self, text: &str);
    fn set_alarm(&mut self, on: bool);
}

/// A started/stopped monitoring session bound to one sink
pub struct MonitorSession<S: SessionSink> {
    monitor: DriverMonitor,
    sink: S,
    active: bool,
}

impl<S: SessionSink> MonitorSession<S> {
    pub fn new(config: DmsConfig, sink: S) -> Result<Self, DmsError> {
        Ok(Self {
            monitor: DriverMonitor::new(config)?,
            sink,
            active: false,
        })
    }

    /// Begin monitoring from a fresh state
    pub fn start(&mut self) {
        if self.active {
            debug!("Session already active");
            return;
        }
        self.monitor.reset();
        self.active = true;
        info!("Monitoring session started");
    }

    /// Process one detector result and dispatch its effects.
    ///
    /// Returns `None` while stopped.
    pub fn on_frame(
        &mut self,
        frame: Option<&LandmarkFrame>,
        timestamp_ms: u64,
    ) -> Option<DmsAnalysis> {
        if !self.active {
            return None;
        }

        let analysis = self.monitor.process(frame, timestamp_ms);
        self.dispatch(&analysis);
        Some(analysis)
    }

    fn dispatch(&mut self, analysis: &DmsAnalysis) {
        for alert in &analysis.alerts {
            self.sink.on_alert(alert);
        }
        for text in &analysis.speech {
            self.sink.request_speech(text);
        }
        if let Some(on) = analysis.alarm_change {
            self.sink.set_alarm(on);
        }
        self.sink.on_focus_change(analysis.focus);
    }

    /// Stop monitoring: silence the alarm and clear all latches and timers
    pub fn stop(&mut self) {
        if !self.active {
            return;
        }
        if self.monitor.alarm_on() {
            self.sink.set_alarm(false);
        }
        self.monitor.reset();
        self.active = false;
        info!("Monitoring session stopped");
    }

    /// Pull results from `source` until it is exhausted, returning the frame count
    pub fn run_source<L: LandmarkSource>(&mut self, source: &mut L) -> usize {
        let mut frames = 0;
        while let Some(result) = source.next_result() {
            self.on_frame(result.landmarks.as_ref(), result.timestamp_ms);
            frames += 1;
        }
        frames
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn monitor(&self) -> &DriverMonitor {
        &self.monitor
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

impl<S: SessionSink> Drop for MonitorSession<S> {
    fn drop(&mut self) {
        self.stop();
    }
}
