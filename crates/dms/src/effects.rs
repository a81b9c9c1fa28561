//! Fire-and-forget audio side effects
//!
//! The state machine never waits on speech or playback. Requests go through an
//! unbounded channel to a task that owns the [`AudioBackend`]; backend
//! failures are logged there and go no further.

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::analysis::AlertEvent;
use crate::session::SessionSink;

/// Side-effect errors (reported by backends, never surfaced to the monitor)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EffectError {
    #[error("Speech synthesis unavailable: {0}")]
    SpeechUnavailable(String),

    #[error("Alarm playback blocked: {0}")]
    PlaybackBlocked(String),
}

/// Requested side effect
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Speak(String),
    Alarm(bool),
}

/// Speech and alarm output
pub trait AudioBackend {
    fn speak(&mut self, text: &str) -> Result<(), EffectError>;

    /// Start (`true`) or stop (`false`) the looping alarm
    fn set_alarm(&mut self, on: bool) -> Result<(), EffectError>;
}

/// Non-blocking producer half of the effect channel
#[derive(Debug, Clone)]
pub struct EffectSender {
    tx: mpsc::UnboundedSender<Effect>,
}

impl EffectSender {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Effect>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue an effect. A closed channel is logged and ignored.
    pub fn send(&self, effect: Effect) {
        if let Err(e) = self.tx.send(effect) {
            debug!("Effect receiver dropped, discarding {:?}", e.0);
        }
    }

    pub fn speak(&self, text: impl Into<String>) {
        self.send(Effect::Speak(text.into()));
    }

    pub fn set_alarm(&self, on: bool) {
        self.send(Effect::Alarm(on));
    }
}

/// Apply effects until every sender is dropped, then hand the backend back
pub async fn run_effects<B: AudioBackend>(
    mut rx: mpsc::UnboundedReceiver<Effect>,
    mut backend: B,
) -> B {
    while let Some(effect) = rx.recv().await {
        let result = match &effect {
            Effect::Speak(text) => backend.speak(text),
            Effect::Alarm(on) => backend.set_alarm(*on),
        };
        if let Err(e) = result {
            warn!("Side effect {:?} failed: {}", effect, e);
        }
    }
    debug!("Effect channel closed");
    backend
}

/// Backend that only logs; stands in for real TTS and audio playback
#[derive(Debug, Default)]
pub struct LoggingBackend {
    alarm_on: bool,
}

impl LoggingBackend {
    pub fn alarm_on(&self) -> bool {
        self.alarm_on
    }
}

impl AudioBackend for LoggingBackend {
    fn speak(&mut self, text: &str) -> Result<(), EffectError> {
        info!("Speak: {}", text);
        Ok(())
    }

    fn set_alarm(&mut self, on: bool) -> Result<(), EffectError> {
        if on != self.alarm_on {
            info!("Alarm loop {}", if on { "started" } else { "stopped" });
        }
        self.alarm_on = on;
        Ok(())
    }
}

/// Events for a presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Focus(u8),
    Alert(AlertEvent),
}

/// [`SessionSink`] that forwards audio to the effect channel and focus/alerts
/// to a UI event channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    effects: EffectSender,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelSink {
    pub fn new(effects: EffectSender, events: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self { effects, events }
    }

    fn publish(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            debug!("Session event receiver dropped");
        }
    }
}

impl SessionSink for ChannelSink {
    fn on_focus_change(&mut self, focus: u8) {
        self.publish(SessionEvent::Focus(focus));
    }

    fn on_alert(&mut self, alert: &AlertEvent) {
        self.publish(SessionEvent::Alert(alert.clone()));
    }

    fn request_speech(&mut self, text: &str) {
        self.effects.speak(text);
    }

    fn set_alarm(&mut self, on: bool) {
        self.effects.set_alarm(on);
    }
}
