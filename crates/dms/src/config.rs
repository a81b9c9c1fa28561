//! DMS configuration

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::state::AlertCondition;
use crate::DmsError;

/// Environment variable prefix for overrides (`DMS_EAR_LOW=0.22`, `DMS_PROMPTS__YAWN=...`)
pub const ENV_PREFIX: &str = "DMS";

/// Sentences requested from the speech collaborator, one per alert condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechPrompts {
    pub drowsy_warn: String,
    pub drowsy_critical: String,
    pub yawn: String,
    pub head_turn: String,
    pub no_face: String,
    pub low_focus: String,
}

impl Default for SpeechPrompts {
    fn default() -> Self {
        Self {
            drowsy_warn: "Hey, stay with me. Keep your eyes on the road.".into(),
            drowsy_critical: "Wake up! Pull over as soon as it is safe.".into(),
            yawn: "You seem tired. Consider taking a break.".into(),
            head_turn: "Please look back at the road.".into(),
            no_face: "I can't see you. Please face the camera.".into(),
            low_focus: "Your focus is dropping. Stay alert.".into(),
        }
    }
}

impl SpeechPrompts {
    pub fn for_condition(&self, condition: AlertCondition) -> &str {
        match condition {
            AlertCondition::DrowsyWarn => &self.drowsy_warn,
            AlertCondition::DrowsyCritical => &self.drowsy_critical,
            AlertCondition::Yawn => &self.yawn,
            AlertCondition::HeadTurn => &self.head_turn,
            AlertCondition::NoFace => &self.no_face,
            AlertCondition::LowFocus => &self.low_focus,
        }
    }
}

/// DMS configuration
///
/// Frame counts assume the detector runs at `frame_rate_hz`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DmsConfig {
    /// Smoothed EAR below this counts as a closed-eye frame
    pub ear_low: f64,

    /// Smoothed EAR above this ends a closed-eye episode
    pub ear_high: f64,

    /// Smoothed MAR above this counts as a yawning frame
    pub mar_threshold: f64,

    /// Closed-eye frames still treated as an ordinary blink
    pub blink_max_frames: u32,

    /// Closed-eye frames before the drowsiness warning
    pub warn_frame_threshold: u32,

    /// Closed-eye frames before the critical alarm
    pub critical_frame_threshold: u32,

    /// Yawning frames before the yawn alert
    pub yawn_frame_threshold: u32,

    /// Head yaw or pitch (degrees) at which the driver counts as looking away
    pub head_turn_angle_threshold_deg: f64,

    /// Cooldown between head-turn / no-face alerts (milliseconds)
    pub alert_cooldown_ms: u64,

    /// Rolling window length for EAR/MAR smoothing (frames)
    pub smoothing_window_size: usize,

    /// Exponential smoothing factor for the focus score
    pub focus_smoothing_alpha: f64,

    /// EAR mapped to 0% focus
    pub focus_ear_min: f64,

    /// EAR mapped to 100% focus
    pub focus_ear_max: f64,

    /// Nominal detector frame rate
    pub frame_rate_hz: f64,

    /// Fire a low-focus alert below this score (disabled when unset)
    pub low_focus_threshold: Option<u8>,

    /// Cooldown between low-focus alerts (milliseconds)
    pub low_focus_cooldown_ms: u64,

    /// Speech prompts
    pub prompts: SpeechPrompts,
}

impl Default for DmsConfig {
    fn default() -> Self {
        Self {
            ear_low: 0.25,
            ear_high: 0.28,
            mar_threshold: 0.6,
            blink_max_frames: 12,
            warn_frame_threshold: 120,
            critical_frame_threshold: 240,
            yawn_frame_threshold: 15,
            head_turn_angle_threshold_deg: 90.0,
            alert_cooldown_ms: 5000,
            smoothing_window_size: ring_buffer::DEFAULT_WINDOW,
            focus_smoothing_alpha: 0.1,
            focus_ear_min: 0.15,
            focus_ear_max: 0.35,
            frame_rate_hz: 30.0,
            low_focus_threshold: None,
            low_focus_cooldown_ms: 15_000,
            prompts: SpeechPrompts::default(),
        }
    }
}

impl DmsConfig {
    /// Create strict config (shorter closed-eye tolerance)
    pub fn strict() -> Self {
        Self {
            warn_frame_threshold: 60,
            critical_frame_threshold: 120,
            yawn_frame_threshold: 10,
            head_turn_angle_threshold_deg: 60.0,
            ..Default::default()
        }
    }

    /// Create lenient config (longer closed-eye tolerance)
    pub fn lenient() -> Self {
        Self {
            warn_frame_threshold: 150,
            critical_frame_threshold: 300,
            yawn_frame_threshold: 30,
            ..Default::default()
        }
    }

    /// Load configuration: defaults, then an optional file, then `DMS_*` environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, DmsError> {
        let mut builder = ::config::Config::builder();

        if let Some(path) = path {
            info!("Loading DMS configuration from {}", path.display());
            builder = builder.add_source(::config::File::from(path));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: DmsConfig = builder
            .build()
            .and_then(|settings| settings.try_deserialize())
            .map_err(|e| DmsError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject threshold sets the state machine cannot run with
    pub fn validate(&self) -> Result<(), DmsError> {
        let fail = |msg: String| Err(DmsError::Config(msg));

        if !(self.ear_low > 0.0 && self.ear_low <= self.ear_high) {
            return fail(format!(
                "ear_low ({}) must be positive and not above ear_high ({})",
                self.ear_low, self.ear_high
            ));
        }
        if self.mar_threshold <= 0.0 {
            return fail(format!("mar_threshold ({}) must be positive", self.mar_threshold));
        }
        if !(self.blink_max_frames < self.warn_frame_threshold
            && self.warn_frame_threshold < self.critical_frame_threshold)
        {
            return fail(format!(
                "frame thresholds must increase: blink {} < warn {} < critical {}",
                self.blink_max_frames, self.warn_frame_threshold, self.critical_frame_threshold
            ));
        }
        if self.yawn_frame_threshold == 0 {
            return fail("yawn_frame_threshold must be at least 1".into());
        }
        if self.head_turn_angle_threshold_deg <= 0.0 {
            return fail("head_turn_angle_threshold_deg must be positive".into());
        }
        if self.smoothing_window_size == 0 {
            return fail("smoothing_window_size must be at least 1".into());
        }
        if !(self.focus_smoothing_alpha > 0.0 && self.focus_smoothing_alpha <= 1.0) {
            return fail(format!(
                "focus_smoothing_alpha ({}) must be in (0, 1]",
                self.focus_smoothing_alpha
            ));
        }
        if self.focus_ear_min >= self.focus_ear_max {
            return fail(format!(
                "focus_ear_min ({}) must be below focus_ear_max ({})",
                self.focus_ear_min, self.focus_ear_max
            ));
        }
        if self.frame_rate_hz <= 0.0 {
            return fail("frame_rate_hz must be positive".into());
        }
        if matches!(self.low_focus_threshold, Some(t) if t > 100) {
            return fail("low_focus_threshold must be within 0..=100".into());
        }
        Ok(())
    }

    /// Convert a frame count to seconds at the nominal frame rate
    pub fn frames_to_secs(&self, frames: u32) -> f64 {
        frames as f64 / self.frame_rate_hz
    }

    /// Nominal time between frames (milliseconds)
    pub fn frame_interval_ms(&self) -> u64 {
        (1000.0 / self.frame_rate_hz).round() as u64
    }
}
