//! Driver state tracking

use serde::{Deserialize, Serialize};

use crate::DmsConfig;

/// Eye-closure sub-state, derived from the consecutive closed-eye frame count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EyeState {
    #[default]
    Awake,
    /// Closure short enough to be an ordinary blink
    Blink,
    /// Closed past blink tolerance, not yet long enough to warn
    EyesClosed,
    DrowsyWarn,
    DrowsyCritical,
}

impl EyeState {
    pub fn from_closed_frames(closed_frames: u32, config: &DmsConfig) -> Self {
        if closed_frames == 0 {
            EyeState::Awake
        } else if closed_frames <= config.blink_max_frames {
            EyeState::Blink
        } else if closed_frames < config.warn_frame_threshold {
            EyeState::EyesClosed
        } else if closed_frames < config.critical_frame_threshold {
            EyeState::DrowsyWarn
        } else {
            EyeState::DrowsyCritical
        }
    }
}

/// Mouth sub-state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouthState {
    #[default]
    Normal,
    Yawning,
}

/// Single most important status, for displays that show one label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverStatus {
    NoFace,
    Awake,
    Blink,
    EyesClosed,
    DrowsyWarn,
    DrowsyCritical,
    Yawning,
    HeadTurned,
}

/// Orthogonal attention sub-states plus the two overriding flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttentionState {
    pub eye: EyeState,
    pub mouth: MouthState,
    pub head_turned: bool,
    pub no_face: bool,
}

impl AttentionState {
    /// Priority: no face, head turned, critical, warn, yawning, closed, blink, awake
    pub fn status(&self) -> DriverStatus {
        if self.no_face {
            return DriverStatus::NoFace;
        }
        if self.head_turned {
            return DriverStatus::HeadTurned;
        }
        match (self.eye, self.mouth) {
            (EyeState::DrowsyCritical, _) => DriverStatus::DrowsyCritical,
            (EyeState::DrowsyWarn, _) => DriverStatus::DrowsyWarn,
            (_, MouthState::Yawning) => DriverStatus::Yawning,
            (EyeState::EyesClosed, _) => DriverStatus::EyesClosed,
            (EyeState::Blink, _) => DriverStatus::Blink,
            (EyeState::Awake, _) => DriverStatus::Awake,
        }
    }
}

/// Alertable conditions, each owning one debounce latch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCondition {
    DrowsyWarn,
    DrowsyCritical,
    Yawn,
    HeadTurn,
    NoFace,
    LowFocus,
}

impl AlertCondition {
    pub const ALL: [AlertCondition; 6] = [
        AlertCondition::DrowsyWarn,
        AlertCondition::DrowsyCritical,
        AlertCondition::Yawn,
        AlertCondition::HeadTurn,
        AlertCondition::NoFace,
        AlertCondition::LowFocus,
    ];
}

/// Driver state (tracked over time, one per monitoring session)
#[derive(Debug, Clone, Default)]
pub struct DriverState {
    /// Consecutive frames with smoothed EAR below the low threshold
    pub closed_frames: u32,

    /// Consecutive frames with smoothed MAR above the yawn threshold
    pub yawn_frames: u32,

    /// Consecutive frames without a usable face
    pub face_absent_frames: u32,

    /// Current attention sub-states
    pub attention: AttentionState,

    /// Looping alarm requested
    pub alarm_on: bool,
}

impl DriverState {
    /// Zero the eye and mouth counters and their sub-states
    pub fn clear_eye_and_mouth(&mut self) {
        self.closed_frames = 0;
        self.yawn_frames = 0;
        self.attention.eye = EyeState::Awake;
        self.attention.mouth = MouthState::Normal;
    }

    /// Reset state (on session stop)
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
