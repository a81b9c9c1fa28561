//! DMS analysis results and alerts

use alerting::Severity;
use serde::{Deserialize, Serialize};

use crate::focus::FocusLevel;
use crate::geometry::MetricSample;
use crate::smoothing::SmoothedMetrics;
use crate::state::{AlertCondition, AttentionState};

/// DMS alert types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Eyes closed well past a blink
    Drowsiness,

    /// Sustained yawn
    Yawn,

    /// Head turned away from the road
    HeadTurn,

    /// Face not visible (camera blocked?)
    NoFace,

    /// Focus score below the configured floor
    LowFocus,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Drowsiness => "drowsiness",
            AlertKind::Yawn => "yawn",
            AlertKind::HeadTurn => "head_turn",
            AlertKind::NoFace => "no_face",
            AlertKind::LowFocus => "low_focus",
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AlertCondition {
    pub fn kind(&self) -> AlertKind {
        match self {
            AlertCondition::DrowsyWarn | AlertCondition::DrowsyCritical => AlertKind::Drowsiness,
            AlertCondition::Yawn => AlertKind::Yawn,
            AlertCondition::HeadTurn => AlertKind::HeadTurn,
            AlertCondition::NoFace => AlertKind::NoFace,
            AlertCondition::LowFocus => AlertKind::LowFocus,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            AlertCondition::DrowsyCritical => Severity::Critical,
            AlertCondition::DrowsyWarn
            | AlertCondition::HeadTurn
            | AlertCondition::NoFace
            | AlertCondition::LowFocus => Severity::High,
            AlertCondition::Yawn => Severity::Medium,
        }
    }

    /// Text carried by the alert event
    pub fn message(&self) -> &'static str {
        match self {
            AlertCondition::DrowsyWarn => "Eyes closed for too long",
            AlertCondition::DrowsyCritical => "Driver drowsy, alarm raised",
            AlertCondition::Yawn => "Yawning detected",
            AlertCondition::HeadTurn => "Head turned away from the road",
            AlertCondition::NoFace => "No face detected",
            AlertCondition::LowFocus => "Low focus level detected",
        }
    }
}

/// Alert emitted on a condition's not-notified -> notified transition. Never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    /// Unique within a monitor, increasing with emission order
    pub id: u64,
    pub kind: AlertKind,
    pub severity: Severity,
    pub message: String,
    pub emitted_at_ms: u64,
}

/// Complete result of one processed frame
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DmsAnalysis {
    /// Frame timestamp (milliseconds)
    pub timestamp_ms: u64,

    /// Whether a usable face was detected
    pub face_detected: bool,

    /// Raw metrics (if a face was detected)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricSample>,

    /// Smoothed metrics (absent on no-face and head-turned frames)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smoothed: Option<SmoothedMetrics>,

    /// Attention sub-states after this frame
    pub attention: AttentionState,

    /// Consecutive closed-eye frames
    pub closed_frames: u32,

    /// Consecutive yawning frames
    pub yawn_frames: u32,

    /// Consecutive frames without a usable face
    pub face_absent_frames: u32,

    /// Focus score 0-100
    pub focus: u8,

    /// Focus band
    pub focus_level: FocusLevel,

    /// Alerts emitted on this frame
    pub alerts: Vec<AlertEvent>,

    /// Speech requested on this frame
    pub speech: Vec<String>,

    /// Alarm switched on (`Some(true)`) or off (`Some(false)`) on this frame
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alarm_change: Option<bool>,

    /// Alarm state after this frame
    pub alarm_on: bool,
}

impl DmsAnalysis {
    /// Check if any alerts were emitted
    pub fn has_alerts(&self) -> bool {
        !self.alerts.is_empty()
    }

    /// Get highest severity alert
    pub fn highest_severity_alert(&self) -> Option<&AlertEvent> {
        // Ties go to the earliest emitted
        self.alerts
            .iter()
            .rev()
            .max_by_key(|alert| alert.severity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(id: u64, kind: AlertKind, severity: Severity) -> AlertEvent {
        AlertEvent {
            id,
            kind,
            severity,
            message: String::new(),
            emitted_at_ms: 0,
        }
    }

    #[test]
    fn test_highest_severity_alert() {
        let analysis = DmsAnalysis {
            alerts: vec![
                alert(1, AlertKind::Yawn, Severity::Medium),
                alert(2, AlertKind::Drowsiness, Severity::Critical),
                alert(3, AlertKind::HeadTurn, Severity::High),
            ],
            ..Default::default()
        };
        assert!(analysis.has_alerts());
        assert_eq!(analysis.highest_severity_alert().map(|a| a.id), Some(2));
    }

    #[test]
    fn test_severity_tie_prefers_first() {
        let analysis = DmsAnalysis {
            alerts: vec![
                alert(1, AlertKind::NoFace, Severity::High),
                alert(2, AlertKind::LowFocus, Severity::High),
            ],
            ..Default::default()
        };
        assert_eq!(analysis.highest_severity_alert().map(|a| a.id), Some(1));
    }

    #[test]
    fn test_condition_mapping() {
        assert_eq!(AlertCondition::DrowsyWarn.kind(), AlertKind::Drowsiness);
        assert_eq!(AlertCondition::DrowsyWarn.severity(), Severity::High);
        assert_eq!(AlertCondition::DrowsyCritical.severity(), Severity::Critical);
        assert_eq!(AlertCondition::Yawn.severity(), Severity::Medium);
    }

    #[test]
    fn test_alert_serializes_snake_case() {
        let json = serde_json::to_value(alert(7, AlertKind::HeadTurn, Severity::High)).unwrap();
        assert_eq!(json["kind"], "head_turn");
        assert_eq!(json["severity"], "high");
    }
}
