//! Run summary printed by the simulator

use alerting::Severity;
use chrono::{DateTime, Duration, Utc};
use dms::{AlertEvent, AlertKind, DmsAnalysis, DriverStatus};
use serde::Serialize;

/// Alert as it appears in the report
#[derive(Debug, Clone, Serialize)]
pub struct ReportedAlert {
    pub id: u64,
    pub kind: AlertKind,
    pub severity: Severity,
    pub message: String,
    /// Index of the processed frame that raised it
    pub frame: usize,
    pub stream_ms: u64,
    /// Stream time mapped onto the wall clock at run start
    pub wall_clock: DateTime<Utc>,
}

/// Summary of one simulated session
#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    pub scenario: String,
    pub started_at: DateTime<Utc>,
    pub frames: usize,
    pub frames_with_face: usize,
    /// Longest run of consecutive frames without a face
    pub longest_face_absence: u32,
    pub frames_dropped: u64,
    pub alerts: Vec<ReportedAlert>,
    /// Newest first, as a dashboard would list them
    pub recent_alerts: Vec<String>,
    pub alarm_on_frames: Vec<usize>,
    pub alarm_off_frames: Vec<usize>,
    pub final_focus: u8,
    pub focus_min: u8,
    pub focus_max: u8,
    pub final_status: Option<DriverStatus>,
}

/// Accumulates per-frame analyses into a [`SimReport`]
#[derive(Debug)]
pub struct ReportBuilder {
    report: SimReport,
}

impl ReportBuilder {
    pub fn new(scenario: &str, started_at: DateTime<Utc>) -> Self {
        Self {
            report: SimReport {
                scenario: scenario.to_string(),
                started_at,
                frames: 0,
                frames_with_face: 0,
                longest_face_absence: 0,
                frames_dropped: 0,
                alerts: Vec::new(),
                recent_alerts: Vec::new(),
                alarm_on_frames: Vec::new(),
                alarm_off_frames: Vec::new(),
                final_focus: 0,
                focus_min: u8::MAX,
                focus_max: 0,
                final_status: None,
            },
        }
    }

    pub fn record(&mut self, analysis: &DmsAnalysis) {
        let report = &mut self.report;
        let frame = report.frames;
        report.frames += 1;

        if analysis.face_detected {
            report.frames_with_face += 1;
        }
        report.longest_face_absence = report.longest_face_absence.max(analysis.face_absent_frames);
        for alert in &analysis.alerts {
            report.alerts.push(ReportedAlert {
                id: alert.id,
                kind: alert.kind,
                severity: alert.severity,
                message: alert.message.clone(),
                frame,
                stream_ms: alert.emitted_at_ms,
                wall_clock: wall_clock(report.started_at, alert.emitted_at_ms),
            });
        }
        match analysis.alarm_change {
            Some(true) => report.alarm_on_frames.push(frame),
            Some(false) => report.alarm_off_frames.push(frame),
            None => {}
        }

        report.final_focus = analysis.focus;
        report.focus_min = report.focus_min.min(analysis.focus);
        report.focus_max = report.focus_max.max(analysis.focus);
        report.final_status = Some(analysis.attention.status());
    }

    pub fn finish<'a>(
        mut self,
        frames_dropped: u64,
        recent: impl IntoIterator<Item = &'a AlertEvent>,
    ) -> SimReport {
        if self.report.frames == 0 {
            self.report.focus_min = 0;
        }
        self.report.frames_dropped = frames_dropped;
        self.report.recent_alerts = recent
            .into_iter()
            .map(|a| format!("#{} {} ({}): {}", a.id, a.kind, a.severity, a.message))
            .collect();
        self.report
    }
}

fn wall_clock(started_at: DateTime<Utc>, stream_ms: u64) -> DateTime<Utc> {
    let offset = i64::try_from(stream_ms)
        .ok()
        .and_then(Duration::try_milliseconds)
        .unwrap_or_else(Duration::zero);
    started_at + offset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_run() {
        let report = ReportBuilder::new("empty", Utc::now()).finish(0, []);
        assert_eq!(report.frames, 0);
        assert_eq!(report.focus_min, 0);
        assert!(report.final_status.is_none());
    }

    #[test]
    fn test_records_alarm_and_focus_range() {
        let started = Utc::now();
        let mut builder = ReportBuilder::new("unit", started);
        builder.record(&DmsAnalysis {
            focus: 80,
            face_detected: true,
            ..Default::default()
        });
        builder.record(&DmsAnalysis {
            focus: 20,
            face_absent_frames: 1,
            alarm_change: Some(true),
            alerts: vec![AlertEvent {
                id: 1,
                kind: AlertKind::Drowsiness,
                severity: Severity::Critical,
                message: "Driver drowsy, alarm raised".into(),
                emitted_at_ms: 1500,
            }],
            ..Default::default()
        });

        let report = builder.finish(3, []);
        assert_eq!(report.frames, 2);
        assert_eq!(report.frames_with_face, 1);
        assert_eq!(report.longest_face_absence, 1);
        assert_eq!(report.frames_dropped, 3);
        assert_eq!(report.alarm_on_frames, vec![1]);
        assert_eq!((report.focus_min, report.focus_max, report.final_focus), (20, 80, 20));
        assert_eq!(report.alerts[0].frame, 1);
        assert_eq!(
            report.alerts[0].wall_clock - started,
            Duration::milliseconds(1500)
        );
    }
}
