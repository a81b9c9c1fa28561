//! End-to-end timelines driven by synthetic landmark frames

use alerting::Severity;
use dms::synthetic::SyntheticFace;
use dms::{
    AlertCondition, AlertEvent, AlertKind, DmsAnalysis, DmsConfig, DriverMonitor, DriverStatus,
    LandmarkFrame,
};

const FRAME_MS: u64 = 33;

struct Timeline {
    monitor: DriverMonitor,
    now_ms: u64,
    results: Vec<DmsAnalysis>,
}

impl Timeline {
    fn new(config: DmsConfig) -> Self {
        Self {
            monitor: DriverMonitor::new(config).unwrap(),
            now_ms: 0,
            results: Vec::new(),
        }
    }

    fn frame(&mut self, frame: Option<&LandmarkFrame>) -> &DmsAnalysis {
        let out = self.monitor.process(frame, self.now_ms);
        self.now_ms += FRAME_MS;
        self.results.push(out);
        self.results.last().unwrap()
    }

    fn hold(&mut self, face: SyntheticFace, frames: usize) {
        let frame = face.build();
        for _ in 0..frames {
            self.frame(Some(&frame));
        }
    }

    fn absent(&mut self, frames: usize) {
        for _ in 0..frames {
            self.frame(None);
        }
    }

    /// Continue without a face until `until_ms` (exclusive)
    fn absent_until(&mut self, until_ms: u64) {
        while self.now_ms < until_ms {
            self.frame(None);
        }
    }

    fn alerts(&self) -> Vec<(usize, &AlertEvent)> {
        self.results
            .iter()
            .enumerate()
            .flat_map(|(i, r)| r.alerts.iter().map(move |a| (i, a)))
            .collect()
    }

    fn alarm_changes(&self) -> Vec<(usize, bool)> {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.alarm_change.map(|on| (i, on)))
            .collect()
    }
}

#[test]
fn sustained_closure_warns_then_raises_alarm_once() {
    let mut timeline = Timeline::new(DmsConfig::default());
    timeline.hold(SyntheticFace::new().ear(0.10), 240);

    let alerts = timeline.alerts();
    assert_eq!(alerts.len(), 2);

    // Frame 120 and frame 240 (zero-based 119 and 239)
    let (warn_frame, warn) = alerts[0];
    assert_eq!(warn_frame, 119);
    assert_eq!(warn.kind, AlertKind::Drowsiness);
    assert_eq!(warn.severity, Severity::High);

    let (critical_frame, critical) = alerts[1];
    assert_eq!(critical_frame, 239);
    assert_eq!(critical.severity, Severity::Critical);
    assert!(critical.id > warn.id);

    assert_eq!(timeline.alarm_changes(), vec![(239, true)]);

    let warn_speech = &timeline.results[119].speech;
    assert_eq!(warn_speech, &vec![DmsConfig::default().prompts.drowsy_warn]);
    assert_eq!(
        timeline.results[239].attention.status(),
        DriverStatus::DrowsyCritical
    );
}

#[test]
fn strict_preset_warns_sooner() {
    let mut timeline = Timeline::new(DmsConfig::strict());
    timeline.hold(SyntheticFace::new().ear(0.10), 120);

    let frames: Vec<_> = timeline.alerts().iter().map(|(i, _)| *i).collect();
    assert_eq!(frames, vec![59, 119]);
}

#[test]
fn hysteresis_band_holds_then_releases() {
    let mut timeline = Timeline::new(DmsConfig::default());
    timeline.hold(SyntheticFace::new().ear(0.10), 30);
    timeline.hold(SyntheticFace::new().ear(0.265), 40);

    let held = timeline.results.last().unwrap().closed_frames;
    assert!(held > 30);
    // Once the window is all 0.265 nothing moves
    assert!(timeline.results[40..].iter().all(|r| r.closed_frames == held));

    timeline.hold(SyntheticFace::new().ear(0.30), 5);
    let tail = &timeline.results[70..];
    assert!(tail[0].closed_frames == held, "first open frame stays in the band");
    assert_eq!(tail.last().unwrap().closed_frames, 0);
    assert!(timeline.alerts().is_empty());
}

#[test]
fn yawn_alerts_once_per_episode() {
    let mut timeline = Timeline::new(DmsConfig::default());
    timeline.hold(SyntheticFace::new().mar(0.8), 90);

    let alerts = timeline.alerts();
    assert_eq!(alerts.len(), 1);
    let (frame, yawn) = alerts[0];
    assert_eq!(frame, 14);
    assert_eq!(yawn.kind, AlertKind::Yawn);
    assert_eq!(yawn.severity, Severity::Medium);
    assert_eq!(
        timeline.results[89].attention.status(),
        DriverStatus::Yawning
    );

    // Close the mouth long enough to flush the window, then yawn again
    timeline.hold(SyntheticFace::new(), 10);
    assert_eq!(timeline.results.last().unwrap().yawn_frames, 0);
    timeline.hold(SyntheticFace::new().mar(0.8), 30);

    let yawns = timeline
        .alerts()
        .iter()
        .filter(|(_, a)| a.kind == AlertKind::Yawn)
        .count();
    assert_eq!(yawns, 2);
}

#[test]
fn blinks_never_lower_focus_or_alert() {
    let config = DmsConfig::default();
    let blink_max = config.blink_max_frames;
    let mut timeline = Timeline::new(config);

    // Start from zero focus so recovery is visible
    timeline.absent(1);
    assert_eq!(timeline.results[0].focus, 0);

    for _ in 0..10 {
        timeline.hold(SyntheticFace::new(), 35);
        timeline.hold(SyntheticFace::new().ear(0.05), 5);
    }
    timeline.hold(SyntheticFace::new(), 10);

    let after_absence = &timeline.results[1..];
    assert!(after_absence.iter().all(|r| !r.has_alerts()));
    assert!(after_absence.iter().all(|r| r.closed_frames <= blink_max));
    assert!(after_absence.windows(2).all(|w| w[1].focus >= w[0].focus));
    assert!(timeline.results.last().unwrap().focus > 90);
}

#[test]
fn absent_face_alerts_once_within_cooldown() {
    let mut timeline = Timeline::new(DmsConfig::default());

    let first = timeline.frame(None).clone();
    assert_eq!(first.focus, 0);
    assert!(first.attention.no_face);
    assert_eq!(first.alerts.len(), 1);
    assert_eq!(first.alerts[0].kind, AlertKind::NoFace);

    timeline.absent(9);
    timeline.hold(SyntheticFace::new(), 3);
    assert!(!timeline.monitor.is_latched(AlertCondition::NoFace));

    // Face lost again well inside the five second cooldown
    timeline.absent_until(4_900);
    assert_eq!(timeline.alerts().len(), 1);

    // Still absent once the cooldown has elapsed
    timeline.absent_until(6_000);
    let alerts = timeline.alerts();
    assert_eq!(alerts.len(), 2);
    assert!(alerts[1].1.emitted_at_ms >= 5_000);
    assert!(alerts[1].1.emitted_at_ms < 5_000 + FRAME_MS);
}

#[test]
fn head_turn_suppresses_drowsiness_and_cools_down() {
    let mut timeline = Timeline::new(DmsConfig::default());
    let turned = SyntheticFace::new().ear(0.10).yaw(95.0);

    timeline.hold(turned, 300);
    let alerts = timeline.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].1.kind, AlertKind::HeadTurn);
    assert_eq!(alerts[0].1.severity, Severity::High);

    let last = timeline.results.last().unwrap();
    assert_eq!(last.closed_frames, 0);
    assert!(!last.alarm_on);
    assert!(last.smoothed.is_none());
    assert_eq!(last.attention.status(), DriverStatus::HeadTurned);
    assert!(timeline.results.windows(2).all(|w| w[1].focus <= w[0].focus));

    // Looking back clears the latch; 300 frames is ~9.9s so the cooldown has passed
    timeline.hold(SyntheticFace::new(), 2);
    assert!(!timeline.monitor.is_latched(AlertCondition::HeadTurn));
    timeline.hold(SyntheticFace::new().pitch(-100.0), 1);
    assert_eq!(timeline.alerts().len(), 2);
}

#[test]
fn head_turn_refires_after_cooldown() {
    let mut timeline = Timeline::new(DmsConfig::default());
    timeline.hold(SyntheticFace::new().yaw(95.0), 1);
    timeline.hold(SyntheticFace::new(), 2);
    // Away again at 99ms, persists until ~6s
    timeline.hold(SyntheticFace::new().yaw(-95.0), 180);

    let alerts = timeline.alerts();
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0].1.emitted_at_ms, 0);
    assert!(alerts[1].1.emitted_at_ms >= 5_000);
}

#[test]
fn gradual_drowsiness_and_recovery() {
    let mut timeline = Timeline::new(DmsConfig::default());

    for i in 0..150 {
        let ear = 0.33 - 0.23 * i as f64 / 149.0;
        timeline.hold(SyntheticFace::new().ear(ear), 1);
    }
    timeline.hold(SyntheticFace::new().ear(0.10), 300);
    let drowsy_end = timeline.results.len();

    for i in 1..=20 {
        let ear = 0.10 + 0.23 * i as f64 / 20.0;
        timeline.hold(SyntheticFace::new().ear(ear), 1);
    }
    timeline.hold(SyntheticFace::new().ear(0.33), 10);

    let alerts = timeline.alerts();
    let severities: Vec<_> = alerts.iter().map(|(_, a)| a.severity).collect();
    assert_eq!(severities, vec![Severity::High, Severity::Critical]);
    assert!(alerts.iter().all(|(_, a)| a.kind == AlertKind::Drowsiness));

    // Counted from the first frame whose smoothed EAR drops below ear_low
    let ear_low = DmsConfig::default().ear_low;
    let cross = timeline
        .results
        .iter()
        .position(|r| r.smoothed.is_some_and(|m| m.ear < ear_low))
        .unwrap();
    assert_eq!(timeline.results[cross].closed_frames, 1);
    assert!(cross < 150, "threshold crossed during the descent");
    assert_eq!(alerts[0].0 - cross, 119);
    assert_eq!(alerts[1].0 - cross, 239);

    let changes = timeline.alarm_changes();
    assert_eq!(changes.len(), 2);
    assert!(changes[0].1);
    assert!(!changes[1].1);
    assert!(changes[0].0 < drowsy_end);
    // Smoothed EAR passes ear_high on the 18th step of the ramp
    assert_eq!(changes[1].0, drowsy_end + 17);

    let last = timeline.results.last().unwrap();
    assert_eq!(last.closed_frames, 0);
    assert_eq!(last.attention.status(), DriverStatus::Awake);
    assert!(!last.alarm_on);
}

#[test]
fn stop_and_restart_starts_clean() {
    let mut timeline = Timeline::new(DmsConfig::default());
    timeline.hold(SyntheticFace::new().ear(0.10), 130);
    assert!(timeline.monitor.is_latched(AlertCondition::DrowsyWarn));

    timeline.monitor.reset();
    timeline.results.clear();
    timeline.hold(SyntheticFace::new().ear(0.10), 120);

    let alerts = timeline.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].0, 119);
}
