//! Built-in synthetic driving scenarios

use dms::source::DetectorResult;
use dms::synthetic::SyntheticFace;

/// Canned timelines for exercising the monitor without a camera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Eyes drift shut, stay closed for ten seconds, then reopen
    Drowsy,
    /// Two separate yawns
    Yawn,
    /// Camera blocked for several seconds
    NoFace,
    /// Quick mirror check, then a long look away
    HeadTurn,
}

impl Scenario {
    pub fn name(&self) -> &'static str {
        match self {
            Scenario::Drowsy => "drowsy",
            Scenario::Yawn => "yawn",
            Scenario::NoFace => "no-face",
            Scenario::HeadTurn => "head-turn",
        }
    }

    /// Detector results spaced `interval_ms` apart, starting at zero
    pub fn frames(&self, interval_ms: u64) -> Vec<DetectorResult> {
        let mut timeline = Builder::new(interval_ms);
        let alert = SyntheticFace::new();

        match self {
            Scenario::Drowsy => {
                timeline.face(alert, 60);
                for i in 0..150 {
                    timeline.face(alert.ear(0.33 - 0.23 * i as f64 / 149.0), 1);
                }
                timeline.face(alert.ear(0.10), 300);
                for i in 1..=20 {
                    timeline.face(alert.ear(0.10 + 0.23 * i as f64 / 20.0), 1);
                }
                timeline.face(alert.ear(0.33), 60);
            }
            Scenario::Yawn => {
                timeline.face(alert, 60);
                timeline.face(alert.mar(0.8), 45);
                timeline.face(alert, 30);
                timeline.face(alert.mar(0.8), 45);
                timeline.face(alert, 30);
            }
            Scenario::NoFace => {
                timeline.face(alert, 30);
                timeline.absent(200);
                timeline.face(alert, 30);
            }
            Scenario::HeadTurn => {
                timeline.face(alert, 30);
                timeline.face(alert.yaw(95.0), 20);
                timeline.face(alert, 30);
                timeline.face(alert.yaw(-95.0), 200);
                timeline.face(alert, 30);
            }
        }

        timeline.finish()
    }
}

struct Builder {
    interval_ms: u64,
    results: Vec<DetectorResult>,
}

impl Builder {
    fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            results: Vec::new(),
        }
    }

    fn next_ts(&self) -> u64 {
        self.results.len() as u64 * self.interval_ms
    }

    fn face(&mut self, face: SyntheticFace, frames: usize) {
        let landmarks = face.build();
        for _ in 0..frames {
            let ts = self.next_ts();
            self.results.push(DetectorResult::face(ts, landmarks.clone()));
        }
    }

    fn absent(&mut self, frames: usize) {
        for _ in 0..frames {
            let ts = self.next_ts();
            self.results.push(DetectorResult::no_face(ts));
        }
    }

    fn finish(self) -> Vec<DetectorResult> {
        self.results
    }
}
