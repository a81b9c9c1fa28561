//! Focus score mapping (0-100)

use serde::{Deserialize, Serialize};

use crate::DmsConfig;

/// Map EAR linearly onto 0..=100 after clamping to `[ear_min, ear_max]`
pub fn ear_to_focus_percent(ear: f64, ear_min: f64, ear_max: f64) -> u8 {
    let span = (ear_max - ear_min).max(f64::EPSILON);
    let clamped = ear.clamp(ear_min, ear_max);
    ((clamped - ear_min) / span * 100.0).round() as u8
}

/// Focus band shown by the gauge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusLevel {
    /// 60 and above
    Focused,
    /// 35 to 59
    Caution,
    /// Below 35
    #[default]
    Low,
}

impl FocusLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            60..=u8::MAX => FocusLevel::Focused,
            35..=59 => FocusLevel::Caution,
            _ => FocusLevel::Low,
        }
    }
}

/// Blink-tolerant exponentially smoothed focus score
#[derive(Debug, Clone)]
pub struct FocusMapper {
    value: f64,
    alpha: f64,
    ear_min: f64,
    ear_max: f64,
    blink_max_frames: u32,
}

impl FocusMapper {
    pub const INITIAL: f64 = 100.0;

    pub fn new(config: &DmsConfig) -> Self {
        Self {
            value: Self::INITIAL,
            alpha: config.focus_smoothing_alpha,
            ear_min: config.focus_ear_min,
            ear_max: config.focus_ear_max,
            blink_max_frames: config.blink_max_frames,
        }
    }

    /// Advance one frame with a visible, forward-facing driver.
    ///
    /// Within blink tolerance the target is full focus; past it the target
    /// follows the smoothed EAR.
    pub fn update(&mut self, closed_frames: u32, smoothed_ear: f64) -> u8 {
        let target = if closed_frames <= self.blink_max_frames {
            100.0
        } else {
            ear_to_focus_percent(smoothed_ear, self.ear_min, self.ear_max) as f64
        };
        self.ease_toward(target)
    }

    /// One exponential smoothing step toward `target`
    pub fn ease_toward(&mut self, target: f64) -> u8 {
        self.value = self.value * (1.0 - self.alpha) + target.clamp(0.0, 100.0) * self.alpha;
        self.score()
    }

    /// Drop straight to zero (no face)
    pub fn force_zero(&mut self) -> u8 {
        self.value = 0.0;
        0
    }

    pub fn score(&self) -> u8 {
        self.value.round().clamp(0.0, 100.0) as u8
    }

    pub fn level(&self) -> FocusLevel {
        FocusLevel::from_score(self.score())
    }

    pub fn reset(&mut self) {
        self.value = Self::INITIAL;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ear_mapping_endpoints() {
        assert_eq!(ear_to_focus_percent(0.10, 0.15, 0.35), 0);
        assert_eq!(ear_to_focus_percent(0.15, 0.15, 0.35), 0);
        assert_eq!(ear_to_focus_percent(0.25, 0.15, 0.35), 50);
        assert_eq!(ear_to_focus_percent(0.35, 0.15, 0.35), 100);
        assert_eq!(ear_to_focus_percent(0.50, 0.15, 0.35), 100);
    }

    #[test]
    fn test_focus_levels() {
        assert_eq!(FocusLevel::from_score(100), FocusLevel::Focused);
        assert_eq!(FocusLevel::from_score(60), FocusLevel::Focused);
        assert_eq!(FocusLevel::from_score(59), FocusLevel::Caution);
        assert_eq!(FocusLevel::from_score(35), FocusLevel::Caution);
        assert_eq!(FocusLevel::from_score(34), FocusLevel::Low);
    }

    #[test]
    fn test_blink_pulls_toward_full_focus() {
        let config = DmsConfig::default();
        let mut mapper = FocusMapper::new(&config);
        mapper.force_zero();
        mapper.ease_toward(60.0);
        let mut last = mapper.score();
        for closed in 1..=config.blink_max_frames {
            let score = mapper.update(closed, 0.10);
            assert!(score >= last);
            last = score;
        }
    }

    #[test]
    fn test_prolonged_closure_drags_score_down() {
        let config = DmsConfig::default();
        let mut mapper = FocusMapper::new(&config);
        for closed in 13..80 {
            mapper.update(closed, 0.10);
        }
        assert!(mapper.score() < 5);
        assert_eq!(mapper.level(), FocusLevel::Low);
    }

    #[test]
    fn test_smoothing_step() {
        let config = DmsConfig::default();
        let mut mapper = FocusMapper::new(&config);
        // 100 * 0.9 + 0 * 0.1
        assert_eq!(mapper.ease_toward(0.0), 90);
        mapper.reset();
        assert_eq!(mapper.score(), 100);
    }

    proptest! {
        #[test]
        fn score_stays_in_range(steps in prop::collection::vec((0u32..400, -1.0f64..2.0), 1..200)) {
            let config = DmsConfig::default();
            let mut mapper = FocusMapper::new(&config);
            for (closed, ear) in steps {
                let score = mapper.update(closed, ear);
                prop_assert!(score <= 100);
            }
        }
    }
}
