//! Landmark geometry: eye/mouth aspect ratios and head pose heuristics
//!
//! Pure functions over a validated [`LandmarkFrame`]. Callers validate first;
//! invalid frames are handled as "no face" by the state machine.

use serde::{Deserialize, Serialize};

use crate::landmarks::{indices, LandmarkFrame};
use crate::DmsError;

/// Floor for every ratio denominator
pub const MIN_DENOMINATOR: f64 = 1e-6;

/// Scale applied to normalized nose offsets to get degree-like angles.
/// An offset of half the face width (or height) reads as 90 degrees.
const ANGLE_SCALE_DEG: f64 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EyeSide {
    Left,
    Right,
}

impl EyeSide {
    fn indices(self) -> [usize; 6] {
        match self {
            EyeSide::Left => indices::LEFT_EYE,
            EyeSide::Right => indices::RIGHT_EYE,
        }
    }
}

fn floored(denominator: f64) -> f64 {
    denominator.max(MIN_DENOMINATOR)
}

/// Eye aspect ratio: `(|p2-p6| + |p3-p5|) / (2 * |p1-p4|)`.
///
/// Roughly 0.15 for a closed eye and 0.35 for a wide open one.
pub fn eye_aspect_ratio(frame: &LandmarkFrame, side: EyeSide) -> f64 {
    let [p1, p2, p3, p4, p5, p6] = side.indices().map(|i| frame.at(i));

    let vertical_1 = p2.distance(&p6);
    let vertical_2 = p3.distance(&p5);
    let horizontal = p1.distance(&p4);

    (vertical_1 + vertical_2) / (2.0 * floored(horizontal))
}

/// Mean EAR of both eyes
pub fn average_ear(frame: &LandmarkFrame) -> f64 {
    (eye_aspect_ratio(frame, EyeSide::Left) + eye_aspect_ratio(frame, EyeSide::Right)) / 2.0
}

/// Mouth aspect ratio: mean of inner and outer lip openings over mouth width.
///
/// Below ~0.3 for a closed mouth, above ~0.6 for a yawn.
pub fn mouth_aspect_ratio(frame: &LandmarkFrame) -> f64 {
    let inner = frame
        .at(indices::INNER_LIP_TOP)
        .distance(&frame.at(indices::INNER_LIP_BOTTOM));
    let outer = frame
        .at(indices::OUTER_LIP_TOP)
        .distance(&frame.at(indices::OUTER_LIP_BOTTOM));
    let width = frame
        .at(indices::MOUTH_LEFT)
        .distance(&frame.at(indices::MOUTH_RIGHT));

    ((inner + outer) / 2.0) / floored(width)
}

/// Approximate head yaw: horizontal nose offset from the eye-corner midpoint,
/// relative to face width. Not a calibrated angle.
pub fn head_yaw_degrees(frame: &LandmarkFrame) -> f64 {
    let nose = frame.at(indices::NOSE_TIP);
    let eye_mid = frame
        .at(indices::LEFT_EYE[0])
        .midpoint(&frame.at(indices::RIGHT_EYE[3]));
    let face_width = (frame.at(indices::LEFT_CHEEK).x - frame.at(indices::RIGHT_CHEEK).x).abs();

    (nose.x - eye_mid.x) / floored(face_width) * ANGLE_SCALE_DEG
}

/// Approximate head pitch: vertical nose offset from the forehead/chin
/// midpoint, relative to face height. Not a calibrated angle.
pub fn head_pitch_degrees(frame: &LandmarkFrame) -> f64 {
    let nose = frame.at(indices::NOSE_TIP);
    let forehead = frame.at(indices::FOREHEAD);
    let chin = frame.at(indices::CHIN);
    let face_height = (forehead.y - chin.y).abs();

    (nose.y - forehead.midpoint(&chin).y) / floored(face_height) * ANGLE_SCALE_DEG
}

/// Metrics derived from one landmark frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub ear: f64,
    pub mar: f64,
    pub yaw_deg: f64,
    pub pitch_deg: f64,
    pub timestamp_ms: u64,
}

impl MetricSample {
    /// Validate the frame and compute every metric
    pub fn from_frame(frame: &LandmarkFrame, timestamp_ms: u64) -> Result<Self, DmsError> {
        frame.validate()?;
        Ok(Self {
            ear: average_ear(frame),
            mar: mouth_aspect_ratio(frame),
            yaw_deg: head_yaw_degrees(frame),
            pitch_deg: head_pitch_degrees(frame),
            timestamp_ms,
        })
    }

    /// Head turned at least `threshold_deg` on either axis
    pub fn head_turned(&self, threshold_deg: f64) -> bool {
        self.yaw_deg.abs() >= threshold_deg || self.pitch_deg.abs() >= threshold_deg
    }
}
