//! Synthetic face-mesh frames with exact EAR/MAR/pose values.
//!
//! Used by the simulator and tests in place of a live detector.

use crate::landmarks::{indices, LandmarkFrame, Point};

/// Points in a MediaPipe face-mesh result
pub const FACE_MESH_POINTS: usize = 468;

const EYE_WIDTH: f64 = 0.08;
const EYE_Y: f64 = 0.42;
const LEFT_EYE_OUTER_X: f64 = 0.38;
const RIGHT_EYE_INNER_X: f64 = 0.54;

const FACE_LEFT_X: f64 = 0.30;
const FACE_RIGHT_X: f64 = 0.70;
const FOREHEAD_Y: f64 = 0.20;
const CHIN_Y: f64 = 0.80;

const MOUTH_WIDTH: f64 = 0.10;
const MOUTH_Y: f64 = 0.65;

/// Builder for a frame whose geometry reproduces the requested metrics
#[derive(Debug, Clone, Copy)]
pub struct SyntheticFace {
    left_ear: f64,
    right_ear: f64,
    mar: f64,
    yaw_deg: f64,
    pitch_deg: f64,
}

impl Default for SyntheticFace {
    fn default() -> Self {
        Self {
            left_ear: 0.32,
            right_ear: 0.32,
            mar: 0.15,
            yaw_deg: 0.0,
            pitch_deg: 0.0,
        }
    }
}

impl SyntheticFace {
    /// Alert, forward-facing driver with a closed mouth
    pub fn new() -> Self {
        Self::default()
    }

    /// Same EAR on both eyes
    pub fn ear(self, ear: f64) -> Self {
        self.eyes(ear, ear)
    }

    pub fn eyes(mut self, left_ear: f64, right_ear: f64) -> Self {
        self.left_ear = left_ear;
        self.right_ear = right_ear;
        self
    }

    pub fn mar(mut self, mar: f64) -> Self {
        self.mar = mar;
        self
    }

    /// Yaw beyond roughly ±110 degrees places the nose outside the unit square
    pub fn yaw(mut self, yaw_deg: f64) -> Self {
        self.yaw_deg = yaw_deg;
        self
    }

    pub fn pitch(mut self, pitch_deg: f64) -> Self {
        self.pitch_deg = pitch_deg;
        self
    }

    pub fn build(&self) -> LandmarkFrame {
        let mut points = vec![Point::new(0.5, 0.5); FACE_MESH_POINTS];

        place_eye(&mut points, indices::LEFT_EYE, LEFT_EYE_OUTER_X, self.left_ear);
        place_eye(&mut points, indices::RIGHT_EYE, RIGHT_EYE_INNER_X, self.right_ear);

        // Mouth: inner and outer openings equal, so MAR = opening / width
        let opening = self.mar * MOUTH_WIDTH;
        points[indices::MOUTH_LEFT] = Point::new(0.5 - MOUTH_WIDTH / 2.0, MOUTH_Y);
        points[indices::MOUTH_RIGHT] = Point::new(0.5 + MOUTH_WIDTH / 2.0, MOUTH_Y);
        for (top, bottom) in [
            (indices::INNER_LIP_TOP, indices::INNER_LIP_BOTTOM),
            (indices::OUTER_LIP_TOP, indices::OUTER_LIP_BOTTOM),
        ] {
            points[top] = Point::new(0.5, MOUTH_Y - opening / 2.0);
            points[bottom] = Point::new(0.5, MOUTH_Y + opening / 2.0);
        }

        // Face outline
        points[indices::LEFT_CHEEK] = Point::new(FACE_LEFT_X, 0.5);
        points[indices::RIGHT_CHEEK] = Point::new(FACE_RIGHT_X, 0.5);
        points[indices::FOREHEAD] = Point::new(0.5, FOREHEAD_Y);
        points[indices::CHIN] = Point::new(0.5, CHIN_Y);

        // Nose offset encodes the pose; eye midpoint and face centre are both x = 0.5
        let face_width = FACE_RIGHT_X - FACE_LEFT_X;
        let face_height = CHIN_Y - FOREHEAD_Y;
        let center_y = (FOREHEAD_Y + CHIN_Y) / 2.0;
        points[indices::NOSE_TIP] = Point::new(
            0.5 + self.yaw_deg / 180.0 * face_width,
            center_y + self.pitch_deg / 180.0 * face_height,
        );

        LandmarkFrame::new(points)
    }
}

/// Lay out six eye points starting at `left_x` so that EAR equals `ear`
fn place_eye(points: &mut [Point], eye: [usize; 6], left_x: f64, ear: f64) {
    let [p1, p2, p3, p4, p5, p6] = eye;
    let gap = ear * EYE_WIDTH;
    let x1 = left_x + EYE_WIDTH / 3.0;
    let x2 = left_x + 2.0 * EYE_WIDTH / 3.0;

    points[p1] = Point::new(left_x, EYE_Y);
    points[p4] = Point::new(left_x + EYE_WIDTH, EYE_Y);
    points[p2] = Point::new(x1, EYE_Y - gap / 2.0);
    points[p6] = Point::new(x1, EYE_Y + gap / 2.0);
    points[p3] = Point::new(x2, EYE_Y - gap / 2.0);
    points[p5] = Point::new(x2, EYE_Y + gap / 2.0);
}
