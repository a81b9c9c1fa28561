//! Face landmark frames produced by the external face-mesh detector

use serde::{Deserialize, Serialize};

use crate::DmsError;

/// MediaPipe face-mesh landmark indices used by the geometry module
pub mod indices {
    /// Left eye: outer corner, upper lid x2, inner corner, lower lid x2
    pub const LEFT_EYE: [usize; 6] = [33, 160, 158, 133, 153, 144];
    /// Right eye: inner corner, upper lid x2, outer corner, lower lid x2
    pub const RIGHT_EYE: [usize; 6] = [362, 385, 387, 263, 373, 380];

    pub const MOUTH_LEFT: usize = 61;
    pub const MOUTH_RIGHT: usize = 291;
    pub const INNER_LIP_TOP: usize = 13;
    pub const INNER_LIP_BOTTOM: usize = 14;
    pub const OUTER_LIP_TOP: usize = 0;
    pub const OUTER_LIP_BOTTOM: usize = 17;

    pub const NOSE_TIP: usize = 1;
    pub const FOREHEAD: usize = 10;
    pub const CHIN: usize = 152;
    pub const LEFT_CHEEK: usize = 234;
    pub const RIGHT_CHEEK: usize = 454;

    /// Every index the geometry module reads
    pub const REQUIRED: [usize; 23] = [
        LEFT_EYE[0], LEFT_EYE[1], LEFT_EYE[2], LEFT_EYE[3], LEFT_EYE[4], LEFT_EYE[5],
        RIGHT_EYE[0], RIGHT_EYE[1], RIGHT_EYE[2], RIGHT_EYE[3], RIGHT_EYE[4], RIGHT_EYE[5],
        MOUTH_LEFT, MOUTH_RIGHT, INNER_LIP_TOP, INNER_LIP_BOTTOM, OUTER_LIP_TOP, OUTER_LIP_BOTTOM,
        NOSE_TIP, FOREHEAD, CHIN, LEFT_CHEEK, RIGHT_CHEEK,
    ];

    /// Minimum number of points a frame needs
    pub const MIN_POINTS: usize = RIGHT_CHEEK + 1;
}

/// Normalized 2D landmark position (depth ignored)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::new(x, y)
    }
}

/// One detector result: fixed-length landmark array normalized to [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkFrame {
    points: Vec<Point>,
}

impl LandmarkFrame {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Landmark at `index`; callers must have validated the frame
    pub(crate) fn at(&self, index: usize) -> Point {
        self.points[index]
    }

    /// Check that every landmark the geometry module reads is present and finite
    pub fn validate(&self) -> Result<(), DmsError> {
        if self.points.len() < indices::MIN_POINTS {
            return Err(DmsError::KeypointsMissing {
                required: indices::MIN_POINTS,
                actual: self.points.len(),
            });
        }

        match indices::REQUIRED.iter().find(|&&i| !self.points[i].is_finite()) {
            Some(&index) => Err(DmsError::NonFiniteLandmark(index)),
            None => Ok(()),
        }
    }
}
