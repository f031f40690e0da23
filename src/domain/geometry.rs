//! Geometric types and the pure math behind every calibration click
//!
//! Angles are in degrees, measured with `atan2` in image coordinates
//! (y grows downwards), so 90° points straight down.

use serde::{Deserialize, Serialize};

/// Degrees in one full turn
pub const FULL_TURN: f64 = 360.0;

/// Integer pixel coordinate as stored in the calibration configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Raw pointer position inside the displayed image's bounding box
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerPos {
    pub x: f64,
    pub y: f64,
}

impl PointerPos {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Subtract an integer origin without rounding
    pub fn offset_by(self, origin: Point) -> PointerPos {
        PointerPos {
            x: self.x - f64::from(origin.x),
            y: self.y - f64::from(origin.y),
        }
    }

    /// Nearest integer pixel
    pub fn round(self) -> Point {
        Point {
            x: self.x.round() as i32,
            y: self.y.round() as i32,
        }
    }
}

/// `pointer - origin`, rounded to the nearest integer pixel
pub fn to_relative(pointer: PointerPos, origin: Point) -> Point {
    pointer.offset_by(origin).round()
}

/// Angle of `pointer` around `center`, in degrees within (-180, 180]
///
/// `pointer` must already be in the same (crop-relative) space as `center`.
pub fn angle_from_center(pointer: PointerPos, center: Point) -> f64 {
    let dy = pointer.y - f64::from(center.y);
    let dx = pointer.x - f64::from(center.x);
    dy.atan2(dx).to_degrees()
}

/// Fold any finite angle into `[0, 360)`
pub fn normalize_angle_lower_bound(angle: f64) -> f64 {
    let folded = angle.rem_euclid(FULL_TURN);
    // rem_euclid of a tiny negative number rounds up to exactly 360
    if folded >= FULL_TURN {
        0.0
    } else {
        folded + 0.0
    }
}

/// Shift `candidate_end` by whole turns so that it lies in `[start, start + 360)`
///
/// A dial whose span crosses the 0°/360° seam ends up with `end > 360`, which
/// keeps the angle pair monotonic for the service's interpolation.
pub fn normalize_angle_ordering(candidate_end: f64, start: f64) -> f64 {
    let mut end = candidate_end;
    if end < start {
        end += ((start - end) / FULL_TURN).ceil() * FULL_TURN;
    } else if end - start >= FULL_TURN {
        end -= ((end - start) / FULL_TURN).floor() * FULL_TURN;
    }
    end
}
