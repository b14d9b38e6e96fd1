//! Axis-aligned pixel rectangle used as the subject boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Boundary rectangle in frame pixel coordinates.
///
/// Edges are inclusive corners `(x1, y1)` to `(x2, y2)`. A boundary may lie
/// partly outside the frame; [`is_in_frame`] tells whether it does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Boundary {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Boundary {
    #[must_use]
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    #[must_use]
    pub fn width(&self) -> i32 {
        self.x2.saturating_sub(self.x1)
    }

    #[must_use]
    pub fn height(&self) -> i32 {
        self.y2.saturating_sub(self.y1)
    }

    /// Integer centre point, rounding toward negative infinity
    #[must_use]
    pub fn center(&self) -> (i32, i32) {
        (midpoint(self.x1, self.x2), midpoint(self.y1, self.y2))
    }
}

/// Floor of the mean, computed wide so saturated edges cannot overflow
#[allow(clippy::cast_possible_truncation)]
fn midpoint(a: i32, b: i32) -> i32 {
    // The mean of two i32 values always fits in i32
    (i64::from(a) + i64::from(b)).div_euclid(2) as i32
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x1, self.y1, self.x2, self.y2)
    }
}

/// Check that a boundary is non-degenerate and lies entirely inside the frame.
///
/// True iff `0 <= x1 < x2 <= width` and `0 <= y1 < y2 <= height`. A missing
/// boundary is never in frame.
#[must_use]
pub fn is_in_frame(boundary: Option<&Boundary>, frame_width: i32, frame_height: i32) -> bool {
    boundary.is_some_and(|b| {
        0 <= b.x1 && b.x1 < b.x2 && b.x2 <= frame_width && 0 <= b.y1 && b.y1 < b.y2 && b.y2 <= frame_height
    })
}
