//! Planar coordinate type and bearing helpers.
//!
//! Junction geometry only needs directions, not distances on the globe, so
//! points live in the host's flat world space (`x` east, `y` north).

/// A position in world space.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Compass bearing from `self` towards `other` in degrees, clockwise from
    /// north, in `[0, 360)`.  Returns 0 for coincident points.
    pub fn bearing_to(self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        if dx == 0.0 && dy == 0.0 {
            return 0.0;
        }
        normalize_deg(dx.atan2(dy).to_degrees())
    }
}

/// Wrap an angle into `[0, 360)`.
#[inline]
pub fn normalize_deg(deg: f32) -> f32 {
    let d = deg.rem_euclid(360.0);
    // rem_euclid can return exactly 360.0 for tiny negative inputs.
    if d >= 360.0 { 0.0 } else { d }
}

/// Signed smallest difference `to - from` in `(-180, 180]`.
#[inline]
pub fn signed_delta_deg(from: f32, to: f32) -> f32 {
    let d = normalize_deg(to - from);
    if d > 180.0 { d - 360.0 } else { d }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}
