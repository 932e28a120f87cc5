//! Required-stopping-distance check.
//!
//! A vehicle only needs a junction decision once it is close enough that it
//! would have to start braking now to stop at the line:
//!
//! ```text
//! stopping_distance = v² / (2·a)
//! decide  ⇔  distance_to_stop_line ≤ stopping_distance
//! ```

use crate::ApproachRequest;

/// Distance needed to stop from `speed` at constant `deceleration`.
/// Non-positive decelerations give an infinite distance.
#[inline]
pub fn stopping_distance(speed: f32, deceleration: f32) -> f32 {
    if deceleration <= 0.0 {
        return f32::INFINITY;
    }
    let v = speed.max(0.0);
    v * v / (2.0 * deceleration)
}

/// `true` if the request is within braking range of its stop line.
pub fn within_braking_range(req: &ApproachRequest) -> bool {
    let a = req
        .deceleration
        .filter(|a| *a > 0.0)
        .unwrap_or_else(|| req.decision.kind.default_deceleration());
    req.distance_to_stop_line <= stopping_distance(req.decision.current_speed, a)
}
