//! Decision inputs and outputs.

use ja_core::{Tick, VehicleId, VehicleKind};
use ja_registry::MovementKey;

/// The speed restriction handed back to the host for one tick.
#[derive(Copy, Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpeedCap {
    /// Drive as the host's own model sees fit.
    #[default]
    Unrestricted,
    /// Do not exceed this speed.
    LimitedTo(f32),
    /// Come to a halt before the stop line.
    Stop,
}

impl SpeedCap {
    /// The cap as a number; `None` when unrestricted.
    #[inline]
    pub fn limit(self) -> Option<f32> {
        match self {
            SpeedCap::Unrestricted => None,
            SpeedCap::LimitedTo(v) => Some(v),
            SpeedCap::Stop => Some(0.0),
        }
    }

    #[inline]
    pub fn is_stop(self) -> bool {
        self == SpeedCap::Stop
    }
}

/// One vehicle asking how fast it may approach a junction this tick.
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecisionRequest {
    pub vehicle: VehicleId,
    pub kind:    VehicleKind,
    /// The movement the host believes the vehicle is making.
    pub key:     MovementKey,
    pub current_speed: f32,
    pub now:     Tick,
}

impl DecisionRequest {
    pub fn new(vehicle: VehicleId, key: MovementKey, current_speed: f32, now: Tick) -> Self {
        Self { vehicle, kind: VehicleKind::Car, key, current_speed, now }
    }

    pub fn with_kind(mut self, kind: VehicleKind) -> Self {
        self.kind = kind;
        self
    }
}

/// A [`DecisionRequest`] plus what the braking check needs.
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ApproachRequest {
    pub decision: DecisionRequest,
    /// Remaining distance to the stop line.
    pub distance_to_stop_line: f32,
    /// Braking deceleration; the kind's default when `None`.
    pub deceleration: Option<f32>,
}

impl ApproachRequest {
    pub fn new(decision: DecisionRequest, distance_to_stop_line: f32) -> Self {
        Self { decision, distance_to_stop_line, deceleration: None }
    }
}
