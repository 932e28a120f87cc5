//! Per-vehicle tracking state.

use ja_core::{LaneId, NodeId, SegmentId, Tick};

use crate::MovementKey;

/// Where a vehicle stands in the junction decision cycle for its current
/// movement.
///
/// The state only moves forward (`None → Enter → Stop → Leave → Transit`);
/// the only way back is a reset to `None` when the vehicle registers under a
/// new movement.
///
/// Crossing the junction is the same event as registering under the next
/// movement, so the tracker reports `Leave → Transit` through
/// `TrackOutcome::transit` and the stored state starts over at `None`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CarState {
    /// Not evaluated yet for this movement.
    #[default]
    None,
    /// First evaluated near the junction.
    Enter,
    /// Waiting (or yielding) for conflicting traffic.
    Stop,
    /// Cleared to cross; stays cleared.
    Leave,
    /// Crossed the junction.  Reported by the tracker, never stored.
    Transit,
}

impl CarState {
    /// Move forward to `next`.  Returns `false` and leaves `self` unchanged
    /// if `next` would be a step backwards.
    #[inline]
    pub fn advance_to(&mut self, next: CarState) -> bool {
        if next < *self {
            return false;
        }
        *self = next;
        true
    }

    /// `true` once the vehicle has been cleared to cross.
    #[inline]
    pub fn is_committed(self) -> bool {
        self >= CarState::Leave
    }
}

/// Everything the engine knows about one tracked vehicle.
///
/// Refreshed by the route tracker on its level-of-detail cadence and by the
/// arbitration decision every tick the vehicle is near a junction.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleTrackingState {
    /// Tick of the most recent tracker scan.
    pub last_seen_tick: Tick,

    /// Segment and lane the vehicle is currently on.
    pub from_segment: SegmentId,
    pub from_lane:    LaneId,

    /// Junction the vehicle is heading for.
    pub to_node: NodeId,

    /// Segment and lane taken after `to_node`.  `INVALID` until the path
    /// provides enough lookahead.
    pub to_segment: SegmentId,
    pub to_lane:    LaneId,

    /// Secondary movement registered for signal flow accounting.
    pub lookahead: Option<MovementKey>,

    pub decision_state: CarState,

    /// Ticks spent in `CarState::Stop` for the current movement.
    pub wait_ticks: u32,

    /// Latched once the vehicle slowed below the stop threshold while waiting.
    pub stopped: bool,

    /// Speed shed per tick while yielding; drawn once per registration.
    pub yield_speed_reduction: f32,

    /// Number of movement registrations so far.
    pub registrations: u32,
}

impl VehicleTrackingState {
    /// A freshly seen vehicle that is not registered anywhere yet.
    pub fn new(now: Tick) -> Self {
        Self {
            last_seen_tick:        now,
            from_segment:          SegmentId::INVALID,
            from_lane:             LaneId::INVALID,
            to_node:               NodeId::INVALID,
            to_segment:            SegmentId::INVALID,
            to_lane:               LaneId::INVALID,
            lookahead:             None,
            decision_state:        CarState::None,
            wait_ticks:            0,
            stopped:               false,
            yield_speed_reduction: 0.0,
            registrations:         0,
        }
    }

    /// The primary movement this vehicle is registered under, if any.
    #[inline]
    pub fn movement(&self) -> Option<MovementKey> {
        (self.to_node.is_valid() && self.from_segment.is_valid())
            .then(|| MovementKey::new(self.to_node, self.from_segment))
    }

    /// Clear the per-movement decision counters.
    pub fn reset_decision(&mut self) {
        self.decision_state = CarState::None;
        self.wait_ticks = 0;
        self.stopped = false;
    }
}
