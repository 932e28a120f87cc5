//! The route tracker.

use std::ops::Range;

use log::debug;

use ja_core::{EngineConfig, LaneId, NodeId, SegmentId, Tick, VehicleId};
use ja_network::RoadNetworkAccessor;
use ja_registry::{CarState, MovementKey, PriorityRegistry};

use crate::PathPosition;

/// What one [`RouteTracker::track`] call changed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackOutcome {
    /// `false` if the call left the vehicle untouched (no usable path).
    pub tracked: bool,
    /// The primary movement changed (or was registered for the first time).
    pub registered_changed: bool,
    /// Primary movement before the call.
    pub previous: Option<MovementKey>,
    /// Primary movement after the call.
    pub current: Option<MovementKey>,
    /// Secondary movement registered for signal flow accounting.
    pub lookahead: Option<MovementKey>,
    /// The vehicle had been cleared through `previous` and has now crossed it.
    pub transit: bool,
}

/// Registers vehicles under the movement they are about to make.
///
/// Stateless apart from configuration; all per-vehicle data lives in the
/// [`PriorityRegistry`], so one tracker can serve every worker thread.
#[derive(Clone, Debug)]
pub struct RouteTracker {
    yield_speed_reduction: Range<f32>,
}

impl Default for RouteTracker {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

/// Validated lookahead derived from the path.
#[derive(Default)]
struct Lookahead {
    to_segment: Option<(SegmentId, LaneId)>,
    secondary:  Option<MovementKey>,
}

impl RouteTracker {
    pub fn new(cfg: &EngineConfig) -> Self {
        Self { yield_speed_reduction: cfg.yield_speed_reduction.clone() }
    }

    /// Update `vehicle`'s registration from its upcoming `path` (current
    /// position first, up to three entries are used).
    ///
    /// `is_timed(node)` must return `true` for junctions running a timed
    /// signal program; only those receive lookahead registrations.
    pub fn track<N, T>(
        &self,
        registry: &PriorityRegistry,
        net:      &N,
        vehicle:  VehicleId,
        path:     &[PathPosition],
        now:      Tick,
        is_timed: T,
    ) -> TrackOutcome
    where
        N: RoadNetworkAccessor + ?Sized,
        T: Fn(NodeId) -> bool,
    {
        if let Err(err) = registry.vehicles().check(vehicle) {
            debug!("{err}, not tracked");
            return TrackOutcome::default();
        }
        let Some(first) = path.first() else {
            debug!("{vehicle}: empty path, not tracked");
            return TrackOutcome::default();
        };
        let Some(to_node) = net.target_junction(first.segment, first.offset) else {
            debug!("{vehicle}: unknown segment {}, not tracked", first.segment);
            return TrackOutcome::default();
        };
        let from_lane = if net.lane_segment(first.lane) == Some(first.segment) {
            first.lane
        } else {
            debug!("{vehicle}: lane {} is not on {}", first.lane, first.segment);
            LaneId::INVALID
        };
        let look = Self::lookahead(net, vehicle, to_node, &path[1..], &is_timed);
        let key = MovementKey::new(to_node, first.segment);

        let Some((previous, old_lookahead, transit)) =
            registry.vehicles().upsert(vehicle, now, |tv| {
                let st = &mut tv.state;
                let previous = (st.registrations > 0).then(|| st.movement()).flatten();
                let changed = previous != Some(key);
                let mut transit = false;

                st.last_seen_tick = now;
                if changed {
                    transit = st.decision_state == CarState::Leave;
                    st.from_segment = first.segment;
                    st.to_node = to_node;
                    st.reset_decision();
                    st.yield_speed_reduction = if self.yield_speed_reduction.is_empty() {
                        self.yield_speed_reduction.start
                    } else {
                        tv.rng.gen_range(self.yield_speed_reduction.clone())
                    };
                    st.registrations += 1;
                }
                st.from_lane = from_lane;
                (st.to_segment, st.to_lane) =
                    look.to_segment.unwrap_or((SegmentId::INVALID, LaneId::INVALID));
                let old_lookahead = std::mem::replace(&mut st.lookahead, look.secondary);
                (previous, old_lookahead, transit)
            })
        else {
            return TrackOutcome::default();
        };

        let registered_changed = previous != Some(key);
        if registered_changed {
            if let Some(old) = previous {
                registry.detach(old, vehicle);
            }
            registry.attach(key, vehicle);
        }
        if old_lookahead != look.secondary {
            if let Some(old) = old_lookahead {
                registry.detach_lookahead(old, vehicle);
            }
            if let Some(new) = look.secondary {
                registry.attach_lookahead(new, vehicle);
            }
        }

        TrackOutcome {
            tracked: true,
            registered_changed,
            previous,
            current: Some(key),
            lookahead: look.secondary,
            transit,
        }
    }

    /// Validate `rest` (the path after the current position) as far as it
    /// goes.  The first bad element cuts the lookahead short.
    fn lookahead<N, T>(
        net:      &N,
        vehicle:  VehicleId,
        to_node:  NodeId,
        rest:     &[PathPosition],
        is_timed: &T,
    ) -> Lookahead
    where
        N: RoadNetworkAccessor + ?Sized,
        T: Fn(NodeId) -> bool,
    {
        let mut look = Lookahead::default();
        let Some(next) = rest.first() else { return look };

        if !net.is_connected(to_node, next.segment) {
            debug!("{vehicle}: {} does not leave {to_node}", next.segment);
            return look;
        }
        if net.lane_segment(next.lane) != Some(next.segment) {
            debug!("{vehicle}: lane {} is not on {}", next.lane, next.segment);
            return look;
        }
        look.to_segment = Some((next.segment, next.lane));

        let Some(after) = rest.get(1) else { return look };
        let Some(far) = net.other_junction(next.segment, to_node) else { return look };
        if !net.is_connected(far, after.segment) {
            debug!("{vehicle}: {} does not leave {far}", after.segment);
            return look;
        }
        if is_timed(far) {
            look.secondary = Some(MovementKey::new(far, next.segment));
        }
        look
    }
}
