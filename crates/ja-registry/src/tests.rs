//! Unit tests for ja-registry.

#[cfg(test)]
mod helpers {
    use ja_core::{EngineConfig, NodeId, Point, SegmentId, Tick, VehicleId};
    use ja_network::{RoadNetwork, RoadNetworkBuilder};

    use crate::{MovementKey, PriorityRegistry};

    /// Four-way junction `c` at the origin; returns `[N, E, S, W]`.
    pub fn four_way() -> (RoadNetwork, NodeId, [SegmentId; 4]) {
        let mut b = RoadNetworkBuilder::new();
        let c = b.add_node(Point::new(0.0, 0.0));
        let n = b.add_node(Point::new(0.0, 100.0));
        let e = b.add_node(Point::new(100.0, 0.0));
        let s = b.add_node(Point::new(0.0, -100.0));
        let w = b.add_node(Point::new(-100.0, 0.0));
        let north = b.add_road(c, n, 2, 50.0).unwrap();
        let east  = b.add_road(c, e, 2, 50.0).unwrap();
        let south = b.add_road(c, s, 2, 50.0).unwrap();
        let west  = b.add_road(c, w, 2, 50.0).unwrap();
        (b.build(), c, [north, east, south, west])
    }

    pub fn registry() -> PriorityRegistry {
        PriorityRegistry::new(&EngineConfig { max_vehicles: 64, ..EngineConfig::default() })
    }

    /// Track `v` as heading `from → to` through `node` and register it.
    pub fn place(
        reg:  &PriorityRegistry,
        v:    u32,
        node: NodeId,
        from: SegmentId,
        to:   SegmentId,
        now:  Tick,
    ) -> VehicleId {
        let v = VehicleId(v);
        reg.vehicles().upsert(v, now, |tv| {
            tv.state.last_seen_tick = now;
            tv.state.from_segment = from;
            tv.state.to_node = node;
            tv.state.to_segment = to;
        });
        reg.attach(MovementKey::new(node, from), v);
        v
    }
}

// ── Tracking state ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tracking {
    use ja_core::{NodeId, SegmentId, Tick};

    use crate::{CarState, MovementKey, VehicleTrackingState};

    #[test]
    fn car_state_only_moves_forward() {
        let mut s = CarState::None;
        assert!(s.advance_to(CarState::Enter));
        assert!(s.advance_to(CarState::Leave));
        assert!(!s.advance_to(CarState::Stop));
        assert_eq!(s, CarState::Leave);
        assert!(s.is_committed());
        assert!(!CarState::Stop.is_committed());
    }

    #[test]
    fn movement_needs_node_and_segment() {
        let mut st = VehicleTrackingState::new(Tick(3));
        assert_eq!(st.movement(), None);
        st.to_node = NodeId(1);
        assert_eq!(st.movement(), None);
        st.from_segment = SegmentId(4);
        assert_eq!(st.movement(), Some(MovementKey::new(NodeId(1), SegmentId(4))));
    }

    #[test]
    fn reset_clears_decision_counters() {
        let mut st = VehicleTrackingState::new(Tick::ZERO);
        st.decision_state = CarState::Stop;
        st.wait_ticks = 12;
        st.stopped = true;
        st.reset_decision();
        assert_eq!(st.decision_state, CarState::None);
        assert_eq!(st.wait_ticks, 0);
        assert!(!st.stopped);
    }
}

// ── Vehicle store ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod store {
    use ja_core::{CoreError, Tick, VehicleId};

    use crate::VehicleStore;

    #[test]
    fn out_of_range_ids_are_rejected() {
        let store = VehicleStore::new(4, 0);
        assert!(store.check(VehicleId(3)).is_ok());
        assert_eq!(
            store.check(VehicleId(4)),
            Err(CoreError::VehicleOutOfRange { vehicle: VehicleId(4), capacity: 4 })
        );
        assert_eq!(store.upsert(VehicleId(9), Tick::ZERO, |_| ()), None);
        assert!(store.get(VehicleId::INVALID).is_none());
    }

    #[test]
    fn upsert_then_remove() {
        let store = VehicleStore::new(8, 1);
        store.upsert(VehicleId(5), Tick(7), |tv| tv.state.wait_ticks = 2);
        assert!(store.contains(VehicleId(5)));
        assert_eq!(store.ids(), vec![VehicleId(5)]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(VehicleId(5)).unwrap().last_seen_tick, Tick(7));

        let last = store.remove(VehicleId(5)).unwrap();
        assert_eq!(last.wait_ticks, 2);
        assert!(store.is_empty());
        assert_eq!(store.update(VehicleId(5), |_| ()), None);
    }

    #[test]
    fn slot_rng_is_seeded_per_vehicle() {
        let a = VehicleStore::new(8, 42);
        let b = VehicleStore::new(8, 42);
        let draw = |s: &VehicleStore| {
            s.upsert(VehicleId(3), Tick::ZERO, |tv| tv.rng.gen_range(0.0f32..1.0)).unwrap()
        };
        assert_eq!(draw(&a), draw(&b));
    }
}

// ── Classification and membership ──────────────────────────────────────────────

#[cfg(test)]
mod classification {
    use ja_core::{Tick, VehicleId};

    use super::helpers::{four_way, place, registry};
    use crate::{MovementKey, PriorityType};

    #[test]
    fn set_and_clear_priority() {
        let (_, c, [n, ..]) = four_way();
        let reg = registry();
        let key = MovementKey::new(c, n);

        reg.set_priority_type(key, Some(PriorityType::Stop));
        reg.set_priority_type(key, Some(PriorityType::Stop));
        assert_eq!(reg.priority_type(key), Some(PriorityType::Stop));
        assert_eq!(reg.movement_keys(), vec![key]);

        reg.set_priority_type(key, None);
        assert_eq!(reg.priority_type(key), None);
        assert!(reg.entry(key).is_none());
        // Clearing twice is harmless.
        reg.set_priority_type(key, None);
    }

    #[test]
    fn signal_tracking_keeps_entry_alive() {
        let (_, c, [n, ..]) = four_way();
        let reg = registry();
        let key = MovementKey::new(c, n);

        reg.set_priority_type(key, Some(PriorityType::Yield));
        reg.set_signal_tracked(key, true);
        reg.set_priority_type(key, None);
        assert!(reg.entry(key).is_some());

        reg.set_signal_tracked(key, false);
        assert!(reg.entry(key).is_none());
    }

    #[test]
    fn new_entry_picks_up_tracked_vehicles() {
        let (_, c, [n, _, s, _]) = four_way();
        let reg = registry();
        // Uncontrolled: attach is refused.
        let v = place(&reg, 2, c, s, n, Tick(1));
        let key = MovementKey::new(c, s);
        assert!(reg.movement_vehicles(key).is_empty());

        reg.set_priority_type(key, Some(PriorityType::Yield));
        assert_eq!(reg.movement_vehicles(key), vec![v]);
    }

    #[test]
    fn remove_vehicle_drops_membership() {
        let (_, c, [n, _, s, _]) = four_way();
        let reg = registry();
        let key = MovementKey::new(c, s);
        reg.set_priority_type(key, Some(PriorityType::Main));
        let v = place(&reg, 1, c, s, n, Tick(1));
        assert!(reg.entry(key).unwrap().contains(v));

        assert!(reg.remove_vehicle(v));
        assert!(!reg.remove_vehicle(v));
        assert!(reg.movement_vehicles(key).is_empty());
        assert!(!reg.vehicles().contains(VehicleId(1)));
    }

    #[test]
    fn approach_count_ignores_old_sightings() {
        let (_, c, [n, _, s, _]) = four_way();
        let reg = registry();
        let key = MovementKey::new(c, s);
        reg.set_signal_tracked(key, true);
        place(&reg, 1, c, s, n, Tick(0));
        place(&reg, 2, c, s, n, Tick(500));
        assert_eq!(reg.approach_count(key, Tick(500)), 1);
        assert_eq!(reg.approach_count(key, Tick(200)), 2);
    }
}

// ── Conflict query ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod incoming {
    use ja_core::{CoreResult, SegmentId, Tick, VehicleId};

    use super::helpers::{four_way, place, registry};
    use crate::{CarState, MovementKey, PriorityType};

    #[test]
    fn yield_gives_way_to_crossing_main() {
        let (net, c, [n, e, s, w]) = four_way();
        let reg = registry();
        reg.set_priority_type(MovementKey::new(c, s), Some(PriorityType::Yield));
        reg.set_priority_type(MovementKey::new(c, w), Some(PriorityType::Main));

        let minor = place(&reg, 1, c, s, n, Tick(10));
        let major = place(&reg, 2, c, w, e, Tick(10));

        assert!(reg.has_incoming_vehicles(&net, minor, c, Tick(10)));
        assert!(!reg.has_incoming_vehicles(&net, major, c, Tick(10)));
    }

    #[test]
    fn no_conflict_for_non_crossing_turns() {
        let (net, c, [n, e, s, _]) = four_way();
        let reg = registry();
        reg.set_priority_type(MovementKey::new(c, s), Some(PriorityType::Yield));
        reg.set_priority_type(MovementKey::new(c, n), Some(PriorityType::Main));

        // Right turn from the south and straight from the north never cross.
        let minor = place(&reg, 1, c, s, e, Tick(10));
        place(&reg, 2, c, n, s, Tick(10));
        assert!(!reg.has_incoming_vehicles(&net, minor, c, Tick(10)));
    }

    #[test]
    fn two_mains_never_wait_on_each_other() {
        let (net, c, [n, e, s, w]) = four_way();
        let reg = registry();
        reg.set_priority_type(MovementKey::new(c, s), Some(PriorityType::Main));
        reg.set_priority_type(MovementKey::new(c, w), Some(PriorityType::Main));

        let from_south = place(&reg, 1, c, s, n, Tick(5));
        let from_west = place(&reg, 2, c, w, e, Tick(5));
        let a = reg.has_incoming_vehicles(&net, from_south, c, Tick(5));
        let b = reg.has_incoming_vehicles(&net, from_west, c, Tick(5));
        assert!(a != b, "exactly one of two crossing main movements yields");
        // Right-hand traffic: the approach on the right (south, seen from west) goes first.
        assert!(b);
    }

    #[test]
    fn main_left_turn_yields_to_oncoming_straight() {
        let (net, c, [n, _, s, w]) = four_way();
        let reg = registry();
        reg.set_priority_type(MovementKey::new(c, s), Some(PriorityType::Main));
        reg.set_priority_type(MovementKey::new(c, n), Some(PriorityType::Main));

        let turning = place(&reg, 1, c, s, w, Tick(5));
        let straight = place(&reg, 2, c, n, s, Tick(5));
        assert!(reg.has_incoming_vehicles(&net, turning, c, Tick(5)));
        assert!(!reg.has_incoming_vehicles(&net, straight, c, Tick(5)));
    }

    #[test]
    fn two_yields_use_side_priority() {
        let (net, c, [n, e, s, w]) = four_way();
        let reg = registry();
        reg.set_priority_type(MovementKey::new(c, s), Some(PriorityType::Stop));
        reg.set_priority_type(MovementKey::new(c, e), Some(PriorityType::Stop));

        let from_south = place(&reg, 1, c, s, n, Tick(5));
        let from_east = place(&reg, 2, c, e, w, Tick(5));
        // East is on the right of a south approach.
        assert!(reg.has_incoming_vehicles(&net, from_south, c, Tick(5)));
        assert!(!reg.has_incoming_vehicles(&net, from_east, c, Tick(5)));
    }

    #[test]
    fn stale_vehicles_are_ignored() {
        let (net, c, [n, e, s, w]) = four_way();
        let reg = registry();
        reg.set_priority_type(MovementKey::new(c, s), Some(PriorityType::Yield));
        reg.set_priority_type(MovementKey::new(c, w), Some(PriorityType::Main));

        let minor = place(&reg, 1, c, s, n, Tick(1_000));
        let major = place(&reg, 2, c, w, e, Tick(100));
        assert!(!reg.has_incoming_vehicles(&net, minor, c, Tick(1_000)));

        reg.vehicles().update(major, |tv| tv.state.last_seen_tick = Tick(1_000));
        assert!(reg.has_incoming_vehicles(&net, minor, c, Tick(1_000)));
    }

    #[test]
    fn committed_main_left_turn_blocks_oncoming_straight() {
        let (net, c, [n, _, s, w]) = four_way();
        let reg = registry();
        reg.set_priority_type(MovementKey::new(c, s), Some(PriorityType::Main));
        reg.set_priority_type(MovementKey::new(c, n), Some(PriorityType::Main));

        // Left turner let through by the wait timeout.
        let turning = place(&reg, 1, c, s, w, Tick(40));
        let straight = place(&reg, 2, c, n, s, Tick(40));
        assert!(!reg.has_incoming_vehicles(&net, straight, c, Tick(40)));

        reg.vehicles().update(turning, |tv| tv.state.decision_state = CarState::Leave);
        assert!(reg.has_incoming_vehicles(&net, straight, c, Tick(40)));
    }

    #[test]
    fn committed_stop_from_the_left_blocks_right_hand_approach() {
        let (net, c, [n, e, s, w]) = four_way();
        let reg = registry();
        reg.set_priority_type(MovementKey::new(c, s), Some(PriorityType::Stop));
        reg.set_priority_type(MovementKey::new(c, e), Some(PriorityType::Stop));

        let from_south = place(&reg, 1, c, s, n, Tick(8));
        let from_east = place(&reg, 2, c, e, w, Tick(8));
        assert!(!reg.has_incoming_vehicles(&net, from_east, c, Tick(8)));

        reg.vehicles().update(from_south, |tv| tv.state.decision_state = CarState::Leave);
        assert!(reg.has_incoming_vehicles(&net, from_east, c, Tick(8)));
    }

    #[test]
    fn committed_vehicle_on_a_harmless_path_is_ignored() {
        let (net, c, [n, e, s, _]) = four_way();
        let reg = registry();
        reg.set_priority_type(MovementKey::new(c, s), Some(PriorityType::Main));
        reg.set_priority_type(MovementKey::new(c, n), Some(PriorityType::Main));

        let right_turn = place(&reg, 1, c, s, e, Tick(2));
        let straight = place(&reg, 2, c, n, s, Tick(2));
        reg.vehicles().update(right_turn, |tv| tv.state.decision_state = CarState::Leave);
        assert!(!reg.has_incoming_vehicles(&net, straight, c, Tick(2)));
    }

    #[test]
    fn unknown_destination_is_treated_as_conflict() {
        let (net, c, [_, e, s, w]) = four_way();
        let reg = registry();
        reg.set_priority_type(MovementKey::new(c, s), Some(PriorityType::Yield));
        reg.set_priority_type(MovementKey::new(c, w), Some(PriorityType::Main));

        // Would be a harmless right turn, but the tracker does not know yet.
        let minor = place(&reg, 1, c, s, SegmentId::INVALID, Tick(3));
        place(&reg, 2, c, w, e, Tick(3));
        assert!(reg.has_incoming_vehicles(&net, minor, c, Tick(3)));
    }

    #[test]
    fn filter_skips_movements() {
        let (net, c, [n, e, s, w]) = four_way();
        let reg = registry();
        reg.set_priority_type(MovementKey::new(c, s), Some(PriorityType::Yield));
        reg.set_priority_type(MovementKey::new(c, w), Some(PriorityType::Main));
        let minor = place(&reg, 1, c, s, n, Tick(3));
        place(&reg, 2, c, w, e, Tick(3));

        let held = MovementKey::new(c, w);
        assert!(!reg.has_incoming_vehicles_filtered(&net, minor, c, Tick(3), |k| k != held));
    }

    #[test]
    fn untracked_vehicle_has_no_incoming() -> CoreResult<()> {
        let (net, c, _) = four_way();
        let reg = registry();
        reg.vehicles().check(VehicleId(7))?;
        assert!(!reg.has_incoming_vehicles(&net, VehicleId(7), c, Tick(0)));
        Ok(())
    }
}

// ── Housekeeping ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod sweep {
    use ja_core::Tick;

    use super::helpers::{four_way, place, registry};
    use crate::{MovementKey, PriorityType, SweepReport};

    #[test]
    fn sweep_removes_stale_vehicles() {
        let (_, c, [n, _, s, _]) = four_way();
        let reg = registry();
        let key = MovementKey::new(c, s);
        reg.set_priority_type(key, Some(PriorityType::Stop));
        let old = place(&reg, 1, c, s, n, Tick(0));
        let fresh = place(&reg, 2, c, s, n, Tick(2_000));

        let report = reg.sweep_stale(Tick(2_000));
        assert_eq!(report.removed_vehicles, 1);
        assert!(!reg.vehicles().contains(old));
        assert_eq!(reg.movement_vehicles(key), vec![fresh]);
    }

    #[test]
    fn sweep_prunes_mismatched_membership() {
        let (_, c, [n, e, s, _]) = four_way();
        let reg = registry();
        let from_s = MovementKey::new(c, s);
        let from_e = MovementKey::new(c, e);
        reg.set_priority_type(from_s, Some(PriorityType::Yield));
        reg.set_priority_type(from_e, Some(PriorityType::Yield));
        let v = place(&reg, 1, c, s, n, Tick(5));
        // Leftover membership that no longer matches the vehicle's state.
        reg.attach(from_e, v);

        let report = reg.sweep_stale(Tick(5));
        assert_eq!(report, SweepReport { removed_vehicles: 0, pruned_memberships: 1 });
        assert_eq!(reg.movement_vehicles(from_s), vec![v]);
        assert!(reg.movement_vehicles(from_e).is_empty());
        assert_eq!(reg.sweep_stale(Tick(5)), SweepReport::default());
    }
}
