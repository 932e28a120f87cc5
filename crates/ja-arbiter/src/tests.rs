//! Unit tests for ja-arbiter.

use ja_core::{EngineConfig, NodeId, Point, SegmentId, Tick, VehicleId};
use ja_network::{RoadNetwork, RoadNetworkBuilder};
use ja_registry::{MovementKey, PriorityRegistry};
use ja_signal::SignalController;

use crate::{ArbitrationContext, DecisionRequest};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Four-way junction `c` at the origin with 50-speed lanes, plus an empty
/// registry and signal controller.
struct Fixture {
    net:      RoadNetwork,
    c:        NodeId,
    /// `[N, E, S, W]`
    seg:      [SegmentId; 4],
    registry: PriorityRegistry,
    signals:  SignalController,
}

const N: usize = 0;
const E: usize = 1;
const S: usize = 2;
const W: usize = 3;

fn fixture() -> Fixture {
    let mut b = RoadNetworkBuilder::new();
    let c = b.add_node(Point::new(0.0, 0.0));
    let n = b.add_node(Point::new(0.0, 100.0));
    let e = b.add_node(Point::new(100.0, 0.0));
    let s = b.add_node(Point::new(0.0, -100.0));
    let w = b.add_node(Point::new(-100.0, 0.0));
    let north = b.add_road(c, n, 1, 50.0).unwrap();
    let east  = b.add_road(c, e, 1, 50.0).unwrap();
    let south = b.add_road(c, s, 1, 50.0).unwrap();
    let west  = b.add_road(c, w, 1, 50.0).unwrap();
    let cfg = EngineConfig { max_vehicles: 32, ..EngineConfig::default() };
    Fixture {
        net: b.build(),
        c,
        seg: [north, east, south, west],
        registry: PriorityRegistry::new(&cfg),
        signals: SignalController::new(&cfg),
    }
}

impl Fixture {
    fn ctx(&self) -> ArbitrationContext<'_, RoadNetwork> {
        ArbitrationContext::new(&self.registry, &self.signals, &self.net)
    }

    fn key(&self, from: usize) -> MovementKey {
        MovementKey::new(self.c, self.seg[from])
    }

    /// Track vehicle `v` as driving `from → to` through `c`, seen at `now`.
    fn place(&self, v: u32, from: usize, to: usize, now: Tick) -> VehicleId {
        let v = VehicleId(v);
        let (from, to) = (self.seg[from], self.seg[to]);
        let lane = self.net.lanes_of(from).next().unwrap();
        self.registry.vehicles().upsert(v, now, |tv| {
            tv.state.last_seen_tick = now;
            tv.state.from_segment = from;
            tv.state.from_lane = lane;
            tv.state.to_node = self.c;
            tv.state.to_segment = to;
            tv.state.yield_speed_reduction = 15.0;
            tv.state.registrations = 1;
        });
        self.registry.attach(MovementKey::new(self.c, from), v);
        v
    }

    fn request(&self, v: VehicleId, from: usize, speed: f32, now: Tick) -> DecisionRequest {
        DecisionRequest::new(v, self.key(from), speed, now)
    }
}

// ── Speed caps and braking ─────────────────────────────────────────────────────

#[cfg(test)]
mod braking {
    use ja_core::VehicleKind;

    use super::*;
    use crate::braking::{stopping_distance, within_braking_range};
    use crate::{ApproachRequest, Arbiter, SpeedCap};

    #[test]
    fn speed_cap_limits() {
        assert_eq!(SpeedCap::Unrestricted.limit(), None);
        assert_eq!(SpeedCap::LimitedTo(4.0).limit(), Some(4.0));
        assert_eq!(SpeedCap::Stop.limit(), Some(0.0));
        assert!(SpeedCap::Stop.is_stop());
    }

    #[test]
    fn stopping_distance_is_quadratic() {
        assert_eq!(stopping_distance(10.0, 0.5), 100.0);
        assert_eq!(stopping_distance(20.0, 0.5), 400.0);
        assert_eq!(stopping_distance(-3.0, 0.5), 0.0);
        assert!(stopping_distance(1.0, 0.0).is_infinite());
    }

    #[test]
    fn far_vehicles_are_not_decided() {
        let f = fixture();
        let v = f.place(1, S, N, Tick(0));
        let req = f.request(v, S, 10.0, Tick(0));

        let far = ApproachRequest::new(req, 150.0);
        assert!(!within_braking_range(&far));
        assert_eq!(Arbiter::default().speed_cap(&f.ctx(), &far), None);

        let near = ApproachRequest::new(req, 80.0);
        assert_eq!(Arbiter::default().speed_cap(&f.ctx(), &near), Some(SpeedCap::Unrestricted));

        // A bus brakes harder to stop in time: 10² / (2·0.3) ≈ 166.
        let bus = ApproachRequest::new(req.with_kind(VehicleKind::Bus), 150.0);
        assert!(within_braking_range(&bus));
        let custom = ApproachRequest { deceleration: Some(2.0), ..near };
        assert!(!within_braking_range(&custom));
    }
}

// ── Fail-soft paths ────────────────────────────────────────────────────────────

#[cfg(test)]
mod fail_soft {
    use ja_registry::{CarState, PriorityType};

    use super::*;
    use crate::{Arbiter, SpeedCap};

    #[test]
    fn unknown_vehicle_is_unrestricted() {
        let f = fixture();
        let req = f.request(VehicleId(9), S, 10.0, Tick(0));
        assert_eq!(Arbiter::default().decide(&f.ctx(), &req), SpeedCap::Unrestricted);
    }

    #[test]
    fn stale_key_is_unrestricted() {
        let f = fixture();
        f.registry.set_priority_type(f.key(N), Some(PriorityType::Stop));
        let v = f.place(1, S, N, Tick(0));
        // The host still asks about the north approach.
        let req = f.request(v, N, 10.0, Tick(0));
        assert_eq!(Arbiter::default().decide(&f.ctx(), &req), SpeedCap::Unrestricted);
        assert_eq!(f.registry.tracking_state(v).unwrap().decision_state, CarState::None);
    }

    #[test]
    fn uncontrolled_junction_is_unrestricted() {
        let f = fixture();
        let v = f.place(1, S, N, Tick(0));
        f.place(2, E, W, Tick(0));
        let req = f.request(v, S, 10.0, Tick(0));
        assert_eq!(Arbiter::default().decide(&f.ctx(), &req), SpeedCap::Unrestricted);
        assert_eq!(f.registry.tracking_state(v).unwrap().decision_state, CarState::None);
    }
}

// ── Priority state machine ─────────────────────────────────────────────────────

#[cfg(test)]
mod priority {
    use ja_registry::{CarState, PriorityType};

    use super::*;
    use crate::{Arbiter, SpeedCap};

    #[test]
    fn stop_sign_clears_one_tick_after_stopping() {
        let f = fixture();
        f.registry.set_priority_type(f.key(S), Some(PriorityType::Stop));
        let v = f.place(1, S, N, Tick(0));
        let arb = Arbiter::default();

        assert_eq!(arb.decide(&f.ctx(), &f.request(v, S, 0.0, Tick(1))), SpeedCap::Stop);
        let st = f.registry.tracking_state(v).unwrap();
        assert_eq!(st.decision_state, CarState::Stop);
        assert!(st.stopped);

        assert_eq!(arb.decide(&f.ctx(), &f.request(v, S, 0.0, Tick(2))), SpeedCap::Unrestricted);
        assert_eq!(f.registry.tracking_state(v).unwrap().decision_state, CarState::Leave);
    }

    #[test]
    fn stop_sign_requires_a_full_stop() {
        let f = fixture();
        f.registry.set_priority_type(f.key(S), Some(PriorityType::Stop));
        let v = f.place(1, S, N, Tick(0));
        let arb = Arbiter::default();
        for t in 1..5 {
            assert_eq!(arb.decide(&f.ctx(), &f.request(v, S, 8.0, Tick(t))), SpeedCap::Stop);
        }
        assert!(!f.registry.tracking_state(v).unwrap().stopped);
    }

    #[test]
    fn yield_and_main_clear_immediately_without_traffic() {
        let f = fixture();
        f.registry.set_priority_type(f.key(S), Some(PriorityType::Yield));
        f.registry.set_priority_type(f.key(N), Some(PriorityType::Main));
        let y = f.place(1, S, N, Tick(0));
        let m = f.place(2, N, W, Tick(0));
        let arb = Arbiter::default();

        // A right turn from the north does not cross the northbound yield.
        assert_eq!(arb.decide(&f.ctx(), &f.request(y, S, 12.0, Tick(1))), SpeedCap::Unrestricted);
        assert_eq!(arb.decide(&f.ctx(), &f.request(m, N, 12.0, Tick(1))), SpeedCap::Unrestricted);
        assert_eq!(f.registry.tracking_state(m).unwrap().decision_state, CarState::Leave);
    }

    #[test]
    fn cleared_main_road_keeps_to_lane_limit() {
        let f = fixture();
        f.registry.set_priority_type(f.key(S), Some(PriorityType::Main));
        let v = f.place(1, S, N, Tick(0));
        let arb = Arbiter::default();
        assert_eq!(arb.decide(&f.ctx(), &f.request(v, S, 30.0, Tick(1))), SpeedCap::Unrestricted);
        assert_eq!(arb.decide(&f.ctx(), &f.request(v, S, 30.0, Tick(2))), SpeedCap::LimitedTo(50.0));
    }

    #[test]
    fn four_way_main_and_yield() {
        let f = fixture();
        for d in [N, S] {
            f.registry.set_priority_type(f.key(d), Some(PriorityType::Main));
        }
        for d in [E, W] {
            f.registry.set_priority_type(f.key(d), Some(PriorityType::Yield));
        }
        let main = f.place(1, S, N, Tick(0));
        let minor = f.place(2, E, W, Tick(0));
        let arb = Arbiter::default();

        // The main road never waits for the side road.
        assert_eq!(arb.decide(&f.ctx(), &f.request(main, S, 20.0, Tick(1))), SpeedCap::Unrestricted);
        // The side road sheds its yield reduction while main traffic is present.
        assert_eq!(
            arb.decide(&f.ctx(), &f.request(minor, E, 20.0, Tick(1))),
            SpeedCap::LimitedTo(5.0)
        );
        assert_eq!(
            arb.decide(&f.ctx(), &f.request(minor, E, 4.0, Tick(2))),
            SpeedCap::LimitedTo(0.0)
        );
        assert_eq!(f.registry.tracking_state(minor).unwrap().decision_state, CarState::Stop);

        f.registry.remove_vehicle(main);
        assert_eq!(
            arb.decide(&f.ctx(), &f.request(minor, E, 0.0, Tick(3))),
            SpeedCap::Unrestricted
        );
        assert_eq!(f.registry.tracking_state(minor).unwrap().decision_state, CarState::Leave);
    }

    #[test]
    fn timeout_lets_waiting_vehicle_through() {
        let f = fixture();
        f.registry.set_priority_type(f.key(S), Some(PriorityType::Stop));
        f.registry.set_priority_type(f.key(W), Some(PriorityType::Main));
        let v = f.place(1, S, N, Tick(0));
        f.place(2, W, E, Tick(0));
        let arb = Arbiter::default();

        let mut states = Vec::new();
        let mut cleared_at = None;
        for t in 1..=40u64 {
            let cap = arb.decide(&f.ctx(), &f.request(v, S, 0.0, Tick(t)));
            states.push(f.registry.tracking_state(v).unwrap().decision_state);
            if cap == SpeedCap::Unrestricted && cleared_at.is_none() {
                cleared_at = Some(t);
            }
        }
        assert_eq!(cleared_at, Some(31));
        assert_eq!(f.registry.tracking_state(v).unwrap().wait_ticks, 30);
        assert!(states.windows(2).all(|w| w[0] <= w[1]), "decision state went backwards");
    }
}

// ── Signals ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod signals {
    use ja_core::VehicleKind;
    use ja_registry::{CarState, PriorityType};
    use ja_signal::{ChangeMetric, Step, StepSignal};

    use super::*;
    use crate::{Arbiter, SpeedCap};

    #[test]
    fn red_stops_green_latches_leave() {
        let f = fixture();
        f.signals.set_manual(f.c, &f.seg).unwrap();
        let v = f.place(1, S, N, Tick(0));
        let arb = Arbiter::default();

        assert_eq!(arb.decide(&f.ctx(), &f.request(v, S, 10.0, Tick(1))), SpeedCap::Stop);
        f.signals.toggle_manual(f.c, f.seg[S]).unwrap();
        assert_eq!(arb.decide(&f.ctx(), &f.request(v, S, 10.0, Tick(2))), SpeedCap::Unrestricted);
        assert_eq!(f.registry.tracking_state(v).unwrap().decision_state, CarState::Leave);
    }

    #[test]
    fn transition_states() {
        let f = fixture();
        let steps = vec![
            Step::new(5, 100).with_metric(ChangeMetric::FirstFlow).with(f.seg[S], StepSignal::green()),
            Step::new(5, 100).with_metric(ChangeMetric::FirstFlow).with(f.seg[S], StepSignal::red()),
        ];
        f.signals.install_timed(f.c, steps).unwrap();
        f.signals.start(f.c, Tick(0)).unwrap();
        let committed = f.place(1, S, N, Tick(0));
        let arb = Arbiter::default();
        assert_eq!(
            arb.decide(&f.ctx(), &f.request(committed, S, 10.0, Tick(1))),
            SpeedCap::Unrestricted
        );

        f.signals.skip_step(f.c, Tick(10)).unwrap();
        let late = f.place(2, S, W, Tick(10));
        // Green-to-red: the cleared vehicle finishes crossing, the newcomer stops.
        assert_eq!(
            arb.decide(&f.ctx(), &f.request(committed, S, 10.0, Tick(10))),
            SpeedCap::Unrestricted
        );
        assert_eq!(arb.decide(&f.ctx(), &f.request(late, S, 10.0, Tick(10))), SpeedCap::Stop);

        f.signals.skip_step(f.c, Tick(20)).unwrap();
        // Red-to-green still holds traffic.
        assert_eq!(arb.decide(&f.ctx(), &f.request(late, S, 0.0, Tick(20))), SpeedCap::Stop);
    }

    #[test]
    fn green_with_conflict_crawls() {
        let f = fixture();
        f.signals.set_manual(f.c, &f.seg).unwrap();
        f.signals.toggle_manual(f.c, f.seg[S]).unwrap();
        f.signals.toggle_manual(f.c, f.seg[W]).unwrap();
        f.registry.set_priority_type(f.key(S), Some(PriorityType::Yield));
        let v = f.place(1, S, N, Tick(0));
        f.place(2, W, E, Tick(0));
        let arb = Arbiter::default();

        assert_eq!(
            arb.decide(&f.ctx(), &f.request(v, S, 10.0, Tick(1))),
            SpeedCap::LimitedTo(3.0)
        );
        // Once the crossing traffic is held at red it no longer counts.
        f.signals.toggle_manual(f.c, f.seg[W]).unwrap();
        assert_eq!(arb.decide(&f.ctx(), &f.request(v, S, 10.0, Tick(2))), SpeedCap::Unrestricted);
    }

    #[test]
    fn emergency_ignores_red_but_not_traffic() {
        let f = fixture();
        f.signals.set_manual(f.c, &f.seg).unwrap();
        let v = f.place(1, S, N, Tick(0));
        let arb = Arbiter::default();
        let req = f.request(v, S, 20.0, Tick(1)).with_kind(VehicleKind::Emergency);

        // Traffic from the right crossing its path.
        let other = f.place(2, E, W, Tick(0));
        assert_eq!(arb.decide(&f.ctx(), &req), SpeedCap::LimitedTo(6.0));

        f.registry.remove_vehicle(other);
        assert_eq!(arb.decide(&f.ctx(), &req), SpeedCap::Unrestricted);
        assert_eq!(f.registry.tracking_state(v).unwrap().decision_state, CarState::Leave);
    }
}
