//! The per-tick junction decision.

use log::debug;

use ja_core::EngineConfig;
use ja_network::RoadNetworkAccessor;
use ja_registry::{CarState, MovementKey, PriorityType, VehicleTrackingState};
use ja_signal::{LightColor, MovementGroup};

use crate::braking::within_braking_range;
use crate::{ApproachRequest, ArbitrationContext, DecisionRequest, SpeedCap};

/// Decision parameters taken from [`EngineConfig`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Arbiter {
    pub wait_timeout_ticks:   u32,
    pub stop_speed_threshold: f32,
    pub caution_factor:       f32,
}

impl Default for Arbiter {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl Arbiter {
    pub fn new(cfg: &EngineConfig) -> Self {
        Self {
            wait_timeout_ticks:   cfg.wait_timeout_ticks,
            stop_speed_threshold: cfg.stop_speed_threshold,
            caution_factor:       cfg.caution_factor,
        }
    }

    /// Braking check, then [`decide`](Self::decide).  `None` means the
    /// vehicle is still far enough out that no decision is needed this tick.
    pub fn speed_cap<N: RoadNetworkAccessor + ?Sized>(
        &self,
        ctx: &ArbitrationContext<'_, N>,
        req: &ApproachRequest,
    ) -> Option<SpeedCap> {
        within_braking_range(req).then(|| self.decide(ctx, &req.decision))
    }

    /// Decide the speed cap for one vehicle approaching `req.key.node`.
    ///
    /// Never fails: unknown vehicles and vehicles that already moved on to
    /// another movement get `Unrestricted`.
    pub fn decide<N: RoadNetworkAccessor + ?Sized>(
        &self,
        ctx: &ArbitrationContext<'_, N>,
        req: &DecisionRequest,
    ) -> SpeedCap {
        let Some(mut st) = ctx.registry.tracking_state(req.vehicle) else {
            debug!("decision for untracked {}", req.vehicle);
            return SpeedCap::Unrestricted;
        };
        if st.movement() != Some(req.key) {
            return SpeedCap::Unrestricted;
        }
        let before = (st.decision_state, st.wait_ticks, st.stopped);
        let priority = ctx.registry.priority_type(req.key);

        let cap = if req.kind.ignores_controls() {
            self.emergency(ctx, req, &mut st)
        } else if ctx.signals.is_active(req.key.node) {
            self.signalled(ctx, req, &mut st, priority.is_some())
        } else if let Some(p) = priority {
            self.priority_step(ctx, req, &mut st, p)
        } else {
            SpeedCap::Unrestricted
        };

        if before != (st.decision_state, st.wait_ticks, st.stopped) {
            Self::commit(ctx, req, &st);
        }
        cap
    }

    /// Write the decision fields back, unless the tracker moved the vehicle
    /// to another movement in the meantime.
    fn commit<N: RoadNetworkAccessor + ?Sized>(
        ctx: &ArbitrationContext<'_, N>,
        req: &DecisionRequest,
        st:  &VehicleTrackingState,
    ) {
        ctx.registry.vehicles().update(req.vehicle, |tv| {
            let same_movement = tv.state.movement() == Some(req.key);
            if same_movement && tv.state.decision_state.advance_to(st.decision_state) {
                tv.state.wait_ticks = st.wait_ticks;
                tv.state.stopped = st.stopped;
            }
        });
    }

    fn incoming<N: RoadNetworkAccessor + ?Sized>(
        ctx: &ArbitrationContext<'_, N>,
        req: &DecisionRequest,
    ) -> bool {
        ctx.registry.has_incoming_vehicles(ctx.net, req.vehicle, req.key.node, req.now)
    }

    fn caution(&self, req: &DecisionRequest) -> SpeedCap {
        SpeedCap::LimitedTo(req.current_speed.max(0.0) * self.caution_factor)
    }

    // ── Emergency vehicles ────────────────────────────────────────────────

    fn emergency<N: RoadNetworkAccessor + ?Sized>(
        &self,
        ctx: &ArbitrationContext<'_, N>,
        req: &DecisionRequest,
        st:  &mut VehicleTrackingState,
    ) -> SpeedCap {
        if Self::incoming(ctx, req) {
            return self.caution(req);
        }
        st.decision_state.advance_to(CarState::Leave);
        SpeedCap::Unrestricted
    }

    // ── Signalled junctions ───────────────────────────────────────────────

    fn signalled<N: RoadNetworkAccessor + ?Sized>(
        &self,
        ctx:        &ArbitrationContext<'_, N>,
        req:        &DecisionRequest,
        st:         &mut VehicleTrackingState,
        classified: bool,
    ) -> SpeedCap {
        let node = req.key.node;
        let turn = ctx.registry.geometry().turn_direction(ctx.net, req.key.segment, st.to_segment, node);
        let phase = ctx.signals.phase(node);
        match phase.light(req.key.segment, MovementGroup::from_turn(turn)) {
            LightColor::Red | LightColor::RedToGreen => return SpeedCap::Stop,
            LightColor::GreenToRed if !st.decision_state.is_committed() => return SpeedCap::Stop,
            LightColor::GreenToRed | LightColor::Green => {}
        }

        if classified {
            let not_held = |k: MovementKey| phase.lights(k.segment).is_none_or(|l| !l.all_vehicles_red());
            let conflict = ctx.registry.has_incoming_vehicles_filtered(
                ctx.net,
                req.vehicle,
                node,
                req.now,
                not_held,
            );
            if conflict {
                return self.caution(req);
            }
        }
        st.decision_state.advance_to(CarState::Leave);
        SpeedCap::Unrestricted
    }

    // ── Priority signs ────────────────────────────────────────────────────

    /// One tick of the priority state machine:
    ///
    /// ```text
    /// None → Enter → Stop           first evaluation, same tick
    /// Stop, wait ≥ timeout → Leave  any sign
    /// Stop (Stop sign)  stopped ∧ wait > 1 ∧ clear → Leave
    /// Stop (Yield sign) clear → Leave, else shed speed
    /// Stop (Main road)  clear → Leave, else stop
    /// ```
    fn priority_step<N: RoadNetworkAccessor + ?Sized>(
        &self,
        ctx:      &ArbitrationContext<'_, N>,
        req:      &DecisionRequest,
        st:       &mut VehicleTrackingState,
        priority: PriorityType,
    ) -> SpeedCap {
        if st.decision_state == CarState::None {
            st.decision_state = CarState::Enter;
            st.wait_ticks = 0;
            st.stopped = false;
        }
        if st.decision_state == CarState::Enter {
            st.decision_state = CarState::Stop;
        }
        if st.decision_state.is_committed() {
            return Self::leave_cap(ctx, st, priority);
        }

        if st.wait_ticks >= self.wait_timeout_ticks {
            debug!("{} waited {} ticks at {}, letting it through", req.vehicle, st.wait_ticks, req.key);
            st.decision_state = CarState::Leave;
            return SpeedCap::Unrestricted;
        }
        st.wait_ticks += 1;
        if req.current_speed < self.stop_speed_threshold {
            st.stopped = true;
        }

        let clear = |st: &mut VehicleTrackingState| {
            st.decision_state = CarState::Leave;
            SpeedCap::Unrestricted
        };
        match priority {
            PriorityType::Stop => {
                if st.stopped && st.wait_ticks > 1 && !Self::incoming(ctx, req) {
                    clear(st)
                } else {
                    SpeedCap::Stop
                }
            }
            PriorityType::Yield => {
                if Self::incoming(ctx, req) {
                    SpeedCap::LimitedTo((req.current_speed - st.yield_speed_reduction).max(0.0))
                } else {
                    clear(st)
                }
            }
            PriorityType::Main => {
                if Self::incoming(ctx, req) { SpeedCap::Stop } else { clear(st) }
            }
        }
    }

    /// Cap for a vehicle already cleared through the junction.  Main-road
    /// traffic keeps to the posted limit of its lane.
    fn leave_cap<N: RoadNetworkAccessor + ?Sized>(
        ctx:      &ArbitrationContext<'_, N>,
        st:       &VehicleTrackingState,
        priority: PriorityType,
    ) -> SpeedCap {
        match priority {
            PriorityType::Main => ctx
                .net
                .speed_limit(st.from_segment, st.from_lane)
                .map_or(SpeedCap::Unrestricted, SpeedCap::LimitedTo),
            PriorityType::Yield | PriorityType::Stop => SpeedCap::Unrestricted,
        }
    }
}
