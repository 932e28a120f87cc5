//! The `JunctionArbitrationEngine` struct and its entry points.

use std::sync::Arc;

use log::{info, warn};

use ja_arbiter::{ApproachRequest, Arbiter, ArbitrationContext, DecisionRequest, SpeedCap};
use ja_core::{EngineConfig, NodeId, SegmentId, Tick, VehicleId};
use ja_network::RoadNetworkAccessor;
use ja_registry::{MovementKey, PriorityRegistry, PriorityType, SweepReport, VehicleTrackingState};
use ja_signal::{
    LightColor, MovementGroup, SegmentLights, SignalController, SignalDefinition, SignalPhase,
    Step, StepChange, TimedProgram,
};
use ja_tracker::{PathPosition, RouteTracker, TrackOutcome};

use crate::{EngineError, EngineObserver, EngineResult, EngineSnapshot};

/// One vehicle's upcoming path, as passed to
/// [`JunctionArbitrationEngine::track_batch`].
pub type TrackInput<'p> = (VehicleId, &'p [PathPosition]);

// ── Engine ────────────────────────────────────────────────────────────────────

/// The junction arbitration engine.
///
/// Owns the priority registry and the signal controller and reads the road
/// network through `N`.  Every method takes `&self`: the host may share one
/// engine between all of its simulation threads and call the per-vehicle
/// entry points (`track`, `decide`, `speed_cap`) concurrently.
/// `advance_step` must be called for a given junction by one thread per tick.
///
/// A tick, as the host drives it:
///
/// ```text
/// for each vehicle (any thread):   track(vehicle, path, now)
/// for each vehicle near a junction: speed_cap(request) / decide(request)
/// once per tick:                   advance_signals(now, observer)
/// every few hundred ticks:         sweep(now, observer)
/// ```
///
/// Create via [`EngineBuilder`][crate::EngineBuilder].
pub struct JunctionArbitrationEngine<N: RoadNetworkAccessor> {
    pub(crate) config:   EngineConfig,
    pub(crate) network:  N,
    pub(crate) registry: PriorityRegistry,
    pub(crate) signals:  SignalController,
    pub(crate) tracker:  RouteTracker,
    pub(crate) arbiter:  Arbiter,
}

impl<N: RoadNetworkAccessor> JunctionArbitrationEngine<N> {
    pub(crate) fn new(config: EngineConfig, network: N) -> Self {
        Self {
            registry: PriorityRegistry::new(&config),
            signals:  SignalController::new(&config),
            tracker:  RouteTracker::new(&config),
            arbiter:  Arbiter::new(&config),
            config,
            network,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn registry(&self) -> &PriorityRegistry {
        &self.registry
    }

    pub fn signals(&self) -> &SignalController {
        &self.signals
    }

    /// Copy of the vehicle's tracking state, `None` if it is not tracked.
    pub fn tracking_state(&self, vehicle: VehicleId) -> Option<VehicleTrackingState> {
        self.registry.tracking_state(vehicle)
    }

    pub fn phase(&self, node: NodeId) -> Arc<SignalPhase> {
        self.signals.phase(node)
    }

    pub fn light(&self, node: NodeId, segment: SegmentId, group: MovementGroup) -> LightColor {
        self.signals.light(node, segment, group)
    }

    fn context(&self) -> ArbitrationContext<'_, N> {
        ArbitrationContext::new(&self.registry, &self.signals, &self.network)
    }

    // ── Tracking ──────────────────────────────────────────────────────────

    /// Update the vehicle's registration from its upcoming path.
    ///
    /// A vehicle crossing a timed junction it had been cleared through counts
    /// towards that junction's flow for the running step.
    pub fn track(&self, vehicle: VehicleId, path: &[PathPosition], now: Tick) -> TrackOutcome {
        let outcome = self.tracker.track(
            &self.registry,
            &self.network,
            vehicle,
            path,
            now,
            |node| self.signals.is_timed(node),
        );
        if let Some(crossed) = outcome.previous.filter(|_| outcome.transit) {
            self.signals.record_flow(crossed.node);
        }
        outcome
    }

    /// [`track`](Self::track) every vehicle in `batch`, then report crossings
    /// to `observer` in batch order.
    ///
    /// With the `parallel` feature the tracking runs on Rayon's thread pool.
    pub fn track_batch<O: EngineObserver>(
        &self,
        batch:    &[TrackInput<'_>],
        now:      Tick,
        observer: &mut O,
    ) -> Vec<TrackOutcome> {
        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<TrackOutcome> =
            batch.iter().map(|&(vehicle, path)| self.track(vehicle, path, now)).collect();

        #[cfg(feature = "parallel")]
        let outcomes: Vec<TrackOutcome> = {
            use rayon::prelude::*;
            batch.par_iter().map(|&(vehicle, path)| self.track(vehicle, path, now)).collect()
        };

        for (&(vehicle, _), outcome) in batch.iter().zip(&outcomes) {
            if let Some(crossed) = outcome.previous.filter(|_| outcome.transit) {
                observer.on_transit(vehicle, crossed);
            }
        }
        outcomes
    }

    // ── Decisions ─────────────────────────────────────────────────────────

    /// Speed cap for a vehicle approaching `req.key.node`.  Never fails.
    pub fn decide(&self, req: &DecisionRequest) -> SpeedCap {
        self.arbiter.decide(&self.context(), req)
    }

    /// Braking-distance check, then [`decide`](Self::decide).  `None` while
    /// the vehicle is still too far out to need a decision.
    pub fn speed_cap(&self, req: &ApproachRequest) -> Option<SpeedCap> {
        self.arbiter.speed_cap(&self.context(), req)
    }

    /// [`speed_cap`](Self::speed_cap) for every request, results in request
    /// order.  Requests for the same vehicle must not appear twice.
    pub fn decide_batch(&self, reqs: &[ApproachRequest]) -> Vec<Option<SpeedCap>> {
        let ctx = self.context();

        #[cfg(not(feature = "parallel"))]
        {
            reqs.iter().map(|req| self.arbiter.speed_cap(&ctx, req)).collect()
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            reqs.par_iter().map(|req| self.arbiter.speed_cap(&ctx, req)).collect()
        }
    }

    // ── Signal tick ───────────────────────────────────────────────────────

    /// Advance one junction's timed program.  Waiting traffic is the number
    /// of recently seen vehicles approaching on each segment held at red.
    pub fn advance_step(&self, node: NodeId, now: Tick) -> Option<StepChange> {
        self.signals.advance_step(node, now, |segment| {
            self.registry.approach_count(MovementKey::new(node, segment), now)
        })
    }

    /// Advance every signal once and report step changes to `observer` in
    /// junction order.  Returns the number of junctions that changed step.
    pub fn advance_signals<O: EngineObserver>(&self, now: Tick, observer: &mut O) -> usize {
        let nodes = self.signals.nodes();

        #[cfg(not(feature = "parallel"))]
        let changes: Vec<(NodeId, StepChange)> = nodes
            .iter()
            .filter_map(|&node| self.advance_step(node, now).map(|c| (node, c)))
            .collect();

        #[cfg(feature = "parallel")]
        let changes: Vec<(NodeId, StepChange)> = {
            use rayon::prelude::*;
            nodes
                .par_iter()
                .filter_map(|&node| self.advance_step(node, now).map(|c| (node, c)))
                .collect()
        };

        for &(node, change) in &changes {
            observer.on_step_change(node, change);
        }
        changes.len()
    }

    // ── Priority signs ────────────────────────────────────────────────────

    /// Put a sign on (or remove it from) the movement entering `key.node`
    /// from `key.segment`.
    pub fn set_priority_type(
        &self,
        key:      MovementKey,
        priority: Option<PriorityType>,
    ) -> EngineResult<()> {
        if priority.is_some() {
            self.check_approach(key)?;
        }
        self.registry.set_priority_type(key, priority);
        Ok(())
    }

    pub fn priority_type(&self, key: MovementKey) -> Option<PriorityType> {
        self.registry.priority_type(key)
    }

    // ── Signal editing ────────────────────────────────────────────────────

    /// Install a stopped timed program, replacing the junction's signal.
    pub fn install_timed(&self, node: NodeId, steps: Vec<Step>) -> EngineResult<()> {
        for step in &steps {
            self.check_segments(node, step.lights.iter().map(|(s, _)| *s))?;
        }
        let before = self.signals.segments(node);
        self.signals.install_timed(node, steps)?;
        self.sync_tracked(node, &before);
        Ok(())
    }

    pub fn start(&self, node: NodeId, now: Tick) -> EngineResult<()> {
        Ok(self.signals.start(node, now)?)
    }

    pub fn stop(&self, node: NodeId) -> EngineResult<()> {
        Ok(self.signals.stop(node)?)
    }

    pub fn skip_step(&self, node: NodeId, now: Tick) -> EngineResult<StepChange> {
        Ok(self.signals.skip_step(node, now)?)
    }

    /// Append a step; returns its index.
    pub fn add_step(&self, node: NodeId, step: Step, now: Tick) -> EngineResult<usize> {
        self.check_segments(node, step.lights.iter().map(|(s, _)| *s))?;
        let before = self.signals.segments(node);
        let index = self.signals.add_step(node, step, now)?;
        self.sync_tracked(node, &before);
        Ok(index)
    }

    pub fn remove_step(&self, node: NodeId, index: usize, now: Tick) -> EngineResult<Step> {
        let before = self.signals.segments(node);
        let step = self.signals.remove_step(node, index, now)?;
        self.sync_tracked(node, &before);
        Ok(step)
    }

    /// Put the junction under manual control with all `segments` held red.
    pub fn set_manual(&self, node: NodeId, segments: &[SegmentId]) -> EngineResult<()> {
        self.check_segments(node, segments.iter().copied())?;
        let before = self.signals.segments(node);
        self.signals.set_manual(node, segments)?;
        self.sync_tracked(node, &before);
        Ok(())
    }

    pub fn toggle_manual(&self, node: NodeId, segment: SegmentId) -> EngineResult<SegmentLights> {
        Ok(self.signals.toggle_manual(node, segment)?)
    }

    pub fn set_manual_light(
        &self,
        node:    NodeId,
        segment: SegmentId,
        group:   MovementGroup,
        color:   LightColor,
    ) -> EngineResult<SegmentLights> {
        Ok(self.signals.set_manual_light(node, segment, group, color)?)
    }

    pub fn set_manual_pedestrian(
        &self,
        node:    NodeId,
        segment: SegmentId,
        color:   LightColor,
    ) -> EngineResult<SegmentLights> {
        Ok(self.signals.set_manual_pedestrian(node, segment, color)?)
    }

    /// Drop the junction's signal.  Its lights read green afterwards.
    pub fn remove_signal(&self, node: NodeId) -> EngineResult<()> {
        let before = self.signals.segments(node);
        self.signals.remove(node)?;
        self.sync_tracked(node, &before);
        Ok(())
    }

    // ── Housekeeping ──────────────────────────────────────────────────────

    /// Drop vehicles the tracker has not seen for `stale_after_ticks` and
    /// prune memberships that no longer match their vehicle.
    pub fn sweep<O: EngineObserver>(&self, now: Tick, observer: &mut O) -> SweepReport {
        let report = self.registry.sweep_stale(now);
        observer.on_sweep(report);
        report
    }

    /// Forget a despawned vehicle.  `false` if it was not tracked.
    pub fn remove_vehicle(&self, vehicle: VehicleId) -> bool {
        self.registry.remove_vehicle(vehicle)
    }

    // ── Persistence ───────────────────────────────────────────────────────

    pub fn snapshot(&self) -> EngineSnapshot {
        let signals = self
            .signals
            .nodes()
            .into_iter()
            .filter_map(|node| self.signals.definition(node).map(|def| (node, def)))
            .collect();
        EngineSnapshot { priorities: self.registry.priorities(), signals }
    }

    /// Replace every priority sign and signal with the snapshot's.  Started
    /// timed programs resume their saved step from `now`.
    ///
    /// The snapshot is checked against the network and timed programs are
    /// validated before anything changes.
    pub fn restore(&self, snapshot: EngineSnapshot, now: Tick) -> EngineResult<()> {
        for &(key, _) in &snapshot.priorities {
            self.check_approach(key)?;
        }
        for (node, def) in &snapshot.signals {
            match def {
                SignalDefinition::Timed { steps, .. } => {
                    for step in steps {
                        self.check_segments(*node, step.lights.iter().map(|(s, _)| *s))?;
                    }
                    TimedProgram::new(steps.clone())?;
                }
                SignalDefinition::Manual { lights } => {
                    self.check_segments(*node, lights.iter().map(|(s, _)| *s))?;
                }
            }
        }

        self.clear();
        let (signs, signals) = (snapshot.priorities.len(), snapshot.signals.len());
        for (key, priority) in snapshot.priorities {
            self.registry.set_priority_type(key, Some(priority));
        }
        for (node, def) in snapshot.signals {
            self.signals.restore(node, def, now)?;
            self.sync_tracked(node, &[]);
        }
        info!("restored {signs} priority signs and {signals} signals at {now}");
        Ok(())
    }

    fn clear(&self) {
        for node in self.signals.nodes() {
            let before = self.signals.segments(node);
            if self.signals.remove(node).is_ok() {
                self.sync_tracked(node, &before);
            }
        }
        for (key, _) in self.registry.priorities() {
            self.registry.set_priority_type(key, None);
        }
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    fn check_approach(&self, key: MovementKey) -> EngineResult<()> {
        if self.network.is_connected(key.node, key.segment) {
            Ok(())
        } else {
            warn!("edit rejected: {} does not meet {}", key.segment, key.node);
            Err(EngineError::NotAnApproach(key))
        }
    }

    fn check_segments(
        &self,
        node:     NodeId,
        segments: impl IntoIterator<Item = SegmentId>,
    ) -> EngineResult<()> {
        segments.into_iter().try_for_each(|s| self.check_approach(MovementKey::new(node, s)))
    }

    /// Keep a registry entry for every segment the junction's signal has
    /// lights for, and release the ones in `before` it no longer uses.
    fn sync_tracked(&self, node: NodeId, before: &[SegmentId]) {
        let after = self.signals.segments(node);
        for &segment in before.iter().filter(|s| !after.contains(s)) {
            self.registry.set_signal_tracked(MovementKey::new(node, segment), false);
        }
        for &segment in &after {
            self.registry.set_signal_tracked(MovementKey::new(node, segment), true);
        }
    }
}
