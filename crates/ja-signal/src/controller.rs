//! The `SignalController`: every custom signal in the network.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use log::{info, warn};
use rustc_hash::FxHashMap;

use ja_core::{EngineConfig, NodeId, SegmentId, Tick};

use crate::{
    LightColor, ManualSignal, MovementGroup, PhaseTiming, SegmentLights, SignalError,
    SignalPhase, SignalResult, Step, StepChange, TimedProgram,
};

/// What runs a junction's lights.
#[derive(Clone, Debug)]
enum Program {
    Timed(TimedProgram),
    Manual(ManualSignal),
}

impl Program {
    fn phase(&self, now: Tick, timing: &PhaseTiming) -> SignalPhase {
        match self {
            Program::Timed(t) if t.is_started() => t.phase(now, timing),
            Program::Timed(_) => SignalPhase::uncontrolled(),
            Program::Manual(m) => m.phase(),
        }
    }

    fn is_active(&self) -> bool {
        match self {
            Program::Timed(t) => t.is_started(),
            Program::Manual(_) => true,
        }
    }
}

/// Plain-data description of one junction's signal, for persistence.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SignalDefinition {
    Timed { steps: Vec<Step>, current_step: usize, started: bool },
    Manual { lights: Vec<(SegmentId, SegmentLights)> },
}

struct JunctionSignal {
    program: Mutex<Program>,
    phase:   RwLock<Arc<SignalPhase>>,
}

impl JunctionSignal {
    fn new(program: Program, now: Tick, timing: &PhaseTiming) -> Self {
        let phase = Arc::new(program.phase(now, timing));
        Self { program: Mutex::new(program), phase: RwLock::new(phase) }
    }

    fn program(&self) -> MutexGuard<'_, Program> {
        self.program.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_phase(&self) -> Arc<SignalPhase> {
        Arc::clone(&self.phase.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn publish(&self, phase: SignalPhase) {
        if *self.current_phase() != phase {
            *self.phase.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(phase);
        }
    }
}

/// All custom signals, keyed by junction.
///
/// Reads (`light`, `phase`) clone the published `Arc<SignalPhase>` and never
/// wait on a program lock.  `advance_step` is expected to be called for each
/// junction by one thread per tick.
pub struct SignalController {
    signals: RwLock<FxHashMap<NodeId, Arc<JunctionSignal>>>,
    timing:  PhaseTiming,
}

impl Default for SignalController {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl SignalController {
    pub fn new(cfg: &EngineConfig) -> Self {
        Self {
            signals: RwLock::new(FxHashMap::default()),
            timing:  PhaseTiming {
                red_to_green_ticks: cfg.red_to_green_ticks,
                green_to_red_ticks: cfg.green_to_red_ticks,
                wait_flow_balance:  cfg.wait_flow_balance,
            },
        }
    }

    pub fn timing(&self) -> &PhaseTiming {
        &self.timing
    }

    fn get(&self, node: NodeId) -> Option<Arc<JunctionSignal>> {
        self.signals.read().unwrap_or_else(PoisonError::into_inner).get(&node).cloned()
    }

    fn require(&self, node: NodeId) -> SignalResult<Arc<JunctionSignal>> {
        self.get(node).ok_or_else(|| {
            warn!("signal edit rejected: {node} has no program");
            SignalError::UnknownJunction(node)
        })
    }

    fn insert(&self, node: NodeId, program: Program, now: Tick) {
        let signal = Arc::new(JunctionSignal::new(program, now, &self.timing));
        self.signals.write().unwrap_or_else(PoisonError::into_inner).insert(node, signal);
    }

    /// Run `f` on the junction's timed program and republish its phase.
    fn with_timed<R>(
        &self,
        node: NodeId,
        now:  Tick,
        f:    impl FnOnce(&mut TimedProgram) -> SignalResult<R>,
    ) -> SignalResult<R> {
        let signal = self.require(node)?;
        let mut program = signal.program();
        let Program::Timed(timed) = &mut *program else {
            warn!("signal edit rejected: {node} is not timed");
            return Err(SignalError::NotTimed(node));
        };
        let out = f(timed)?;
        let phase = program.phase(now, &self.timing);
        drop(program);
        signal.publish(phase);
        Ok(out)
    }

    fn with_manual(
        &self,
        node: NodeId,
        segment: SegmentId,
        f: impl FnOnce(&mut ManualSignal) -> Option<SegmentLights>,
    ) -> SignalResult<SegmentLights> {
        let signal = self.require(node)?;
        let mut program = signal.program();
        let Program::Manual(manual) = &mut *program else {
            warn!("signal edit rejected: {node} is not manual");
            return Err(SignalError::NotManual(node));
        };
        let lights = f(manual).ok_or(SignalError::UnknownSegment { node, segment })?;
        let phase = manual.phase();
        drop(program);
        signal.publish(phase);
        Ok(lights)
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// The published phase.  Uncontrolled junctions get an empty phase
    /// (everything green).
    pub fn phase(&self, node: NodeId) -> Arc<SignalPhase> {
        self.get(node)
            .map_or_else(|| Arc::new(SignalPhase::uncontrolled()), |s| s.current_phase())
    }

    pub fn light(&self, node: NodeId, segment: SegmentId, group: MovementGroup) -> LightColor {
        match self.get(node) {
            Some(s) => s.current_phase().light(segment, group),
            None => LightColor::Green,
        }
    }

    pub fn pedestrian_light(&self, node: NodeId, segment: SegmentId) -> LightColor {
        match self.get(node) {
            Some(s) => s.current_phase().pedestrian(segment),
            None => LightColor::Green,
        }
    }

    /// `true` if the junction has a program currently controlling it.
    pub fn is_active(&self, node: NodeId) -> bool {
        self.get(node).is_some_and(|s| s.program().is_active())
    }

    /// `true` if the junction runs a started timed program.
    pub fn is_timed(&self, node: NodeId) -> bool {
        self.get(node)
            .is_some_and(|s| matches!(&*s.program(), Program::Timed(t) if t.is_started()))
    }

    pub fn has_program(&self, node: NodeId) -> bool {
        self.get(node).is_some()
    }

    /// Junctions with a program, sorted.
    pub fn nodes(&self) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> =
            self.signals.read().unwrap_or_else(PoisonError::into_inner).keys().copied().collect();
        nodes.sort_unstable();
        nodes
    }

    /// Incoming segments the junction's program has lights for.
    pub fn segments(&self, node: NodeId) -> Vec<SegmentId> {
        let Some(signal) = self.get(node) else { return Vec::new() };
        let program = signal.program();
        match &*program {
            Program::Timed(t) => t.segments().to_vec(),
            Program::Manual(m) => m.lights().iter().map(|(s, _)| *s).collect(),
        }
    }

    /// `(current step, step started at)` of a timed program.
    pub fn step_state(&self, node: NodeId) -> Option<(usize, Tick)> {
        let signal = self.get(node)?;
        let program = signal.program();
        match &*program {
            Program::Timed(t) => Some((t.current_step(), t.step_started_at())),
            Program::Manual(_) => None,
        }
    }

    // ── Tick loop ─────────────────────────────────────────────────────────

    /// Count one vehicle through `node` for the active step's flow.
    pub fn record_flow(&self, node: NodeId) {
        if let Some(signal) = self.get(node) {
            if let Program::Timed(t) = &mut *signal.program() {
                t.record_flow();
            }
        }
    }

    /// Advance the junction's timed program by one tick.
    ///
    /// `waiting(segment)` reports how many vehicles approach on a segment; it
    /// is summed over the segments held at red and called without any
    /// signal lock held.  Does nothing for manual or uncontrolled junctions.
    pub fn advance_step(
        &self,
        node:    NodeId,
        now:     Tick,
        waiting: impl Fn(SegmentId) -> usize,
    ) -> Option<StepChange> {
        let signal = self.get(node)?;
        let red = match &*signal.program() {
            Program::Timed(t) if t.is_started() => t.red_segments(),
            _ => return None,
        };
        let wait: usize = red.into_iter().map(waiting).sum();
        let wait = u32::try_from(wait).unwrap_or(u32::MAX);

        let mut program = signal.program();
        let Program::Timed(timed) = &mut *program else { return None };
        let change = timed.advance(now, wait, self.timing.wait_flow_balance);
        let phase = program.phase(now, &self.timing);
        drop(program);
        signal.publish(phase);

        if let Some(c) = change {
            info!("{node}: step {} -> {} at {now}{}", c.from, c.to, if c.forced { " (forced)" } else { "" });
        }
        change
    }

    // ── Program editing ───────────────────────────────────────────────────

    /// Install a timed program (stopped, at step 0), replacing whatever the
    /// junction had.
    pub fn install_timed(&self, node: NodeId, steps: Vec<Step>) -> SignalResult<()> {
        let program = TimedProgram::new(steps).inspect_err(|e| {
            warn!("timed program for {node} rejected: {e}");
        })?;
        self.insert(node, Program::Timed(program), Tick::ZERO);
        info!("{node}: timed program installed");
        Ok(())
    }

    pub fn start(&self, node: NodeId, now: Tick) -> SignalResult<()> {
        self.with_timed(node, now, |t| {
            t.start(now);
            Ok(())
        })?;
        info!("{node}: timed program started at {now}");
        Ok(())
    }

    /// Stop a timed program.  Lights read green until it is started again.
    pub fn stop(&self, node: NodeId) -> SignalResult<()> {
        self.with_timed(node, Tick::ZERO, |t| {
            t.stop();
            Ok(())
        })?;
        info!("{node}: timed program stopped");
        Ok(())
    }

    /// Jump to the next step now, ignoring `min_duration`.
    pub fn skip_step(&self, node: NodeId, now: Tick) -> SignalResult<StepChange> {
        let change = self.with_timed(node, now, |t| {
            if t.is_started() { Ok(t.skip(now)) } else { Err(SignalError::NotTimed(node)) }
        })?;
        info!("{node}: skipped step {} -> {}", change.from, change.to);
        Ok(change)
    }

    pub fn add_step(&self, node: NodeId, step: Step, now: Tick) -> SignalResult<usize> {
        self.with_timed(node, now, |t| t.add_step(step))
    }

    pub fn remove_step(&self, node: NodeId, index: usize, now: Tick) -> SignalResult<Step> {
        self.with_timed(node, now, |t| t.remove_step(index))
    }

    /// Put the junction under manual control; every listed segment starts
    /// red with pedestrians crossing.
    pub fn set_manual(&self, node: NodeId, segments: &[SegmentId]) -> SignalResult<()> {
        if segments.is_empty() {
            warn!("manual signal for {node} rejected: no segments");
            return Err(SignalError::EmptyProgram);
        }
        self.insert(node, Program::Manual(ManualSignal::new(segments)), Tick::ZERO);
        info!("{node}: manual signal installed");
        Ok(())
    }

    pub fn toggle_manual(&self, node: NodeId, segment: SegmentId) -> SignalResult<SegmentLights> {
        self.with_manual(node, segment, |m| m.toggle(segment))
    }

    pub fn set_manual_light(
        &self,
        node:    NodeId,
        segment: SegmentId,
        group:   MovementGroup,
        color:   LightColor,
    ) -> SignalResult<SegmentLights> {
        let color = color.settled()?;
        self.with_manual(node, segment, |m| m.set_light(segment, group, color))
    }

    pub fn set_manual_pedestrian(
        &self,
        node:    NodeId,
        segment: SegmentId,
        color:   LightColor,
    ) -> SignalResult<SegmentLights> {
        let color = color.settled()?;
        self.with_manual(node, segment, |m| m.set_pedestrian(segment, color))
    }

    /// Drop the junction's program.  Its lights read green afterwards.
    pub fn remove(&self, node: NodeId) -> SignalResult<()> {
        let removed = self.signals.write().unwrap_or_else(PoisonError::into_inner).remove(&node);
        match removed {
            Some(_) => {
                info!("{node}: signal removed");
                Ok(())
            }
            None => Err(SignalError::UnknownJunction(node)),
        }
    }

    // ── Persistence ───────────────────────────────────────────────────────

    pub fn definition(&self, node: NodeId) -> Option<SignalDefinition> {
        let signal = self.get(node)?;
        let program = signal.program();
        Some(match &*program {
            Program::Timed(t) => SignalDefinition::Timed {
                steps:        t.steps().to_vec(),
                current_step: t.current_step(),
                started:      t.is_started(),
            },
            Program::Manual(m) => SignalDefinition::Manual { lights: m.lights().to_vec() },
        })
    }

    /// Rebuild a junction's signal from a definition.  A started timed
    /// program resumes its saved step from `now`.
    pub fn restore(&self, node: NodeId, def: SignalDefinition, now: Tick) -> SignalResult<()> {
        let program = match def {
            SignalDefinition::Timed { steps, current_step, started } => {
                let mut t = TimedProgram::new(steps)?;
                for _ in 0..current_step % t.steps().len() {
                    t.skip(Tick::ZERO);
                }
                if started {
                    t.start(now);
                }
                Program::Timed(t)
            }
            SignalDefinition::Manual { lights } => {
                for (_, l) in &lights {
                    for c in [l.left, l.main, l.right, l.pedestrian] {
                        c.settled()?;
                    }
                }
                Program::Manual(ManualSignal::from_lights(lights))
            }
        };
        self.insert(node, program, now);
        Ok(())
    }
}
