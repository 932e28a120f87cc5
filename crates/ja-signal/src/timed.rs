//! Timed step programs.
//!
//! # Step model
//!
//! A program is an ordered list of [`Step`]s.  Exactly one step is active.
//! Once per tick the controller calls [`TimedProgram::advance`]:
//!
//! ```text
//! elapsed = now - step_started_at
//! elapsed <  min_duration                  → hold
//! elapsed >= max_duration                  → next step
//! otherwise, step.metric says "change"     → next step
//! ```
//!
//! "Next" is `(current + 1) % len`.  After every call
//! `now - step_started_at < max_duration`, so a step with `max_duration = 50`
//! started at tick 0 is active for ticks 0..=49 and hands over at tick 50.

use ja_core::{SegmentId, Tick};

use crate::light::transition;
use crate::{LightColor, SegmentLights, SignalError, SignalPhase, SignalResult, StepSignal};

/// Traffic counted for the active step.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FlowWaitSample {
    /// Vehicles that crossed the junction since the step began.
    pub flow: u32,
    /// Vehicles approaching on segments held at red.
    pub wait: u32,
}

/// When a step may end between its minimum and maximum duration.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChangeMetric {
    /// Waiting traffic, weighted by the flow balance, outweighs the flow.
    #[default]
    Default,
    /// As soon as any vehicle flowed.
    FirstFlow,
    /// As soon as any vehicle waits.
    FirstWait,
    /// As soon as nothing flows.
    NoFlow,
    /// As soon as nothing waits.
    NoWait,
}

impl ChangeMetric {
    pub fn should_change(self, sample: FlowWaitSample, wait_flow_balance: f32) -> bool {
        match self {
            ChangeMetric::Default   => sample.wait as f32 * wait_flow_balance > sample.flow as f32,
            ChangeMetric::FirstFlow => sample.flow > 0,
            ChangeMetric::FirstWait => sample.wait > 0,
            ChangeMetric::NoFlow    => sample.flow == 0,
            ChangeMetric::NoWait    => sample.wait == 0,
        }
    }
}

/// One step of a timed program.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Step {
    pub min_duration: u64,
    pub max_duration: u64,
    pub metric: ChangeMetric,
    /// Steady lights per incoming segment.  Segments of the program missing
    /// here are red for the whole step.
    pub lights: Vec<(SegmentId, StepSignal)>,
}

impl Step {
    pub fn new(min_duration: u64, max_duration: u64) -> Self {
        Self { min_duration, max_duration, metric: ChangeMetric::Default, lights: Vec::new() }
    }

    pub fn with_metric(mut self, metric: ChangeMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Set the lights of `segment`, replacing an earlier entry.
    pub fn with(mut self, segment: SegmentId, signal: StepSignal) -> Self {
        self.lights.retain(|(s, _)| *s != segment);
        self.lights.push((segment, signal));
        self
    }

    pub fn signal(&self, segment: SegmentId) -> StepSignal {
        self.lights
            .iter()
            .find(|(s, _)| *s == segment)
            .map_or(StepSignal::red(), |(_, sig)| *sig)
    }

    pub fn validate(&self, index: usize) -> SignalResult<()> {
        let invalid = |reason| Err(SignalError::InvalidStep { index, reason });
        if self.max_duration == 0 {
            return invalid("max_duration must be positive");
        }
        if self.min_duration > self.max_duration {
            return invalid("min_duration exceeds max_duration");
        }
        if !self.lights.iter().all(|(_, sig)| sig.is_settled()) {
            return invalid("step lights must be Red or Green");
        }
        Ok(())
    }
}

/// A step change reported by [`TimedProgram::advance`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StepChange {
    pub from: usize,
    pub to:   usize,
    pub at:   Tick,
    /// `true` for manual skips and for hitting `max_duration`.
    pub forced: bool,
}

/// Transition lengths applied when phases are computed.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PhaseTiming {
    pub red_to_green_ticks: u64,
    pub green_to_red_ticks: u64,
    pub wait_flow_balance:  f32,
}

impl Default for PhaseTiming {
    fn default() -> Self {
        Self { red_to_green_ticks: 60, green_to_red_ticks: 30, wait_flow_balance: 0.8 }
    }
}

/// A running (or stopped) timed program for one junction.
#[derive(Clone, Debug)]
pub struct TimedProgram {
    steps: Vec<Step>,
    /// All segments any step mentions, sorted.
    segments: Vec<SegmentId>,
    current: usize,
    /// Step that was active before `current`; `None` right after start.
    previous: Option<usize>,
    step_started_at: Tick,
    started: bool,
    flow: u32,
}

impl TimedProgram {
    /// Validate and build a stopped program positioned at step 0.
    pub fn new(steps: Vec<Step>) -> SignalResult<Self> {
        if steps.is_empty() {
            return Err(SignalError::EmptyProgram);
        }
        for (i, step) in steps.iter().enumerate() {
            step.validate(i)?;
        }
        let mut program = Self {
            steps,
            segments: Vec::new(),
            current: 0,
            previous: None,
            step_started_at: Tick::ZERO,
            started: false,
            flow: 0,
        };
        program.collect_segments();
        Ok(program)
    }

    fn collect_segments(&mut self) {
        let mut segs: Vec<SegmentId> =
            self.steps.iter().flat_map(|s| s.lights.iter().map(|(seg, _)| *seg)).collect();
        segs.sort_unstable();
        segs.dedup();
        self.segments = segs;
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn segments(&self) -> &[SegmentId] {
        &self.segments
    }

    #[inline]
    pub fn current_step(&self) -> usize {
        self.current
    }

    #[inline]
    pub fn step_started_at(&self) -> Tick {
        self.step_started_at
    }

    #[inline]
    pub fn is_started(&self) -> bool {
        self.started
    }

    #[inline]
    pub fn flow(&self) -> u32 {
        self.flow
    }

    /// Start (or restart) the current step at `now`.
    pub fn start(&mut self, now: Tick) {
        self.started = true;
        self.previous = None;
        self.step_started_at = now;
        self.flow = 0;
    }

    pub fn stop(&mut self) {
        self.started = false;
    }

    /// Count one vehicle through the junction during the active step.
    pub fn record_flow(&mut self) {
        if self.started {
            self.flow = self.flow.saturating_add(1);
        }
    }

    /// Segments with no green vehicle group in the active step.
    pub fn red_segments(&self) -> Vec<SegmentId> {
        let step = &self.steps[self.current];
        self.segments
            .iter()
            .copied()
            .filter(|&seg| !step.signal(seg).resolve().any_vehicle_green())
            .collect()
    }

    /// Run one tick of the step logic.  See the module docs.
    pub fn advance(&mut self, now: Tick, wait: u32, wait_flow_balance: f32) -> Option<StepChange> {
        if !self.started {
            return None;
        }
        let step = &self.steps[self.current];
        let elapsed = now.since(self.step_started_at);
        if elapsed < step.min_duration {
            return None;
        }
        let forced = elapsed >= step.max_duration;
        let sample = FlowWaitSample { flow: self.flow, wait };
        if !forced && !step.metric.should_change(sample, wait_flow_balance) {
            return None;
        }
        Some(self.switch_to_next(now, forced))
    }

    /// Manual override: move on regardless of `min_duration`.
    pub fn skip(&mut self, now: Tick) -> StepChange {
        self.switch_to_next(now, true)
    }

    fn switch_to_next(&mut self, now: Tick, forced: bool) -> StepChange {
        let from = self.current;
        let to = (from + 1) % self.steps.len();
        self.previous = Some(from);
        self.current = to;
        self.step_started_at = now;
        self.flow = 0;
        StepChange { from, to, at: now, forced }
    }

    /// Append a step, returning its index.
    pub fn add_step(&mut self, step: Step) -> SignalResult<usize> {
        step.validate(self.steps.len())?;
        self.steps.push(step);
        self.collect_segments();
        Ok(self.steps.len() - 1)
    }

    /// Remove step `index`.  The last remaining step cannot be removed.
    pub fn remove_step(&mut self, index: usize) -> SignalResult<Step> {
        let len = self.steps.len();
        if index >= len {
            return Err(SignalError::StepOutOfRange { index, len });
        }
        if len == 1 {
            return Err(SignalError::EmptyProgram);
        }
        let removed = self.steps.remove(index);
        if index < self.current {
            self.current -= 1;
        } else if self.current >= self.steps.len() {
            self.current = 0;
        }
        self.previous = None;
        self.collect_segments();
        Ok(removed)
    }

    /// The lights in effect at `now`, including transition states.
    pub fn phase(&self, now: Tick, timing: &PhaseTiming) -> SignalPhase {
        let step = &self.steps[self.current];
        let prev = self.previous.and_then(|i| self.steps.get(i));
        let elapsed = now.since(self.step_started_at);
        let blend = |p: LightColor, n: LightColor| {
            transition(p, n, elapsed, timing.red_to_green_ticks, timing.green_to_red_ticks)
        };

        let lights = self
            .segments
            .iter()
            .map(|&seg| {
                let next = step.signal(seg).resolve();
                let lights = match prev {
                    None => next,
                    Some(p) => {
                        let before = p.signal(seg).resolve();
                        SegmentLights {
                            left:       blend(before.left, next.left),
                            main:       blend(before.main, next.main),
                            right:      blend(before.right, next.right),
                            pedestrian: blend(before.pedestrian, next.pedestrian),
                        }
                    }
                };
                (seg, lights)
            })
            .collect();
        SignalPhase::from_lights(lights)
    }
}
