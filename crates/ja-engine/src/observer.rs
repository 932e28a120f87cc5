//! Engine observer trait for signal, housekeeping and flow callbacks.

use ja_core::{NodeId, VehicleId};
use ja_registry::{MovementKey, SweepReport};
use ja_signal::StepChange;

/// Callbacks invoked by the engine's batch drivers.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example: step change logger
///
/// ```rust,ignore
/// struct StepLog(Vec<(NodeId, usize)>);
///
/// impl EngineObserver for StepLog {
///     fn on_step_change(&mut self, node: NodeId, change: StepChange) {
///         self.0.push((node, change.to));
///     }
/// }
/// ```
pub trait EngineObserver {
    /// A timed program moved to another step during
    /// [`advance_signals`][crate::JunctionArbitrationEngine::advance_signals].
    fn on_step_change(&mut self, _node: NodeId, _change: StepChange) {}

    /// A housekeeping sweep finished.
    fn on_sweep(&mut self, _report: SweepReport) {}

    /// A vehicle that had been cleared through `movement` was registered on
    /// its next movement, so it has crossed `movement.node`.
    fn on_transit(&mut self, _vehicle: VehicleId, _movement: MovementKey) {}
}

/// An [`EngineObserver`] that does nothing.
pub struct NoopObserver;

impl EngineObserver for NoopObserver {}
