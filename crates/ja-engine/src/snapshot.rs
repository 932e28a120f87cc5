//! Plain-data engine state for saving and loading.

use ja_core::NodeId;
use ja_registry::{MovementKey, PriorityType};
use ja_signal::SignalDefinition;

/// Everything a saved game needs to rebuild the engine's configuration.
///
/// Vehicle tracking is not part of it: the tracker rebuilds registrations from
/// the vehicles' paths within a few ticks of loading.  How the snapshot is
/// encoded is up to the host (with the `serde` feature it is an ordinary
/// serde value).
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineSnapshot {
    /// Priority signs, sorted by movement.
    pub priorities: Vec<(MovementKey, PriorityType)>,
    /// Signal programs, sorted by junction.
    pub signals: Vec<(NodeId, SignalDefinition)>,
}

impl EngineSnapshot {
    pub fn is_empty(&self) -> bool {
        self.priorities.is_empty() && self.signals.is_empty()
    }
}
