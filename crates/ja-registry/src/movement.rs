//! Junction movements and their priority classification.

use std::fmt;
use std::sync::Mutex;

use rustc_hash::FxHashSet;

use ja_core::{NodeId, SegmentId, VehicleId};

use crate::lock;

/// A movement into a junction: `(junction, incoming segment)`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MovementKey {
    pub node:    NodeId,
    pub segment: SegmentId,
}

impl MovementKey {
    #[inline]
    pub fn new(node: NodeId, segment: SegmentId) -> Self {
        Self { node, segment }
    }
}

impl fmt::Display for MovementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.segment, self.node)
    }
}

/// Priority sign on a segment end.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PriorityType {
    /// Main road: only yields to other main-road traffic.
    Main,
    /// Give way: slows down for priority traffic, no full stop required.
    Yield,
    /// Stop sign: must come to a halt before crossing.
    Stop,
}

impl PriorityType {
    #[inline]
    pub fn is_main(self) -> bool {
        matches!(self, PriorityType::Main)
    }
}

#[derive(Default)]
struct MovementInner {
    priority:       Option<PriorityType>,
    signal_tracked: bool,
    registered:     FxHashSet<VehicleId>,
    lookahead:      FxHashSet<VehicleId>,
}

/// One registry entry: the classification of a movement and the vehicles
/// currently registered on it.
///
/// The entry lives while it either carries a priority sign or its junction
/// runs a signal program (`signal_tracked`).
#[derive(Default)]
pub struct PriorityMovement {
    inner: Mutex<MovementInner>,
}

impl PriorityMovement {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub fn priority(&self) -> Option<PriorityType> {
        lock(&self.inner).priority
    }

    pub fn is_signal_tracked(&self) -> bool {
        lock(&self.inner).signal_tracked
    }

    pub(crate) fn set_priority(&self, priority: Option<PriorityType>) {
        lock(&self.inner).priority = priority;
    }

    pub(crate) fn set_signal_tracked(&self, tracked: bool) {
        lock(&self.inner).signal_tracked = tracked;
    }

    /// `true` if neither a sign nor a signal keeps this entry alive.
    pub(crate) fn is_unused(&self) -> bool {
        let inner = lock(&self.inner);
        inner.priority.is_none() && !inner.signal_tracked
    }

    pub(crate) fn insert(&self, vehicle: VehicleId) -> bool {
        lock(&self.inner).registered.insert(vehicle)
    }

    pub(crate) fn remove(&self, vehicle: VehicleId) -> bool {
        lock(&self.inner).registered.remove(&vehicle)
    }

    pub(crate) fn insert_lookahead(&self, vehicle: VehicleId) -> bool {
        lock(&self.inner).lookahead.insert(vehicle)
    }

    pub(crate) fn remove_lookahead(&self, vehicle: VehicleId) -> bool {
        lock(&self.inner).lookahead.remove(&vehicle)
    }

    /// Add every vehicle `heading` accepts, holding the entry lock across
    /// the whole scan.  `heading` returns `(registered, lookahead)`.
    ///
    /// Lock order is entry then vehicle slot; nothing takes them the other
    /// way round.
    pub(crate) fn fill(
        &self,
        ids:         &[VehicleId],
        mut heading: impl FnMut(VehicleId) -> (bool, bool),
    ) {
        let mut inner = lock(&self.inner);
        for &v in ids {
            let (registered, lookahead) = heading(v);
            if registered {
                inner.registered.insert(v);
            }
            if lookahead {
                inner.lookahead.insert(v);
            }
        }
    }

    pub fn contains(&self, vehicle: VehicleId) -> bool {
        lock(&self.inner).registered.contains(&vehicle)
    }

    /// Copy out the classification and the registered ids, sorted, so the
    /// lock is released before any vehicle slot is touched.
    pub fn snapshot(&self) -> (Option<PriorityType>, Vec<VehicleId>) {
        let inner = lock(&self.inner);
        let priority = inner.priority;
        let mut ids: Vec<VehicleId> = inner.registered.iter().copied().collect();
        drop(inner);
        ids.sort_unstable();
        (priority, ids)
    }

    /// Registered ids, sorted.
    pub fn registered(&self) -> Vec<VehicleId> {
        self.snapshot().1
    }

    /// Lookahead ids, sorted.
    pub fn lookahead(&self) -> Vec<VehicleId> {
        let mut ids: Vec<VehicleId> = lock(&self.inner).lookahead.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn registered_len(&self) -> usize {
        lock(&self.inner).registered.len()
    }

    /// Keep only the memberships `keep` accepts.  Returns how many were
    /// dropped.
    pub(crate) fn retain(&self, mut keep: impl FnMut(VehicleId, bool) -> bool) -> usize {
        let mut inner = lock(&self.inner);
        let before = inner.registered.len() + inner.lookahead.len();
        inner.registered.retain(|&v| keep(v, false));
        inner.lookahead.retain(|&v| keep(v, true));
        before - inner.registered.len() - inner.lookahead.len()
    }
}
