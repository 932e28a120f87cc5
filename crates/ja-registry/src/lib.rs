//! `ja-registry`: who is heading where, and who has to give way.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                    |
//! |----------------|-------------------------------------------------------------|
//! | [`tracking`]   | `VehicleTrackingState`, `CarState`                          |
//! | [`movement`]   | `MovementKey`, `PriorityType`, `PriorityMovement`           |
//! | [`store`]      | `VehicleStore` (flat per-vehicle slots), `TrackedVehicle`   |
//! | [`registry`]   | `PriorityRegistry` (movements + conflict queries)           |
//!
//! # Ownership
//!
//! The registry never owns vehicles, it only records membership.  Vehicle
//! state lives in a flat slot table indexed by `VehicleId`; movements live in
//! a sharded map keyed by `(junction, incoming segment)`.  A movement's vehicle
//! set holds plain ids that are resolved through the slot table on demand, so
//! there are no reference cycles and a despawned vehicle simply resolves to
//! nothing.
//!
//! # Locking
//!
//! Every slot and every movement has its own mutex; map shards use a
//! read-write lock that only guards the key → movement mapping.  No method
//! holds more than one of these locks at a time.

pub mod movement;
pub mod registry;
pub mod store;
pub mod tracking;

#[cfg(test)]
mod tests;

pub use movement::{MovementKey, PriorityMovement, PriorityType};
pub use registry::{PriorityRegistry, SweepReport};
pub use store::{TrackedVehicle, VehicleStore};
pub use tracking::{CarState, VehicleTrackingState};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the data if a previous holder panicked.  A
/// poisoned slot must not take the whole tick loop down with it.
#[inline]
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
