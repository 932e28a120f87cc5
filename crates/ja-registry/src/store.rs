//! Flat per-vehicle slot table.
//!
//! # Why slots and not a map?
//!
//! Host vehicle handles are small dense integers with a fixed upper bound, so
//! the table is a `Vec` indexed by `VehicleId`, allocated once.  Each slot has
//! its own mutex: the host never updates the same vehicle from two threads in
//! one tick, so slot locks are effectively uncontended, and readers looking at
//! *other* vehicles (conflict queries) only ever hold one slot at a time.
//!
//! ```ignore
//! let state = store.get(vehicle)?;          // copy-out snapshot
//! store.update(vehicle, |tv| tv.state.wait_ticks += 1);
//! ```

use std::sync::Mutex;

use ja_core::{CoreError, CoreResult, Tick, VehicleId, VehicleRng};

use crate::{VehicleTrackingState, lock};

/// The contents of an occupied slot.
#[derive(Clone, Debug)]
pub struct TrackedVehicle {
    pub state: VehicleTrackingState,
    /// Deterministic per-vehicle RNG, seeded when the slot is first filled.
    pub rng: VehicleRng,
}

/// Fixed-capacity table of tracked vehicles.
pub struct VehicleStore {
    slots: Vec<Mutex<Option<TrackedVehicle>>>,
    seed:  u64,
}

impl VehicleStore {
    /// Allocate `capacity` empty slots.  `seed` is the global RNG seed.
    pub fn new(capacity: usize, seed: u64) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || Mutex::new(None));
        Self { slots, seed }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// `Ok` if `vehicle` fits in the table.
    pub fn check(&self, vehicle: VehicleId) -> CoreResult<()> {
        if vehicle.index() < self.slots.len() {
            Ok(())
        } else {
            Err(CoreError::VehicleOutOfRange { vehicle, capacity: self.slots.len() })
        }
    }

    /// Copy of the tracking state, or `None` for untracked / out-of-range ids.
    pub fn get(&self, vehicle: VehicleId) -> Option<VehicleTrackingState> {
        let slot = self.slots.get(vehicle.index())?;
        lock(slot).as_ref().map(|tv| tv.state.clone())
    }

    /// `true` if `vehicle` currently occupies its slot.
    pub fn contains(&self, vehicle: VehicleId) -> bool {
        self.slots
            .get(vehicle.index())
            .is_some_and(|slot| lock(slot).is_some())
    }

    /// Run `f` on an occupied slot.  `None` if the vehicle is not tracked.
    pub fn update<R>(
        &self,
        vehicle: VehicleId,
        f:       impl FnOnce(&mut TrackedVehicle) -> R,
    ) -> Option<R> {
        let slot = self.slots.get(vehicle.index())?;
        let mut guard = lock(slot);
        guard.as_mut().map(f)
    }

    /// Run `f` on the slot, filling it first if empty.  `None` only for
    /// out-of-range ids.
    pub fn upsert<R>(
        &self,
        vehicle: VehicleId,
        now:     Tick,
        f:       impl FnOnce(&mut TrackedVehicle) -> R,
    ) -> Option<R> {
        let slot = self.slots.get(vehicle.index())?;
        let mut guard = lock(slot);
        let tv = guard.get_or_insert_with(|| TrackedVehicle {
            state: VehicleTrackingState::new(now),
            rng:   VehicleRng::new(self.seed, vehicle),
        });
        Some(f(tv))
    }

    /// Empty the slot, returning the last state.
    pub fn remove(&self, vehicle: VehicleId) -> Option<VehicleTrackingState> {
        let slot = self.slots.get(vehicle.index())?;
        lock(slot).take().map(|tv| tv.state)
    }

    /// Ids of all occupied slots in ascending order.  O(capacity).
    pub fn ids(&self) -> Vec<VehicleId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| lock(slot).is_some())
            .map(|(i, _)| VehicleId(i as u32))
            .collect()
    }

    /// Number of occupied slots.  O(capacity).
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| lock(slot).is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
