//! The `PriorityRegistry`: movement classification, membership, and the
//! "is conflicting traffic coming?" query.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, PoisonError};

use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};

use ja_core::{EngineConfig, NodeId, SegmentId, TrafficSide, Tick, VehicleId};
use ja_network::{RoadNetworkAccessor, TurnDirection, TurnGeometry};

use crate::{MovementKey, PriorityMovement, PriorityType, VehicleStore, VehicleTrackingState};

/// Number of movement map shards.  Power of two.
const SHARDS: usize = 64;

type Shard = RwLock<FxHashMap<MovementKey, Arc<PriorityMovement>>>;

/// What a housekeeping sweep removed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Vehicles dropped because the tracker had not seen them recently.
    pub removed_vehicles: usize,
    /// Movement memberships that no longer matched their vehicle's state.
    pub pruned_memberships: usize,
}

/// Registry of priority-controlled movements and tracked vehicles.
///
/// Shared by reference between all worker threads; every method takes
/// `&self`.
pub struct PriorityRegistry {
    vehicles: VehicleStore,
    shards:   Box<[Shard]>,
    geometry: TurnGeometry,
    /// See [`EngineConfig::incoming_recency_ticks`].
    recency_ticks: u64,
    /// See [`EngineConfig::stale_after_ticks`].
    stale_after_ticks: u64,
}

impl PriorityRegistry {
    pub fn new(cfg: &EngineConfig) -> Self {
        let shards = (0..SHARDS).map(|_| RwLock::new(FxHashMap::default())).collect();
        Self {
            vehicles: VehicleStore::new(cfg.max_vehicles, cfg.seed),
            shards,
            geometry: TurnGeometry::from_config(cfg),
            recency_ticks: cfg.incoming_recency_ticks,
            stale_after_ticks: cfg.stale_after_ticks,
        }
    }

    #[inline]
    pub fn vehicles(&self) -> &VehicleStore {
        &self.vehicles
    }

    #[inline]
    pub fn geometry(&self) -> &TurnGeometry {
        &self.geometry
    }

    /// Copy-out snapshot of one vehicle's tracking state.
    pub fn tracking_state(&self, vehicle: VehicleId) -> Option<VehicleTrackingState> {
        self.vehicles.get(vehicle)
    }

    /// Number of tracked vehicles.
    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    // ── Shard plumbing ────────────────────────────────────────────────────

    #[inline]
    fn shard(&self, key: MovementKey) -> &Shard {
        let h = key.node.0.wrapping_mul(0x9e37_79b9) ^ key.segment.0;
        &self.shards[h as usize & (SHARDS - 1)]
    }

    fn read(shard: &Shard) -> RwLockReadGuard<'_, FxHashMap<MovementKey, Arc<PriorityMovement>>> {
        shard.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(shard: &Shard) -> RwLockWriteGuard<'_, FxHashMap<MovementKey, Arc<PriorityMovement>>> {
        shard.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// The entry for `key`, if the movement is controlled.
    pub fn entry(&self, key: MovementKey) -> Option<Arc<PriorityMovement>> {
        Self::read(self.shard(key)).get(&key).cloned()
    }

    /// Fetch or create the entry for `key`.  Returns `(entry, created)`.
    fn entry_or_create(&self, key: MovementKey) -> (Arc<PriorityMovement>, bool) {
        if let Some(e) = self.entry(key) {
            return (e, false);
        }
        let mut map = Self::write(self.shard(key));
        if let Some(e) = map.get(&key) {
            return (Arc::clone(e), false);
        }
        let e = Arc::new(PriorityMovement::new());
        map.insert(key, Arc::clone(&e));
        (e, true)
    }

    fn drop_if_unused(&self, key: MovementKey) {
        let mut map = Self::write(self.shard(key));
        if map.get(&key).is_some_and(|e| e.is_unused()) {
            map.remove(&key);
        }
    }

    /// Register every already-tracked vehicle heading along `key` into a
    /// freshly created entry.
    ///
    /// Slots are read under the entry lock, so a tracker that moves a vehicle
    /// away mid-scan detaches it only after the scan has inserted it.
    fn backfill(&self, key: MovementKey, entry: &PriorityMovement) {
        let ids = self.vehicles.ids();
        entry.fill(&ids, |v| {
            self.vehicles.get(v).map_or((false, false), |state| {
                (state.movement() == Some(key), state.lookahead == Some(key))
            })
        });
    }

    // ── Classification ────────────────────────────────────────────────────

    /// Set or clear the priority sign of a movement.  Idempotent.
    ///
    /// Clearing deletes the entry (and its membership) unless the junction's
    /// signal program still needs it.  Vehicles that referenced a deleted
    /// entry simply find nothing on their next lookup.
    pub fn set_priority_type(&self, key: MovementKey, priority: Option<PriorityType>) {
        match priority {
            Some(p) => {
                let (entry, created) = self.entry_or_create(key);
                entry.set_priority(Some(p));
                if created {
                    self.backfill(key, &entry);
                }
            }
            None => {
                if let Some(entry) = self.entry(key) {
                    entry.set_priority(None);
                    self.drop_if_unused(key);
                }
            }
        }
    }

    pub fn priority_type(&self, key: MovementKey) -> Option<PriorityType> {
        self.entry(key)?.priority()
    }

    /// Keep (or stop keeping) an entry alive for signal flow accounting.
    pub fn set_signal_tracked(&self, key: MovementKey, tracked: bool) {
        if tracked {
            let (entry, created) = self.entry_or_create(key);
            entry.set_signal_tracked(true);
            if created {
                self.backfill(key, &entry);
            }
        } else if let Some(entry) = self.entry(key) {
            entry.set_signal_tracked(false);
            self.drop_if_unused(key);
        }
    }

    /// All controlled movements, sorted.
    pub fn movement_keys(&self) -> Vec<MovementKey> {
        let mut keys: Vec<MovementKey> = self
            .shards
            .iter()
            .flat_map(|s| Self::read(s).keys().copied().collect::<Vec<_>>())
            .collect();
        keys.sort_unstable();
        keys
    }

    /// Movements carrying a priority sign, sorted.
    pub fn priorities(&self) -> Vec<(MovementKey, PriorityType)> {
        self.movement_keys()
            .into_iter()
            .filter_map(|k| self.priority_type(k).map(|p| (k, p)))
            .collect()
    }

    // ── Membership ────────────────────────────────────────────────────────

    /// Add `vehicle` to the movement's registered set.  `false` if the
    /// movement is not controlled.
    pub fn attach(&self, key: MovementKey, vehicle: VehicleId) -> bool {
        self.entry(key).is_some_and(|e| {
            e.insert(vehicle);
            true
        })
    }

    pub fn detach(&self, key: MovementKey, vehicle: VehicleId) {
        if let Some(e) = self.entry(key) {
            e.remove(vehicle);
        }
    }

    pub fn attach_lookahead(&self, key: MovementKey, vehicle: VehicleId) -> bool {
        self.entry(key).is_some_and(|e| {
            e.insert_lookahead(vehicle);
            true
        })
    }

    pub fn detach_lookahead(&self, key: MovementKey, vehicle: VehicleId) {
        if let Some(e) = self.entry(key) {
            e.remove_lookahead(vehicle);
        }
    }

    /// Vehicles registered on `key`, sorted.  Empty for uncontrolled keys.
    pub fn movement_vehicles(&self, key: MovementKey) -> Vec<VehicleId> {
        self.entry(key).map(|e| e.registered()).unwrap_or_default()
    }

    /// Lookahead registrations on `key`, sorted.
    pub fn lookahead_vehicles(&self, key: MovementKey) -> Vec<VehicleId> {
        self.entry(key).map(|e| e.lookahead()).unwrap_or_default()
    }

    /// Registered and lookahead vehicles on `key` the tracker saw within the
    /// recency window.  Used as the waiting count by signal metrics.
    pub fn approach_count(&self, key: MovementKey, now: Tick) -> usize {
        let Some(entry) = self.entry(key) else { return 0 };
        let mut ids = entry.registered();
        ids.extend(entry.lookahead());
        ids.sort_unstable();
        ids.dedup();
        ids.into_iter()
            .filter(|&v| {
                self.vehicles
                    .get(v)
                    .is_some_and(|s| now.since(s.last_seen_tick) <= self.recency_ticks)
            })
            .count()
    }

    // ── Housekeeping ──────────────────────────────────────────────────────

    /// Drop `vehicle` from the table and from every set it is in.
    pub fn remove_vehicle(&self, vehicle: VehicleId) -> bool {
        let Some(state) = self.vehicles.remove(vehicle) else { return false };
        if let Some(key) = state.movement() {
            self.detach(key, vehicle);
        }
        if let Some(key) = state.lookahead {
            self.detach_lookahead(key, vehicle);
        }
        true
    }

    /// Remove vehicles not seen for `stale_after_ticks` and prune
    /// memberships that disagree with their vehicle's current state.
    pub fn sweep_stale(&self, now: Tick) -> SweepReport {
        let mut report = SweepReport::default();
        let mut primary: FxHashMap<VehicleId, MovementKey> = FxHashMap::default();
        let mut secondary: FxHashSet<(VehicleId, MovementKey)> = FxHashSet::default();

        for v in self.vehicles.ids() {
            let Some(state) = self.vehicles.get(v) else { continue };
            if now.since(state.last_seen_tick) > self.stale_after_ticks {
                if self.remove_vehicle(v) {
                    report.removed_vehicles += 1;
                }
                continue;
            }
            if let Some(key) = state.movement() {
                primary.insert(v, key);
            }
            if let Some(key) = state.lookahead {
                secondary.insert((v, key));
            }
        }

        for key in self.movement_keys() {
            if let Some(entry) = self.entry(key) {
                report.pruned_memberships += entry.retain(|v, is_lookahead| {
                    if is_lookahead {
                        secondary.contains(&(v, key))
                    } else {
                        primary.get(&v) == Some(&key)
                    }
                });
            }
        }
        if report != SweepReport::default() {
            debug!(
                "sweep at {now}: removed {} stale vehicles, pruned {} memberships",
                report.removed_vehicles, report.pruned_memberships
            );
        }
        report
    }

    // ── Geometry ──────────────────────────────────────────────────────────

    pub fn is_left_segment<N: RoadNetworkAccessor + ?Sized>(
        &self,
        net:  &N,
        from: SegmentId,
        to:   SegmentId,
        node: NodeId,
    ) -> bool {
        self.geometry.is_left_segment(net, from, to, node)
    }

    pub fn is_right_segment<N: RoadNetworkAccessor + ?Sized>(
        &self,
        net:  &N,
        from: SegmentId,
        to:   SegmentId,
        node: NodeId,
    ) -> bool {
        self.geometry.is_right_segment(net, from, to, node)
    }

    /// Rank of a turn for main-road tie breaks: lower goes first.  Unknown
    /// turns rank as given, so callers can bias them either way.
    fn turn_rank(&self, dir: Option<TurnDirection>, unknown: u8) -> u8 {
        let (near, far) = match self.geometry.side {
            TrafficSide::Right => (TurnDirection::Right, TurnDirection::Left),
            TrafficSide::Left  => (TurnDirection::Left, TurnDirection::Right),
        };
        match dir {
            Some(TurnDirection::Straight) => 0,
            Some(d) if d == near          => 1,
            Some(d) if d == far           => 2,
            Some(_)                       => 3,
            None                          => unknown,
        }
    }

    // ── Conflict query ────────────────────────────────────────────────────

    /// `true` if a vehicle with right of way over `vehicle` is approaching
    /// `node` on a movement that conflicts with `vehicle`'s turn.
    pub fn has_incoming_vehicles<N: RoadNetworkAccessor + ?Sized>(
        &self,
        net:     &N,
        vehicle: VehicleId,
        node:    NodeId,
        now:     Tick,
    ) -> bool {
        self.has_incoming_vehicles_filtered(net, vehicle, node, now, |_| true)
    }

    /// As [`has_incoming_vehicles`](Self::has_incoming_vehicles), skipping
    /// movements for which `consider` returns `false`.
    ///
    /// Right of way:
    /// - a main-road vehicle only gives way to other main-road (or
    ///   unclassified) traffic, going straight before turning and, on equal
    ///   turns, to the approach on its driving side;
    /// - a yield/stop vehicle gives way to all main-road traffic and to
    ///   non-main traffic approaching from its driving side.
    ///
    /// Vehicles already cleared through the junction count whatever their
    /// priority, as long as their path conflicts.
    ///
    /// The answer errs towards `true`: unknown destinations conflict, and
    /// approach is judged by tracker recency rather than exact position.
    pub fn has_incoming_vehicles_filtered<N, F>(
        &self,
        net:      &N,
        vehicle:  VehicleId,
        node:     NodeId,
        now:      Tick,
        consider: F,
    ) -> bool
    where
        N: RoadNetworkAccessor + ?Sized,
        F: Fn(MovementKey) -> bool,
    {
        let Some(me) = self.vehicles.get(vehicle) else {
            debug!("incoming check for untracked {vehicle}");
            return false;
        };
        if me.to_node != node {
            return false;
        }
        let my_priority = self
            .priority_type(MovementKey::new(node, me.from_segment))
            .unwrap_or(PriorityType::Main);
        let my_turn = self.geometry.turn_direction(net, me.from_segment, me.to_segment, node);
        let my_rank = self.turn_rank(my_turn, 3);

        for &seg in net.connected_segments(node) {
            if seg == me.from_segment {
                continue;
            }
            let key = MovementKey::new(node, seg);
            if !consider(key) {
                continue;
            }
            let Some(entry) = self.entry(key) else { continue };
            let (other_priority, members) = entry.snapshot();
            if members.is_empty() {
                continue;
            }
            let other_main = other_priority.is_none_or(PriorityType::is_main);
            let side_priority = self.geometry.has_side_priority(net, me.from_segment, seg, node);

            let segment_relevant = match my_priority {
                PriorityType::Main => other_main,
                PriorityType::Yield | PriorityType::Stop => other_main || side_priority,
            };

            for other_id in members {
                if other_id == vehicle {
                    continue;
                }
                let Some(other) = self.vehicles.get(other_id) else { continue };
                if other.to_node != node || other.from_segment != seg {
                    continue;
                }
                if now.since(other.last_seen_tick) > self.recency_ticks {
                    continue;
                }
                // Cleared vehicles never stop again: only geometry counts.
                if !other.decision_state.is_committed() {
                    if !segment_relevant {
                        continue;
                    }
                    if my_priority.is_main() {
                        let other_turn =
                            self.geometry.turn_direction(net, seg, other.to_segment, node);
                        let other_rank = self.turn_rank(other_turn, 0);
                        let yields =
                            other_rank < my_rank || (other_rank == my_rank && side_priority);
                        if !yields {
                            continue;
                        }
                    }
                }
                if self.geometry.movements_conflict(
                    net,
                    node,
                    (me.from_segment, me.to_segment),
                    (seg, other.to_segment),
                ) {
                    return true;
                }
            }
        }
        false
    }
}
