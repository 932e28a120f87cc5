//! The `RoadNetworkAccessor` trait.
//!
//! # Pluggability
//!
//! The road network is owned by the host simulation.  The engine calls it
//! through this trait, so a host can answer from its own buffers and tests
//! can use the in-memory [`RoadNetwork`](crate::RoadNetwork).
//!
//! # Thread safety
//!
//! Vehicles are tracked and arbitrated from many worker threads at once, so
//! implementations must be `Send + Sync`.  All methods are read-only.
//!
//! # Failure semantics
//!
//! Unknown ids are not errors: they answer `None` / an empty slice, and the
//! caller falls back to its documented default.

use ja_core::{LaneId, NodeId, SegmentId};

pub trait RoadNetworkAccessor: Send + Sync {
    /// `(start, end)` junctions of `segment`.
    fn junctions(&self, segment: SegmentId) -> Option<(NodeId, NodeId)>;

    /// Segments connected at `node`, ordered clockwise by bearing.
    fn connected_segments(&self, node: NodeId) -> &[SegmentId];

    /// Parent segment of `lane`.
    fn lane_segment(&self, lane: LaneId) -> Option<SegmentId>;

    /// Posted speed limit of `lane` on `segment`.
    fn speed_limit(&self, segment: SegmentId, lane: LaneId) -> Option<f32>;

    /// Compass bearing (degrees clockwise from north) of `segment` as it
    /// leaves `node`.  `None` if the segment does not touch `node`.
    fn segment_bearing(&self, segment: SegmentId, node: NodeId) -> Option<f32>;

    // ── Provided helpers ──────────────────────────────────────────────────

    /// The junction at the far end of `segment`, seen from `node`.
    fn other_junction(&self, segment: SegmentId, node: NodeId) -> Option<NodeId> {
        let (start, end) = self.junctions(segment)?;
        if start == node {
            Some(end)
        } else if end == node {
            Some(start)
        } else {
            None
        }
    }

    /// `true` if `segment` ends at `node`.
    fn is_connected(&self, node: NodeId, segment: SegmentId) -> bool {
        self.connected_segments(node).contains(&segment)
    }

    /// Junction a vehicle at `offset` (0..=255 along the segment) is heading
    /// for: the start node for offsets below the midpoint, the end node
    /// otherwise.
    fn target_junction(&self, segment: SegmentId, offset: u8) -> Option<NodeId> {
        let (start, end) = self.junctions(segment)?;
        Some(if offset < 128 { start } else { end })
    }
}
