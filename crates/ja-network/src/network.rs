//! In-memory road network and builder.
//!
//! # Data layout
//!
//! Junction adjacency uses **Compressed Sparse Row (CSR)** format.  Given a
//! `NodeId n`, the segments ending at it occupy the slice:
//!
//! ```text
//! node_segments[ node_seg_start[n] .. node_seg_start[n+1] ]
//! ```
//!
//! sorted clockwise by the bearing each segment leaves the node with.  The
//! conflict geometry relies on that ordering.
//!
//! Segment and lane arrays are indexed by `SegmentId` / `LaneId` directly.

use ja_core::{LaneId, NodeId, Point, SegmentId};

use crate::{NetworkError, NetworkResult, RoadNetworkAccessor};

// ── RoadNetwork ───────────────────────────────────────────────────────────────

/// Undirected segment graph in CSR format.
///
/// All fields are `pub` for direct indexed access on hot paths.  Do not
/// construct directly; use [`RoadNetworkBuilder`].
pub struct RoadNetwork {
    // ── Node data ─────────────────────────────────────────────────────────
    /// World position of each node.  Indexed by `NodeId`.
    pub node_pos: Vec<Point>,

    // ── CSR adjacency ─────────────────────────────────────────────────────
    /// CSR row pointer.  Length = `node_count + 1`.
    pub node_seg_start: Vec<u32>,

    /// Segments per node, clockwise within each node's range.
    pub node_segments: Vec<SegmentId>,

    // ── Segment data ──────────────────────────────────────────────────────
    pub segment_start: Vec<NodeId>,
    pub segment_end: Vec<NodeId>,

    /// Bearing leaving `segment_start` towards `segment_end`.
    pub segment_bearing_start: Vec<f32>,

    /// Bearing leaving `segment_end` towards `segment_start`.
    pub segment_bearing_end: Vec<f32>,

    // ── Lane data ─────────────────────────────────────────────────────────
    pub lane_segment: Vec<SegmentId>,
    pub lane_speed_limit: Vec<f32>,
}

impl RoadNetwork {
    /// Construct an empty network with no nodes or segments.
    pub fn empty() -> Self {
        RoadNetworkBuilder::new().build()
    }

    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    pub fn segment_count(&self) -> usize {
        self.segment_start.len()
    }

    pub fn lane_count(&self) -> usize {
        self.lane_segment.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    /// Lanes belonging to `segment`, in creation order.
    pub fn lanes_of(&self, segment: SegmentId) -> impl Iterator<Item = LaneId> + '_ {
        self.lane_segment
            .iter()
            .enumerate()
            .filter(move |(_, s)| **s == segment)
            .map(|(i, _)| LaneId(i as u32))
    }
}

impl RoadNetworkAccessor for RoadNetwork {
    fn junctions(&self, segment: SegmentId) -> Option<(NodeId, NodeId)> {
        let start = *self.segment_start.get(segment.index())?;
        let end = *self.segment_end.get(segment.index())?;
        Some((start, end))
    }

    #[inline]
    fn connected_segments(&self, node: NodeId) -> &[SegmentId] {
        let i = node.index();
        if i + 1 >= self.node_seg_start.len() {
            return &[];
        }
        let start = self.node_seg_start[i] as usize;
        let end   = self.node_seg_start[i + 1] as usize;
        &self.node_segments[start..end]
    }

    fn lane_segment(&self, lane: LaneId) -> Option<SegmentId> {
        self.lane_segment.get(lane.index()).copied()
    }

    fn speed_limit(&self, segment: SegmentId, lane: LaneId) -> Option<f32> {
        if self.lane_segment.get(lane.index()) != Some(&segment) {
            return None;
        }
        self.lane_speed_limit.get(lane.index()).copied()
    }

    fn segment_bearing(&self, segment: SegmentId, node: NodeId) -> Option<f32> {
        let (start, end) = self.junctions(segment)?;
        if start == node {
            self.segment_bearing_start.get(segment.index()).copied()
        } else if end == node {
            self.segment_bearing_end.get(segment.index()).copied()
        } else {
            None
        }
    }
}

// ── RoadNetworkBuilder ────────────────────────────────────────────────────────

/// Construct a [`RoadNetwork`] incrementally, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use ja_core::Point;
/// use ja_network::{RoadNetworkAccessor, RoadNetworkBuilder};
///
/// let mut b = RoadNetworkBuilder::new();
/// let centre = b.add_node(Point::new(0.0, 0.0));
/// let north  = b.add_node(Point::new(0.0, 100.0));
/// let seg    = b.add_road(centre, north, 2, 50.0).unwrap();
/// let net = b.build();
/// assert_eq!(net.connected_segments(centre), &[seg]);
/// assert_eq!(net.lane_count(), 2);
/// ```
pub struct RoadNetworkBuilder {
    nodes:    Vec<Point>,
    segments: Vec<(NodeId, NodeId)>,
    lanes:    Vec<(SegmentId, f32)>,
}

impl RoadNetworkBuilder {
    pub fn new() -> Self {
        Self { nodes: Vec::new(), segments: Vec::new(), lanes: Vec::new() }
    }

    /// Add a junction and return its `NodeId` (sequential from 0).
    pub fn add_node(&mut self, pos: Point) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(pos);
        id
    }

    /// Add a segment from `start` to `end` without lanes.
    pub fn add_segment(&mut self, start: NodeId, end: NodeId) -> NetworkResult<SegmentId> {
        for n in [start, end] {
            if n.index() >= self.nodes.len() {
                return Err(NetworkError::NodeNotFound(n));
            }
        }
        if start == end {
            return Err(NetworkError::SelfLoop(start));
        }
        let id = SegmentId(self.segments.len() as u32);
        self.segments.push((start, end));
        Ok(id)
    }

    /// Add a lane to `segment` with the given posted speed limit.
    pub fn add_lane(&mut self, segment: SegmentId, speed_limit: f32) -> NetworkResult<LaneId> {
        if segment.index() >= self.segments.len() {
            return Err(NetworkError::SegmentNotFound(segment));
        }
        let id = LaneId(self.lanes.len() as u32);
        self.lanes.push((segment, speed_limit));
        Ok(id)
    }

    /// Convenience: a segment with `lanes` lanes sharing one speed limit.
    pub fn add_road(
        &mut self,
        start:       NodeId,
        end:         NodeId,
        lanes:       usize,
        speed_limit: f32,
    ) -> NetworkResult<SegmentId> {
        let seg = self.add_segment(start, end)?;
        for _ in 0..lanes {
            self.add_lane(seg, speed_limit)?;
        }
        Ok(seg)
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn segment_count(&self) -> usize { self.segments.len() }

    /// Consume the builder and produce a [`RoadNetwork`].
    ///
    /// Time complexity: O(S log S) for the per-node bearing sort.
    pub fn build(self) -> RoadNetwork {
        let node_count = self.nodes.len();

        let segment_start: Vec<NodeId> = self.segments.iter().map(|s| s.0).collect();
        let segment_end:   Vec<NodeId> = self.segments.iter().map(|s| s.1).collect();
        let segment_bearing_start: Vec<f32> = self
            .segments
            .iter()
            .map(|&(a, b)| self.nodes[a.index()].bearing_to(self.nodes[b.index()]))
            .collect();
        let segment_bearing_end: Vec<f32> = self
            .segments
            .iter()
            .map(|&(a, b)| self.nodes[b.index()].bearing_to(self.nodes[a.index()]))
            .collect();

        // (node, bearing, segment) for both ends, sorted by node then bearing.
        let mut ends: Vec<(NodeId, f32, SegmentId)> = Vec::with_capacity(self.segments.len() * 2);
        for (i, &(a, b)) in self.segments.iter().enumerate() {
            let seg = SegmentId(i as u32);
            ends.push((a, segment_bearing_start[i], seg));
            ends.push((b, segment_bearing_end[i], seg));
        }
        ends.sort_by(|x, y| {
            x.0.cmp(&y.0)
                .then(x.1.total_cmp(&y.1))
                .then(x.2.cmp(&y.2))
        });

        let mut node_seg_start = vec![0u32; node_count + 1];
        for e in &ends {
            node_seg_start[e.0.index() + 1] += 1;
        }
        for i in 1..=node_count {
            node_seg_start[i] += node_seg_start[i - 1];
        }
        debug_assert_eq!(node_seg_start[node_count] as usize, ends.len());
        let node_segments = ends.into_iter().map(|e| e.2).collect();

        RoadNetwork {
            node_pos: self.nodes,
            node_seg_start,
            node_segments,
            segment_start,
            segment_end,
            segment_bearing_start,
            segment_bearing_end,
            lane_segment:     self.lanes.iter().map(|l| l.0).collect(),
            lane_speed_limit: self.lanes.iter().map(|l| l.1).collect(),
        }
    }
}

impl Default for RoadNetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
