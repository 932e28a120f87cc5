//! Turn classification and movement conflict geometry at a junction.
//!
//! # Turn direction
//!
//! A vehicle arriving on `from` travels with heading `bearing(from) + 180°`
//! and leaves with heading `bearing(to)`.  The signed difference decides the
//! turn: within `straight_tolerance_deg` of zero is straight, clockwise is a
//! right turn, counter-clockwise a left turn.  `from == to` is a U-turn.
//!
//! # Conflicts
//!
//! Every segment end contributes two points on a circle around the junction,
//! in clockwise segment order: its inbound lanes and its outbound lanes.  With
//! right-hand traffic the inbound point comes first (it lies counter-clockwise
//! of the segment's centre line); with left-hand traffic the outbound point
//! does.  A movement is the chord from its inbound point to its destination's
//! outbound point.  Two movements conflict when their chords cross or when
//! they merge into the same outbound point.  Movements from the same segment
//! never conflict.

use ja_core::geo::signed_delta_deg;
use ja_core::{EngineConfig, NodeId, SegmentId, TrafficSide};

use crate::RoadNetworkAccessor;

/// How a movement turns at a junction.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TurnDirection {
    Left,
    Straight,
    Right,
    UTurn,
}

/// Driving-side aware turn classifier.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TurnGeometry {
    pub side: TrafficSide,
    pub straight_tolerance_deg: f32,
}

impl Default for TurnGeometry {
    fn default() -> Self {
        Self { side: TrafficSide::Right, straight_tolerance_deg: 30.0 }
    }
}

impl TurnGeometry {
    pub fn from_config(cfg: &EngineConfig) -> Self {
        Self { side: cfg.traffic_side, straight_tolerance_deg: cfg.straight_tolerance_deg }
    }

    /// Classify the turn `from → to` at `node`.  `None` if either segment
    /// does not touch `node`.
    pub fn turn_direction<N: RoadNetworkAccessor + ?Sized>(
        &self,
        net:  &N,
        from: SegmentId,
        to:   SegmentId,
        node: NodeId,
    ) -> Option<TurnDirection> {
        let in_bearing = net.segment_bearing(from, node)?;
        let out_bearing = net.segment_bearing(to, node)?;
        if from == to {
            return Some(TurnDirection::UTurn);
        }
        let heading = in_bearing + 180.0;
        let delta = signed_delta_deg(heading, out_bearing);
        Some(if delta.abs() <= self.straight_tolerance_deg {
            TurnDirection::Straight
        } else if delta > 0.0 {
            TurnDirection::Right
        } else {
            TurnDirection::Left
        })
    }

    /// `true` if `from → to` at `node` is a left turn.
    pub fn is_left_segment<N: RoadNetworkAccessor + ?Sized>(
        &self,
        net:  &N,
        from: SegmentId,
        to:   SegmentId,
        node: NodeId,
    ) -> bool {
        self.turn_direction(net, from, to, node) == Some(TurnDirection::Left)
    }

    /// `true` if `from → to` at `node` is a right turn.
    pub fn is_right_segment<N: RoadNetworkAccessor + ?Sized>(
        &self,
        net:  &N,
        from: SegmentId,
        to:   SegmentId,
        node: NodeId,
    ) -> bool {
        self.turn_direction(net, from, to, node) == Some(TurnDirection::Right)
    }

    /// `true` if traffic arriving on `other` has right of way over traffic
    /// arriving on `from` when neither holds a main-road priority: the
    /// approach on the driver's right (left in left-hand traffic) goes first.
    pub fn has_side_priority<N: RoadNetworkAccessor + ?Sized>(
        &self,
        net:   &N,
        from:  SegmentId,
        other: SegmentId,
        node:  NodeId,
    ) -> bool {
        match self.side {
            TrafficSide::Right => self.is_right_segment(net, from, other, node),
            TrafficSide::Left  => self.is_left_segment(net, from, other, node),
        }
    }

    /// Conservative conflict test between movements `a = (from, to)` and
    /// `b = (from, to)` at `node`.  A `to` of `SegmentId::INVALID` (unknown
    /// destination) or any segment not attached to `node` counts as a
    /// conflict.
    pub fn movements_conflict<N: RoadNetworkAccessor + ?Sized>(
        &self,
        net:  &N,
        node: NodeId,
        a:    (SegmentId, SegmentId),
        b:    (SegmentId, SegmentId),
    ) -> bool {
        if a.0 == b.0 {
            return false;
        }
        if a.1 == b.1 {
            // Merge into the same segment (also catches two unknown targets).
            return true;
        }
        let order = net.connected_segments(node);
        let pos = |seg: SegmentId, inbound: bool| -> Option<usize> {
            let i = order.iter().position(|&s| s == seg)?;
            let first = match self.side {
                TrafficSide::Right => inbound,
                TrafficSide::Left  => !inbound,
            };
            Some(if first { 2 * i } else { 2 * i + 1 })
        };
        let (Some(a0), Some(a1), Some(b0), Some(b1)) =
            (pos(a.0, true), pos(a.1, false), pos(b.0, true), pos(b.1, false))
        else {
            return true;
        };
        let (lo, hi) = if a0 < a1 { (a0, a1) } else { (a1, a0) };
        let inside = |p: usize| lo < p && p < hi;
        inside(b0) != inside(b1)
    }
}
