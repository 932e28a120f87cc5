//! Unit tests for ja-network.
//!
//! All tests use a hand-crafted four-way junction.

#[cfg(test)]
mod helpers {
    use ja_core::{NodeId, Point, SegmentId};

    use crate::{RoadNetwork, RoadNetworkBuilder};

    /// Four-way junction at the origin.
    ///
    /// ```text
    ///            n(1)
    ///             |
    ///   w(4) ---- c(0) ---- e(2)
    ///             |
    ///            s(3)
    /// ```
    ///
    /// Segments are added in the order south, west, north, east so the
    /// clockwise sort is actually exercised.  Every segment starts at the
    /// centre and has two 50.0 lanes.
    pub fn four_way() -> (RoadNetwork, NodeId, [SegmentId; 4]) {
        let mut b = RoadNetworkBuilder::new();
        let c = b.add_node(Point::new(0.0, 0.0));
        let n = b.add_node(Point::new(0.0, 100.0));
        let e = b.add_node(Point::new(100.0, 0.0));
        let s = b.add_node(Point::new(0.0, -100.0));
        let w = b.add_node(Point::new(-100.0, 0.0));

        let south = b.add_road(c, s, 2, 50.0).unwrap();
        let west  = b.add_road(c, w, 2, 50.0).unwrap();
        let north = b.add_road(c, n, 2, 50.0).unwrap();
        let east  = b.add_road(c, e, 2, 50.0).unwrap();

        // [N, E, S, W]
        (b.build(), c, [north, east, south, west])
    }
}

// ── Builder & network structure ────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use ja_core::{NodeId, Point, SegmentId};

    use crate::{NetworkError, RoadNetworkAccessor, RoadNetworkBuilder};

    #[test]
    fn empty_build() {
        let net = RoadNetworkBuilder::new().build();
        assert_eq!(net.node_count(), 0);
        assert_eq!(net.segment_count(), 0);
        assert!(net.is_empty());
        assert!(net.connected_segments(NodeId(0)).is_empty());
    }

    #[test]
    fn rejects_unknown_nodes_and_self_loops() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(Point::new(0.0, 0.0));
        assert_eq!(b.add_segment(a, NodeId(9)), Err(NetworkError::NodeNotFound(NodeId(9))));
        assert_eq!(b.add_segment(a, a), Err(NetworkError::SelfLoop(a)));
        assert_eq!(
            b.add_lane(SegmentId(0), 30.0),
            Err(NetworkError::SegmentNotFound(SegmentId(0)))
        );
    }

    #[test]
    fn segments_sorted_clockwise_at_junction() {
        let (net, c, [n, e, s, w]) = super::helpers::four_way();
        assert_eq!(net.connected_segments(c), &[n, e, s, w]);
    }

    #[test]
    fn outer_nodes_have_one_segment() {
        let (net, c, [n, ..]) = super::helpers::four_way();
        let (start, end) = net.junctions(n).unwrap();
        assert_eq!(start, c);
        assert_eq!(net.connected_segments(end), &[n]);
        assert_eq!(net.other_junction(n, c), Some(end));
        assert_eq!(net.other_junction(n, NodeId(42)), None);
    }

    #[test]
    fn lanes_map_to_parent_segment() {
        let (net, _, [n, e, ..]) = super::helpers::four_way();
        let lanes: Vec<_> = net.lanes_of(n).collect();
        assert_eq!(lanes.len(), 2);
        for &l in &lanes {
            assert_eq!(net.lane_segment(l), Some(n));
            assert_eq!(net.speed_limit(n, l), Some(50.0));
            // Wrong parent segment: no answer.
            assert_eq!(net.speed_limit(e, l), None);
        }
    }
}

// ── Accessor helpers ───────────────────────────────────────────────────────────

#[cfg(test)]
mod accessor {
    use ja_core::{NodeId, SegmentId};

    use crate::RoadNetworkAccessor;

    #[test]
    fn target_junction_uses_offset_midpoint() {
        let (net, c, [n, ..]) = super::helpers::four_way();
        let (_, far) = net.junctions(n).unwrap();
        assert_eq!(net.target_junction(n, 0), Some(c));
        assert_eq!(net.target_junction(n, 127), Some(c));
        assert_eq!(net.target_junction(n, 128), Some(far));
        assert_eq!(net.target_junction(n, 255), Some(far));
        assert_eq!(net.target_junction(SegmentId(99), 255), None);
    }

    #[test]
    fn bearings_leave_the_junction() {
        let (net, c, [n, e, s, w]) = super::helpers::four_way();
        assert!((net.segment_bearing(n, c).unwrap() - 0.0).abs() < 1e-3);
        assert!((net.segment_bearing(e, c).unwrap() - 90.0).abs() < 1e-3);
        assert!((net.segment_bearing(s, c).unwrap() - 180.0).abs() < 1e-3);
        assert!((net.segment_bearing(w, c).unwrap() - 270.0).abs() < 1e-3);
        assert_eq!(net.segment_bearing(n, NodeId(3)), None);
        assert!(net.is_connected(c, e));
    }
}

// ── Turn geometry ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod geometry {
    use ja_core::{SegmentId, TrafficSide};

    use crate::{TurnDirection, TurnGeometry};

    fn rht() -> TurnGeometry {
        TurnGeometry::default()
    }

    fn lht() -> TurnGeometry {
        TurnGeometry { side: TrafficSide::Left, ..TurnGeometry::default() }
    }

    #[test]
    fn turn_directions_from_south() {
        let (net, c, [n, e, s, w]) = super::helpers::four_way();
        let g = rht();
        assert_eq!(g.turn_direction(&net, s, n, c), Some(TurnDirection::Straight));
        assert_eq!(g.turn_direction(&net, s, e, c), Some(TurnDirection::Right));
        assert_eq!(g.turn_direction(&net, s, w, c), Some(TurnDirection::Left));
        assert_eq!(g.turn_direction(&net, s, s, c), Some(TurnDirection::UTurn));
        assert!(g.is_right_segment(&net, s, e, c));
        assert!(g.is_left_segment(&net, s, w, c));
        assert!(!g.is_left_segment(&net, s, n, c));
    }

    #[test]
    fn turn_direction_unknown_segment() {
        let (net, c, [n, ..]) = super::helpers::four_way();
        assert_eq!(rht().turn_direction(&net, n, SegmentId(77), c), None);
    }

    #[test]
    fn side_priority_follows_traffic_side() {
        let (net, c, [_, e, s, w]) = super::helpers::four_way();
        assert!(rht().has_side_priority(&net, s, e, c));
        assert!(!rht().has_side_priority(&net, s, w, c));
        assert!(lht().has_side_priority(&net, s, w, c));
        assert!(!lht().has_side_priority(&net, s, e, c));
    }

    #[test]
    fn opposite_straights_do_not_conflict() {
        let (net, c, [n, _, s, _]) = super::helpers::four_way();
        assert!(!rht().movements_conflict(&net, c, (s, n), (n, s)));
    }

    #[test]
    fn crossing_straights_conflict() {
        let (net, c, [n, e, s, w]) = super::helpers::four_way();
        assert!(rht().movements_conflict(&net, c, (s, n), (w, e)));
        assert!(rht().movements_conflict(&net, c, (e, w), (n, s)));
    }

    #[test]
    fn left_turn_conflicts_with_oncoming() {
        let (net, c, [n, _, s, w]) = super::helpers::four_way();
        assert!(rht().movements_conflict(&net, c, (s, w), (n, s)));
        // In left-hand traffic the same turn is the short one.
        assert!(!lht().movements_conflict(&net, c, (s, w), (n, s)));
    }

    #[test]
    fn right_turn_only_conflicts_on_merge() {
        let (net, c, [n, e, s, w]) = super::helpers::four_way();
        let g = rht();
        assert!(!g.movements_conflict(&net, c, (s, e), (n, s)));
        assert!(!g.movements_conflict(&net, c, (s, e), (e, w)));
        assert!(g.movements_conflict(&net, c, (s, e), (w, e)));
    }

    #[test]
    fn same_source_never_conflicts() {
        let (net, c, [n, e, s, _]) = super::helpers::four_way();
        assert!(!rht().movements_conflict(&net, c, (s, n), (s, e)));
    }

    #[test]
    fn unknown_destination_is_conflict() {
        let (net, c, [n, e, s, _]) = super::helpers::four_way();
        assert!(rht().movements_conflict(&net, c, (s, SegmentId::INVALID), (n, e)));
        assert!(rht().movements_conflict(&net, c, (s, n), (e, SegmentId::INVALID)));
    }
}
