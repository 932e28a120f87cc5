//! The demo's road network: one four-way junction.

use anyhow::{Context, Result};

use ja_core::{LaneId, NodeId, Point, SegmentId};
use ja_network::{RoadNetwork, RoadNetworkBuilder};

/// Length of every arm.
pub const ARM_LENGTH: f32 = 150.0;

pub const ARM_NAMES: [&str; 4] = ["north", "east", "south", "west"];

/// Handles into the network returned by [`build_network`].  Arms are indexed
/// north, east, south, west; each starts at the centre.
pub struct Crossroads {
    pub centre: NodeId,
    pub arms:   [SegmentId; 4],
    pub lanes:  [LaneId; 4],
}

/// Build a single junction with four one-lane arms, 50 km/h each.
pub fn build_network() -> Result<(RoadNetwork, Crossroads)> {
    let mut b = RoadNetworkBuilder::new();
    let centre = b.add_node(Point::new(0.0, 0.0));
    let ends = [
        Point::new(0.0, ARM_LENGTH),
        Point::new(ARM_LENGTH, 0.0),
        Point::new(0.0, -ARM_LENGTH),
        Point::new(-ARM_LENGTH, 0.0),
    ];

    let mut arms = [SegmentId::INVALID; 4];
    for (arm, end) in arms.iter_mut().zip(ends) {
        let node = b.add_node(end);
        *arm = b.add_road(centre, node, 1, 50.0)?;
    }
    let net = b.build();

    let mut lanes = [LaneId::INVALID; 4];
    for (lane, &arm) in lanes.iter_mut().zip(&arms) {
        *lane = net.lanes_of(arm).next().with_context(|| format!("{arm} has no lanes"))?;
    }
    Ok((net, Crossroads { centre, arms, lanes }))
}
