//! Host path positions.

use ja_core::{LaneId, SegmentId};

/// Offsets below this value lie on the first half of a segment.
pub const OFFSET_MIDPOINT: u8 = 128;

/// One element of a vehicle's path as the host reports it.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathPosition {
    pub segment: SegmentId,
    pub lane:    LaneId,
    /// Position along the segment, `0..=255`.  Below [`OFFSET_MIDPOINT`] the
    /// vehicle is driving towards the segment's start node, otherwise
    /// towards its end node.
    pub offset:  u8,
}

impl PathPosition {
    #[inline]
    pub fn new(segment: SegmentId, lane: LaneId, offset: u8) -> Self {
        Self { segment, lane, offset }
    }

    /// `true` if the position points at the segment's start node.
    #[inline]
    pub fn heads_to_start(&self) -> bool {
        self.offset < OFFSET_MIDPOINT
    }
}
