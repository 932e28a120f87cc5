//! Network-subsystem error type.

use thiserror::Error;

use ja_core::{NodeId, SegmentId};

/// Errors produced while building a [`RoadNetwork`](crate::RoadNetwork).
/// Queries never fail; they return `None` or an empty slice instead.
#[derive(Debug, Error, PartialEq)]
pub enum NetworkError {
    #[error("node {0} not found in network")]
    NodeNotFound(NodeId),

    #[error("segment {0} not found in network")]
    SegmentNotFound(SegmentId),

    #[error("segment would start and end at {0}")]
    SelfLoop(NodeId),
}

pub type NetworkResult<T> = Result<T, NetworkError>;
