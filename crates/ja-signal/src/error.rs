use ja_core::{NodeId, SegmentId};
use thiserror::Error;

use crate::LightColor;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SignalError {
    #[error("junction {0} has no signal program")]
    UnknownJunction(NodeId),

    #[error("segment {segment} is not part of the signal at {node}")]
    UnknownSegment { node: NodeId, segment: SegmentId },

    #[error("a timed program needs at least one step")]
    EmptyProgram,

    #[error("step {index} is invalid: {reason}")]
    InvalidStep { index: usize, reason: &'static str },

    #[error("step index {index} out of range for a program of {len} steps")]
    StepOutOfRange { index: usize, len: usize },

    #[error("junction {0} does not run a timed program")]
    NotTimed(NodeId),

    #[error("junction {0} is not in manual mode")]
    NotManual(NodeId),

    #[error("{0:?} is a transition state and cannot be set directly")]
    TransitionalColor(LightColor),
}

pub type SignalResult<T> = Result<T, SignalError>;
