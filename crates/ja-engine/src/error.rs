use ja_core::CoreError;
use ja_network::NetworkError;
use ja_registry::MovementKey;
use ja_signal::SignalError;
use thiserror::Error;

/// Errors from engine construction and configuration edits.  The per-tick
/// entry points never return one.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    #[error("signal error: {0}")]
    Signal(#[from] SignalError),

    #[error("segment {} does not meet junction {}", .0.segment, .0.node)]
    NotAnApproach(MovementKey),
}

pub type EngineResult<T> = Result<T, EngineError>;
