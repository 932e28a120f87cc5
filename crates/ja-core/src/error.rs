//! Core error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant via `From`.  Only configuration-time operations return errors; the
//! per-tick entry points recover locally and never surface one.

use thiserror::Error;

use crate::VehicleId;

/// The base error type for `ja-core` and a common variant for sub-crates.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("vehicle {vehicle} is outside the vehicle table (capacity {capacity})")]
    VehicleOutOfRange { vehicle: VehicleId, capacity: usize },

    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for `ja-core`.
pub type CoreResult<T> = Result<T, CoreError>;
