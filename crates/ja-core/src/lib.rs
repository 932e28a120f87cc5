//! `ja-core`: foundational types for the junction arbitration engine.
//!
//! This crate is a dependency of every other `ja-*` crate.  It intentionally
//! has no `ja-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `VehicleId`, `NodeId`, `SegmentId`, `LaneId`          |
//! | [`geo`]         | `Point`, planar bearings                              |
//! | [`time`]        | `Tick`                                                |
//! | [`config`]      | `EngineConfig`, `TrafficSide`                         |
//! | [`rng`]         | `VehicleRng` (per-vehicle)                            |
//! | [`vehicle`]     | `VehicleKind` enum                                    |
//! | [`error`]       | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |
//!           | Required by `ja-engine` snapshots.                         |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;
pub mod vehicle;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{EngineConfig, TrafficSide};
pub use error::{CoreError, CoreResult};
pub use geo::Point;
pub use ids::{LaneId, NodeId, SegmentId, VehicleId};
pub use rng::VehicleRng;
pub use time::Tick;
pub use vehicle::VehicleKind;
