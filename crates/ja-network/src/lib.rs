//! `ja-network`: read-only road network queries and junction geometry.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                    |
//! |--------------|-------------------------------------------------------------|
//! | [`accessor`] | `RoadNetworkAccessor` trait (the host's network view)       |
//! | [`network`]  | `RoadNetwork` (CSR adjacency), `RoadNetworkBuilder`         |
//! | [`geometry`] | `TurnGeometry`, `TurnDirection`, movement conflict test     |
//! | [`error`]    | `NetworkError`, `NetworkResult<T>`                          |
//!
//! The engine only ever talks to the network through [`RoadNetworkAccessor`],
//! so a host can expose its own segment/node buffers without copying them.
//! [`RoadNetwork`] is the in-memory implementation used by tests and demos.
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public types.           |

pub mod accessor;
pub mod error;
pub mod geometry;
pub mod network;

#[cfg(test)]
mod tests;

pub use accessor::RoadNetworkAccessor;
pub use error::{NetworkError, NetworkResult};
pub use geometry::{TurnDirection, TurnGeometry};
pub use network::{RoadNetwork, RoadNetworkBuilder};
