//! `ja-arbiter`: how fast may this vehicle approach its junction?
//!
//! # Crate layout
//!
//! | Module       | Contents                                                      |
//! |--------------|---------------------------------------------------------------|
//! | [`request`]  | `SpeedCap`, `DecisionRequest`, `ApproachRequest`              |
//! | [`braking`]  | required-stopping-distance check                              |
//! | [`context`]  | `ArbitrationContext<'a, N>`: borrowed registry/signals/network |
//! | [`decision`] | `Arbiter`: signal rules and the priority state machine       |
//!
//! # Decision order
//!
//! 1. Unknown vehicle, or the vehicle already registered elsewhere:
//!    `Unrestricted`.
//! 2. Emergency vehicles skip lights and signs; they only slow down while
//!    conflicting traffic is approaching.
//! 3. Active signal: red and red-to-green stop; green-to-red stops unless the
//!    vehicle is already cleared; green lets it go, at a crawl if the movement
//!    also carries a priority sign and conflicting traffic is coming.
//! 4. Priority sign: the state machine in [`decision`].
//! 5. Anything else: `Unrestricted`.
//!
//! Decisions read other vehicles through the registry and write only the
//! deciding vehicle's own slot, so a batch can run on many threads.

pub mod braking;
pub mod context;
pub mod decision;
pub mod request;

#[cfg(test)]
mod tests;

pub use context::ArbitrationContext;
pub use decision::Arbiter;
pub use request::{ApproachRequest, DecisionRequest, SpeedCap};
