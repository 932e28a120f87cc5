//! `ja-tracker`: keeps the registry in step with where vehicles are going.
//!
//! # Crate layout
//!
//! | Module       | Contents                                               |
//! |--------------|--------------------------------------------------------|
//! | [`path`]     | `PathPosition`: one host path element                 |
//! | [`tracker`]  | `RouteTracker`, `TrackOutcome`                         |
//!
//! # Tracking model
//!
//! The host calls [`RouteTracker::track`] with the first few positions of a
//! vehicle's path whenever its level-of-detail cadence says so:
//!
//! 1. The first position gives the current segment and lane; its offset picks
//!    the junction the vehicle is driving towards.
//! 2. The second position (if valid) gives the segment and lane taken after
//!    that junction.
//! 3. The third position (if valid) lets the tracker pre-register the vehicle
//!    on the *next* junction's movement, but only when that junction runs a
//!    timed signal program, so the program can count approaching traffic.
//!
//! When the primary movement changes the vehicle is moved between movement
//! sets and its decision state starts over.  Bad path data never fails: the
//! lookahead is cut short and a debug line is logged.

pub mod path;
pub mod tracker;


pub use path::PathPosition;
pub use tracker::{RouteTracker, TrackOutcome};
