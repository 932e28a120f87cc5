//! `ja-engine`: the owned front door of the junction arbitration engine.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                   |
//! |---------------|------------------------------------------------------------|
//! | [`engine`]    | `JunctionArbitrationEngine`: tracking, decisions, signals  |
//! | [`builder`]   | `EngineBuilder`                                            |
//! | [`observer`]  | `EngineObserver` trait, `NoopObserver`                     |
//! | [`snapshot`]  | `EngineSnapshot`: priority signs and signal programs       |
//! | [`error`]     | `EngineError`, `EngineResult<T>`                           |
//!
//! # Per-tick flow
//!
//! ```text
//! ① Track:    track(vehicle, path, now) for vehicles due this tick; a
//!              vehicle crossing a timed junction adds to its step flow.
//! ② Decide:   speed_cap(request) for vehicles approaching a junction;
//!              decide(request) skips the braking-distance check.
//! ③ Signals:  advance_signals(now, observer) moves timed programs on.
//! ④ Sweep:    sweep(now, observer) every so often drops vehicles the
//!              tracker stopped seeing.
//! ```
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                     |
//! |------------|------------------------------------------------------------|
//! | `parallel` | Runs `track_batch`, `decide_batch` and `advance_signals`   |
//! |            | on Rayon's thread pool.                                    |
//! | `serde`    | `Serialize`/`Deserialize` for `EngineSnapshot`.            |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use ja_engine::{EngineBuilder, NoopObserver};
//!
//! let engine = EngineBuilder::new(network).build()?;
//! engine.set_priority_type(MovementKey::new(junction, side_road), Some(PriorityType::Stop))?;
//! engine.track(vehicle, &path, now);
//! let cap = engine.decide(&DecisionRequest::new(vehicle, key, speed, now));
//! engine.advance_signals(now, &mut NoopObserver);
//! ```

pub mod builder;
pub mod engine;
pub mod error;
pub mod observer;
pub mod snapshot;


pub use builder::EngineBuilder;
pub use engine::{JunctionArbitrationEngine, TrackInput};
pub use error::{EngineError, EngineResult};
pub use observer::{EngineObserver, NoopObserver};
pub use snapshot::EngineSnapshot;
