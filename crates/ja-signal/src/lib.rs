//! `ja-signal`: custom traffic signals.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                    |
//! |-----------------|-------------------------------------------------------------|
//! | [`light`]       | `LightColor`, `MovementGroup`, `SegmentLights`, `StepSignal` |
//! | [`phase`]       | `SignalPhase`: immutable published snapshot                |
//! | [`timed`]       | `TimedProgram`, `Step`, `ChangeMetric`, `StepChange`        |
//! | [`manual`]      | `ManualSignal`                                              |
//! | [`controller`]  | `SignalController`, `SignalDefinition`                      |
//! | [`error`]       | `SignalError`, `SignalResult<T>`                            |
//!
//! # Reading lights
//!
//! Every junction with a program publishes an `Arc<SignalPhase>`.  A junction
//! without one, or whose timed program is stopped, reads green everywhere:
//!
//! ```text
//! light(node, segment, group)  = phase(node).light(segment, group)  or Green
//! ```
//!
//! After a step change a group that turns green shows `RedToGreen` for
//! `red_to_green_ticks`, and a group that turns red shows `GreenToRed` for
//! `green_to_red_ticks`.

pub mod controller;
pub mod error;
pub mod light;
pub mod manual;
pub mod phase;
pub mod timed;


pub use controller::{SignalController, SignalDefinition};
pub use error::{SignalError, SignalResult};
pub use light::{LightColor, MovementGroup, SegmentLights, StepSignal};
pub use manual::ManualSignal;
pub use phase::SignalPhase;
pub use timed::{ChangeMetric, FlowWaitSample, PhaseTiming, Step, StepChange, TimedProgram};
