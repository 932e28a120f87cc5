//! Simulation time model.
//!
//! Time is a monotonically increasing `Tick` counter supplied by the host, one
//! per simulation step.  Every duration in the engine (wait caps, step bounds,
//! transition windows, staleness) is a plain tick count, so all arithmetic is
//! exact and comparisons are O(1).

use std::fmt;

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation tick counter.
///
/// Stored as `u64`; at 60 ticks per second it lasts ~9.7 billion years.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Ticks elapsed from `earlier` to `self`, or 0 if `earlier` is later.
    ///
    /// Saturates instead of panicking: the host may replay a tick after a
    /// load, and a stale timestamp must never abort the tick loop.
    #[inline]
    pub fn since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}
