//! Engine configuration.
//!
//! Typically deserialized by the host from its own settings file (with the
//! `serde` feature) and handed to the engine builder.  Every field has a
//! default matching the reference game behavior.

use std::ops::Range;

use crate::{CoreError, CoreResult};

/// Which side of the road vehicles drive on.  Decides the right-of-way side
/// between two non-priority approaches and the lane layout used by the turn
/// conflict geometry.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TrafficSide {
    #[default]
    Right,
    Left,
}

/// Top-level arbitration configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,

    /// Size of the vehicle table.  Vehicle ids must be below this value.
    pub max_vehicles: usize,

    /// Ticks a vehicle may spend in `Stop` before it is let through
    /// regardless of conflicting traffic.
    pub wait_timeout_ticks: u32,

    /// Speed below which a waiting vehicle counts as stopped.
    pub stop_speed_threshold: f32,

    /// Range the per-registration yield speed reduction is drawn from.
    pub yield_speed_reduction: Range<f32>,

    /// Fraction of the current speed allowed when a green movement still has
    /// conflicting traffic.
    pub caution_factor: f32,

    /// A registered vehicle counts as approaching only if the tracker saw it
    /// within this many ticks.
    pub incoming_recency_ticks: u64,

    /// Tracking entries not refreshed for this many ticks are dropped by the
    /// housekeeping sweep.
    pub stale_after_ticks: u64,

    /// Length of the red-to-green changeover.
    pub red_to_green_ticks: u64,

    /// Length of the green-to-red changeover.
    pub green_to_red_ticks: u64,

    /// Weight of waiting vehicles against flowing ones in the default step
    /// change metric.
    pub wait_flow_balance: f32,

    pub traffic_side: TrafficSide,

    /// Turns deviating less than this many degrees from straight ahead are
    /// classified as straight.
    pub straight_tolerance_deg: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed:                   0,
            max_vehicles:           16_384,
            wait_timeout_ticks:     30,
            stop_speed_threshold:   0.5,
            yield_speed_reduction:  13.0..18.0,
            caution_factor:         0.3,
            incoming_recency_ticks: 256,
            stale_after_ticks:      1_024,
            red_to_green_ticks:     60,
            green_to_red_ticks:     30,
            wait_flow_balance:      0.8,
            traffic_side:           TrafficSide::Right,
            straight_tolerance_deg: 30.0,
        }
    }
}

impl EngineConfig {
    /// Reject values that would make the arbitration logic meaningless.
    pub fn validate(&self) -> CoreResult<()> {
        if self.max_vehicles == 0 || self.max_vehicles > u32::MAX as usize {
            return Err(CoreError::Config(format!(
                "max_vehicles must be in 1..={}, got {}",
                u32::MAX,
                self.max_vehicles
            )));
        }
        if self.wait_timeout_ticks == 0 {
            return Err(CoreError::Config("wait_timeout_ticks must be positive".into()));
        }
        let r = &self.yield_speed_reduction;
        if !(r.start.is_finite() && r.end.is_finite()) || r.start < 0.0 || r.start >= r.end {
            return Err(CoreError::Config(format!(
                "yield_speed_reduction must be a non-empty non-negative range, got {r:?}"
            )));
        }
        if !(0.0..=1.0).contains(&self.caution_factor) {
            return Err(CoreError::Config(format!(
                "caution_factor must be in [0, 1], got {}",
                self.caution_factor
            )));
        }
        if self.stop_speed_threshold < 0.0 || self.wait_flow_balance < 0.0 {
            return Err(CoreError::Config(
                "stop_speed_threshold and wait_flow_balance must be non-negative".into(),
            ));
        }
        if !(0.0..90.0).contains(&self.straight_tolerance_deg) {
            return Err(CoreError::Config(format!(
                "straight_tolerance_deg must be in [0, 90), got {}",
                self.straight_tolerance_deg
            )));
        }
        Ok(())
    }
}
