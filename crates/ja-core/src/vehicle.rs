//! Vehicle kind enum consumed by the arbitration decision.
//!
//! The host maps each of its vehicle AI variants onto one of these tags; the
//! decision logic branches on the tag instead of on per-kind behavior types.

/// What kind of vehicle is asking for a speed cap.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum VehicleKind {
    /// Private car (default).
    #[default]
    Car,
    Taxi,
    Bus,
    Tram,
    CargoTruck,
    /// Garbage, maintenance, post and other non-emergency city services.
    Service,
    /// Emergency vehicle responding with sirens on.  Ignores lights and signs
    /// but still slows down for conflicting traffic.
    Emergency,
}

impl VehicleKind {
    /// `true` if the vehicle may disregard signals and priority signs.
    #[inline]
    pub fn ignores_controls(self) -> bool {
        matches!(self, VehicleKind::Emergency)
    }

    /// Comfortable braking deceleration (speed units per tick²) used by the
    /// required-stopping-distance check when the host does not supply one.
    pub fn default_deceleration(self) -> f32 {
        match self {
            VehicleKind::Car | VehicleKind::Taxi => 0.5,
            VehicleKind::Emergency               => 0.6,
            VehicleKind::Service                 => 0.4,
            VehicleKind::Bus | VehicleKind::CargoTruck => 0.3,
            VehicleKind::Tram                    => 0.25,
        }
    }

    /// Human-readable label, useful in log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            VehicleKind::Car        => "car",
            VehicleKind::Taxi       => "taxi",
            VehicleKind::Bus        => "bus",
            VehicleKind::Tram       => "tram",
            VehicleKind::CargoTruck => "cargo_truck",
            VehicleKind::Service    => "service",
            VehicleKind::Emergency  => "emergency",
        }
    }
}

impl std::fmt::Display for VehicleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
