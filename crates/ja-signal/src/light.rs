//! Light colors, movement groups and per-segment light sets.

use ja_network::TurnDirection;

use crate::{SignalError, SignalResult};

/// A signal head's state.
///
/// Steady state cycles `Red → RedToGreen → Green → GreenToRed → Red`.  The
/// two transition states are shown for a fixed number of ticks after a step
/// change; vehicles treat them as blocked (a committed vehicle may still
/// clear on `GreenToRed`).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LightColor {
    #[default]
    Red,
    RedToGreen,
    Green,
    GreenToRed,
}

impl LightColor {
    #[inline]
    pub fn is_green(self) -> bool {
        self == LightColor::Green
    }

    /// `true` for the two steady colors a program may set.
    #[inline]
    pub fn is_settled(self) -> bool {
        matches!(self, LightColor::Red | LightColor::Green)
    }

    /// The opposite steady color.
    #[inline]
    pub fn flipped(self) -> LightColor {
        if self.is_green() { LightColor::Red } else { LightColor::Green }
    }

    pub(crate) fn settled(self) -> SignalResult<LightColor> {
        if self.is_settled() { Ok(self) } else { Err(SignalError::TransitionalColor(self)) }
    }
}

/// Which signal head of a segment a movement obeys.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MovementGroup {
    Left,
    Main,
    Right,
}

impl MovementGroup {
    pub const ALL: [MovementGroup; 3] = [MovementGroup::Left, MovementGroup::Main, MovementGroup::Right];

    /// Group for a turn.  Straight, U-turn and unknown turns use `Main`.
    pub fn from_turn(turn: Option<TurnDirection>) -> Self {
        match turn {
            Some(TurnDirection::Left)  => MovementGroup::Left,
            Some(TurnDirection::Right) => MovementGroup::Right,
            _                          => MovementGroup::Main,
        }
    }
}

/// The lights facing one incoming segment.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SegmentLights {
    pub left:       LightColor,
    pub main:       LightColor,
    pub right:      LightColor,
    pub pedestrian: LightColor,
}

impl Default for SegmentLights {
    /// Vehicles held, pedestrians crossing.
    fn default() -> Self {
        Self::vehicles(LightColor::Red)
    }
}

impl SegmentLights {
    /// All vehicle groups set to `color`; the pedestrian light opposite.
    pub fn vehicles(color: LightColor) -> Self {
        let pedestrian = if color == LightColor::Red { LightColor::Green } else { LightColor::Red };
        Self { left: color, main: color, right: color, pedestrian }
    }

    #[inline]
    pub fn get(&self, group: MovementGroup) -> LightColor {
        match group {
            MovementGroup::Left  => self.left,
            MovementGroup::Main  => self.main,
            MovementGroup::Right => self.right,
        }
    }

    #[inline]
    pub fn set(&mut self, group: MovementGroup, color: LightColor) {
        match group {
            MovementGroup::Left  => self.left = color,
            MovementGroup::Main  => self.main = color,
            MovementGroup::Right => self.right = color,
        }
    }

    /// `true` if every vehicle group is red.
    pub fn all_vehicles_red(&self) -> bool {
        MovementGroup::ALL.iter().all(|&g| self.get(g) == LightColor::Red)
    }

    /// `true` if any vehicle group shows green.
    pub fn any_vehicle_green(&self) -> bool {
        MovementGroup::ALL.iter().any(|&g| self.get(g).is_green())
    }
}

/// One segment's entry in a timed step: steady colors per vehicle group and
/// an optional explicit pedestrian light.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepSignal {
    pub left:  LightColor,
    pub main:  LightColor,
    pub right: LightColor,
    /// `None`: green exactly when all vehicle groups are red.
    pub pedestrian: Option<LightColor>,
}

impl StepSignal {
    /// Every vehicle group set to `color`, automatic pedestrian light.
    pub fn all(color: LightColor) -> Self {
        Self { left: color, main: color, right: color, pedestrian: None }
    }

    pub fn green() -> Self {
        Self::all(LightColor::Green)
    }

    pub fn red() -> Self {
        Self::all(LightColor::Red)
    }

    pub fn with(mut self, group: MovementGroup, color: LightColor) -> Self {
        match group {
            MovementGroup::Left  => self.left = color,
            MovementGroup::Main  => self.main = color,
            MovementGroup::Right => self.right = color,
        }
        self
    }

    pub fn with_pedestrian(mut self, color: LightColor) -> Self {
        self.pedestrian = Some(color);
        self
    }

    /// `true` if every color is steady.
    pub fn is_settled(&self) -> bool {
        [self.left, self.main, self.right].iter().all(|c| c.is_settled())
            && self.pedestrian.is_none_or(LightColor::is_settled)
    }

    /// Resolve into concrete lights (pedestrian rule applied).
    pub fn resolve(&self) -> SegmentLights {
        let mut lights = SegmentLights {
            left:       self.left,
            main:       self.main,
            right:      self.right,
            pedestrian: LightColor::Red,
        };
        lights.pedestrian = self.pedestrian.unwrap_or(if lights.all_vehicles_red() {
            LightColor::Green
        } else {
            LightColor::Red
        });
        lights
    }
}

/// Blend a step change into a single light: `prev` and `next` are steady
/// colors, `elapsed` is the ticks since the change.
pub(crate) fn transition(
    prev:         LightColor,
    next:         LightColor,
    elapsed:      u64,
    red_to_green: u64,
    green_to_red: u64,
) -> LightColor {
    match (prev.is_green(), next.is_green()) {
        (false, true) if elapsed < red_to_green => LightColor::RedToGreen,
        (true, false) if elapsed < green_to_red => LightColor::GreenToRed,
        _ => next,
    }
}
