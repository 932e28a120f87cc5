//! Published signal phases.

use ja_core::SegmentId;

use crate::{LightColor, MovementGroup, SegmentLights};

/// Immutable snapshot of every light at one junction.
///
/// The controller swaps a fresh `Arc<SignalPhase>` in whenever a light
/// changes; readers clone the `Arc` and never see a half-updated junction.
/// Segments without an entry are unsignalled and read `Green`.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SignalPhase {
    /// Sorted by segment.
    segments: Vec<(SegmentId, SegmentLights)>,
}

impl SignalPhase {
    /// The phase of an uncontrolled junction.
    pub fn uncontrolled() -> Self {
        Self::default()
    }

    pub fn from_lights(mut segments: Vec<(SegmentId, SegmentLights)>) -> Self {
        segments.sort_unstable_by_key(|(s, _)| *s);
        segments.dedup_by_key(|(s, _)| *s);
        Self { segments }
    }

    #[inline]
    pub fn is_uncontrolled(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn lights(&self, segment: SegmentId) -> Option<SegmentLights> {
        self.segments
            .binary_search_by_key(&segment, |(s, _)| *s)
            .ok()
            .map(|i| self.segments[i].1)
    }

    pub fn light(&self, segment: SegmentId, group: MovementGroup) -> LightColor {
        self.lights(segment).map_or(LightColor::Green, |l| l.get(group))
    }

    pub fn pedestrian(&self, segment: SegmentId) -> LightColor {
        self.lights(segment).map_or(LightColor::Green, |l| l.pedestrian)
    }

    pub fn segments(&self) -> impl Iterator<Item = (SegmentId, SegmentLights)> + '_ {
        self.segments.iter().copied()
    }
}
