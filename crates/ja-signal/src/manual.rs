//! Manually operated signals.

use ja_core::SegmentId;

use crate::{LightColor, MovementGroup, SegmentLights, SignalPhase};

/// A junction whose lights only change when an operator changes them.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ManualSignal {
    /// Sorted by segment.
    lights: Vec<(SegmentId, SegmentLights)>,
}

impl ManualSignal {
    /// Every listed segment starts with vehicles held and pedestrians
    /// crossing.
    pub fn new(segments: &[SegmentId]) -> Self {
        Self::from_lights(segments.iter().map(|&s| (s, SegmentLights::default())).collect())
    }

    pub fn from_lights(mut lights: Vec<(SegmentId, SegmentLights)>) -> Self {
        lights.sort_unstable_by_key(|(s, _)| *s);
        lights.dedup_by_key(|(s, _)| *s);
        Self { lights }
    }

    pub fn lights(&self) -> &[(SegmentId, SegmentLights)] {
        &self.lights
    }

    fn entry(&mut self, segment: SegmentId) -> Option<&mut SegmentLights> {
        let i = self.lights.binary_search_by_key(&segment, |(s, _)| *s).ok()?;
        Some(&mut self.lights[i].1)
    }

    /// Flip the segment's vehicle groups between red and green; pedestrians
    /// get the opposite.  `None` for unknown segments.
    pub fn toggle(&mut self, segment: SegmentId) -> Option<SegmentLights> {
        let lights = self.entry(segment)?;
        *lights = SegmentLights::vehicles(lights.main.flipped());
        Some(*lights)
    }

    pub fn set_light(
        &mut self,
        segment: SegmentId,
        group:   MovementGroup,
        color:   LightColor,
    ) -> Option<SegmentLights> {
        let lights = self.entry(segment)?;
        lights.set(group, color);
        Some(*lights)
    }

    pub fn set_pedestrian(&mut self, segment: SegmentId, color: LightColor) -> Option<SegmentLights> {
        let lights = self.entry(segment)?;
        lights.pedestrian = color;
        Some(*lights)
    }

    pub fn phase(&self) -> SignalPhase {
        SignalPhase::from_lights(self.lights.clone())
    }
}
