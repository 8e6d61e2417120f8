use std::sync::Arc;

use crate::configuration::EnvelopeConfig;
use crate::envelope::builder::envelopebuilder::EnvelopeBuilder;
use crate::envelope::direction::Direction;
use crate::envelope::envelope::{
    Envelope,
    SliceBound
};
use crate::envelope::envelopecursor::EnvelopeCursor;
use crate::envelope::part::envelopepart::EnvelopePart;

/// Output of an overlay pass: base curve ranges interleaved with overlay parts.
///
/// The base curve is copied from the end of the last overlay up to the cursor.
/// Where a base edge meets an overlay edge at a speed only differing by
/// rounding, the overlay speed is forced onto the base edge.
pub(crate) struct OverlaySplice {
    seam_speed_tolerance: f64,
    /// where the base curve resumes after the last overlay, with the overlay end speed
    last_overlay_end: Option<(SliceBound, f64)>,
    result: EnvelopeBuilder
}

impl OverlaySplice {
    pub(crate) fn new(direction: Direction, config: &EnvelopeConfig) -> OverlaySplice {
        let result = if direction.is_reverse() { EnvelopeBuilder::reversed() } else { EnvelopeBuilder::new() };
        OverlaySplice {
            seam_speed_tolerance: config.seam_speed_tolerance(),
            last_overlay_end: None,
            result: result
        }
    }

    fn seam_speed(&self, base: &Envelope, bound: SliceBound, overlay_speed: f64) -> Option<f64> {
        let base_speed = base
            .get(bound.part_index)
            .interpolate_speed_in_step(bound.step_index, bound.position);
        let matches = (base_speed - overlay_speed).abs() <= self.seam_speed_tolerance;
        matches.then_some(overlay_speed)
    }

    /// Copies the base curve up to the cursor, or to the end of the base
    /// envelope once the cursor reached it.
    pub(crate) fn copy_base(&mut self, cursor: &EnvelopeCursor<'_>, overlay_start_speed: Option<f64>) {
        let base = cursor.envelope();
        let to = if cursor.has_reached_end() { None } else { Some(cursor.bound()) };
        let (from, from_speed) = match self.last_overlay_end {
            Some((bound, speed)) => (Some(bound), self.seam_speed(base, bound, speed)),
            None => (None, None)
        };
        let to_speed = match (to, overlay_start_speed) {
            (Some(bound), Some(speed)) => self.seam_speed(base, bound, speed),
            _ => None
        };
        let parts = cursor.slice_between(from, from_speed, to, to_speed);
        if cursor.is_reverse() {
            self.result.add_parts(parts.into_iter().rev());
        } else {
            self.result.add_parts(parts);
        }
    }

    pub(crate) fn add_overlay(&mut self, part: Arc<EnvelopePart>) {
        self.result.add_part(part);
    }

    /// Where the base curve resumes, `None` when the overlay reached the end of the base envelope.
    pub(crate) fn resume_at(&mut self, overlay_end: Option<(SliceBound, f64)>) {
        self.last_overlay_end = overlay_end;
    }

    pub(crate) fn build(self) -> Envelope {
        self.result.build()
    }
}
