use std::sync::Arc;

use crate::configuration::{
    EnvelopeConfig,
    CURSOR_SPEED_TOLERANCE
};
use crate::envelope::cmpoperator::CmpOperator;
use crate::envelope::direction::Direction;
use crate::envelope::envelope::{
    Envelope,
    SliceBound
};
use crate::envelope::envelopecursor::{
    EnvelopeCursor,
    NextStepResult
};
use crate::envelope::envelopephysics::interpolate_step_time;
use crate::envelope::overlay::overlaysplice::OverlaySplice;
use crate::envelope::overlay::overlaytip::{
    OverlayTip,
    TipOutcome
};
use crate::envelope::part::envelopeattrs::EnvelopeAttrs;
use crate::envelope::part::envelopepartbuilder::{
    EnvelopePartBuilder,
    EnvelopePartConsumer
};

struct ActiveOverlay {
    builder: EnvelopePartBuilder,
    tip: OverlayTip
}

impl ActiveOverlay {
    fn push(&mut self, position: f64, speed: f64, time_delta: f64) {
        self.builder.add_step_with_time(position, speed, time_delta);
        self.tip = OverlayTip::new(position, speed);
    }
}

enum OverlayMode {
    Scanning,
    Overlaying(ActiveOverlay),
    /// An overlay reached the end of the base envelope.
    Complete
}

/// Draws overlays over a base envelope, in a single pass along a direction.
///
/// Each overlay starts on or under the base curve, and is fed step by step
/// until it crosses the base curve again. The result is the base envelope,
/// with every overlaid range replaced by its overlay.
pub struct EnvelopeOverlayBuilder<'a> {
    cursor: EnvelopeCursor<'a>,
    mode: OverlayMode,
    splice: OverlaySplice
}

impl<'a> EnvelopeOverlayBuilder<'a> {
    pub fn new(base: &'a Envelope, direction: Direction) -> EnvelopeOverlayBuilder<'a> {
        EnvelopeOverlayBuilder::with_config(base, direction, &EnvelopeConfig::default())
    }

    pub fn with_config(base: &'a Envelope, direction: Direction, config: &EnvelopeConfig) -> EnvelopeOverlayBuilder<'a> {
        EnvelopeOverlayBuilder {
            cursor: EnvelopeCursor::new(base, direction),
            mode: OverlayMode::Scanning,
            splice: OverlaySplice::new(direction, config)
        }
    }

    pub fn forward(base: &'a Envelope) -> EnvelopeOverlayBuilder<'a> {
        EnvelopeOverlayBuilder::new(base, Direction::Forward)
    }

    pub fn backward(base: &'a Envelope) -> EnvelopeOverlayBuilder<'a> {
        EnvelopeOverlayBuilder::new(base, Direction::Backward)
    }

    pub fn cursor(&self) -> &EnvelopeCursor<'a> {
        &self.cursor
    }

    pub fn is_overlaying(&self) -> bool {
        matches!(self.mode, OverlayMode::Overlaying(_))
    }

    /// Whether an overlay ran until the end of the base envelope.
    pub fn is_complete(&self) -> bool {
        matches!(self.mode, OverlayMode::Complete)
    }

    fn start_overlay(&mut self, attrs: Arc<EnvelopeAttrs>, start_position: f64, start_speed: Option<f64>) -> f64 {
        assert!(!self.is_overlaying(), "an overlay is already in progress");
        assert!(!self.is_complete(), "the base envelope was already fully overlaid");
        assert!(
            self.cursor.find_position(start_position),
            "overlay start {} is outside of the base envelope",
            start_position
        );
        let speed = start_speed.unwrap_or_else(|| self.cursor.interpolate_speed());
        self.splice.copy_base(&self.cursor, Some(speed));

        // the first overlay step must be checked against the base step after the start
        if self.cursor.position() == self.cursor.step_end_pos() {
            let starts_discontinuity = self.cursor.starts_discontinuity();
            let next = self.cursor.next_step();
            assert!(next != NextStepResult::ReachedEnd, "cannot start an overlay at the end of the base envelope");
            if start_speed.is_none() && starts_discontinuity {
                debug_assert!(
                    speed < self.cursor.step_begin_speed(),
                    "a continuous overlay must start below the next base part"
                );
            }
        }
        if (self.cursor.interpolate_speed() - speed).abs() <= CURSOR_SPEED_TOLERANCE {
            self.cursor.force_speed(speed);
        }

        tracing::debug!(position = start_position, speed, "starting overlay");
        self.mode = OverlayMode::Overlaying(ActiveOverlay {
            builder: EnvelopePartBuilder::starting_at(attrs, start_position, speed, self.cursor.direction()),
            tip: OverlayTip::new(start_position, speed)
        });
        speed
    }

    /// Starts an overlay at the base curve speed, and returns that speed.
    pub fn start_continuous_overlay(
        &mut self,
        attrs: Arc<EnvelopeAttrs>,
        physically_accurate: bool,
        start_position: f64
    ) -> f64 {
        let attrs = if attrs.physically_accurate() == physically_accurate {
            attrs
        } else {
            Arc::new(attrs.as_ref().clone().with_physically_accurate(physically_accurate))
        };
        self.start_overlay(attrs, start_position, None)
    }

    /// Starts an overlay at a speed which may be below the base curve.
    pub fn start_discontinuous_overlay(&mut self, attrs: Arc<EnvelopeAttrs>, start_position: f64, start_speed: f64) {
        self.start_overlay(attrs, start_position, Some(start_speed));
    }

    fn active_overlay(&mut self) -> &mut ActiveOverlay {
        match &mut self.mode {
            OverlayMode::Overlaying(active) => active,
            _ => panic!("no overlay is in progress")
        }
    }

    /// Adds a step to the overlay. Returns true when the overlay met the base
    /// curve, in which case it was completed.
    pub fn add_step(&mut self, position: f64, speed: f64) -> bool {
        let tip = self.active_overlay().tip;
        let time_delta = interpolate_step_time(tip.last_pos, position, tip.last_speed, speed, position - tip.last_pos);
        self.add_step_with_time(position, speed, time_delta)
    }

    pub fn add_step_with_time(&mut self, position: f64, speed: f64, time_delta: f64) -> bool {
        let active = match &mut self.mode {
            OverlayMode::Overlaying(active) => active,
            _ => panic!("no overlay is in progress")
        };
        match active.tip.advance(&mut self.cursor, position, speed, time_delta) {
            TipOutcome::Continue => {
                active.push(position, speed, time_delta);
                false
            },
            TipOutcome::Stop { step, .. } => {
                if let Some(step) = step {
                    active.push(step.position, step.speed, step.time_delta);
                }
                self.complete_overlay();
                true
            }
        }
    }

    /// Holds the overlay speed until the base curve goes under it, or the
    /// base envelope ends. Completes the overlay, and returns where it ended.
    pub fn add_plateau(&mut self) -> f64 {
        let tip = self.active_overlay().tip;
        assert!(tip.last_speed > 0.0, "a plateau needs a positive speed");
        let found = self.cursor.find_position(tip.last_pos);
        debug_assert!(found, "the overlay left the base envelope");
        let end = if self.cursor.find_speed(tip.last_speed, CmpOperator::StrictlyLower) {
            self.cursor.position()
        } else {
            self.cursor.envelope_end_pos()
        };
        if self.cursor.compare_pos(end, tip.last_pos) > 0.0 {
            let time_delta = ((end - tip.last_pos) / tip.last_speed).abs();
            self.active_overlay().push(end, tip.last_speed, time_delta);
        }
        self.complete_overlay();
        end
    }

    fn complete_overlay(&mut self) {
        let active = match std::mem::replace(&mut self.mode, OverlayMode::Scanning) {
            OverlayMode::Overlaying(active) => active,
            _ => panic!("no overlay is in progress")
        };
        let tip = active.tip;
        match active.builder.try_build() {
            Some(part) => self.splice.add_overlay(Arc::new(part)),
            None => tracing::debug!(position = tip.last_pos, "dropping empty overlay")
        }
        if self.cursor.has_reached_end() {
            self.mode = OverlayMode::Complete;
            self.splice.resume_at(None);
        } else {
            let bound = SliceBound::new(self.cursor.part_index(), self.cursor.step_index(), tip.last_pos);
            self.splice.resume_at(Some((bound, tip.last_speed)));
        }
        tracing::debug!(position = tip.last_pos, complete = self.is_complete(), "overlay completed");
    }

    /// Copies the rest of the base curve, and builds the overlaid envelope.
    pub fn build(mut self) -> Envelope {
        assert!(!self.is_overlaying(), "an overlay is still in progress");
        if !self.is_complete() {
            self.cursor.move_to_end();
            self.splice.copy_base(&self.cursor, None);
        }
        self.splice.build()
    }
}
