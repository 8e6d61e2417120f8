use std::sync::Arc;

use crate::envelope::envelope::SliceBound;
use crate::envelope::envelopecursor::{
    EnvelopeCursor,
    NextStepResult
};
use crate::envelope::envelopephysics::interpolate_step_time;
use crate::envelope::overlay::overlaytip::{
    OverlayTip,
    TipOutcome
};
use crate::envelope::part::envelopeattrs::EnvelopeAttrs;
use crate::envelope::part::envelopepart::EnvelopePart;
use crate::envelope::part::envelopepartbuilder::{
    EnvelopePartBuilder,
    EnvelopePartConsumer
};

/// Builds a single overlay part, starting from a cursor on a base envelope.
///
/// Steps are checked against the base curve. Once the overlay meets the base
/// curve, it stops there and the cursor is left at the meeting point. The
/// caller then stitches the part into an envelope, for example with an
/// `OverlayEnvelopeBuilder`.
pub struct OverlayEnvelopePartBuilder<'c, 'a> {
    cursor: &'c mut EnvelopeCursor<'a>,
    part_builder: EnvelopePartBuilder,
    tip: OverlayTip,
    initial_bound: SliceBound,
    had_intersection: bool,
    complete: bool
}

impl<'c, 'a> OverlayEnvelopePartBuilder<'c, 'a> {
    fn start(cursor: &'c mut EnvelopeCursor<'a>, attrs: Arc<EnvelopeAttrs>, speed: f64) -> OverlayEnvelopePartBuilder<'c, 'a> {
        let initial_bound = cursor.bound();
        let position = initial_bound.position;
        if cursor.position() == cursor.step_end_pos() {
            let next = cursor.next_step();
            assert!(next != NextStepResult::ReachedEnd, "cannot start an overlay at the end of the base envelope");
        }
        let direction = cursor.direction();
        OverlayEnvelopePartBuilder {
            cursor: cursor,
            part_builder: EnvelopePartBuilder::starting_at(attrs, position, speed, direction),
            tip: OverlayTip::new(position, speed),
            initial_bound: initial_bound,
            had_intersection: false,
            complete: false
        }
    }

    /// Starts at the cursor position, at the base curve speed.
    pub fn start_continuous_overlay(cursor: &'c mut EnvelopeCursor<'a>, attrs: Arc<EnvelopeAttrs>) -> OverlayEnvelopePartBuilder<'c, 'a> {
        let speed = cursor.interpolate_speed();
        OverlayEnvelopePartBuilder::start(cursor, attrs, speed)
    }

    /// Starts at the cursor position, at a speed no greater than the base curve.
    pub fn start_discontinuous_overlay(
        cursor: &'c mut EnvelopeCursor<'a>,
        attrs: Arc<EnvelopeAttrs>,
        initial_speed: f64
    ) -> OverlayEnvelopePartBuilder<'c, 'a> {
        debug_assert!(
            initial_speed <= cursor.interpolate_speed(),
            "an overlay cannot start above the base curve"
        );
        OverlayEnvelopePartBuilder::start(cursor, attrs, initial_speed)
    }

    pub fn last_pos(&self) -> f64 {
        self.tip.last_pos
    }

    pub fn last_speed(&self) -> f64 {
        self.tip.last_speed
    }

    /// Where the overlay started on the base envelope.
    pub fn initial_bound(&self) -> SliceBound {
        self.initial_bound
    }

    /// Whether the overlay stopped by crossing the base curve.
    pub fn had_intersection(&self) -> bool {
        self.had_intersection
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Returns true when the overlay met the base curve and stopped.
    pub fn add_step(&mut self, position: f64, speed: f64) -> bool {
        let time_delta = interpolate_step_time(self.tip.last_pos, position, self.tip.last_speed, speed, position - self.tip.last_pos);
        self.add_step_with_time(position, speed, time_delta)
    }

    pub fn add_step_with_time(&mut self, position: f64, speed: f64, time_delta: f64) -> bool {
        assert!(!self.complete, "the overlay already stopped");
        match self.tip.advance(self.cursor, position, speed, time_delta) {
            TipOutcome::Continue => {
                self.push(position, speed, time_delta);
                false
            },
            TipOutcome::Stop { step, intersection } => {
                if let Some(step) = step {
                    self.push(step.position, step.speed, step.time_delta);
                }
                if !self.cursor.has_reached_end() {
                    self.cursor.find_position(self.tip.last_pos);
                }
                self.had_intersection = intersection;
                self.complete = true;
                true
            }
        }
    }

    fn push(&mut self, position: f64, speed: f64, time_delta: f64) {
        self.part_builder.add_step_with_time(position, speed, time_delta);
        self.tip = OverlayTip::new(position, speed);
    }

    pub fn build(self) -> Option<EnvelopePart> {
        self.part_builder.try_build()
    }
}
