use std::sync::Arc;

use crate::envelope::direction::Direction;
use crate::envelope::envelopephysics::interpolate_step_time;
use crate::envelope::part::constraints::envelopepartconstraint::EnvelopePartConstraint;
use crate::envelope::part::envelopeattrs::EnvelopeAttrs;
use crate::envelope::part::envelopepartbuilder::EnvelopePartConsumer;

/// Forwards steps to a consumer, until one of the constraints is hit.
///
/// A step crossing a constraint is cut at the crossing, and the builder
/// refuses any further step.
pub struct ConstrainedEnvelopePartBuilder<'a, S: EnvelopePartConsumer> {
    sink: S,
    constraints: Vec<Box<dyn EnvelopePartConstraint + 'a>>,
    direction: Direction,
    last_pos: f64,
    last_speed: f64,
    last_intersection: Option<usize>
}

impl<'a, S: EnvelopePartConsumer> ConstrainedEnvelopePartBuilder<'a, S> {
    pub fn new(sink: S, constraints: Vec<Box<dyn EnvelopePartConstraint + 'a>>) -> ConstrainedEnvelopePartBuilder<'a, S> {
        ConstrainedEnvelopePartBuilder {
            sink: sink,
            constraints: constraints,
            direction: Direction::Forward,
            last_pos: f64::NAN,
            last_speed: f64::NAN,
            last_intersection: None
        }
    }

    pub fn set_attrs(&mut self, attrs: Arc<EnvelopeAttrs>) {
        self.sink.set_attrs(attrs);
    }

    /// Starts the part, unless the starting point already breaks a constraint.
    pub fn init_envelope_part(&mut self, position: f64, speed: f64, direction: Direction) -> bool {
        if let Some(index) = self
            .constraints
            .iter()
            .position(|constraint| !constraint.init_check(position, speed, direction))
        {
            self.last_intersection = Some(index);
            return false;
        }
        self.direction = direction;
        self.last_pos = position;
        self.last_speed = speed;
        self.sink.init_envelope_part(position, speed, direction);
        true
    }

    /// Returns false when the step was cut short by a constraint.
    pub fn add_step(&mut self, position: f64, speed: f64) -> bool {
        self.add_step_impl(position, speed, None)
    }

    pub fn add_step_with_time(&mut self, position: f64, speed: f64, time_delta: f64) -> bool {
        self.add_step_impl(position, speed, Some(time_delta))
    }

    fn add_step_impl(&mut self, position: f64, speed: f64, time_delta: Option<f64>) -> bool {
        assert!(self.last_intersection.is_none(), "a constraint was already hit");
        let mut position = position;
        let mut speed = speed;
        for (index, constraint) in self.constraints.iter().enumerate() {
            if let Some(cut) = constraint.step_check(self.last_pos, self.last_speed, position, speed) {
                position = cut.position();
                speed = cut.speed();
                self.last_intersection = Some(index);
            }
        }

        if self.direction.compare_pos(position, self.last_pos) > 0.0 {
            let time_delta = match (self.last_intersection, time_delta) {
                (None, Some(time_delta)) => time_delta,
                _ => interpolate_step_time(self.last_pos, position, self.last_speed, speed, position - self.last_pos)
            };
            self.sink.add_step_with_time(position, speed, time_delta);
            self.last_pos = position;
            self.last_speed = speed;
        }
        self.last_intersection.is_none()
    }

    pub fn last_pos(&self) -> f64 {
        self.last_pos
    }

    pub fn last_speed(&self) -> f64 {
        self.last_speed
    }

    /// Index of the constraint which stopped the part, if any.
    pub fn last_intersection(&self) -> Option<usize> {
        self.last_intersection
    }

    pub fn into_inner(self) -> S {
        self.sink
    }
}
