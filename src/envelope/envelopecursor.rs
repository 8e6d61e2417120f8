use std::sync::Arc;

use crate::configuration::CURSOR_SPEED_TOLERANCE;
use crate::envelope::cmpoperator::CmpOperator;
use crate::envelope::direction::Direction;
use crate::envelope::envelope::{
    Envelope,
    SliceBound
};
use crate::envelope::envelopephysics::intersect_step_with_speed;
use crate::envelope::part::envelopepart::EnvelopePart;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum NextStepResult {
    NextStep,
    NextPart,
    ReachedEnd
}

#[derive(Debug, Clone, Copy)]
struct CursorLocation {
    part_index: usize,
    step_index: usize,
    position: f64,
    speed: Option<f64>
}

/// Moves along an envelope, in either direction.
///
/// The cursor sits on a step of a part, at some position within that step. It
/// only ever moves along its direction. Step accessors are expressed in
/// traversal order: going backward, the beginning of a step is its higher
/// position. Once the end of the envelope is reached, the cursor has no
/// location anymore and position accessors panic.
#[derive(Debug, Clone)]
pub struct EnvelopeCursor<'a> {
    envelope: &'a Envelope,
    direction: Direction,
    revision: u64,
    location: Option<CursorLocation>
}

impl<'a> EnvelopeCursor<'a> {
    pub fn new(envelope: &'a Envelope, direction: Direction) -> EnvelopeCursor<'a> {
        let part_index = direction.first_index(envelope.size());
        let part = envelope.get(part_index);
        EnvelopeCursor {
            envelope: envelope,
            direction: direction,
            revision: 0,
            location: Some(CursorLocation {
                part_index: part_index,
                step_index: direction.first_index(part.step_count()),
                position: direction.step_begin(part.begin_pos(), part.end_pos()),
                speed: None
            })
        }
    }

    pub fn forward(envelope: &'a Envelope) -> EnvelopeCursor<'a> {
        EnvelopeCursor::new(envelope, Direction::Forward)
    }

    pub fn backward(envelope: &'a Envelope) -> EnvelopeCursor<'a> {
        EnvelopeCursor::new(envelope, Direction::Backward)
    }

    fn location(&self) -> &CursorLocation {
        match &self.location {
            Some(location) => location,
            None => panic!("the cursor has reached the end of the envelope")
        }
    }

    pub fn envelope(&self) -> &'a Envelope {
        self.envelope
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_reverse(&self) -> bool {
        self.direction.is_reverse()
    }

    /// Incremented on every move, so that observers can tell when the cursor changed.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn has_reached_end(&self) -> bool {
        self.location.is_none()
    }

    pub fn part_index(&self) -> usize {
        self.location().part_index
    }

    pub fn step_index(&self) -> usize {
        self.location().step_index
    }

    pub fn position(&self) -> f64 {
        self.location().position
    }

    pub fn bound(&self) -> SliceBound {
        let location = self.location();
        SliceBound::new(location.part_index, location.step_index, location.position)
    }

    pub fn part(&self) -> &'a Arc<EnvelopePart> {
        self.envelope.get(self.part_index())
    }

    pub fn compare_pos(&self, a: f64, b: f64) -> f64 {
        self.direction.compare_pos(a, b)
    }

    pub fn step_begin_pos(&self) -> f64 {
        let (part, step) = (self.part(), self.step_index());
        self.direction.step_begin(part.step_begin_pos(step), part.step_end_pos(step))
    }

    pub fn step_end_pos(&self) -> f64 {
        let (part, step) = (self.part(), self.step_index());
        self.direction.step_end(part.step_begin_pos(step), part.step_end_pos(step))
    }

    pub fn step_begin_speed(&self) -> f64 {
        let (part, step) = (self.part(), self.step_index());
        self.direction.step_begin(part.step_begin_speed(step), part.step_end_speed(step))
    }

    pub fn step_end_speed(&self) -> f64 {
        let (part, step) = (self.part(), self.step_index());
        self.direction.step_end(part.step_begin_speed(step), part.step_end_speed(step))
    }

    pub fn part_begin_pos(&self) -> f64 {
        let part = self.part();
        self.direction.step_begin(part.begin_pos(), part.end_pos())
    }

    pub fn part_end_pos(&self) -> f64 {
        let part = self.part();
        self.direction.step_end(part.begin_pos(), part.end_pos())
    }

    pub fn part_end_speed(&self) -> f64 {
        let part = self.part();
        self.direction.step_end(part.begin_speed(), part.end_speed())
    }

    /// Position of the last point along the direction.
    pub fn envelope_end_pos(&self) -> f64 {
        self.direction.step_end(self.envelope.begin_pos(), self.envelope.end_pos())
    }

    /// Speed at the cursor position, or the speed forced onto the cursor if any.
    pub fn interpolate_speed(&self) -> f64 {
        let location = self.location();
        match location.speed {
            Some(speed) => speed,
            None => self.part().interpolate_speed_in_step(location.step_index, location.position)
        }
    }

    fn set_position(&mut self, position: f64, speed: Option<f64>) {
        let direction = self.direction;
        let location = match &mut self.location {
            Some(location) => location,
            None => panic!("the cursor has reached the end of the envelope")
        };
        if position == location.position && location.speed.is_some() && speed.is_none() {
            return;
        }
        debug_assert!(
            direction.compare_pos(location.position, position) <= 0.0,
            "the cursor cannot move backward, from {} to {}",
            location.position,
            position
        );
        location.position = position;
        location.speed = speed;
        self.revision += 1;
        if let Some(speed) = speed {
            debug_assert!(
                (self.part().interpolate_speed_in_step(self.step_index(), position) - speed).abs() <= CURSOR_SPEED_TOLERANCE,
                "forced speed {} is too far from the curve",
                speed
            );
        }
    }

    /// Replaces the speed read at the cursor position. The forced speed must
    /// stay close to the curve, and is dropped on the next move.
    pub fn force_speed(&mut self, speed: f64) {
        let position = self.position();
        self.set_position(position, Some(speed));
    }

    pub fn move_to_end(&mut self) {
        self.location = None;
        self.revision += 1;
    }

    fn next_part_index(&self) -> Option<usize> {
        self.direction.next_index(self.part_index(), self.envelope.size())
    }

    /// Moves to the beginning of the next part. Returns false, and parks the
    /// cursor at the end, when there is none.
    pub fn next_part(&mut self) -> bool {
        let Some(part_index) = self.next_part_index() else {
            self.move_to_end();
            return false;
        };
        let part = self.envelope.get(part_index);
        self.location = Some(CursorLocation {
            part_index: part_index,
            step_index: self.direction.first_index(part.step_count()),
            position: self.direction.step_begin(part.begin_pos(), part.end_pos()),
            speed: None
        });
        self.revision += 1;
        true
    }

    pub fn next_step(&mut self) -> NextStepResult {
        let step_count = self.part().step_count();
        match self.direction.next_index(self.step_index(), step_count) {
            Some(step_index) => {
                let part = self.part();
                let position = self.direction.step_begin(part.step_begin_pos(step_index), part.step_end_pos(step_index));
                self.location = Some(CursorLocation {
                    part_index: self.part_index(),
                    step_index: step_index,
                    position: position,
                    speed: None
                });
                self.revision += 1;
                NextStepResult::NextStep
            },
            None if self.next_part() => NextStepResult::NextPart,
            None => NextStepResult::ReachedEnd
        }
    }

    /// Moves forward to `position`. On a part or step transition, the cursor
    /// stays on the one which comes first. Returns false when the position is
    /// beyond the end of the envelope.
    pub fn find_position(&mut self, position: f64) -> bool {
        if self.has_reached_end() {
            return false;
        }
        while self.compare_pos(self.part_end_pos(), position) < 0.0 {
            if !self.next_part() {
                return false;
            }
        }
        debug_assert!(self.compare_pos(self.part_begin_pos(), position) <= 0.0, "position {} is in a gap", position);
        while self.compare_pos(self.step_end_pos(), position) < 0.0 {
            if self.next_step() == NextStepResult::ReachedEnd {
                return false;
            }
        }
        self.set_position(position, None);
        true
    }

    /// Stops on the first step for which the predicate holds, given
    /// `(begin_pos, begin_speed, end_pos, end_speed)` in traversal order.
    pub fn find_step<F>(&mut self, mut predicate: F) -> bool
    where
        F: FnMut(f64, f64, f64, f64) -> bool
    {
        while !self.has_reached_end() {
            if predicate(self.step_begin_pos(), self.step_begin_speed(), self.step_end_pos(), self.step_end_speed()) {
                return true;
            }
            self.next_step();
        }
        false
    }

    /// Stops at the beginning of the first part for which the predicate holds,
    /// given the part before the transition and the part after it.
    pub fn find_part_transition<F>(&mut self, mut predicate: F) -> bool
    where
        F: FnMut(&EnvelopePart, &EnvelopePart) -> bool
    {
        while !self.has_reached_end() {
            let previous = self.part();
            if !self.next_part() {
                return false;
            }
            if predicate(previous, self.part()) {
                return true;
            }
        }
        false
    }

    /// Stops on the first part for which the predicate holds, starting with the current one.
    pub fn find_part<F>(&mut self, mut predicate: F) -> bool
    where
        F: FnMut(&EnvelopePart) -> bool
    {
        while !self.has_reached_end() {
            if predicate(self.part()) {
                return true;
            }
            self.next_part();
        }
        false
    }

    /// Moves to the first position where the curve speed satisfies `operator`
    /// against `speed`. When the speed is reached inside a step, the cursor
    /// stops at the exact crossing, with `speed` forced onto it.
    pub fn find_speed(&mut self, speed: f64, operator: CmpOperator) -> bool {
        let part_may_match = |part: &EnvelopePart| operator.may_match(part.min_speed(), part.max_speed(), speed);
        if !self.find_part(part_may_match) {
            return false;
        }

        while !operator.compare(self.interpolate_speed(), speed) && !operator.compare(self.step_end_speed(), speed) {
            match self.next_step() {
                NextStepResult::NextStep => {},
                NextStepResult::NextPart => {
                    if !self.find_part(part_may_match) {
                        return false;
                    }
                },
                NextStepResult::ReachedEnd => return false
            }
        }

        if operator.compare(self.interpolate_speed(), speed) {
            return true;
        }

        let crossing = intersect_step_with_speed(
            self.step_begin_pos(),
            self.step_begin_speed(),
            self.step_end_pos(),
            self.step_end_speed(),
            speed
        );
        // rounding may put the crossing slightly behind the cursor
        let position = self.direction.furthest(crossing, self.position());
        let position = self.direction.nearest(position, self.step_end_pos());
        if operator == CmpOperator::Equal || position != self.step_end_pos() {
            self.set_position(position, Some(speed));
        } else {
            self.set_position(position, None);
        }
        true
    }

    /// Whether the cursor sits at the end of its part, and the next part does
    /// not start at the same position and speed.
    pub fn starts_discontinuity(&self) -> bool {
        if self.has_reached_end() || self.position() != self.part_end_pos() {
            return false;
        }
        let Some(next_index) = self.next_part_index() else {
            return false;
        };
        let next = self.envelope.get(next_index);
        let next_begin_pos = self.direction.step_begin(next.begin_pos(), next.end_pos());
        let next_begin_speed = self.direction.step_begin(next.begin_speed(), next.end_speed());
        next_begin_pos != self.position() || next_begin_speed != self.part_end_speed()
    }

    /// Parts between two locations, given in traversal order. A missing
    /// location stands for the matching end of the envelope. The result is in
    /// storage order, with increasing positions.
    pub fn smart_slice(&self, from: Option<SliceBound>, to: Option<SliceBound>) -> Vec<Arc<EnvelopePart>> {
        self.slice_between(from, None, to, None)
    }

    /// Same as `smart_slice`, forcing the speed of the new edges when given.
    pub fn slice_between(
        &self,
        from: Option<SliceBound>,
        from_speed: Option<f64>,
        to: Option<SliceBound>,
        to_speed: Option<f64>
    ) -> Vec<Arc<EnvelopePart>> {
        match self.direction {
            Direction::Forward => self.envelope.slice_impl(from, from_speed, to, to_speed),
            Direction::Backward => self.envelope.slice_impl(to, to_speed, from, from_speed)
        }
    }
}
