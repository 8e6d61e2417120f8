use std::sync::Arc;

use crate::envelope::direction::Direction;
use crate::envelope::envelopephysics::interpolate_step_time;
use crate::envelope::part::envelopeattrs::EnvelopeAttrs;
use crate::envelope::part::envelopepart::EnvelopePart;

/// Receives the points of an envelope part, one step at a time.
pub trait EnvelopePartConsumer {
    fn set_attrs(&mut self, attrs: Arc<EnvelopeAttrs>);

    fn init_envelope_part(&mut self, position: f64, speed: f64, direction: Direction);

    fn add_step_with_time(&mut self, position: f64, speed: f64, time_delta: f64);
}

/// Accumulates points along a direction, and turns them into an `EnvelopePart`.
///
/// Points must be added in traversal order. Parts built backward are flipped
/// back into increasing positions by `build`.
#[derive(Debug, Clone)]
pub struct EnvelopePartBuilder {
    attrs: Arc<EnvelopeAttrs>,
    direction: Direction,
    positions: Vec<f64>,
    speeds: Vec<f64>,
    time_deltas: Vec<f64>
}

impl Default for EnvelopePartBuilder {
    fn default() -> Self {
        EnvelopePartBuilder::new()
    }
}

impl EnvelopePartBuilder {
    pub fn new() -> EnvelopePartBuilder {
        EnvelopePartBuilder {
            attrs: Arc::new(EnvelopeAttrs::default()),
            direction: Direction::Forward,
            positions: Vec::new(),
            speeds: Vec::new(),
            time_deltas: Vec::new()
        }
    }

    pub fn starting_at(attrs: Arc<EnvelopeAttrs>, position: f64, speed: f64, direction: Direction) -> EnvelopePartBuilder {
        let mut builder = EnvelopePartBuilder::new();
        builder.set_attrs(attrs);
        builder.init_envelope_part(position, speed, direction);
        builder
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn point_count(&self) -> usize {
        self.positions.len()
    }

    pub fn last_pos(&self) -> Option<f64> {
        self.positions.last().copied()
    }

    pub fn last_speed(&self) -> Option<f64> {
        self.speeds.last().copied()
    }

    /// Adds a step, deriving its duration from the kinematics.
    pub fn add_step(&mut self, position: f64, speed: f64) {
        let (last_pos, last_speed) = match (self.last_pos(), self.last_speed()) {
            (Some(last_pos), Some(last_speed)) => (last_pos, last_speed),
            _ => panic!("the part was not initialized")
        };
        let time_delta = interpolate_step_time(last_pos, position, last_speed, speed, position - last_pos);
        self.add_step_with_time(position, speed, time_delta);
    }

    /// Builds the part, or returns `None` when fewer than two points were added.
    pub fn try_build(mut self) -> Option<EnvelopePart> {
        if self.positions.len() < 2 {
            return None;
        }
        if self.direction.is_reverse() {
            self.positions.reverse();
            self.speeds.reverse();
            self.time_deltas.reverse();
        }
        match EnvelopePart::try_new(self.attrs, self.positions, self.speeds, self.time_deltas) {
            Ok(part) => Some(part),
            Err(err) => {
                tracing::debug!(%err, "discarding malformed part");
                None
            }
        }
    }

    pub fn build(self) -> EnvelopePart {
        match self.try_build() {
            Some(part) => part,
            None => panic!("cannot build an envelope part from fewer than two valid points")
        }
    }
}

impl EnvelopePartConsumer for EnvelopePartBuilder {
    fn set_attrs(&mut self, attrs: Arc<EnvelopeAttrs>) {
        self.attrs = attrs;
    }

    fn init_envelope_part(&mut self, position: f64, speed: f64, direction: Direction) {
        assert!(self.positions.is_empty(), "the part was already initialized");
        self.direction = direction;
        self.positions.push(position);
        self.speeds.push(speed);
    }

    fn add_step_with_time(&mut self, position: f64, speed: f64, time_delta: f64) {
        let Some(last_pos) = self.last_pos() else {
            panic!("the part was not initialized");
        };
        assert!(
            self.direction.compare_pos(position, last_pos) > 0.0,
            "steps must move along the direction, got {} after {}",
            position,
            last_pos
        );
        self.positions.push(position);
        self.speeds.push(speed);
        self.time_deltas.push(time_delta);
    }
}
