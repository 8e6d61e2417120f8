use crate::envelope::direction::Direction;
use crate::envelope::envelopephysics::interpolate_step_speed;
use crate::envelope::envelopepoint::CurvePoint;
use crate::envelope::part::constraints::envelopepartconstraint::EnvelopePartConstraint;

/// Keeps a part within a position range.
#[derive(Debug, Clone, Copy)]
pub struct PositionConstraint {
    range_begin: f64,
    range_end: f64
}

impl PositionConstraint {
    pub fn new(range_begin: f64, range_end: f64) -> PositionConstraint {
        assert!(range_begin <= range_end, "empty position range");
        PositionConstraint { range_begin: range_begin, range_end: range_end }
    }
}

impl EnvelopePartConstraint for PositionConstraint {
    fn init_check(&self, position: f64, _speed: f64, _direction: Direction) -> bool {
        self.range_begin <= position && position <= self.range_end
    }

    fn step_check(&self, start_pos: f64, start_speed: f64, end_pos: f64, end_speed: f64) -> Option<CurvePoint> {
        let clip = if end_pos > self.range_end {
            self.range_end
        } else if end_pos < self.range_begin {
            self.range_begin
        } else {
            return None;
        };
        let speed = interpolate_step_speed(start_pos, end_pos, start_speed, end_speed, clip - start_pos);
        Some(CurvePoint::new(clip, speed))
    }
}
