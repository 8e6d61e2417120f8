use crate::envelope::direction::Direction;
use crate::envelope::envelopephysics::intersect_step_with_speed;
use crate::envelope::envelopepoint::CurvePoint;
use crate::envelope::part::constraints::envelopepartconstraint::{
    ConstraintKind,
    EnvelopePartConstraint
};

/// Keeps a part above or below a fixed speed.
#[derive(Debug, Clone, Copy)]
pub struct SpeedConstraint {
    bound: f64,
    kind: ConstraintKind
}

impl SpeedConstraint {
    pub fn new(bound: f64, kind: ConstraintKind) -> SpeedConstraint {
        SpeedConstraint { bound: bound, kind: kind }
    }

    pub fn floor(bound: f64) -> SpeedConstraint {
        SpeedConstraint::new(bound, ConstraintKind::Floor)
    }

    pub fn ceiling(bound: f64) -> SpeedConstraint {
        SpeedConstraint::new(bound, ConstraintKind::Ceiling)
    }
}

impl EnvelopePartConstraint for SpeedConstraint {
    fn init_check(&self, _position: f64, speed: f64, _direction: Direction) -> bool {
        !self.kind.is_violated(speed, self.bound)
    }

    fn step_check(&self, start_pos: f64, start_speed: f64, end_pos: f64, end_speed: f64) -> Option<CurvePoint> {
        if !self.kind.is_violated(end_speed, self.bound) {
            return None;
        }
        let position = intersect_step_with_speed(start_pos, start_speed, end_pos, end_speed, self.bound);
        Some(CurvePoint::new(position, self.bound))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_cuts_braking_at_the_bound() {
        let floor = SpeedConstraint::floor(2.0);
        assert!(floor.init_check(0.0, 4.0, Direction::Forward));
        assert!(!floor.init_check(0.0, 1.0, Direction::Forward));
        // v² = 16 - 2x
        let cut = floor.step_check(0.0, 4.0, 8.0, 0.0).unwrap();
        assert!((cut.position() - 6.0).abs() < 1e-9);
        assert_eq!(cut.speed(), 2.0);
        assert!(floor.step_check(0.0, 4.0, 2.0, 8f64.sqrt()).is_none());
    }

    #[test]
    fn ceiling_cuts_acceleration() {
        let ceiling = SpeedConstraint::ceiling(2.0);
        let cut = ceiling.step_check(8.0, 0.0, 0.0, 4.0).unwrap();
        assert!((cut.position() - 6.0).abs() < 1e-9);
    }
}
