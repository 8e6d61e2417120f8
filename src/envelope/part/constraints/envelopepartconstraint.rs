use crate::envelope::direction::Direction;
use crate::envelope::envelopepoint::CurvePoint;

/// Which side of a bound a curve must stay on.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ConstraintKind {
    /// The curve must stay at or above the bound.
    Floor,
    /// The curve must stay at or below the bound.
    Ceiling
}

impl ConstraintKind {
    pub fn is_violated(self, speed: f64, bound: f64) -> bool {
        match self {
            ConstraintKind::Floor => speed < bound,
            ConstraintKind::Ceiling => speed > bound
        }
    }
}

/// A restriction on the points an envelope part may go through.
pub trait EnvelopePartConstraint {
    /// Whether a part may start at this point.
    fn init_check(&self, position: f64, speed: f64, direction: Direction) -> bool;

    /// Checks the step from `(start_pos, start_speed)` to `(end_pos, end_speed)`,
    /// the start being known to be valid. Returns the last valid point of the
    /// step when the end is not.
    fn step_check(&self, start_pos: f64, start_speed: f64, end_pos: f64, end_speed: f64) -> Option<CurvePoint>;
}
