/// Comparison used when searching a speed along an envelope.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CmpOperator {
    StrictlyLower,
    Lower,
    Equal,
    Higher,
    StrictlyHigher
}

impl CmpOperator {
    pub fn compare(self, a: f64, b: f64) -> bool {
        match self {
            CmpOperator::StrictlyLower => a < b,
            CmpOperator::Lower => a <= b,
            CmpOperator::Equal => a == b,
            CmpOperator::Higher => a >= b,
            CmpOperator::StrictlyHigher => a > b
        }
    }

    /// Whether some speed within `[min_speed, max_speed]` can satisfy the comparison with `speed`.
    pub fn may_match(self, min_speed: f64, max_speed: f64, speed: f64) -> bool {
        match self {
            CmpOperator::StrictlyLower | CmpOperator::Lower => self.compare(min_speed, speed),
            CmpOperator::Higher | CmpOperator::StrictlyHigher => self.compare(max_speed, speed),
            CmpOperator::Equal => min_speed <= speed && speed <= max_speed
        }
    }
}
