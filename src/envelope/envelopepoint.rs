/// A point of a speed curve: a position and the speed reached there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePoint {
    position: f64,
    speed: f64
}

impl CurvePoint {
    pub fn new(position: f64, speed: f64) -> CurvePoint {
        CurvePoint { position: position, speed: speed }
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Slope of the chord between two points, in the (position, speed²) plane.
    /// This is twice the constant acceleration of the step joining them.
    pub fn squared_speed_slope(lhs_pt: &CurvePoint, rhs_pt: &CurvePoint) -> f64 {
        (rhs_pt.speed * rhs_pt.speed - lhs_pt.speed * lhs_pt.speed) / (rhs_pt.position - lhs_pt.position)
    }
}

/// A point of an envelope, with the time elapsed since the envelope start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopePoint {
    time: f64,
    speed: f64,
    position: f64
}

impl EnvelopePoint {
    pub fn new(time: f64, speed: f64, position: f64) -> EnvelopePoint {
        EnvelopePoint { time: time, speed: speed, position: position }
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn position(&self) -> f64 {
        self.position
    }
}
