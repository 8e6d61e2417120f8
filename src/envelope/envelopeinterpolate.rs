use crate::envelope::envelopepoint::EnvelopePoint;

/// A speed curve which can be read at any position of its range.
pub trait EnvelopeInterpolate {
    fn interpolate_speed(&self, position: f64) -> f64;

    /// Time elapsed between the beginning of the curve and `position`.
    fn interpolate_total_time(&self, position: f64) -> f64;

    fn max_speed_in_range(&self, begin_position: f64, end_position: f64) -> f64;

    fn iterate_points(&self) -> Vec<EnvelopePoint>;
}
