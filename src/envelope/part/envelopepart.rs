use std::sync::Arc;
use std::sync::OnceLock;

use crate::envelope::envelopeerror::{
    EnvelopeError,
    EnvelopeResult
};
use crate::envelope::envelopeinterpolate::EnvelopeInterpolate;
use crate::envelope::envelopephysics::{
    interpolate_step_speed,
    interpolate_step_time,
    intersect_step_with_speed
};
use crate::envelope::envelopepoint::EnvelopePoint;
use crate::envelope::part::envelopeattrs::EnvelopeAttrs;
use crate::envelope::searchableenvelope::{
    binary_search_positions,
    SearchableEnvelope
};

/// A continuous section of a speed curve.
///
/// A part is a sequence of points `(position, speed)` with strictly increasing
/// positions. Two consecutive points delimit a step, during which the
/// acceleration is constant. `time_deltas[i]` is the time needed to go through
/// step `i`. Parts are immutable, and shared between envelopes through `Arc`.
#[derive(Debug)]
pub struct EnvelopePart {
    attrs: Arc<EnvelopeAttrs>,
    positions: Box<[f64]>,
    speeds: Box<[f64]>,
    time_deltas: Box<[f64]>,
    min_speed: f64,
    max_speed: f64,
    cumulative_times: OnceLock<Box<[f64]>>
}

fn check_arrays(positions: &[f64], speeds: &[f64], time_deltas: &[f64]) -> EnvelopeResult<()> {
    if positions.len() < 2 {
        return Err(EnvelopeError::malformed_part("a part needs at least two points"));
    }
    if speeds.len() != positions.len() {
        return Err(EnvelopeError::malformed_part(format!(
            "{} positions but {} speeds", positions.len(), speeds.len()
        )));
    }
    if time_deltas.len() + 1 != positions.len() {
        return Err(EnvelopeError::malformed_part(format!(
            "{} positions but {} time deltas", positions.len(), time_deltas.len()
        )));
    }
    if positions.iter().chain(speeds.iter()).any(|value| !value.is_finite()) {
        return Err(EnvelopeError::malformed_part("positions and speeds must be finite"));
    }
    if let Some(index) = positions.windows(2).position(|pair| pair[0] >= pair[1]) {
        return Err(EnvelopeError::malformed_part(format!(
            "positions must strictly increase, found {} then {}", positions[index], positions[index + 1]
        )));
    }
    if speeds.iter().any(|speed| *speed < 0.0) {
        return Err(EnvelopeError::malformed_part("speeds must be non negative"));
    }
    if time_deltas.iter().any(|delta| delta.is_nan() || *delta <= 0.0) {
        return Err(EnvelopeError::malformed_part("time deltas must be positive"));
    }
    Ok(())
}

impl EnvelopePart {
    pub fn try_new(
        attrs: Arc<EnvelopeAttrs>,
        positions: Vec<f64>,
        speeds: Vec<f64>,
        time_deltas: Vec<f64>
    ) -> EnvelopeResult<EnvelopePart> {
        check_arrays(&positions, &speeds, &time_deltas)?;
        let min_speed = speeds.iter().copied().fold(f64::INFINITY, f64::min);
        let max_speed = speeds.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Ok(EnvelopePart {
            attrs: attrs,
            positions: positions.into_boxed_slice(),
            speeds: speeds.into_boxed_slice(),
            time_deltas: time_deltas.into_boxed_slice(),
            min_speed: min_speed,
            max_speed: max_speed,
            cumulative_times: OnceLock::new()
        })
    }

    /// Panics on malformed arrays, which only come out of buggy builders.
    pub fn new(attrs: Arc<EnvelopeAttrs>, positions: Vec<f64>, speeds: Vec<f64>, time_deltas: Vec<f64>) -> EnvelopePart {
        EnvelopePart::try_new(attrs, positions, speeds, time_deltas).unwrap_or_else(|err| panic!("{}", err))
    }

    /// Builds a part whose step times are derived from positions and speeds.
    pub fn try_generate_times(
        attrs: Arc<EnvelopeAttrs>,
        positions: Vec<f64>,
        speeds: Vec<f64>
    ) -> EnvelopeResult<EnvelopePart> {
        if positions.len() != speeds.len() {
            return Err(EnvelopeError::malformed_part(format!(
                "{} positions but {} speeds", positions.len(), speeds.len()
            )));
        }
        let time_deltas = positions
            .windows(2)
            .zip(speeds.windows(2))
            .map(|(pos, speed)| interpolate_step_time(pos[0], pos[1], speed[0], speed[1], pos[1] - pos[0]))
            .collect();
        EnvelopePart::try_new(attrs, positions, speeds, time_deltas)
    }

    pub fn generate_times(attrs: Arc<EnvelopeAttrs>, positions: Vec<f64>, speeds: Vec<f64>) -> EnvelopePart {
        EnvelopePart::try_generate_times(attrs, positions, speeds).unwrap_or_else(|err| panic!("{}", err))
    }

    pub fn shared(self) -> Arc<EnvelopePart> {
        Arc::new(self)
    }

    pub fn attrs(&self) -> &Arc<EnvelopeAttrs> {
        &self.attrs
    }

    pub fn point_count(&self) -> usize {
        self.positions.len()
    }

    pub fn step_count(&self) -> usize {
        self.positions.len() - 1
    }

    pub fn positions(&self) -> &[f64] {
        &self.positions
    }

    pub fn speeds(&self) -> &[f64] {
        &self.speeds
    }

    pub fn time_deltas(&self) -> &[f64] {
        &self.time_deltas
    }

    pub fn point_pos(&self, point_index: usize) -> f64 {
        self.positions[point_index]
    }

    pub fn point_speed(&self, point_index: usize) -> f64 {
        self.speeds[point_index]
    }

    pub fn step_time(&self, step_index: usize) -> f64 {
        self.time_deltas[step_index]
    }

    pub fn step_begin_pos(&self, step_index: usize) -> f64 {
        self.positions[step_index]
    }

    pub fn step_end_pos(&self, step_index: usize) -> f64 {
        self.positions[step_index + 1]
    }

    pub fn step_begin_speed(&self, step_index: usize) -> f64 {
        self.speeds[step_index]
    }

    pub fn step_end_speed(&self, step_index: usize) -> f64 {
        self.speeds[step_index + 1]
    }

    pub fn begin_pos(&self) -> f64 {
        self.positions[0]
    }

    pub fn end_pos(&self) -> f64 {
        self.positions[self.positions.len() - 1]
    }

    pub fn begin_speed(&self) -> f64 {
        self.speeds[0]
    }

    pub fn end_speed(&self) -> f64 {
        self.speeds[self.speeds.len() - 1]
    }

    pub fn min_speed(&self) -> f64 {
        self.min_speed
    }

    pub fn max_speed(&self) -> f64 {
        self.max_speed
    }

    pub fn total_distance(&self) -> f64 {
        self.end_pos() - self.begin_pos()
    }

    fn cumulative_times(&self) -> &[f64] {
        self.cumulative_times.get_or_init(|| {
            let mut times = Vec::with_capacity(self.positions.len());
            let mut total = 0.0;
            times.push(total);
            for delta in self.time_deltas.iter() {
                total += delta;
                times.push(total);
            }
            times.into_boxed_slice()
        })
    }

    pub fn total_time(&self) -> f64 {
        self.total_time_before(self.point_count() - 1)
    }

    /// Time needed to go from the beginning of the part to the given point.
    pub fn total_time_before(&self, point_index: usize) -> f64 {
        self.cumulative_times()[point_index]
    }

    /// Index of the step containing `position`, the earlier one on a shared point.
    pub fn find_step(&self, position: f64) -> Option<usize> {
        self.find_left(position)
    }

    fn assert_in_step(&self, step_index: usize, position: f64) {
        assert!(
            self.step_begin_pos(step_index) <= position && position <= self.step_end_pos(step_index),
            "position {} is outside of step {} [{}, {}]",
            position,
            step_index,
            self.step_begin_pos(step_index),
            self.step_end_pos(step_index)
        );
    }

    pub fn interpolate_speed_in_step(&self, step_index: usize, position: f64) -> f64 {
        self.assert_in_step(step_index, position);
        interpolate_step_speed(
            self.step_begin_pos(step_index),
            self.step_end_pos(step_index),
            self.step_begin_speed(step_index),
            self.step_end_speed(step_index),
            position - self.step_begin_pos(step_index)
        )
    }

    /// Time needed to go from the beginning of the step to `position`.
    pub fn interpolate_time_delta(&self, step_index: usize, position: f64) -> f64 {
        self.assert_in_step(step_index, position);
        if position == self.step_end_pos(step_index) {
            return self.step_time(step_index);
        }
        interpolate_step_time(
            self.step_begin_pos(step_index),
            self.step_end_pos(step_index),
            self.step_begin_speed(step_index),
            self.step_end_speed(step_index),
            position - self.step_begin_pos(step_index)
        )
    }

    pub fn interpolate_total_time_in_step(&self, step_index: usize, position: f64) -> f64 {
        self.total_time_before(step_index) + self.interpolate_time_delta(step_index, position)
    }

    /// First position at or after point `start_index` where the curve reaches `speed`.
    pub fn interpolate_position(&self, start_index: usize, speed: f64) -> Option<f64> {
        if self.speeds[start_index] == speed {
            return Some(self.positions[start_index]);
        }
        for step_index in start_index..self.step_count() {
            let begin_speed = self.step_begin_speed(step_index);
            let end_speed = self.step_end_speed(step_index);
            if begin_speed.min(end_speed) <= speed && speed <= begin_speed.max(end_speed) {
                return Some(intersect_step_with_speed(
                    self.step_begin_pos(step_index),
                    begin_speed,
                    self.step_end_pos(step_index),
                    end_speed,
                    speed
                ));
            }
        }
        None
    }

    /// Copy of the steps `[begin_step, end_step)`.
    pub fn slice_index(self: &Arc<Self>, begin_step: usize, end_step: usize) -> Option<Arc<EnvelopePart>> {
        assert!(begin_step <= end_step && end_step <= self.step_count());
        if begin_step == end_step {
            return None;
        }
        self.slice_impl(begin_step, None, None, end_step - 1, None, None)
    }

    /// Keeps the curve between `begin_pos` in step `begin_step`, and `end_pos` in step `end_step`.
    pub fn slice(
        self: &Arc<Self>,
        begin_step: usize,
        begin_pos: f64,
        end_step: usize,
        end_pos: f64
    ) -> Option<Arc<EnvelopePart>> {
        self.slice_impl(begin_step, Some(begin_pos), None, end_step, Some(end_pos), None)
    }

    /// Same as `slice`, where a missing bound keeps the curve up to the part edge.
    pub fn smart_slice(
        self: &Arc<Self>,
        begin: Option<(usize, f64)>,
        end: Option<(usize, f64)>
    ) -> Option<Arc<EnvelopePart>> {
        let (begin_step, begin_pos) = match begin {
            Some((step, position)) => (step, Some(position)),
            None => (0, None)
        };
        let (end_step, end_pos) = match end {
            Some((step, position)) => (step, Some(position)),
            None => (self.step_count() - 1, None)
        };
        self.slice_impl(begin_step, begin_pos, None, end_step, end_pos, None)
    }

    pub fn slice_beginning(self: &Arc<Self>, end_step: usize, end_pos: f64) -> Option<Arc<EnvelopePart>> {
        self.slice_impl(0, None, None, end_step, Some(end_pos), None)
    }

    pub fn slice_end(self: &Arc<Self>, begin_step: usize, begin_pos: f64) -> Option<Arc<EnvelopePart>> {
        self.slice_impl(begin_step, Some(begin_pos), None, self.step_count() - 1, None, None)
    }

    /// Slices by position. Bounds outside of the part are clamped to its edges.
    pub fn slice_by_position(self: &Arc<Self>, begin_pos: f64, end_pos: f64) -> Option<Arc<EnvelopePart>> {
        self.slice_by_position_with_speeds(begin_pos, None, end_pos, None)
    }

    /// Slices by position, forcing the speed of the new edges when given.
    pub fn slice_by_position_with_speeds(
        self: &Arc<Self>,
        begin_pos: f64,
        begin_speed: Option<f64>,
        end_pos: f64,
        end_speed: Option<f64>
    ) -> Option<Arc<EnvelopePart>> {
        if begin_pos >= self.end_pos() || end_pos <= self.begin_pos() || begin_pos >= end_pos {
            return None;
        }
        let (begin_step, begin_pos) = match self.find_right(begin_pos) {
            Some(step) if begin_pos > self.begin_pos() => (step, Some(begin_pos)),
            _ => (0, None)
        };
        let (end_step, end_pos) = match self.find_left(end_pos) {
            Some(step) if end_pos < self.end_pos() => (step, Some(end_pos)),
            _ => (self.step_count() - 1, None)
        };
        self.slice_impl(begin_step, begin_pos, begin_speed, end_step, end_pos, end_speed)
    }

    /// Core slicing primitive.
    ///
    /// A bound equal to a step edge is snapped onto the stored point, so that
    /// no interpolation error creeps in. The same `Arc` comes back when the
    /// slice covers the whole part, and `None` when it is empty.
    pub(crate) fn slice_impl(
        self: &Arc<Self>,
        begin_step: usize,
        begin_pos: Option<f64>,
        begin_speed: Option<f64>,
        end_step: usize,
        end_pos: Option<f64>,
        end_speed: Option<f64>
    ) -> Option<Arc<EnvelopePart>> {
        assert!(begin_step < self.step_count(), "begin step {} out of bounds", begin_step);
        assert!(end_step < self.step_count(), "end step {} out of bounds", end_step);

        let mut begin_step = begin_step;
        let mut begin_pos = begin_pos;
        if let Some(position) = begin_pos {
            if position == self.step_end_pos(begin_step) {
                begin_step += 1;
                begin_pos = None;
            } else if position == self.step_begin_pos(begin_step) {
                begin_pos = None;
            }
        }
        // kept signed, as snapping the end of the first step goes below zero
        let mut end_step = end_step as isize;
        let mut end_pos = end_pos;
        if let Some(position) = end_pos {
            if position == self.step_begin_pos(end_step as usize) {
                end_step -= 1;
                end_pos = None;
            } else if position == self.step_end_pos(end_step as usize) {
                end_pos = None;
            }
        }

        if end_step < begin_step as isize {
            return None;
        }
        let end_step = end_step as usize;
        let begin_speed = begin_speed.filter(|speed| begin_pos.is_some() || *speed != self.speeds[begin_step]);
        let end_speed = end_speed.filter(|speed| end_pos.is_some() || *speed != self.speeds[end_step + 1]);

        if begin_step == 0
            && end_step == self.step_count() - 1
            && begin_pos.is_none()
            && end_pos.is_none()
            && begin_speed.is_none()
            && end_speed.is_none()
        {
            return Some(Arc::clone(self));
        }

        let mut positions = self.positions[begin_step..=end_step + 1].to_vec();
        let mut speeds = self.speeds[begin_step..=end_step + 1].to_vec();
        let mut time_deltas = self.time_deltas[begin_step..=end_step].to_vec();
        let last_point = positions.len() - 1;
        let last_step = time_deltas.len() - 1;

        if let Some(position) = end_pos {
            positions[last_point] = position;
            speeds[last_point] = self.interpolate_speed_in_step(end_step, position);
            time_deltas[last_step] = self.interpolate_time_delta(end_step, position);
        }
        if let Some(position) = begin_pos {
            positions[0] = position;
            speeds[0] = self.interpolate_speed_in_step(begin_step, position);
            time_deltas[0] -= self.interpolate_time_delta(begin_step, position);
        }
        if let Some(speed) = begin_speed {
            speeds[0] = speed;
        }
        if let Some(speed) = end_speed {
            speeds[last_point] = speed;
        }

        if positions[0] >= positions[last_point] {
            return None;
        }
        if time_deltas[0] <= 0.0 || time_deltas[last_step] <= 0.0 {
            // rounding on a very short remainder of a step
            for (step, delta) in time_deltas.iter_mut().enumerate() {
                if *delta <= 0.0 {
                    *delta = interpolate_step_time(
                        positions[step],
                        positions[step + 1],
                        speeds[step],
                        speeds[step + 1],
                        positions[step + 1] - positions[step]
                    );
                }
            }
        }

        match EnvelopePart::try_new(Arc::clone(&self.attrs), positions, speeds, time_deltas) {
            Ok(part) => Some(Arc::new(part)),
            Err(err) => {
                tracing::trace!(%err, "dropping degenerate slice");
                None
            }
        }
    }
}

impl PartialEq for EnvelopePart {
    fn eq(&self, other: &EnvelopePart) -> bool {
        self.attrs == other.attrs
            && self.positions == other.positions
            && self.speeds == other.speeds
            && self.time_deltas == other.time_deltas
    }
}

impl SearchableEnvelope for EnvelopePart {
    fn binary_search_positions(&self, position: f64) -> Result<usize, usize> {
        binary_search_positions(&self.positions, position)
    }

    fn position_points_count(&self) -> usize {
        self.positions.len()
    }
}

impl EnvelopeInterpolate for EnvelopePart {
    fn interpolate_speed(&self, position: f64) -> f64 {
        match binary_search_positions(&self.positions, position) {
            Ok(point_index) => self.speeds[point_index],
            Err(_) => {
                let step_index = self.find_step(position).unwrap_or_else(|| {
                    panic!("position {} is outside of the part [{}, {}]", position, self.begin_pos(), self.end_pos())
                });
                self.interpolate_speed_in_step(step_index, position)
            }
        }
    }

    fn interpolate_total_time(&self, position: f64) -> f64 {
        let step_index = self.find_step(position).unwrap_or_else(|| {
            panic!("position {} is outside of the part [{}, {}]", position, self.begin_pos(), self.end_pos())
        });
        self.interpolate_total_time_in_step(step_index, position)
    }

    fn max_speed_in_range(&self, begin_position: f64, end_position: f64) -> f64 {
        let begin_position = begin_position.max(self.begin_pos());
        let end_position = end_position.min(self.end_pos());
        assert!(begin_position <= end_position, "empty range");
        // steps are monotonic, so the maximum is on a point or a range edge
        let inner_max = self
            .positions
            .iter()
            .zip(self.speeds.iter())
            .filter(|(position, _)| begin_position < **position && **position < end_position)
            .map(|(_, speed)| *speed)
            .fold(f64::NEG_INFINITY, f64::max);
        inner_max
            .max(self.interpolate_speed(begin_position))
            .max(self.interpolate_speed(end_position))
    }

    fn iterate_points(&self) -> Vec<EnvelopePoint> {
        (0..self.point_count())
            .map(|index| EnvelopePoint::new(self.total_time_before(index), self.speeds[index], self.positions[index]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs() -> Arc<EnvelopeAttrs> {
        EnvelopeAttrs::new().shared()
    }

    fn accelerating_part() -> Arc<EnvelopePart> {
        // v² = 2x
        EnvelopePart::generate_times(attrs(), vec![0.0, 2.0, 8.0], vec![0.0, 2.0, 4.0]).shared()
    }

    #[test]
    fn rejects_malformed_arrays() {
        let err = EnvelopePart::try_generate_times(attrs(), vec![0.0], vec![1.0]).unwrap_err();
        assert!(matches!(err, EnvelopeError::MalformedPart(_)));
        assert!(EnvelopePart::try_generate_times(attrs(), vec![0.0, 0.0], vec![1.0, 1.0]).is_err());
        assert!(EnvelopePart::try_generate_times(attrs(), vec![0.0, 1.0], vec![1.0, -1.0]).is_err());
        assert!(EnvelopePart::try_new(attrs(), vec![0.0, 1.0], vec![1.0, 1.0], vec![0.0]).is_err());
        assert!(EnvelopePart::try_new(attrs(), vec![0.0, 1.0], vec![1.0, 1.0], vec![]).is_err());
    }

    #[test]
    fn generated_times_follow_kinematics() {
        let part = accelerating_part();
        assert!((part.step_time(0) - 2.0).abs() < 1e-9);
        assert!((part.step_time(1) - 2.0).abs() < 1e-9);
        assert!((part.total_time() - 4.0).abs() < 1e-9);
        assert!((part.interpolate_total_time(4.5) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn speed_interpolation() {
        let part = accelerating_part();
        assert_eq!(part.interpolate_speed(2.0), 2.0);
        assert!((part.interpolate_speed(4.5) - 3.0).abs() < 1e-9);
        assert_eq!(part.min_speed(), 0.0);
        assert_eq!(part.max_speed(), 4.0);
        assert!((part.max_speed_in_range(0.0, 4.5) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn full_slices_keep_identity() {
        let part = accelerating_part();
        let same = part.slice(0, 0.0, 1, 8.0).unwrap();
        assert!(Arc::ptr_eq(&part, &same));
        let same = part.smart_slice(None, None).unwrap();
        assert!(Arc::ptr_eq(&part, &same));
        let same = part.slice_index(0, 2).unwrap();
        assert!(Arc::ptr_eq(&part, &same));
        let same = part.slice_by_position_with_speeds(0.0, Some(0.0), 8.0, Some(4.0)).unwrap();
        assert!(Arc::ptr_eq(&part, &same));
    }

    #[test]
    fn slicing_on_a_point_snaps_to_it() {
        let part = accelerating_part();
        let end = part.slice(0, 2.0, 1, 8.0).unwrap();
        assert_eq!(end.positions(), &[2.0, 8.0]);
        assert_eq!(end.speeds(), &[2.0, 4.0]);
        assert_eq!(end.step_time(0), part.step_time(1));

        let beginning = part.slice(0, 0.0, 1, 2.0).unwrap();
        assert_eq!(beginning.positions(), &[0.0, 2.0]);
        assert!(part.slice(0, 2.0, 1, 2.0).is_none());
    }

    #[test]
    fn slicing_inside_a_step_interpolates() {
        let part = accelerating_part();
        let slice = part.slice(1, 4.5, 1, 8.0).unwrap();
        assert_eq!(slice.begin_pos(), 4.5);
        assert!((slice.begin_speed() - 3.0).abs() < 1e-9);
        assert!((slice.total_time() - 1.0).abs() < 1e-9);
        assert!(Arc::ptr_eq(slice.attrs(), part.attrs()));
    }

    #[test]
    fn slicing_by_position_clamps_to_edges() {
        let part = accelerating_part();
        let slice = part.slice_by_position(-5.0, 4.5).unwrap();
        assert_eq!(slice.begin_pos(), 0.0);
        assert_eq!(slice.end_pos(), 4.5);
        assert!(part.slice_by_position(9.0, 10.0).is_none());
        let forced = part.slice_by_position_with_speeds(2.0, Some(2.5), 8.0, None).unwrap();
        assert_eq!(forced.begin_speed(), 2.5);
    }

    #[test]
    fn position_of_a_speed() {
        let part = accelerating_part();
        assert_eq!(part.interpolate_position(0, 2.0), Some(2.0));
        assert!((part.interpolate_position(0, 3.0).unwrap() - 4.5).abs() < 1e-9);
        assert_eq!(part.interpolate_position(0, 5.0), None);
    }

    #[test]
    fn iterated_points_carry_cumulative_time() {
        let points = accelerating_part().iterate_points();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].time(), 0.0);
        assert!((points[2].time() - 4.0).abs() < 1e-9);
        assert_eq!(points[1].position(), 2.0);
    }
}
