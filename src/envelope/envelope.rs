use std::sync::Arc;
use std::sync::OnceLock;

use crate::envelope::direction::Direction;
use crate::envelope::envelopeerror::{
    EnvelopeError,
    EnvelopeResult
};
use crate::envelope::envelopeinterpolate::EnvelopeInterpolate;
use crate::envelope::envelopepoint::EnvelopePoint;
use crate::envelope::part::envelopepart::EnvelopePart;
use crate::envelope::searchableenvelope::{
    binary_search_positions,
    SearchableEnvelope
};

/// A location inside an envelope, as needed to cut it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceBound {
    pub part_index: usize,
    pub step_index: usize,
    pub position: f64
}

impl SliceBound {
    pub fn new(part_index: usize, step_index: usize, position: f64) -> SliceBound {
        SliceBound { part_index: part_index, step_index: step_index, position: position }
    }
}

/// An ordered sequence of envelope parts.
///
/// Parts never overlap, but may leave gaps between each other: `is_space_continuous`
/// tells whether each part starts where the previous one ends, and `is_continuous`
/// whether the speed also matches at each transition. Position based lookups
/// require a continuous envelope.
#[derive(Debug)]
pub struct Envelope {
    parts: Box<[Arc<EnvelopePart>]>,
    part_positions: Box<[f64]>,
    space_continuous: bool,
    continuous: bool,
    min_speed: f64,
    max_speed: f64,
    cumulative_times: OnceLock<Box<[f64]>>
}

impl Envelope {
    pub fn try_make(parts: Vec<Arc<EnvelopePart>>) -> EnvelopeResult<Envelope> {
        if parts.is_empty() {
            return Err(EnvelopeError::EmptyEnvelope);
        }
        if let Some(index) = (1..parts.len()).find(|i| parts[*i].begin_pos() < parts[*i - 1].end_pos()) {
            return Err(EnvelopeError::OverlappingParts { index: index });
        }

        let mut space_continuous = true;
        let mut continuous = true;
        for pair in parts.windows(2) {
            if pair[0].end_pos() != pair[1].begin_pos() {
                space_continuous = false;
                continuous = false;
            } else if pair[0].end_speed() != pair[1].begin_speed() {
                continuous = false;
            }
        }

        let mut part_positions = Vec::with_capacity(parts.len() + 1);
        part_positions.push(parts[0].begin_pos());
        part_positions.extend(parts.iter().map(|part| part.end_pos()));

        let min_speed = parts.iter().map(|part| part.min_speed()).fold(f64::INFINITY, f64::min);
        let max_speed = parts.iter().map(|part| part.max_speed()).fold(f64::NEG_INFINITY, f64::max);

        Ok(Envelope {
            parts: parts.into_boxed_slice(),
            part_positions: part_positions.into_boxed_slice(),
            space_continuous: space_continuous,
            continuous: continuous,
            min_speed: min_speed,
            max_speed: max_speed,
            cumulative_times: OnceLock::new()
        })
    }

    /// Panics when given no part, or overlapping parts.
    pub fn make(parts: Vec<Arc<EnvelopePart>>) -> Envelope {
        Envelope::try_make(parts).unwrap_or_else(|err| panic!("{}", err))
    }

    pub fn size(&self) -> usize {
        self.parts.len()
    }

    pub fn get(&self, part_index: usize) -> &Arc<EnvelopePart> {
        &self.parts[part_index]
    }

    pub fn parts(&self) -> &[Arc<EnvelopePart>] {
        &self.parts
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<EnvelopePart>> {
        self.parts.iter()
    }

    pub fn is_space_continuous(&self) -> bool {
        self.space_continuous
    }

    pub fn is_continuous(&self) -> bool {
        self.continuous
    }

    pub fn begin_pos(&self) -> f64 {
        self.parts[0].begin_pos()
    }

    pub fn end_pos(&self) -> f64 {
        self.parts[self.parts.len() - 1].end_pos()
    }

    pub fn begin_speed(&self) -> f64 {
        self.parts[0].begin_speed()
    }

    pub fn end_speed(&self) -> f64 {
        self.parts[self.parts.len() - 1].end_speed()
    }

    pub fn total_distance(&self) -> f64 {
        self.end_pos() - self.begin_pos()
    }

    pub fn min_speed(&self) -> f64 {
        self.min_speed
    }

    pub fn max_speed(&self) -> f64 {
        self.max_speed
    }

    /// First part whose range contains `position`. Works on envelopes with gaps.
    pub fn find_envelope_part_index(&self, position: f64) -> Option<usize> {
        self.parts
            .iter()
            .position(|part| part.begin_pos() <= position && position <= part.end_pos())
    }

    fn assert_continuous(&self) {
        assert!(self.continuous, "this operation requires a continuous envelope");
    }

    fn located_part(&self, part_index: Option<usize>, position: f64) -> &Arc<EnvelopePart> {
        match part_index {
            Some(part_index) => &self.parts[part_index],
            None => panic!(
                "position {} is outside of the envelope [{}, {}]",
                position,
                self.begin_pos(),
                self.end_pos()
            )
        }
    }

    /// Speed at `position`, read on the part which comes first along `direction`.
    pub fn interpolate_speed_left_dir(&self, position: f64, direction: Direction) -> f64 {
        self.assert_continuous();
        self.located_part(self.find_left_dir(position, direction), position)
            .interpolate_speed(position)
    }

    /// Speed at `position`, read on the part which comes last along `direction`.
    pub fn interpolate_speed_right_dir(&self, position: f64, direction: Direction) -> f64 {
        self.assert_continuous();
        self.located_part(self.find_right_dir(position, direction), position)
            .interpolate_speed(position)
    }

    fn cumulative_times(&self) -> &[f64] {
        self.cumulative_times.get_or_init(|| {
            let mut times = Vec::with_capacity(self.parts.len() + 1);
            let mut total = 0.0;
            times.push(total);
            for part in self.parts.iter() {
                total += part.total_time();
                times.push(total);
            }
            times.into_boxed_slice()
        })
    }

    /// Time needed to go through every part, gaps excluded.
    pub fn total_time(&self) -> f64 {
        self.time_to_part_transition(self.parts.len())
    }

    /// Time needed to go through the parts before `transition_index`.
    pub fn time_to_part_transition(&self, transition_index: usize) -> f64 {
        self.cumulative_times()[transition_index]
    }

    pub fn interpolate_total_time_clamp(&self, position: f64) -> f64 {
        self.interpolate_total_time(position.clamp(self.begin_pos(), self.end_pos()))
    }

    pub fn time_between(&self, begin_position: f64, end_position: f64) -> f64 {
        self.interpolate_total_time(end_position) - self.interpolate_total_time(begin_position)
    }

    /// Cuts the envelope between two bounds, sharing the parts which are kept whole.
    pub fn slice(&self, begin: SliceBound, end: SliceBound) -> Vec<Arc<EnvelopePart>> {
        self.slice_impl(Some(begin), None, Some(end), None)
    }

    /// Same as `slice`, where a missing bound keeps the envelope up to its edge.
    pub fn smart_slice(&self, begin: Option<SliceBound>, end: Option<SliceBound>) -> Vec<Arc<EnvelopePart>> {
        self.slice_impl(begin, None, end, None)
    }

    /// Cuts the envelope between two positions, clamped to the envelope range.
    pub fn slice_by_position(&self, begin_position: f64, end_position: f64) -> Vec<Arc<EnvelopePart>> {
        self.slice_by_position_with_speeds(begin_position, None, end_position, None)
    }

    pub fn slice_by_position_with_speeds(
        &self,
        begin_position: f64,
        begin_speed: Option<f64>,
        end_position: f64,
        end_speed: Option<f64>
    ) -> Vec<Arc<EnvelopePart>> {
        if begin_position >= end_position || begin_position >= self.end_pos() || end_position <= self.begin_pos() {
            return Vec::new();
        }
        let begin = if begin_position <= self.begin_pos() {
            None
        } else {
            Some(self.begin_bound_at(begin_position))
        };
        let end = if end_position >= self.end_pos() {
            None
        } else {
            Some(self.end_bound_at(end_position))
        };
        self.slice_impl(begin, begin_speed, end, end_speed)
    }

    /// Where a slice starting at `position` begins: in the part after it on a
    /// transition, or at the start of the next part when in a gap.
    fn begin_bound_at(&self, position: f64) -> SliceBound {
        let part_index = self
            .parts
            .iter()
            .position(|part| position < part.end_pos())
            .unwrap_or(self.parts.len() - 1);
        let part = &self.parts[part_index];
        let position = position.max(part.begin_pos());
        let step_index = part.find_right(position).unwrap_or(0);
        SliceBound::new(part_index, step_index, position)
    }

    fn end_bound_at(&self, position: f64) -> SliceBound {
        let part_index = self
            .parts
            .iter()
            .rposition(|part| part.begin_pos() < position)
            .unwrap_or(0);
        let part = &self.parts[part_index];
        let position = position.min(part.end_pos());
        let step_index = part.find_left(position).unwrap_or(part.step_count() - 1);
        SliceBound::new(part_index, step_index, position)
    }

    pub(crate) fn slice_impl(
        &self,
        begin: Option<SliceBound>,
        begin_speed: Option<f64>,
        end: Option<SliceBound>,
        end_speed: Option<f64>
    ) -> Vec<Arc<EnvelopePart>> {
        let (begin_part, begin_step, begin_pos) = match begin {
            Some(bound) => (bound.part_index, bound.step_index, Some(bound.position)),
            None => (0, 0, None)
        };
        let (end_part, end_step, end_pos) = match end {
            Some(bound) => (bound.part_index, bound.step_index, Some(bound.position)),
            None => {
                let last = self.parts.len() - 1;
                (last, self.parts[last].step_count() - 1, None)
            }
        };
        if end_part < begin_part {
            return Vec::new();
        }

        if begin_part == end_part {
            return self.parts[begin_part]
                .slice_impl(begin_step, begin_pos, begin_speed, end_step, end_pos, end_speed)
                .into_iter()
                .collect();
        }

        let first = &self.parts[begin_part];
        let last = &self.parts[end_part];
        let mut result = Vec::with_capacity(end_part - begin_part + 1);
        result.extend(first.slice_impl(begin_step, begin_pos, begin_speed, first.step_count() - 1, None, None));
        result.extend(self.parts[begin_part + 1..end_part].iter().cloned());
        result.extend(last.slice_impl(0, None, None, end_step, end_pos, end_speed));
        result
    }
}

impl SearchableEnvelope for Envelope {
    fn binary_search_positions(&self, position: f64) -> Result<usize, usize> {
        binary_search_positions(&self.part_positions, position)
    }

    fn position_points_count(&self) -> usize {
        self.part_positions.len()
    }
}

impl EnvelopeInterpolate for Envelope {
    fn interpolate_speed(&self, position: f64) -> f64 {
        self.assert_continuous();
        self.located_part(self.find_left(position), position)
            .interpolate_speed(position)
    }

    fn interpolate_total_time(&self, position: f64) -> f64 {
        self.assert_continuous();
        let part_index = self.find_left(position);
        let part = self.located_part(part_index, position);
        let part_index = part_index.unwrap_or_default();
        self.time_to_part_transition(part_index) + part.interpolate_total_time(position)
    }

    fn max_speed_in_range(&self, begin_position: f64, end_position: f64) -> f64 {
        self.parts
            .iter()
            .filter(|part| part.begin_pos() <= end_position && begin_position <= part.end_pos())
            .map(|part| part.max_speed_in_range(begin_position, end_position))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    fn iterate_points(&self) -> Vec<EnvelopePoint> {
        let mut points = Vec::new();
        for (part_index, part) in self.parts.iter().enumerate() {
            let time_offset = self.time_to_part_transition(part_index);
            points.extend(
                part.iterate_points()
                    .into_iter()
                    .map(|point| EnvelopePoint::new(point.time() + time_offset, point.speed(), point.position()))
            );
        }
        points
    }
}

impl<'a> IntoIterator for &'a Envelope {
    type Item = &'a Arc<EnvelopePart>;
    type IntoIter = std::slice::Iter<'a, Arc<EnvelopePart>>;

    fn into_iter(self) -> Self::IntoIter {
        self.parts.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::part::envelopeattrs::EnvelopeAttrs;

    fn flat(begin: f64, end: f64, speed: f64) -> Arc<EnvelopePart> {
        EnvelopePart::generate_times(EnvelopeAttrs::new().shared(), vec![begin, end], vec![speed, speed]).shared()
    }

    #[test]
    fn rejects_empty_and_overlapping_parts() {
        assert!(matches!(Envelope::try_make(vec![]), Err(EnvelopeError::EmptyEnvelope)));
        let err = Envelope::try_make(vec![flat(0.0, 2.0, 1.0), flat(1.0, 3.0, 1.0)]).unwrap_err();
        assert!(matches!(err, EnvelopeError::OverlappingParts { index: 1 }));
    }

    #[test]
    fn continuity_flags() {
        let continuous = Envelope::make(vec![flat(0.0, 1.0, 2.0), flat(1.0, 2.0, 2.0)]);
        assert!(continuous.is_continuous());
        assert!(continuous.is_space_continuous());

        let jump = Envelope::make(vec![flat(0.0, 1.0, 2.0), flat(1.0, 2.0, 3.0)]);
        assert!(!jump.is_continuous());
        assert!(jump.is_space_continuous());

        let gap = Envelope::make(vec![flat(0.0, 1.0, 2.0), flat(1.5, 2.0, 2.0)]);
        assert!(!gap.is_space_continuous());
        assert_eq!(gap.find_envelope_part_index(1.7), Some(1));
        assert_eq!(gap.find_envelope_part_index(1.2), None);

        let slice = gap.slice_by_position(1.2, 1.8);
        assert_eq!(slice.len(), 1);
        assert_eq!(slice[0].begin_pos(), 1.5);
        assert_eq!(slice[0].end_pos(), 1.8);
    }

    #[test]
    fn total_time_sums_parts() {
        let envelope = Envelope::make(vec![flat(0.0, 10.0, 2.0), flat(10.0, 20.0, 2.0)]);
        assert!((envelope.total_time() - 10.0).abs() < 1e-9);
        assert!((envelope.interpolate_total_time(15.0) - 7.5).abs() < 1e-9);
        assert!((envelope.time_to_part_transition(1) - 5.0).abs() < 1e-9);
        assert!((envelope.interpolate_total_time_clamp(30.0) - 10.0).abs() < 1e-9);
        assert!((envelope.time_between(5.0, 15.0) - 5.0).abs() < 1e-9);
    }

    #[test]
    #[should_panic(expected = "continuous envelope")]
    fn interpolation_needs_continuity() {
        let envelope = Envelope::make(vec![flat(0.0, 1.0, 2.0), flat(1.0, 2.0, 3.0)]);
        envelope.interpolate_speed(0.5);
    }

    #[test]
    fn directional_speed_lookups() {
        let envelope = Envelope::make(vec![flat(0.0, 1.0, 2.0), flat(1.0, 2.0, 2.0)]);
        assert_eq!(envelope.interpolate_speed_left_dir(1.0, Direction::Backward), 2.0);
        assert_eq!(envelope.interpolate_speed_right_dir(1.0, Direction::Forward), 2.0);
    }

    #[test]
    fn slicing_shares_middle_parts() {
        let middle = flat(1.0, 2.0, 2.0);
        let envelope = Envelope::make(vec![flat(0.0, 1.0, 2.0), Arc::clone(&middle), flat(2.0, 3.0, 2.0)]);
        let slice = envelope.slice_by_position(0.5, 2.5);
        assert_eq!(slice.len(), 3);
        assert!(Arc::ptr_eq(&slice[1], &middle));
        assert_eq!(slice[0].begin_pos(), 0.5);
        assert_eq!(slice[2].end_pos(), 2.5);

        let whole = envelope.smart_slice(None, None);
        assert_eq!(whole.len(), 3);
        assert!(whole.iter().zip(envelope.iter()).all(|(a, b)| Arc::ptr_eq(a, b)));
    }
}
