use std::sync::Arc;

use crate::configuration::EnvelopeConfig;
use crate::envelope::builder::envelopebuilder::EnvelopeBuilder;
use crate::envelope::direction::Direction;
use crate::envelope::envelope::Envelope;
use crate::envelope::envelopeerror::EnvelopeResult;
use crate::envelope::envelopephysics::{
    intersect_steps,
    step_acceleration
};
use crate::envelope::envelopepoint::CurvePoint;
use crate::envelope::part::envelopepart::EnvelopePart;
use crate::envelope::part::envelopepartbuilder::EnvelopePartBuilder;

/// Speed and acceleration of a curve at some position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepSample {
    pub speed: f64,
    pub acceleration: f64
}

/// Decides which curve a sweep keeps where several overlap.
pub trait SweepOrder {
    /// Whether `candidate` is strictly better than `incumbent` at the same position.
    fn is_better_speed(&self, candidate: f64, incumbent: f64) -> bool;

    /// Whether `candidate` should replace `incumbent` from some position onward,
    /// given both curves right after that position.
    fn beats(&self, candidate: SweepSample, incumbent: SweepSample) -> bool;
}

/// Keeps the lowest curve. On equal speeds, the one braking the hardest.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinOrder;

impl SweepOrder for MinOrder {
    fn is_better_speed(&self, candidate: f64, incumbent: f64) -> bool {
        candidate < incumbent
    }

    fn beats(&self, candidate: SweepSample, incumbent: SweepSample) -> bool {
        candidate.speed < incumbent.speed
            || (candidate.speed == incumbent.speed && candidate.acceleration < incumbent.acceleration)
    }
}

/// Keeps the highest curve. Speeds closer than the tie epsilon are
/// considered equal, in which case the curve accelerating the most wins.
#[derive(Debug, Clone, Copy)]
pub struct MaxOrder {
    tie_epsilon: f64
}

impl MaxOrder {
    pub fn new(tie_epsilon: f64) -> MaxOrder {
        MaxOrder { tie_epsilon: tie_epsilon }
    }
}

impl Default for MaxOrder {
    fn default() -> Self {
        MaxOrder::new(EnvelopeConfig::default().max_speed_tie_epsilon())
    }
}

impl SweepOrder for MaxOrder {
    fn is_better_speed(&self, candidate: f64, incumbent: f64) -> bool {
        candidate > incumbent + self.tie_epsilon
    }

    fn beats(&self, candidate: SweepSample, incumbent: SweepSample) -> bool {
        if (candidate.speed - incumbent.speed).abs() <= self.tie_epsilon {
            return candidate.acceleration > incumbent.acceleration;
        }
        candidate.speed > incumbent.speed
    }
}

/// Builds the pointwise minimum or maximum of a set of parts.
///
/// Where no input part covers a position, the result has a gap. Output points
/// are either input points or crossings between input curves, and output step
/// times are recomputed from the kinematics.
#[derive(Debug)]
pub struct SweepEnvelopeBuilder<O: SweepOrder> {
    order: O,
    parts: Vec<Arc<EnvelopePart>>
}

pub type MinEnvelopeBuilder = SweepEnvelopeBuilder<MinOrder>;
pub type MaxEnvelopeBuilder = SweepEnvelopeBuilder<MaxOrder>;

impl SweepEnvelopeBuilder<MinOrder> {
    pub fn new() -> MinEnvelopeBuilder {
        SweepEnvelopeBuilder::with_order(MinOrder)
    }
}

impl Default for SweepEnvelopeBuilder<MinOrder> {
    fn default() -> Self {
        SweepEnvelopeBuilder::<MinOrder>::new()
    }
}

impl SweepEnvelopeBuilder<MaxOrder> {
    pub fn new() -> MaxEnvelopeBuilder {
        SweepEnvelopeBuilder::with_order(MaxOrder::default())
    }

    pub fn with_config(config: &EnvelopeConfig) -> MaxEnvelopeBuilder {
        SweepEnvelopeBuilder::with_order(MaxOrder::new(config.max_speed_tie_epsilon()))
    }
}

impl Default for SweepEnvelopeBuilder<MaxOrder> {
    fn default() -> Self {
        SweepEnvelopeBuilder::<MaxOrder>::new()
    }
}

impl<O: SweepOrder> SweepEnvelopeBuilder<O> {
    pub fn with_order(order: O) -> SweepEnvelopeBuilder<O> {
        SweepEnvelopeBuilder { order: order, parts: Vec::new() }
    }

    pub fn add_part(&mut self, part: Arc<EnvelopePart>) -> &mut SweepEnvelopeBuilder<O> {
        self.parts.push(part);
        self
    }

    pub fn add_parts(&mut self, parts: impl IntoIterator<Item = Arc<EnvelopePart>>) -> &mut SweepEnvelopeBuilder<O> {
        self.parts.extend(parts);
        self
    }

    pub fn add_envelope(&mut self, envelope: &Envelope) -> &mut SweepEnvelopeBuilder<O> {
        self.parts.extend(envelope.iter().cloned());
        self
    }

    pub fn try_build(self) -> EnvelopeResult<Envelope> {
        let mut events = Vec::new();
        for (part_index, part) in self.parts.iter().enumerate() {
            events.push(SweepEvent { position: part.begin_pos(), part: part_index, kind: EventKind::Begin });
            for point_index in 1..part.point_count() - 1 {
                events.push(SweepEvent {
                    position: part.point_pos(point_index),
                    part: part_index,
                    kind: EventKind::Intermediate(point_index)
                });
            }
            events.push(SweepEvent { position: part.end_pos(), part: part_index, kind: EventKind::End });
        }
        events.sort_by(|a, b| a.position.total_cmp(&b.position));

        let mut sweep = Sweep {
            order: &self.order,
            parts: &self.parts,
            steps: vec![0; self.parts.len()],
            active: Vec::new(),
            winner: None,
            current: None,
            last_position: f64::NEG_INFINITY,
            output: EnvelopeBuilder::new()
        };
        let mut group_begin = 0;
        while group_begin < events.len() {
            let position = events[group_begin].position;
            let group_end = events[group_begin..]
                .iter()
                .position(|event| event.position != position)
                .map_or(events.len(), |offset| group_begin + offset);
            sweep.process(position, &events[group_begin..group_end]);
            group_begin = group_end;
        }
        sweep.close();

        tracing::debug!(inputs = self.parts.len(), outputs = sweep.output.len(), "swept envelope parts");
        sweep.output.try_build()
    }

    pub fn build(self) -> Envelope {
        self.try_build().unwrap_or_else(|err| panic!("{}", err))
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum EventKind {
    Begin,
    Intermediate(usize),
    End
}

#[derive(Debug, Clone, Copy)]
struct SweepEvent {
    position: f64,
    part: usize,
    kind: EventKind
}

struct Sweep<'p, O: SweepOrder> {
    order: &'p O,
    parts: &'p [Arc<EnvelopePart>],
    /// current step of each input part
    steps: Vec<usize>,
    /// input parts covering the sweep position, by insertion order
    active: Vec<usize>,
    winner: Option<usize>,
    current: Option<EnvelopePartBuilder>,
    last_position: f64,
    output: EnvelopeBuilder
}

impl<O: SweepOrder> Sweep<'_, O> {
    fn speed_at(&self, part: usize, position: f64) -> f64 {
        self.parts[part].interpolate_speed_in_step(self.steps[part], position)
    }

    fn sample(&self, part: usize, position: f64) -> SweepSample {
        let (curve, step) = (&self.parts[part], self.steps[part]);
        SweepSample {
            speed: curve.interpolate_speed_in_step(step, position),
            acceleration: step_acceleration(
                curve.step_begin_pos(step),
                curve.step_end_pos(step),
                curve.step_begin_speed(step),
                curve.step_end_speed(step)
            )
        }
    }

    /// Where `challenger` crosses `winner` within `[from, to]`, with the speed read on `challenger`.
    fn crossing(&self, winner: usize, challenger: usize, from: f64, to: f64) -> CurvePoint {
        let (a, a_step) = (&self.parts[winner], self.steps[winner]);
        let (b, b_step) = (&self.parts[challenger], self.steps[challenger]);
        let crossing = intersect_steps(
            a.step_begin_pos(a_step),
            a.step_begin_speed(a_step),
            a.step_end_pos(a_step),
            a.step_end_speed(a_step),
            b.step_begin_pos(b_step),
            b.step_begin_speed(b_step),
            b.step_end_pos(b_step),
            b.step_end_speed(b_step)
        );
        let position = match crossing {
            Some(point) if point.position().is_finite() => point.position().clamp(from, to),
            _ => from
        };
        CurvePoint::new(position, b.interpolate_speed_in_step(b_step, position))
    }

    fn open(&mut self, part: usize, position: f64, speed: f64) {
        let attrs = Arc::clone(self.parts[part].attrs());
        self.current = Some(EnvelopePartBuilder::starting_at(attrs, position, speed, Direction::Forward));
        self.winner = Some(part);
    }

    fn extend(&mut self, position: f64, speed: f64) {
        if let Some(builder) = &mut self.current {
            if builder.last_pos().is_some_and(|last_pos| position > last_pos) {
                builder.add_step(position, speed);
            }
        }
    }

    /// Flushes the part being built, returning its last point.
    fn close(&mut self) -> Option<CurvePoint> {
        let builder = self.current.take()?;
        let last_point = match (builder.last_pos(), builder.last_speed()) {
            (Some(position), Some(speed)) => Some(CurvePoint::new(position, speed)),
            _ => None
        };
        if let Some(part) = builder.try_build() {
            self.output.add_part(Arc::new(part));
        }
        self.winner = None;
        last_point
    }

    fn process(&mut self, position: f64, group: &[SweepEvent]) {
        self.update_crossings(position);

        for event in group.iter().filter(|event| event.kind == EventKind::End) {
            if self.winner == Some(event.part) {
                let speed = self.parts[event.part].end_speed();
                self.extend(position, speed);
                self.close();
            }
            self.active.retain(|part| *part != event.part);
        }

        for event in group {
            if let EventKind::Intermediate(point_index) = event.kind {
                if self.winner == Some(event.part) {
                    let speed = self.parts[event.part].point_speed(point_index);
                    self.extend(position, speed);
                }
                self.steps[event.part] = point_index;
            }
        }

        for event in group.iter().filter(|event| event.kind == EventKind::Begin) {
            self.active.push(event.part);
            self.steps[event.part] = 0;
        }

        self.update_winner(position);
        self.last_position = position;
    }

    /// Follows the curves crossing the winner between the previous event and `position`.
    fn update_crossings(&mut self, position: f64) {
        let mut from = self.last_position;
        for _ in 0..self.active.len() {
            let Some(winner) = self.winner else {
                return;
            };
            let winner_speed = self.speed_at(winner, position);
            let mut earliest: Option<(usize, CurvePoint)> = None;
            for &part in self.active.iter() {
                if part == winner || !self.order.is_better_speed(self.speed_at(part, position), winner_speed) {
                    continue;
                }
                let crossing = self.crossing(winner, part, from, position);
                if earliest.is_none_or(|(_, point)| crossing.position() < point.position()) {
                    earliest = Some((part, crossing));
                }
            }
            let Some((part, crossing)) = earliest else {
                return;
            };
            tracing::trace!(position = crossing.position(), from = winner, to = part, "curves cross");
            self.extend(crossing.position(), crossing.speed());
            let start = self.close().unwrap_or(crossing);
            self.open(part, start.position(), start.speed());
            from = crossing.position();
        }
    }

    /// Picks the best curve leaving `position`, jumping to it when it beats the winner.
    fn update_winner(&mut self, position: f64) {
        let mut best: Option<(usize, SweepSample)> = None;
        for &part in self.active.iter() {
            let sample = self.sample(part, position);
            if best.is_none_or(|(_, best_sample)| self.order.beats(sample, best_sample)) {
                best = Some((part, sample));
            }
        }
        let Some((best_part, best_sample)) = best else {
            return;
        };
        match self.winner {
            None => self.open(best_part, position, best_sample.speed),
            Some(winner) if winner != best_part => {
                let winner_sample = self.sample(winner, position);
                if self.order.beats(best_sample, winner_sample) {
                    self.extend(position, winner_sample.speed);
                    self.close();
                    self.open(best_part, position, best_sample.speed);
                }
            },
            Some(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::part::envelopeattrs::EnvelopeAttrs;

    fn sample(speed: f64, acceleration: f64) -> SweepSample {
        SweepSample { speed: speed, acceleration: acceleration }
    }

    #[test]
    fn orders_break_ties_on_acceleration() {
        assert!(MinOrder.beats(sample(2.0, -1.0), sample(2.0, 0.0)));
        assert!(!MinOrder.beats(sample(2.0, 1.0), sample(2.0, 0.0)));

        let max = MaxOrder::new(1e-6);
        assert!(max.beats(sample(2.0 - 1e-7, 1.0), sample(2.0, 0.0)));
        assert!(max.beats(sample(2.1, -1.0), sample(2.0, 0.0)));
        assert!(!max.is_better_speed(2.0 + 1e-7, 2.0));
        assert!(max.is_better_speed(2.1, 2.0));
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(MinEnvelopeBuilder::new().try_build().is_err());
    }

    #[test]
    fn output_carries_input_attrs() {
        let attrs = EnvelopeAttrs::new().with_label("limit").shared();
        let part = EnvelopePart::generate_times(Arc::clone(&attrs), vec![0.0, 5.0], vec![3.0, 3.0]).shared();
        let mut builder = MaxEnvelopeBuilder::new();
        builder.add_part(part);
        let max = builder.build();
        assert!(Arc::ptr_eq(max.get(0).attrs(), &attrs));
    }
}
