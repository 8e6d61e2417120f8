use crate::envelope::direction::Direction;
use crate::envelope::envelope::Envelope;
use crate::envelope::envelopeinterpolate::EnvelopeInterpolate;
use crate::envelope::envelopephysics::{
    interpolate_step_speed,
    intersect_steps
};
use crate::envelope::envelopepoint::CurvePoint;
use crate::envelope::searchableenvelope::SearchableEnvelope;
use crate::envelope::part::constraints::envelopepartconstraint::{
    ConstraintKind,
    EnvelopePartConstraint
};

/// Keeps a part above or below another envelope.
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeConstraint<'a> {
    envelope: &'a Envelope,
    kind: ConstraintKind
}

/// A step of the bounding envelope, in traversal order.
#[derive(Debug, Clone, Copy)]
struct BoundStep {
    begin_pos: f64,
    begin_speed: f64,
    end_pos: f64,
    end_speed: f64
}

impl BoundStep {
    fn speed_at(&self, position: f64) -> f64 {
        interpolate_step_speed(self.begin_pos, self.end_pos, self.begin_speed, self.end_speed, position - self.begin_pos)
    }
}

impl<'a> EnvelopeConstraint<'a> {
    pub fn new(envelope: &'a Envelope, kind: ConstraintKind) -> EnvelopeConstraint<'a> {
        EnvelopeConstraint { envelope: envelope, kind: kind }
    }

    /// First part which may overlap positions from `low` onward.
    fn first_part_from(&self, low: f64) -> usize {
        if low < self.envelope.begin_pos() {
            0
        } else {
            self.envelope.find_left(low).unwrap_or(self.envelope.size())
        }
    }

    /// Steps of the envelope overlapping `[low, high]`, ordered along `direction`.
    fn bound_steps(&self, low: f64, high: f64, direction: Direction) -> Vec<BoundStep> {
        let mut steps = Vec::new();
        for part in self.envelope.iter().skip(self.first_part_from(low)) {
            if part.begin_pos() >= high {
                break;
            }
            if part.end_pos() <= low {
                continue;
            }
            let first_step = if low <= part.begin_pos() { 0 } else { part.find_step(low).unwrap_or(0) };
            for step in first_step..part.step_count() {
                if part.step_begin_pos(step) >= high {
                    break;
                }
                if part.step_end_pos(step) <= low {
                    continue;
                }
                steps.push(BoundStep {
                    begin_pos: direction.step_begin(part.step_begin_pos(step), part.step_end_pos(step)),
                    begin_speed: direction.step_begin(part.step_begin_speed(step), part.step_end_speed(step)),
                    end_pos: direction.step_end(part.step_begin_pos(step), part.step_end_pos(step)),
                    end_speed: direction.step_end(part.step_begin_speed(step), part.step_end_speed(step))
                });
            }
        }
        if direction.is_reverse() {
            steps.reverse();
        }
        steps
    }
}

impl EnvelopePartConstraint for EnvelopeConstraint<'_> {
    fn init_check(&self, position: f64, speed: f64, direction: Direction) -> bool {
        // on a transition, the part which comes next along the direction applies
        let mut containing = self
            .envelope
            .iter()
            .filter(|part| part.begin_pos() <= position && position <= part.end_pos());
        let part = if direction.is_reverse() { containing.next() } else { containing.last() };
        match part {
            Some(part) => !self.kind.is_violated(speed, part.interpolate_speed(position)),
            None => true
        }
    }

    fn step_check(&self, start_pos: f64, start_speed: f64, end_pos: f64, end_speed: f64) -> Option<CurvePoint> {
        let direction = Direction::from_delta(end_pos - start_pos);
        let speed_at = |position: f64| interpolate_step_speed(start_pos, end_pos, start_speed, end_speed, position - start_pos);

        for bound in self.bound_steps(start_pos.min(end_pos), start_pos.max(end_pos), direction) {
            let overlap_start = direction.furthest(start_pos, bound.begin_pos);
            let overlap_end = direction.nearest(end_pos, bound.end_pos);
            if direction.compare_pos(overlap_end, overlap_start) <= 0.0 {
                continue;
            }

            // the bounding envelope may jump at a part transition
            if overlap_start != start_pos {
                let speed = speed_at(overlap_start);
                if self.kind.is_violated(speed, bound.speed_at(overlap_start)) {
                    return Some(CurvePoint::new(overlap_start, speed));
                }
            }

            let speed = speed_at(overlap_end);
            if !self.kind.is_violated(speed, bound.speed_at(overlap_end)) {
                continue;
            }
            let crossing = intersect_steps(
                start_pos,
                start_speed,
                end_pos,
                end_speed,
                bound.begin_pos,
                bound.begin_speed,
                bound.end_pos,
                bound.end_speed
            );
            let position = match crossing {
                Some(point) if point.position().is_finite() => {
                    direction.nearest(direction.furthest(point.position(), overlap_start), overlap_end)
                },
                _ => overlap_start
            };
            return Some(CurvePoint::new(position, bound.speed_at(position)));
        }
        None
    }
}
