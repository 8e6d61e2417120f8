use crate::envelope::envelopecursor::{
    EnvelopeCursor,
    NextStepResult
};
use crate::envelope::envelopephysics::{
    interpolate_step_speed,
    interpolate_step_time,
    intersect_steps
};

/// A step to append to an overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct OverlayStep {
    pub position: f64,
    pub speed: f64,
    pub time_delta: f64
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum TipOutcome {
    /// The whole step stays under the base curve.
    Continue,
    /// The overlay stops, once the given step is appended.
    Stop { step: Option<OverlayStep>, intersection: bool }
}

/// Overlay and base speeds at the next point where either curve has a point.
#[derive(Debug, Clone, Copy)]
struct NextPoint {
    position: f64,
    base_speed: f64,
    overlay_speed: f64
}

/// Last point of an overlay being drawn over a base envelope.
///
/// The tip checks each new overlay step against the base steps under the
/// cursor, and tells where the overlay has to stop: at its first crossing with
/// the base curve, on a base part starting below the overlay, or at the end of
/// the base envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct OverlayTip {
    pub last_pos: f64,
    pub last_speed: f64
}

impl OverlayTip {
    pub(crate) fn new(last_pos: f64, last_speed: f64) -> OverlayTip {
        OverlayTip { last_pos: last_pos, last_speed: last_speed }
    }

    pub(crate) fn advance(&self, cursor: &mut EnvelopeCursor<'_>, position: f64, speed: f64, time_delta: f64) -> TipOutcome {
        assert!(
            cursor.compare_pos(self.last_pos, position) < 0.0,
            "overlay steps must move along the cursor direction, got {} after {}",
            position,
            self.last_pos
        );
        while cursor.compare_pos(position, cursor.step_begin_pos()) > 0.0 {
            if let Some(outcome) = self.intersect(cursor, position, speed, time_delta) {
                return outcome;
            }
            let step_end = cursor.step_end_pos();
            if cursor.compare_pos(position, step_end) < 0.0 {
                break;
            }
            match cursor.next_step() {
                NextStepResult::NextStep => {},
                NextStepResult::NextPart => {
                    if let Some(outcome) = self.handle_new_part(cursor, position, speed, time_delta) {
                        return outcome;
                    }
                },
                NextStepResult::ReachedEnd => {
                    return TipOutcome::Stop {
                        step: self.step_to(step_end, position, speed, time_delta),
                        intersection: false
                    };
                }
            }
        }
        TipOutcome::Continue
    }

    /// The overlay step from the tip to `target`, cut from the step ending at `(position, speed)`.
    fn step_to(&self, target: f64, position: f64, speed: f64, time_delta: f64) -> Option<OverlayStep> {
        if target == self.last_pos {
            return None;
        }
        if target == position {
            return Some(OverlayStep { position: position, speed: speed, time_delta: time_delta });
        }
        let delta = target - self.last_pos;
        Some(OverlayStep {
            position: target,
            speed: interpolate_step_speed(self.last_pos, position, self.last_speed, speed, delta),
            time_delta: interpolate_step_time(self.last_pos, position, self.last_speed, speed, delta)
        })
    }

    fn base_speed_at(cursor: &EnvelopeCursor<'_>, position: f64) -> f64 {
        interpolate_step_speed(
            cursor.step_begin_pos(),
            cursor.step_end_pos(),
            cursor.step_begin_speed(),
            cursor.step_end_speed(),
            position - cursor.step_begin_pos()
        )
    }

    fn next_point(&self, cursor: &EnvelopeCursor<'_>, position: f64, speed: f64) -> NextPoint {
        let base_step_end = cursor.step_end_pos();
        let delta = cursor.compare_pos(position, base_step_end);
        if delta == 0.0 {
            return NextPoint { position: position, base_speed: cursor.step_end_speed(), overlay_speed: speed };
        }
        if delta < 0.0 {
            return NextPoint {
                position: position,
                base_speed: OverlayTip::base_speed_at(cursor, position),
                overlay_speed: speed
            };
        }
        NextPoint {
            position: base_step_end,
            base_speed: cursor.step_end_speed(),
            overlay_speed: interpolate_step_speed(
                self.last_pos,
                position,
                self.last_speed,
                speed,
                base_step_end - self.last_pos
            )
        }
    }

    /// Looks for a crossing with the base step under the cursor.
    fn intersect(&self, cursor: &EnvelopeCursor<'_>, position: f64, speed: f64, time_delta: f64) -> Option<TipOutcome> {
        let base_min_speed = cursor.step_begin_speed().min(cursor.step_end_speed());
        if self.last_speed.max(speed) < base_min_speed {
            return None;
        }

        let next = self.next_point(cursor, position, speed);
        let speed_delta = next.overlay_speed - next.base_speed;
        if speed_delta < 0.0 {
            return None;
        }
        if speed_delta == 0.0 {
            return Some(TipOutcome::Stop {
                step: self.step_to(next.position, position, speed, time_delta),
                intersection: true
            });
        }

        let direction = cursor.direction();
        let lowest = direction.furthest(self.last_pos, cursor.step_begin_pos());
        let crossing = intersect_steps(
            self.last_pos,
            self.last_speed,
            position,
            speed,
            cursor.step_begin_pos(),
            cursor.step_begin_speed(),
            cursor.step_end_pos(),
            cursor.step_end_speed()
        );
        let crossing_pos = match crossing {
            Some(point) if point.position().is_finite() => {
                direction.nearest(direction.furthest(point.position(), lowest), next.position)
            },
            _ => lowest
        };
        if crossing_pos == self.last_pos {
            return Some(TipOutcome::Stop { step: None, intersection: true });
        }
        tracing::trace!(position = crossing_pos, "overlay crosses the base curve");
        Some(TipOutcome::Stop {
            step: Some(OverlayStep {
                position: crossing_pos,
                speed: OverlayTip::base_speed_at(cursor, crossing_pos),
                time_delta: interpolate_step_time(
                    self.last_pos,
                    position,
                    self.last_speed,
                    speed,
                    crossing_pos - self.last_pos
                )
            }),
            intersection: true
        })
    }

    /// Stops the overlay when the new base part starts at or below it.
    fn handle_new_part(&self, cursor: &EnvelopeCursor<'_>, position: f64, speed: f64, time_delta: f64) -> Option<TipOutcome> {
        let part_start = cursor.step_begin_pos();
        let overlay_speed = if part_start == position {
            speed
        } else {
            interpolate_step_speed(self.last_pos, position, self.last_speed, speed, part_start - self.last_pos)
        };
        if cursor.step_begin_speed() > overlay_speed {
            return None;
        }
        Some(TipOutcome::Stop {
            step: self.step_to(part_start, position, speed, time_delta),
            intersection: false
        })
    }
}
