//! Kinematics of a single envelope step.
//!
//! Within a step, acceleration is constant over time, which makes the squared speed
//! an affine function of the position. Every formula below works in the
//! (position, speed²) plane and is indifferent to the traversal direction:
//! a step may be given from its higher position to its lower one.

use crate::envelope::envelopepoint::CurvePoint;

/// Below this magnitude, an acceleration is treated as zero when computing step times.
pub const ZERO_ACCELERATION_EPSILON: f64 = 1e-6;

/// Constant acceleration needed to go from `begin_speed` at `begin_pos` to
/// `end_speed` at `end_pos`, counted along the direction from begin to end.
pub fn step_acceleration(begin_pos: f64, end_pos: f64, begin_speed: f64, end_speed: f64) -> f64 {
    if begin_pos == end_pos {
        debug_assert!(begin_speed == end_speed, "a zero length step cannot change speed");
        return 0.0;
    }
    (end_speed * end_speed - begin_speed * begin_speed) / (2.0 * (end_pos - begin_pos))
}

/// Speed reached after travelling `position_delta` from `begin_speed` under `acceleration`.
pub fn accelerated_speed(acceleration: f64, begin_speed: f64, position_delta: f64) -> f64 {
    let squared_speed = begin_speed * begin_speed + 2.0 * acceleration * position_delta;
    if squared_speed <= 0.0 {
        // braking to a stop leaves a tiny negative residue
        debug_assert!(
            squared_speed > -1e-6 * f64::max(1.0, begin_speed * begin_speed),
            "the step never reaches this position"
        );
        return 0.0;
    }
    squared_speed.sqrt()
}

/// Speed at `position_delta` from the beginning of the step joining the two given points.
pub fn interpolate_step_speed(
    begin_pos: f64,
    end_pos: f64,
    begin_speed: f64,
    end_speed: f64,
    position_delta: f64
) -> f64 {
    if position_delta == 0.0 {
        return begin_speed;
    }
    if begin_pos + position_delta == end_pos {
        return end_speed;
    }
    let acceleration = step_acceleration(begin_pos, end_pos, begin_speed, end_speed);
    accelerated_speed(acceleration, begin_speed, position_delta)
}

/// Time needed to travel `position_delta` from the beginning of the step joining the two given points.
pub fn interpolate_step_time(
    begin_pos: f64,
    end_pos: f64,
    begin_speed: f64,
    end_speed: f64,
    position_delta: f64
) -> f64 {
    let acceleration = step_acceleration(begin_pos, end_pos, begin_speed, end_speed);
    if acceleration.abs() < ZERO_ACCELERATION_EPSILON {
        return (position_delta / begin_speed).abs();
    }
    let speed = accelerated_speed(acceleration, begin_speed, position_delta);
    ((speed - begin_speed) / acceleration).abs()
}

/// Position at which the step reaches `speed`. The step must be accelerating or braking.
pub fn intersect_step_with_speed(
    begin_pos: f64,
    begin_speed: f64,
    end_pos: f64,
    end_speed: f64,
    speed: f64
) -> f64 {
    if speed == begin_speed {
        return begin_pos;
    }
    if speed == end_speed {
        return end_pos;
    }
    let acceleration = step_acceleration(begin_pos, end_pos, begin_speed, end_speed);
    debug_assert!(acceleration != 0.0, "a constant step never crosses another speed");
    begin_pos + (speed * speed - begin_speed * begin_speed) / (2.0 * acceleration)
}

/// Crossing point of two steps, extended to full lines in the (position, speed²) plane.
///
/// The speed is interpolated on the second step. Returns `None` for parallel steps.
/// The caller is responsible for checking the crossing lies within both steps.
#[allow(clippy::too_many_arguments)]
pub fn intersect_steps(
    a_begin_pos: f64,
    a_begin_speed: f64,
    a_end_pos: f64,
    a_end_speed: f64,
    b_begin_pos: f64,
    b_begin_speed: f64,
    b_end_pos: f64,
    b_end_speed: f64
) -> Option<CurvePoint> {
    let a_acceleration = step_acceleration(a_begin_pos, a_end_pos, a_begin_speed, a_end_speed);
    let b_acceleration = step_acceleration(b_begin_pos, b_end_pos, b_begin_speed, b_end_speed);
    if a_acceleration == b_acceleration {
        return None;
    }

    if a_acceleration == 0.0 {
        let position = intersect_step_with_speed(b_begin_pos, b_begin_speed, b_end_pos, b_end_speed, a_begin_speed);
        return Some(CurvePoint::new(position, a_begin_speed));
    }
    if b_acceleration == 0.0 {
        let position = intersect_step_with_speed(a_begin_pos, a_begin_speed, a_end_pos, a_end_speed, b_begin_speed);
        return Some(CurvePoint::new(position, b_begin_speed));
    }

    let position = (b_begin_speed * b_begin_speed - a_begin_speed * a_begin_speed
        + 2.0 * a_acceleration * a_begin_pos
        - 2.0 * b_acceleration * b_begin_pos)
        / (2.0 * (a_acceleration - b_acceleration));
    if !position.is_finite() {
        return None;
    }
    let speed = accelerated_speed(b_acceleration, b_begin_speed, position - b_begin_pos);
    Some(CurvePoint::new(position, speed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "expected {}, got {}", expected, actual);
    }

    #[test]
    fn acceleration_is_direction_agnostic() {
        let forward = step_acceleration(0.0, 10.0, 2.0, 4.0);
        assert_close(forward, 0.6);
        let backward = step_acceleration(10.0, 0.0, 4.0, 2.0);
        assert_close(backward, 0.6);
        assert_close(interpolate_step_speed(10.0, 0.0, 4.0, 2.0, -10.0), 2.0);
    }

    #[test]
    fn step_speed_is_exact_on_bounds() {
        assert_eq!(interpolate_step_speed(3.0, 7.1, 1.3, 2.9, 0.0), 1.3);
        assert_eq!(interpolate_step_speed(3.0, 7.1, 1.3, 2.9, 4.1), 2.9);
    }

    #[test]
    fn braking_to_a_stop_clamps_to_zero() {
        let acceleration = step_acceleration(0.0, 8.0, 4.0, 0.0);
        assert_eq!(accelerated_speed(acceleration, 4.0, 8.0 + 1e-12), 0.0);
    }

    #[test]
    fn step_time_for_constant_and_accelerating_steps() {
        assert_close(interpolate_step_time(0.0, 10.0, 5.0, 5.0, 10.0), 2.0);
        // from 0 to 2m/s under 1m/s²: 2s over 2m
        assert_close(interpolate_step_time(0.0, 2.0, 0.0, 2.0, 2.0), 2.0);
        assert_close(interpolate_step_time(2.0, 0.0, 2.0, 0.0, -2.0), 2.0);
    }

    #[test]
    fn speed_threshold_crossing() {
        // v² = 2x
        let position = intersect_step_with_speed(0.0, 0.0, 8.0, 4.0, 2.0);
        assert_close(position, 2.0);
        assert_eq!(intersect_step_with_speed(0.0, 0.0, 8.0, 4.0, 4.0), 8.0);
    }

    #[test]
    fn crossing_of_two_accelerating_steps() {
        // v² = 2x and v² = 8 - 2x cross at x = 2, v = 2
        let point = intersect_steps(0.0, 0.0, 4.0, 8f64.sqrt(), 0.0, 8f64.sqrt(), 4.0, 0.0).unwrap();
        assert_close(point.position(), 2.0);
        assert_close(point.speed(), 2.0);
    }

    #[test]
    fn crossing_with_a_plateau() {
        let point = intersect_steps(0.0, 3.0, 10.0, 3.0, 0.0, 0.0, 8.0, 4.0).unwrap();
        assert_close(point.position(), 4.5);
        assert_eq!(point.speed(), 3.0);
    }

    #[test]
    fn parallel_steps_never_cross() {
        assert!(intersect_steps(0.0, 1.0, 1.0, 1.0, 0.0, 2.0, 1.0, 2.0).is_none());
    }
}
