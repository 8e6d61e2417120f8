mod common;

use trainenvelope::envelope::cmpoperator::CmpOperator;
use trainenvelope::envelope::envelope::{
    Envelope,
    SliceBound
};
use trainenvelope::envelope::envelopecursor::{
    EnvelopeCursor,
    NextStepResult
};

use common::{
    assert_close,
    envelope,
    flat,
    part
};

fn three_parts() -> Envelope {
    envelope(&[
        part("a", &[0.0, 2.0, 4.0], &[2.0, 3.0, 4.0]),
        flat("b", 4.0, 6.0, 4.0),
        part("c", &[6.0, 8.0, 10.0], &[4.0, 3.0, 1.0])
    ])
}

fn location(cursor: &EnvelopeCursor) -> (usize, usize, f64) {
    (cursor.part_index(), cursor.step_index(), cursor.position())
}

#[test]
fn forward_walk_visits_every_step() {
    let envelope = three_parts();
    let mut cursor = EnvelopeCursor::forward(&envelope);
    assert_eq!(location(&cursor), (0, 0, 0.0));
    assert_eq!(cursor.next_step(), NextStepResult::NextStep);
    assert_eq!(location(&cursor), (0, 1, 2.0));
    assert_eq!(cursor.next_step(), NextStepResult::NextPart);
    assert_eq!(location(&cursor), (1, 0, 4.0));
    assert_eq!(cursor.next_step(), NextStepResult::NextPart);
    assert_eq!(cursor.next_step(), NextStepResult::NextStep);
    assert_eq!(location(&cursor), (2, 1, 8.0));
    assert_eq!(cursor.next_step(), NextStepResult::ReachedEnd);
    assert!(cursor.has_reached_end());
}

#[test]
fn backward_walk_reads_steps_in_reverse() {
    let envelope = three_parts();
    let mut cursor = EnvelopeCursor::backward(&envelope);
    assert_eq!(location(&cursor), (2, 1, 10.0));
    assert_eq!(cursor.step_begin_pos(), 10.0);
    assert_eq!(cursor.step_end_pos(), 8.0);
    assert_eq!(cursor.step_begin_speed(), 1.0);
    assert_eq!(cursor.step_end_speed(), 3.0);

    assert_eq!(cursor.next_step(), NextStepResult::NextStep);
    assert_eq!(location(&cursor), (2, 0, 8.0));
    assert_eq!(cursor.next_step(), NextStepResult::NextPart);
    assert_eq!(location(&cursor), (1, 0, 6.0));
    assert_eq!(cursor.next_step(), NextStepResult::NextPart);
    assert_eq!(location(&cursor), (0, 1, 4.0));
    assert_eq!(cursor.next_step(), NextStepResult::NextStep);
    assert_eq!(cursor.next_step(), NextStepResult::ReachedEnd);
}

#[test]
fn find_position_stays_on_the_earlier_step() {
    let envelope = three_parts();
    let mut cursor = EnvelopeCursor::forward(&envelope);
    let revision = cursor.revision();
    assert!(cursor.find_position(4.0));
    assert_eq!(location(&cursor), (0, 1, 4.0));
    assert_eq!(cursor.interpolate_speed(), 4.0);
    assert!(cursor.revision() > revision);

    assert!(cursor.find_position(5.0));
    assert_eq!(location(&cursor), (1, 0, 5.0));
    assert!(!cursor.find_position(11.0));
    assert!(cursor.has_reached_end());
}

#[test]
fn find_position_backward() {
    let envelope = three_parts();
    let mut cursor = EnvelopeCursor::backward(&envelope);
    assert!(cursor.find_position(6.0));
    assert_eq!(location(&cursor), (2, 0, 6.0));
    assert!(cursor.find_position(3.0));
    assert_eq!(location(&cursor), (0, 1, 3.0));
}

#[test]
fn find_speed_stops_on_the_exact_crossing() {
    let envelope = three_parts();
    let mut cursor = EnvelopeCursor::forward(&envelope);
    assert!(cursor.find_speed(3.5, CmpOperator::StrictlyHigher));
    assert_eq!((cursor.part_index(), cursor.step_index()), (0, 1));
    assert_close(cursor.position(), 2.0 + 3.25 / 3.5);
    assert_eq!(cursor.interpolate_speed(), 3.5);

    assert!(cursor.find_speed(2.0, CmpOperator::StrictlyLower));
    assert_eq!((cursor.part_index(), cursor.step_index()), (2, 1));
    assert_close(cursor.position(), 9.25);

    assert!(!cursor.find_speed(0.5, CmpOperator::StrictlyLower));
    assert!(cursor.has_reached_end());
}

#[test]
fn find_speed_backward() {
    let envelope = three_parts();
    let mut cursor = EnvelopeCursor::backward(&envelope);
    assert!(cursor.find_speed(3.5, CmpOperator::StrictlyHigher));
    assert_eq!((cursor.part_index(), cursor.step_index()), (2, 0));
    assert_close(cursor.position(), 8.0 - 3.25 / 3.5);
}

#[test]
fn find_speed_on_a_point_needs_no_interpolation() {
    let envelope = three_parts();
    let mut cursor = EnvelopeCursor::forward(&envelope);
    assert!(cursor.find_speed(4.0, CmpOperator::Higher));
    assert_eq!(cursor.position(), 4.0);
    assert_eq!(cursor.interpolate_speed(), 4.0);
}

#[test]
fn step_and_part_predicates() {
    let envelope = three_parts();
    let mut cursor = EnvelopeCursor::forward(&envelope);
    assert!(cursor.find_step(|_, begin_speed, _, end_speed| end_speed < begin_speed));
    assert_eq!(location(&cursor), (2, 0, 6.0));

    let mut cursor = EnvelopeCursor::forward(&envelope);
    assert!(cursor.find_part(|part| part.min_speed() == part.max_speed()));
    assert_eq!(cursor.part_index(), 1);
    assert!(!cursor.find_part(|part| part.max_speed() > 10.0));
}

#[test]
fn discontinuities_are_detected() {
    let jump = envelope(&[flat("low", 0.0, 2.0, 2.0), flat("high", 2.0, 4.0, 3.0)]);
    let mut cursor = EnvelopeCursor::forward(&jump);
    assert!(!cursor.starts_discontinuity());
    assert!(cursor.find_position(2.0));
    assert!(cursor.starts_discontinuity());

    let mut cursor = EnvelopeCursor::forward(&jump);
    assert!(cursor.find_part_transition(|previous, next| previous.end_speed() != next.begin_speed()));
    assert_eq!(location(&cursor), (1, 0, 2.0));

    let smooth = three_parts();
    let mut cursor = EnvelopeCursor::forward(&smooth);
    assert!(cursor.find_position(4.0));
    assert!(!cursor.starts_discontinuity());
}

#[test]
fn slices_follow_the_traversal_order() {
    let envelope = three_parts();
    let forward = EnvelopeCursor::forward(&envelope);
    let parts = forward.smart_slice(Some(SliceBound::new(0, 1, 3.0)), None);
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0].begin_pos(), 3.0);
    assert_eq!(parts[2].end_pos(), 10.0);

    let backward = EnvelopeCursor::backward(&envelope);
    let parts = backward.smart_slice(Some(SliceBound::new(2, 0, 7.0)), None);
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0].begin_pos(), 0.0);
    assert_eq!(parts[2].end_pos(), 7.0);
}
