mod common;

use std::sync::Arc;

use trainenvelope::envelope::builder::envelopebuilder::EnvelopeBuilder;
use trainenvelope::envelope::direction::Direction;
use trainenvelope::envelope::envelope::Envelope;
use trainenvelope::envelope::envelopeinterpolate::EnvelopeInterpolate;
use trainenvelope::envelope::searchableenvelope::SearchableEnvelope;

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

#[test]
fn sliced_envelope_reads_like_its_source() {
    let base = three_parts();
    let sliced = Envelope::make(base.slice_by_position(1.0, 9.0));
    assert_eq!(sliced.size(), 3);
    assert!(sliced.is_continuous());
    assert_eq!(sliced.begin_pos(), 1.0);
    assert_eq!(sliced.end_pos(), 9.0);
    assert!(Arc::ptr_eq(sliced.get(1), base.get(1)));

    for position in [1.5, 3.0, 4.0, 5.0, 7.0, 8.5] {
        assert_close(sliced.interpolate_speed(position), base.interpolate_speed(position));
    }
    assert_close(sliced.total_time(), base.time_between(1.0, 9.0));
}

#[test]
fn transitions_are_searchable_from_both_sides() {
    let envelope = three_parts();
    assert_eq!(envelope.find_left(4.0), Some(0));
    assert_eq!(envelope.find_right(4.0), Some(1));
    assert_eq!(envelope.find_left_dir(4.0, Direction::Backward), Some(1));
    assert_eq!(envelope.find_left(-1.0), None);
    assert_eq!(envelope.find_right(10.0), Some(2));
    assert_eq!(envelope.interpolate_speed_left_dir(6.0, Direction::Forward), 4.0);
}

#[test]
fn points_come_out_in_time_order() {
    let envelope = three_parts();
    let points = envelope.iterate_points();
    assert_eq!(points.len(), 8);
    for pair in points.windows(2) {
        assert!(pair[0].time() <= pair[1].time());
        assert!(pair[0].position() <= pair[1].position());
    }
    assert_close(points[7].time(), envelope.total_time());
}

#[test]
fn speed_range_queries() {
    let envelope = three_parts();
    assert_eq!(envelope.max_speed(), 4.0);
    assert_eq!(envelope.min_speed(), 1.0);
    assert_eq!(envelope.max_speed_in_range(0.0, 10.0), 4.0);
    assert_close(envelope.max_speed_in_range(8.5, 10.0), envelope.interpolate_speed(8.5));
}

#[test]
fn reversed_builder_restores_storage_order() {
    let base = three_parts();
    let mut builder = EnvelopeBuilder::reversed();
    for part in base.iter().rev() {
        builder.add_part(Arc::clone(part));
    }
    let rebuilt = builder.build();
    assert_eq!(rebuilt.size(), 3);
    assert!(rebuilt.is_continuous());
    for (rebuilt_part, base_part) in rebuilt.iter().zip(base.iter()) {
        assert!(Arc::ptr_eq(rebuilt_part, base_part));
    }
}
