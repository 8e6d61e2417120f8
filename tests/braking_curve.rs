mod common;

use std::sync::Arc;

use trainenvelope::envelope::direction::Direction;
use trainenvelope::envelope::envelopeinterpolate::EnvelopeInterpolate;
use trainenvelope::envelope::overlay::overlayenvelopebuilder::OverlayEnvelopeBuilder;
use trainenvelope::envelope::part::constraints::constrainedenvelopepartbuilder::ConstrainedEnvelopePartBuilder;
use trainenvelope::envelope::part::constraints::envelopeconstraint::EnvelopeConstraint;
use trainenvelope::envelope::part::constraints::envelopepartconstraint::{
    ConstraintKind,
    EnvelopePartConstraint
};
use trainenvelope::envelope::part::constraints::positionconstraint::PositionConstraint;
use trainenvelope::envelope::part::envelopepartbuilder::EnvelopePartBuilder;

use common::{
    assert_close,
    assert_ranges,
    envelope,
    flat,
    labeled
};

#[test]
fn braking_curve_stops_under_the_speed_limit() {
    let limit = envelope(&[flat("limit", 0.0, 100.0, 8.0)]);
    let constraints: Vec<Box<dyn EnvelopePartConstraint + '_>> = vec![
        Box::new(EnvelopeConstraint::new(&limit, ConstraintKind::Ceiling)),
        Box::new(PositionConstraint::new(0.0, 100.0))
    ];
    let mut builder = ConstrainedEnvelopePartBuilder::new(EnvelopePartBuilder::new(), constraints);
    builder.set_attrs(labeled("braking"));

    // v² = 2 (100 - x), drawn backward from the stop
    assert!(builder.init_envelope_part(100.0, 0.0, Direction::Backward));
    assert!(!builder.add_step(50.0, 10.0));
    assert_eq!(builder.last_intersection(), Some(0));
    assert_close(builder.last_pos(), 68.0);
    assert_eq!(builder.last_speed(), 8.0);

    let braking = Arc::new(builder.into_inner().build());
    assert_eq!(braking.begin_speed(), 8.0);
    assert_close(braking.begin_pos(), 68.0);

    let mut overlay = OverlayEnvelopeBuilder::forward(&limit);
    overlay.add_part(braking);
    let profile = overlay.build();
    assert_ranges(&profile, &[(0.0, 68.0), (68.0, 100.0)]);
    assert!(profile.is_continuous());
    assert_close(profile.interpolate_speed(84.0), 32f64.sqrt());
    assert_eq!(profile.end_speed(), 0.0);
}
