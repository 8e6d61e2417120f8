use std::sync::Arc;

use crate::configuration::CURSOR_SPEED_TOLERANCE;
use crate::envelope::cmpoperator::CmpOperator;
use crate::envelope::envelope::Envelope;
use crate::envelope::envelopecursor::{
    EnvelopeCursor,
    NextStepResult
};
use crate::envelope::overlay::envelopeoverlaybuilder::EnvelopeOverlayBuilder;
use crate::envelope::part::envelopeattrs::EnvelopeAttrs;

/// Caps the speed of an envelope.
pub struct EnvelopeSpeedCap;

impl EnvelopeSpeedCap {
    /// Envelope equal to `base` wherever it stays under `speed_limit`, and to
    /// plateaus at `speed_limit` carrying `attrs` elsewhere.
    #[tracing::instrument(level = "debug", skip(base, attrs))]
    pub fn from(base: &Envelope, attrs: Arc<EnvelopeAttrs>, speed_limit: f64) -> Envelope {
        assert!(speed_limit > 0.0, "speed limits must be positive");
        let mut cursor = EnvelopeCursor::forward(base);
        let mut builder = EnvelopeOverlayBuilder::forward(base);

        while cursor.find_speed(speed_limit, CmpOperator::StrictlyHigher) {
            let start = cursor.position();
            builder.start_discontinuous_overlay(Arc::clone(&attrs), start, speed_limit);
            let end = builder.add_plateau();
            tracing::trace!(start, end, "capped range");
            if builder.is_complete() || !cursor.find_position(end) {
                break;
            }
            if cursor.starts_discontinuity() {
                cursor.next_part();
            } else if (cursor.interpolate_speed() - speed_limit).abs() <= CURSOR_SPEED_TOLERANCE {
                cursor.force_speed(speed_limit);
            }
            if end == start && cursor.next_step() == NextStepResult::ReachedEnd {
                break;
            }
        }
        builder.build()
    }
}
