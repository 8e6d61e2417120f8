use std::sync::Arc;

use crate::configuration::EnvelopeConfig;
use crate::envelope::direction::Direction;
use crate::envelope::envelope::Envelope;
use crate::envelope::envelopecursor::EnvelopeCursor;
use crate::envelope::overlay::overlaysplice::OverlaySplice;
use crate::envelope::part::envelopepart::EnvelopePart;

/// Replaces ranges of a base envelope with ready-made parts.
///
/// Parts must be given in traversal order, without overlapping each other.
/// The base curve is kept between them. Where a part edge meets the base curve
/// at a speed only differing by rounding, the part speed is forced onto the base
/// edge, so that the result stays continuous.
pub struct OverlayEnvelopeBuilder<'a> {
    cursor: EnvelopeCursor<'a>,
    splice: OverlaySplice
}

impl<'a> OverlayEnvelopeBuilder<'a> {
    pub fn new(base: &'a Envelope, direction: Direction) -> OverlayEnvelopeBuilder<'a> {
        OverlayEnvelopeBuilder::with_config(base, direction, &EnvelopeConfig::default())
    }

    pub fn with_config(base: &'a Envelope, direction: Direction, config: &EnvelopeConfig) -> OverlayEnvelopeBuilder<'a> {
        OverlayEnvelopeBuilder {
            cursor: EnvelopeCursor::new(base, direction),
            splice: OverlaySplice::new(direction, config)
        }
    }

    pub fn forward(base: &'a Envelope) -> OverlayEnvelopeBuilder<'a> {
        OverlayEnvelopeBuilder::new(base, Direction::Forward)
    }

    pub fn backward(base: &'a Envelope) -> OverlayEnvelopeBuilder<'a> {
        OverlayEnvelopeBuilder::new(base, Direction::Backward)
    }

    pub fn add_part(&mut self, part: Arc<EnvelopePart>) -> &mut OverlayEnvelopeBuilder<'a> {
        let direction = self.cursor.direction();
        let start = direction.step_begin(part.begin_pos(), part.end_pos());
        let end = direction.step_end(part.begin_pos(), part.end_pos());
        let start_speed = direction.step_begin(part.begin_speed(), part.end_speed());
        let end_speed = direction.step_end(part.begin_speed(), part.end_speed());

        assert!(self.cursor.find_position(start), "overlay part starts outside of the base envelope, at {}", start);
        self.splice.copy_base(&self.cursor, Some(start_speed));
        self.splice.add_overlay(part);
        assert!(self.cursor.find_position(end), "overlay part ends outside of the base envelope, at {}", end);
        self.splice.resume_at(Some((self.cursor.bound(), end_speed)));
        self
    }

    pub fn add_parts(&mut self, parts: impl IntoIterator<Item = Arc<EnvelopePart>>) -> &mut OverlayEnvelopeBuilder<'a> {
        for part in parts {
            self.add_part(part);
        }
        self
    }

    pub fn build(mut self) -> Envelope {
        self.cursor.move_to_end();
        self.splice.copy_base(&self.cursor, None);
        self.splice.build()
    }
}
