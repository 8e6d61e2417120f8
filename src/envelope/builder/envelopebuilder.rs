use std::sync::Arc;

use crate::envelope::envelope::Envelope;
use crate::envelope::envelopeerror::EnvelopeResult;
use crate::envelope::part::envelopepart::EnvelopePart;

/// Collects parts into an envelope. Parts collected in reverse order are
/// flipped back when building.
#[derive(Debug, Default)]
pub struct EnvelopeBuilder {
    parts: Vec<Arc<EnvelopePart>>,
    reversed: bool
}

impl EnvelopeBuilder {
    pub fn new() -> EnvelopeBuilder {
        EnvelopeBuilder::default()
    }

    /// A builder expecting parts by decreasing positions.
    pub fn reversed() -> EnvelopeBuilder {
        EnvelopeBuilder { parts: Vec::new(), reversed: true }
    }

    pub fn add_part(&mut self, part: Arc<EnvelopePart>) {
        self.parts.push(part);
    }

    pub fn add_parts(&mut self, parts: impl IntoIterator<Item = Arc<EnvelopePart>>) {
        self.parts.extend(parts);
    }

    pub fn add_envelope(&mut self, envelope: &Envelope) {
        self.parts.extend(envelope.iter().cloned());
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn try_build(mut self) -> EnvelopeResult<Envelope> {
        if self.reversed {
            self.parts.reverse();
        }
        Envelope::try_make(self.parts)
    }

    pub fn build(self) -> Envelope {
        self.try_build().unwrap_or_else(|err| panic!("{}", err))
    }
}
