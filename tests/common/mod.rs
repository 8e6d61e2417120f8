#![allow(dead_code)]

use std::sync::Arc;

use trainenvelope::envelope::envelope::Envelope;
use trainenvelope::envelope::part::envelopeattrs::EnvelopeAttrs;
use trainenvelope::envelope::part::envelopepart::EnvelopePart;

pub const TOLERANCE: f64 = 1e-9;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn labeled(label: &str) -> Arc<EnvelopeAttrs> {
    EnvelopeAttrs::new().with_label(label).shared()
}

pub fn part(label: &str, positions: &[f64], speeds: &[f64]) -> Arc<EnvelopePart> {
    EnvelopePart::generate_times(labeled(label), positions.to_vec(), speeds.to_vec()).shared()
}

pub fn flat(label: &str, begin: f64, end: f64, speed: f64) -> Arc<EnvelopePart> {
    part(label, &[begin, end], &[speed, speed])
}

pub fn envelope(parts: &[Arc<EnvelopePart>]) -> Envelope {
    Envelope::make(parts.to_vec())
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < TOLERANCE,
        "expected {}, got {}",
        expected,
        actual
    );
}

/// Checks the part layout of an envelope, as `(begin, end)` pairs.
pub fn assert_ranges(envelope: &Envelope, expected: &[(f64, f64)]) {
    let ranges: Vec<(f64, f64)> = envelope.iter().map(|part| (part.begin_pos(), part.end_pos())).collect();
    assert_eq!(ranges.len(), expected.len(), "unexpected parts {:?}", ranges);
    for ((begin, end), (expected_begin, expected_end)) in ranges.iter().zip(expected) {
        assert_close(*begin, *expected_begin);
        assert_close(*end, *expected_end);
    }
}
