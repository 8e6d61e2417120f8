use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use crate::envelope::envelopeerror::{
    EnvelopeError,
    EnvelopeResult
};

/// Two speeds closer than this are considered tied by `MaxEnvelopeBuilder`,
/// which then prefers the curve with the greatest acceleration.
pub const MAX_SPEED_TIE_EPSILON: f64 = 1e-6;

/// Largest speed mismatch between an overlay edge and the base curve which is
/// still considered float noise when stitching them together.
pub const SEAM_SPEED_TOLERANCE: f64 = 1e-6;

/// Largest allowed difference between a speed forced on a cursor and the speed
/// interpolated on the base curve at the cursor position.
pub const CURSOR_SPEED_TOLERANCE: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    max_speed_tie_epsilon: f64,
    seam_speed_tolerance: f64
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        EnvelopeConfig {
            max_speed_tie_epsilon: MAX_SPEED_TIE_EPSILON,
            seam_speed_tolerance: SEAM_SPEED_TOLERANCE
        }
    }
}

impl EnvelopeConfig {
    pub fn new(max_speed_tie_epsilon: f64, seam_speed_tolerance: f64) -> EnvelopeResult<EnvelopeConfig> {
        let config = EnvelopeConfig { max_speed_tie_epsilon, seam_speed_tolerance };
        config.validate()?;
        Ok(config)
    }

    pub fn max_speed_tie_epsilon(&self) -> f64 {
        self.max_speed_tie_epsilon
    }

    pub fn seam_speed_tolerance(&self) -> f64 {
        self.seam_speed_tolerance
    }

    pub fn validate(&self) -> EnvelopeResult<()> {
        let fields = [
            ("max_speed_tie_epsilon", self.max_speed_tie_epsilon),
            ("seam_speed_tolerance", self.seam_speed_tolerance)
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(EnvelopeError::invalid_config(format!(
                    "{} must be a finite, non negative number, got {}", name, value
                )));
            }
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> EnvelopeResult<EnvelopeConfig> {
        let config: EnvelopeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_reader(file_path: impl AsRef<Path>) -> EnvelopeResult<EnvelopeConfig> {
        let file = File::open(file_path)?;
        let reader = BufReader::new(file);
        let config: EnvelopeConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        tracing::debug!(?config, "loaded envelope configuration");
        Ok(config)
    }
}
