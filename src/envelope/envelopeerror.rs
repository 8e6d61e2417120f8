use thiserror::Error;

pub type EnvelopeResult<T> = Result<T, EnvelopeError>;

/// Recoverable failures of the envelope crate.
///
/// Contract violations (interpolating a discontinuous envelope, feeding an overlay
/// backwards, ...) are not represented here: they panic, as they are programming errors.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("malformed envelope part: {0}")]
    MalformedPart(String),

    #[error("an envelope needs at least one part")]
    EmptyEnvelope,

    #[error("envelope part {index} starts before the end of the previous part")]
    OverlappingParts { index: usize },
}

impl EnvelopeError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn malformed_part(msg: impl Into<String>) -> Self {
        Self::MalformedPart(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            EnvelopeError::invalid_config("x")
                .to_string()
                .contains("invalid configuration:")
        );
        assert!(
            EnvelopeError::malformed_part("x")
                .to_string()
                .contains("malformed envelope part:")
        );
        assert!(
            EnvelopeError::OverlappingParts { index: 3 }
                .to_string()
                .contains("part 3")
        );
    }

    #[test]
    fn json_errors_convert() {
        let err: EnvelopeError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, EnvelopeError::Json(_)));
    }
}
