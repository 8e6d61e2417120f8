use std::sync::Arc;

use serde::Deserialize;

/// What the train is doing along a part.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Deserialize)]
pub enum EnvelopeProfile {
    Accelerating,
    ConstantSpeed,
    Maintain,
    Coasting,
    Braking,
    Catching
}

/// Where a speed limit comes from.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Deserialize)]
pub enum LimitKind {
    SpeedLimit,
    TrainLimit
}

/// Metadata carried by an envelope part.
///
/// Attributes are shared between parts through an `Arc`, and survive slicing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EnvelopeAttrs {
    profile: Option<EnvelopeProfile>,
    limit_kind: Option<LimitKind>,
    physically_accurate: bool,
    label: Option<String>
}

impl EnvelopeAttrs {
    pub fn new() -> EnvelopeAttrs {
        EnvelopeAttrs::default()
    }

    pub fn with_profile(mut self, profile: EnvelopeProfile) -> EnvelopeAttrs {
        self.profile = Some(profile);
        self
    }

    pub fn with_limit_kind(mut self, limit_kind: LimitKind) -> EnvelopeAttrs {
        self.limit_kind = Some(limit_kind);
        self
    }

    pub fn with_physically_accurate(mut self, physically_accurate: bool) -> EnvelopeAttrs {
        self.physically_accurate = physically_accurate;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> EnvelopeAttrs {
        self.label = Some(label.into());
        self
    }

    pub fn shared(self) -> Arc<EnvelopeAttrs> {
        Arc::new(self)
    }

    pub fn profile(&self) -> Option<EnvelopeProfile> {
        self.profile
    }

    pub fn limit_kind(&self) -> Option<LimitKind> {
        self.limit_kind
    }

    pub fn physically_accurate(&self) -> bool {
        self.physically_accurate
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}
