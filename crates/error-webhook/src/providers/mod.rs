//! Provider payload schemas and their normalizers.
//!
//! Each provider's webhook body is modeled as an explicit optional-field
//! schema. Normalization into [`ErrorRecord`] is total: every missing field
//! has a documented default.

pub mod betterstack;
pub mod glitchtip;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;

use crate::models::{ErrorRecord, Provider};

pub use betterstack::BetterStackPayload;
pub use glitchtip::GlitchTipPayload;

/// A parsed inbound webhook body, one variant per provider.
#[derive(Debug, Clone)]
pub enum ProviderPayload {
    GlitchTip(GlitchTipPayload),
    BetterStack(BetterStackPayload),
}

impl ProviderPayload {
    /// Parse a raw webhook body according to the provider's schema.
    ///
    /// Fails only when the body is not JSON. Any JSON value is accepted;
    /// fields with an unexpected shape fall back to their defaults.
    pub fn parse(provider: Provider, body: &[u8]) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_slice(body)?;
        Ok(match provider {
            Provider::GlitchTip => Self::GlitchTip(from_value_or_default(value)),
            Provider::BetterStack => Self::BetterStack(from_value_or_default(value)),
        })
    }

    #[must_use]
    pub const fn provider(&self) -> Provider {
        match self {
            Self::GlitchTip(_) => Provider::GlitchTip,
            Self::BetterStack(_) => Provider::BetterStack,
        }
    }

    /// Convert into the canonical record.
    #[must_use]
    pub fn normalize(self) -> ErrorRecord {
        match self {
            Self::GlitchTip(payload) => payload.into(),
            Self::BetterStack(payload) => payload.into(),
        }
    }
}

fn from_value_or_default<T: DeserializeOwned + Default>(value: Value) -> T {
    serde_json::from_value(value).unwrap_or_default()
}

/// Field deserializer that maps `null` and mistyped values to the default.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Value::deserialize(deserializer).map(from_value_or_default)
}

/// Identifier that providers send either as a string or as a number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LooseId {
    Text(String),
    Number(serde_json::Number),
}

impl LooseId {
    /// Rendered id, or `None` when it is an empty string.
    #[must_use]
    pub fn present(&self) -> Option<String> {
        Some(self.to_string()).filter(|id| !id.is_empty())
    }
}

impl fmt::Display for LooseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}
