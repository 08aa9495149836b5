//! Canonical error record and the GitHub dispatch envelope.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// `event_type` sent with every `repository_dispatch` request.
pub const DISPATCH_EVENT_TYPE: &str = "error_investigation";

/// Upstream error-monitoring provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// GlitchTip (Sentry-compatible event payloads)
    GlitchTip,
    /// Better Stack (incident payloads with a templated `cause`)
    BetterStack,
}

impl Provider {
    /// Stable source tag used in the dispatch envelope and in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GlitchTip => "glitchtip",
            Self::BetterStack => "betterstack",
        }
    }

    /// Header carrying the provider's webhook signature.
    #[must_use]
    pub const fn signature_header(self) -> &'static str {
        match self {
            Self::GlitchTip => "x-glitchtip-signature",
            Self::BetterStack => "x-betterstack-signature",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "glitchtip" => Ok(Self::GlitchTip),
            "betterstack" => Ok(Self::BetterStack),
            other => Err(format!(
                "unknown provider '{other}' (expected glitchtip or betterstack)"
            )),
        }
    }
}

/// Fields scraped out of a Better Stack `cause` blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedCause {
    pub error_type: String,
    pub error_message: String,
    pub file_path: String,
}

/// Stack information attached to an [`ErrorRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Stacktrace {
    /// Synthesized from free text: the raw blob plus what could be parsed out of it.
    Cause { raw: String, parsed: ParsedCause },
    /// Provider-native stacktrace object, passed through untouched.
    Event(Value),
}

/// Provider-agnostic error summary handed to the investigation workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    pub error_id: String,
    pub title: String,
    pub message: String,
    /// Exception class name. Only Better Stack reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    pub level: String,
    pub platform: String,
    pub culprit: String,
    /// ISO-8601 event time.
    pub timestamp: String,
    pub tags: HashMap<String, String>,
    pub context: Map<String, Value>,
    pub stacktrace: Option<Stacktrace>,
    pub breadcrumbs: Vec<Value>,
    pub user: Map<String, Value>,
    pub environment: String,
    pub release: String,
    pub url: String,
    pub project_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident_url: Option<String>,
}

/// Body of a `POST /repos/{owner}/{repo}/dispatches` request.
#[derive(Debug, Serialize)]
pub struct DispatchEnvelope<'a> {
    pub event_type: &'static str,
    pub client_payload: ClientPayload<'a>,
}

/// `client_payload` section of the dispatch envelope.
#[derive(Debug, Serialize)]
pub struct ClientPayload<'a> {
    pub error: &'a ErrorRecord,
    pub source: Provider,
    pub timestamp: String,
}

impl<'a> DispatchEnvelope<'a> {
    /// Wrap a record for dispatch, stamped with the current time.
    #[must_use]
    pub fn new(error: &'a ErrorRecord, source: Provider) -> Self {
        Self {
            event_type: DISPATCH_EVENT_TYPE,
            client_payload: ClientPayload {
                error,
                source,
                timestamp: now_iso(),
            },
        }
    }
}

/// Current time in the `2024-01-01T00:00:00.000Z` form.
#[must_use]
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
