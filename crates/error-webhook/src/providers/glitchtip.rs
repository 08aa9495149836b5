//! GlitchTip webhook payloads.
//!
//! GlitchTip forwards Sentry-compatible events, either as a top-level `event`
//! or nested under `data.event`, alongside optional `project` metadata.
//!
//! Reference: <https://develop.sentry.dev/sdk/data-model/event-payloads/>

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

use super::{lenient, LooseId};
use crate::models::{now_iso, ErrorRecord, Stacktrace};

/// Top-level GlitchTip webhook body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GlitchTipPayload {
    /// Event at the top level
    #[serde(default, deserialize_with = "lenient")]
    pub event: Option<GlitchTipEvent>,
    /// Alternate wrapping used by some GlitchTip versions
    #[serde(default, deserialize_with = "lenient")]
    pub data: Option<GlitchTipData>,
    /// Project the event belongs to
    #[serde(default, deserialize_with = "lenient")]
    pub project: Option<GlitchTipProject>,
}

/// `data` wrapper around an event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GlitchTipData {
    #[serde(default, deserialize_with = "lenient")]
    pub event: Option<GlitchTipEvent>,
}

/// Project metadata.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GlitchTipProject {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
}

/// Sentry-style error event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GlitchTipEvent {
    #[serde(default, deserialize_with = "lenient")]
    pub event_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<LooseId>,
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub level: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub platform: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub culprit: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub timestamp: Option<EventTimestamp>,
    #[serde(default, deserialize_with = "lenient")]
    pub tags: Option<EventTags>,
    #[serde(default, deserialize_with = "lenient")]
    pub contexts: Option<Map<String, Value>>,
    #[serde(default, deserialize_with = "lenient")]
    pub exception: Option<ExceptionList>,
    /// Stacktrace attached to the event itself (e.g. for `captureMessage`)
    #[serde(default, deserialize_with = "lenient")]
    pub stacktrace: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub breadcrumbs: Option<Breadcrumbs>,
    #[serde(default, deserialize_with = "lenient")]
    pub user: Option<Map<String, Value>>,
    #[serde(default, deserialize_with = "lenient")]
    pub environment: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub release: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub web_url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
    /// Project name or numeric id, depending on the sender
    #[serde(default, deserialize_with = "lenient")]
    pub project: Option<Value>,
}

/// `exception` interface.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExceptionList {
    #[serde(default, deserialize_with = "lenient")]
    pub values: Vec<ExceptionValue>,
}

/// One entry of `exception.values`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExceptionValue {
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub exception_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub value: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub stacktrace: Option<Value>,
}

/// Event time, as an ISO string or as Sentry epoch seconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EventTimestamp {
    Iso(String),
    EpochSeconds(f64),
}

impl EventTimestamp {
    fn into_iso(self) -> String {
        match self {
            Self::Iso(s) => s,
            #[allow(clippy::cast_possible_truncation)]
            Self::EpochSeconds(secs) => {
                DateTime::<Utc>::from_timestamp_millis((secs * 1000.0).round() as i64)
                    .map_or_else(now_iso, |dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
        }
    }
}

/// Tags, as a map or as Sentry's `[[key, value], ...]` list.
///
/// Non-string values are rendered as JSON text; `null` values and malformed
/// pairs are dropped.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EventTags {
    Map(Map<String, Value>),
    Pairs(Vec<Value>),
}

impl EventTags {
    fn into_map(self) -> HashMap<String, String> {
        match self {
            Self::Map(map) => map
                .into_iter()
                .filter_map(|(key, value)| Some((key, tag_value(value)?)))
                .collect(),
            Self::Pairs(pairs) => pairs.into_iter().filter_map(tag_pair).collect(),
        }
    }
}

fn tag_pair(pair: Value) -> Option<(String, String)> {
    let (key, value) = match pair {
        Value::Array(mut kv) if kv.len() == 2 => {
            let value = kv.pop()?;
            (kv.pop()?, value)
        }
        Value::Object(mut obj) => (obj.remove("key")?, obj.remove("value")?),
        _ => return None,
    };
    match key {
        Value::String(key) if !key.is_empty() => Some((key, tag_value(value)?)),
        _ => None,
    }
}

fn tag_value(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Breadcrumbs, as a list or wrapped in `{ "values": [...] }`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Breadcrumbs {
    List(Vec<Value>),
    Wrapped { values: Vec<Value> },
}

impl Breadcrumbs {
    fn into_vec(self) -> Vec<Value> {
        match self {
            Self::List(values) | Self::Wrapped { values } => values,
        }
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

impl From<GlitchTipPayload> for ErrorRecord {
    fn from(payload: GlitchTipPayload) -> Self {
        let GlitchTipPayload {
            event,
            data,
            project,
        } = payload;

        let event = event
            .or_else(|| data.and_then(|d| d.event))
            .unwrap_or_default();
        let project = project.unwrap_or_default();

        let first_exception = event
            .exception
            .and_then(|list| list.values.into_iter().next())
            .unwrap_or_default();

        // Per-exception frames are more specific than the event-level trace
        let stacktrace = first_exception
            .stacktrace
            .or(event.stacktrace)
            .map(Stacktrace::Event);

        let error_id = present(event.event_id)
            .or_else(|| event.id.as_ref().and_then(LooseId::present))
            .unwrap_or_else(|| "unknown".to_string());

        let message = present(event.message)
            .or_else(|| present(first_exception.value))
            .unwrap_or_else(|| "No error message".to_string());

        let project_name = present(project.name)
            .or_else(|| present(project.slug))
            .or_else(|| {
                event
                    .project
                    .as_ref()
                    .and_then(Value::as_str)
                    .map(String::from)
            })
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            error_id,
            title: present(event.title).unwrap_or_else(|| "Unknown Error".to_string()),
            message,
            error_type: None,
            level: present(event.level).unwrap_or_else(|| "error".to_string()),
            platform: present(event.platform).unwrap_or_else(|| "unknown".to_string()),
            culprit: present(event.culprit).unwrap_or_else(|| "unknown".to_string()),
            timestamp: event
                .timestamp
                .map_or_else(now_iso, EventTimestamp::into_iso),
            tags: event.tags.map(EventTags::into_map).unwrap_or_default(),
            context: event.contexts.unwrap_or_default(),
            stacktrace,
            breadcrumbs: event
                .breadcrumbs
                .map(Breadcrumbs::into_vec)
                .unwrap_or_default(),
            user: event.user.unwrap_or_default(),
            environment: present(event.environment)
                .unwrap_or_else(|| "production".to_string()),
            release: present(event.release).unwrap_or_else(|| "unknown".to_string()),
            url: present(event.web_url)
                .or_else(|| present(event.url))
                .or_else(|| present(project.url))
                .unwrap_or_default(),
            project_name,
            incident_url: None,
        }
    }
}
