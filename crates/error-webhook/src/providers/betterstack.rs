//! Better Stack incident webhook payloads.
//!
//! Better Stack sends a JSON:API style incident, either at the top level or
//! wrapped in `data`. The error details only exist inside the templated
//! `attributes.cause` text, so most fields come from [`crate::cause`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

use super::{lenient, LooseId};
use crate::cause;
use crate::models::{now_iso, ErrorRecord, Stacktrace};

/// Metadata key holding the application name.
const APPLICATION_KEY: &str = "Application";

/// Better Stack errors are reported by its Python integration.
const PLATFORM: &str = "python";

/// Top-level Better Stack webhook body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BetterStackPayload {
    /// Incident wrapped in `data`
    #[serde(default, deserialize_with = "lenient")]
    pub data: Option<BetterStackIncident>,
    /// Incident fields sent at the top level
    #[serde(flatten)]
    pub incident: BetterStackIncident,
}

impl BetterStackPayload {
    /// The incident, preferring the `data` wrapper when present.
    #[must_use]
    pub fn into_incident(self) -> BetterStackIncident {
        self.data.unwrap_or(self.incident)
    }
}

/// Incident resource.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BetterStackIncident {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<LooseId>,
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub resource_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub attributes: Option<IncidentAttributes>,
}

/// Incident attributes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncidentAttributes {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    /// Markdown description of the error
    #[serde(default, deserialize_with = "lenient")]
    pub cause: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub started_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub metadata: Vec<MetadataEntry>,
}

/// One `{ key, value }` metadata pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    #[serde(default, deserialize_with = "lenient")]
    pub key: String,
    #[serde(default, deserialize_with = "lenient")]
    pub value: Value,
}

impl IncidentAttributes {
    /// Value of the `Application` metadata entry.
    #[must_use]
    pub fn application_name(&self) -> Option<String> {
        self.metadata
            .iter()
            .find(|entry| entry.key == APPLICATION_KEY)
            .and_then(|entry| match &entry.value {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Null | Value::String(_) => None,
                other => Some(other.to_string()),
            })
    }
}

impl From<BetterStackPayload> for ErrorRecord {
    fn from(payload: BetterStackPayload) -> Self {
        let incident = payload.into_incident();
        let attributes = incident.attributes.unwrap_or_default();

        let project_name = attributes
            .application_name()
            .unwrap_or_else(|| "unknown".to_string());
        let raw_cause = attributes.cause.unwrap_or_default();
        let parsed = cause::parse(&raw_cause);
        let url = attributes.url.unwrap_or_default();

        let mut context = Map::new();
        context.insert("cause".to_string(), Value::String(raw_cause.clone()));
        context.insert("metadata".to_string(), json!(attributes.metadata));

        Self {
            error_id: incident
                .id
                .as_ref()
                .and_then(LooseId::present)
                .unwrap_or_else(|| "unknown".to_string()),
            title: attributes
                .name
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "Unknown Error".to_string()),
            message: parsed.error_message.clone(),
            error_type: Some(parsed.error_type.clone()),
            level: "error".to_string(),
            platform: PLATFORM.to_string(),
            culprit: parsed.file_path.clone(),
            timestamp: attributes
                .started_at
                .filter(|s| !s.is_empty())
                .unwrap_or_else(now_iso),
            tags: HashMap::new(),
            context,
            stacktrace: Some(Stacktrace::Cause {
                raw: raw_cause,
                parsed,
            }),
            breadcrumbs: Vec::new(),
            user: Map::new(),
            environment: "production".to_string(),
            release: "unknown".to_string(),
            url: url.clone(),
            project_name,
            incident_url: Some(url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ParsedCause;

    const CAUSE: &str =
        "**ZeroDivisionError**\n\n```\ndivision by zero\n```\n`flexy/urls.py` in `trigger_error`";

    fn normalize(value: Value) -> ErrorRecord {
        let payload: BetterStackPayload = serde_json::from_value(value).unwrap();
        payload.into()
    }

    fn incident() -> Value {
        json!({
            "id": "inc-204",
            "type": "incident",
            "attributes": {
                "name": "ZeroDivisionError in flexy",
                "cause": CAUSE,
                "started_at": "2026-01-18T20:00:00.000Z",
                "url": "https://uptime.betterstack.com/team/1/incidents/204",
                "metadata": [
                    { "key": "Environment", "value": "prod" },
                    { "key": "Application", "value": "flexy" }
                ]
            }
        })
    }

    #[test]
    fn test_normalize_incident() {
        let record = normalize(incident());

        assert_eq!(record.error_id, "inc-204");
        assert_eq!(record.title, "ZeroDivisionError in flexy");
        assert_eq!(record.error_type.as_deref(), Some("ZeroDivisionError"));
        assert_eq!(record.message, "division by zero");
        assert_eq!(record.culprit, "flexy/urls.py in trigger_error");
        assert_eq!(record.platform, "python");
        assert_eq!(record.level, "error");
        assert_eq!(record.timestamp, "2026-01-18T20:00:00.000Z");
        assert_eq!(record.project_name, "flexy");
        assert_eq!(
            record.url,
            "https://uptime.betterstack.com/team/1/incidents/204"
        );
        assert_eq!(record.incident_url.as_deref(), Some(record.url.as_str()));
        assert_eq!(record.context["cause"], CAUSE);
        assert_eq!(record.context["metadata"][1]["value"], "flexy");
    }

    #[test]
    fn test_stacktrace_synthesized_from_cause() {
        let record = normalize(incident());

        assert_eq!(
            record.stacktrace,
            Some(Stacktrace::Cause {
                raw: CAUSE.to_string(),
                parsed: ParsedCause {
                    error_type: "ZeroDivisionError".to_string(),
                    error_message: "division by zero".to_string(),
                    file_path: "flexy/urls.py in trigger_error".to_string(),
                },
            })
        );
    }

    #[test]
    fn test_data_wrapper() {
        let record = normalize(json!({ "data": incident() }));
        assert_eq!(record.error_id, "inc-204");
        assert_eq!(record.project_name, "flexy");
    }

    #[test]
    fn test_empty_payload_uses_fallbacks() {
        let record = normalize(json!({}));

        assert_eq!(record.error_id, "unknown");
        assert_eq!(record.title, "Unknown Error");
        assert_eq!(record.error_type.as_deref(), Some("Unknown"));
        assert_eq!(record.message, "No error message");
        assert_eq!(record.culprit, "unknown");
        assert_eq!(record.project_name, "unknown");
        assert_eq!(record.url, "");
        assert!(record.tags.is_empty());
        assert!(record.breadcrumbs.is_empty());
        // Always present for this provider, even with an empty cause
        assert!(matches!(record.stacktrace, Some(Stacktrace::Cause { .. })));
    }

    #[test]
    fn test_application_lookup_ignores_other_keys() {
        let record = normalize(json!({
            "id": 7,
            "attributes": {
                "metadata": [{ "key": "application", "value": "lowercase" }]
            }
        }));
        assert_eq!(record.error_id, "7");
        assert_eq!(record.project_name, "unknown");
    }

    #[test]
    fn test_application_lookup_takes_first_match() {
        let attributes: IncidentAttributes = serde_json::from_value(json!({
            "metadata": [
                { "key": "Application", "value": "first" },
                { "key": "Application", "value": "second" }
            ]
        }))
        .unwrap();
        assert_eq!(attributes.application_name().as_deref(), Some("first"));
    }

    #[test]
    fn test_null_metadata_falls_back_to_unknown_project() {
        let record = normalize(json!({
            "data": {
                "id": "inc-5",
                "attributes": { "name": "x", "cause": CAUSE, "metadata": null }
            }
        }));
        assert_eq!(record.error_id, "inc-5");
        assert_eq!(record.project_name, "unknown");
        assert_eq!(record.error_type.as_deref(), Some("ZeroDivisionError"));
        assert_eq!(record.context["metadata"], json!([]));
    }

    #[test]
    fn test_mistyped_attributes_use_defaults() {
        let record = normalize(json!({
            "data": {
                "id": true,
                "attributes": {
                    "name": null,
                    "cause": 12,
                    "url": null,
                    "metadata": [{ "key": "Application", "value": null }]
                }
            }
        }));
        assert_eq!(record.error_id, "unknown");
        assert_eq!(record.title, "Unknown Error");
        assert_eq!(record.message, "No error message");
        assert_eq!(record.url, "");
        assert_eq!(record.project_name, "unknown");
    }

    #[test]
    fn test_empty_id_falls_back_to_unknown() {
        let record = normalize(json!({ "data": { "id": "", "attributes": { "name": "x" } } }));
        assert_eq!(record.error_id, "unknown");
        assert_eq!(record.title, "x");
    }

    #[test]
    fn test_cause_without_markers() {
        let record = normalize(json!({
            "id": "inc-9",
            "attributes": { "cause": "Something went wrong" }
        }));
        assert_eq!(record.error_type.as_deref(), Some("Unknown"));
        assert_eq!(record.message, "No error message");
        assert_eq!(record.culprit, "unknown");
    }
}
