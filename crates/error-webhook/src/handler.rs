//! Request handling: validate, normalize, dispatch, respond.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::dispatch::Dispatch;
use crate::models::Provider;
use crate::providers::ProviderPayload;
use crate::webhooks::validate_webhook_signature;

/// Response envelope returned for every webhook call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub status_code: u16,
    pub headers: BTreeMap<&'static str, &'static str>,
    pub body: ResponseBody,
}

/// JSON body of a [`WebhookResponse`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Success(SuccessBody),
    Failure(FailureBody),
    Rejected(RejectedBody),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessBody {
    pub success: bool,
    pub message: String,
    pub error_id: String,
    pub error_title: String,
    pub github_repo: String,
    pub processing_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureBody {
    pub success: bool,
    pub error: String,
    pub processing_time: String,
}

/// Body of a request turned away before processing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedBody {
    pub error: String,
}

impl WebhookResponse {
    fn new(status_code: u16, body: ResponseBody) -> Self {
        Self {
            status_code,
            headers: BTreeMap::from([("Content-Type", "application/json")]),
            body,
        }
    }

    fn failure(status_code: u16, error: impl Into<String>, started: Instant) -> Self {
        Self::new(
            status_code,
            ResponseBody::Failure(FailureBody {
                success: false,
                error: error.into(),
                processing_time: elapsed(started),
            }),
        )
    }

    fn unauthorized() -> Self {
        Self::new(
            401,
            ResponseBody::Rejected(RejectedBody {
                error: "Invalid webhook signature".to_string(),
            }),
        )
    }

    /// Whether the pipeline completed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.body, ResponseBody::Success(_))
    }
}

/// Orchestrates one webhook invocation.
pub struct WebhookHandler {
    dispatcher: Arc<dyn Dispatch>,
    webhook_secret: Option<String>,
}

impl WebhookHandler {
    #[must_use]
    pub fn new(dispatcher: Arc<dyn Dispatch>, webhook_secret: Option<String>) -> Self {
        Self {
            dispatcher,
            webhook_secret,
        }
    }

    /// Handle a raw webhook body from `provider`.
    ///
    /// Never fails: dispatch errors become a 500 envelope, an unparseable
    /// body a 400 and a rejected signature a 401.
    pub async fn handle(
        &self,
        provider: Provider,
        body: &[u8],
        signature: Option<&str>,
    ) -> WebhookResponse {
        let started = Instant::now();

        info!(provider = %provider, bytes = body.len(), "Received webhook call");

        if !validate_webhook_signature(
            provider,
            body,
            signature,
            self.webhook_secret.as_deref(),
        ) {
            warn!(provider = %provider, "Invalid webhook signature");
            return WebhookResponse::unauthorized();
        }

        let payload = match ProviderPayload::parse(provider, body) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(provider = %provider, error = %e, "Failed to parse webhook payload");
                return WebhookResponse::failure(
                    400,
                    format!("Invalid {provider} payload: {e}"),
                    started,
                );
            }
        };

        let record = payload.normalize();
        debug!(
            provider = %provider,
            error_id = %record.error_id,
            title = %record.title,
            project = %record.project_name,
            culprit = %record.culprit,
            "Parsed error"
        );

        match self.dispatcher.dispatch(&record, provider).await {
            Ok(outcome) => {
                info!(
                    provider = %provider,
                    error_id = %record.error_id,
                    repo = %outcome.repo,
                    status = outcome.status_code,
                    "Error investigation triggered"
                );
                WebhookResponse::new(
                    200,
                    ResponseBody::Success(SuccessBody {
                        success: true,
                        message: "Error investigation triggered".to_string(),
                        error_id: record.error_id,
                        error_title: record.title,
                        github_repo: outcome.repo,
                        processing_time: elapsed(started),
                    }),
                )
            }
            Err(e) => {
                error!(
                    provider = %provider,
                    error_id = %record.error_id,
                    error = %e,
                    "Failed to trigger error investigation"
                );
                WebhookResponse::failure(500, e.to_string(), started)
            }
        }
    }
}

fn elapsed(started: Instant) -> String {
    format!("{}ms", started.elapsed().as_millis())
}
