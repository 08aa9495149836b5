//! GitHub `repository_dispatch` client.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{GitHubConfig, ValidGitHubConfig};
use crate::error::DispatchError;
use crate::models::{DispatchEnvelope, ErrorRecord, Provider};

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";
const DISPATCH_USER_AGENT: &str = "error-webhook-dispatcher";

/// Result of a successful dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchOutcome {
    /// HTTP status returned by GitHub (204 on success).
    pub status_code: u16,
    /// Target repository as `owner/repo`.
    pub repo: String,
}

/// Sends a normalized error record to the investigation workflow.
#[async_trait]
pub trait Dispatch: Send + Sync {
    /// Send one record. Called exactly once per webhook; never retried.
    async fn dispatch(
        &self,
        record: &ErrorRecord,
        source: Provider,
    ) -> Result<DispatchOutcome, DispatchError>;
}

/// Dispatcher backed by the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubDispatcher {
    client: reqwest::Client,
    dispatches_url: String,
    repo: String,
}

impl GitHubDispatcher {
    /// Create a dispatcher.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::MissingConfig`] if the token, owner or
    /// repository is missing, before any client is built.
    pub fn new(config: &GitHubConfig) -> Result<Self, DispatchError> {
        let config = config.validate()?;
        Self::from_valid(&config)
    }

    fn from_valid(config: &ValidGitHubConfig) -> Result<Self, DispatchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(DISPATCH_USER_AGENT));

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token)).map_err(|_| {
            DispatchError::InvalidConfig("GITHUB_TOKEN is not a valid header value".to_string())
        })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            dispatches_url: format!(
                "{}/repos/{}/{}/dispatches",
                config.api_url, config.owner, config.repo
            ),
            repo: config.slug(),
        })
    }

    /// Target repository as `owner/repo`.
    #[must_use]
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Full URL of the dispatches endpoint.
    #[must_use]
    pub fn dispatches_url(&self) -> &str {
        &self.dispatches_url
    }
}

#[async_trait]
impl Dispatch for GitHubDispatcher {
    async fn dispatch(
        &self,
        record: &ErrorRecord,
        source: Provider,
    ) -> Result<DispatchOutcome, DispatchError> {
        let envelope = DispatchEnvelope::new(record, source);

        debug!(
            repo = %self.repo,
            source = %source,
            error_id = %record.error_id,
            "Sending repository_dispatch"
        );

        let response = self
            .client
            .post(&self.dispatches_url)
            .json(&envelope)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                repo = %self.repo,
                status = %status,
                body = %body,
                "GitHub dispatch request failed"
            );
            return Err(DispatchError::Api {
                status: status.as_u16(),
                body,
            });
        }

        info!(
            repo = %self.repo,
            status = status.as_u16(),
            error_id = %record.error_id,
            "GitHub repository_dispatch triggered"
        );

        Ok(DispatchOutcome {
            status_code: status.as_u16(),
            repo: self.repo.clone(),
        })
    }
}
