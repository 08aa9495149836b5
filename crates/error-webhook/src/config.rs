//! Configuration for the error webhook service.

use std::env;

use crate::error::DispatchError;

/// Default GitHub REST API base URL.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Service configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port.
    pub port: u16,
    /// Webhook signing secret. Read but not yet used for verification.
    pub webhook_secret: Option<String>,
    /// GitHub dispatch target.
    pub github: GitHubConfig,
}

impl Config {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8080),
            webhook_secret: non_empty_var("WEBHOOK_SECRET"),
            github: GitHubConfig::from_env(),
        }
    }
}

/// GitHub `repository_dispatch` target.
///
/// The required values stay optional here so that every missing one can be
/// reported together by [`GitHubConfig::validate`].
#[derive(Clone, Default)]
pub struct GitHubConfig {
    /// Token with permission to create repository dispatch events.
    pub token: Option<String>,
    /// Repository owner (user or organization).
    pub owner: Option<String>,
    /// Repository name.
    pub repo: Option<String>,
    /// API base URL (overridable for tests and GitHub Enterprise).
    pub api_url: String,
}

/// A [`GitHubConfig`] with every required value present.
#[derive(Clone)]
pub struct ValidGitHubConfig {
    pub token: String,
    pub owner: String,
    pub repo: String,
    pub api_url: String,
}

impl GitHubConfig {
    /// Load from `GITHUB_TOKEN`, `GITHUB_REPO_OWNER`, `GITHUB_REPO_NAME`
    /// and `GITHUB_API_URL`.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            token: non_empty_var("GITHUB_TOKEN"),
            owner: non_empty_var("GITHUB_REPO_OWNER"),
            repo: non_empty_var("GITHUB_REPO_NAME"),
            api_url: non_empty_var("GITHUB_API_URL")
                .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
        }
    }

    /// Names of the required variables that are missing or empty.
    #[must_use]
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("GITHUB_TOKEN", &self.token),
            ("GITHUB_REPO_OWNER", &self.owner),
            ("GITHUB_REPO_NAME", &self.repo),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().is_none_or(str::is_empty))
        .map(|(name, _)| name)
        .collect()
    }

    /// Check that the token, owner and repository are all set.
    pub fn validate(&self) -> Result<ValidGitHubConfig, DispatchError> {
        match (&self.token, &self.owner, &self.repo) {
            (Some(token), Some(owner), Some(repo))
                if !token.is_empty() && !owner.is_empty() && !repo.is_empty() =>
            {
                Ok(ValidGitHubConfig {
                    token: token.clone(),
                    owner: owner.clone(),
                    repo: repo.clone(),
                    api_url: self.api_url.trim_end_matches('/').to_string(),
                })
            }
            _ => Err(DispatchError::MissingConfig(self.missing())),
        }
    }
}

// The token must never end up in logs
impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl ValidGitHubConfig {
    /// `owner/repo` slug.
    #[must_use]
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|s| !s.is_empty())
}
