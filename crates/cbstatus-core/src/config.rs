//! Environment configuration

use crate::coordination::StatusReporter;
use crate::error::{Error, Result};
use crate::http::auth::DEFAULT_METADATA_HOST;
use crate::http::client::DEFAULT_GITHUB_API_URL;
use crate::http::sourcerepo::DEFAULT_SOURCEREPO_API_URL;
use crate::http::{GitHubApiClient, MetadataServerToken, SourceRepoClient, StaticToken};
use crate::traits::TokenSource;
use std::sync::Arc;

/// Status context used when none is configured
pub const DEFAULT_STATUS_CONTEXT: &str = "ci/cloudbuild";

/// Runtime configuration
#[derive(Clone)]
pub struct Config {
    /// GitHub API base URL
    pub github_api_url: String,
    /// Token for the GitHub API
    pub github_token: String,
    /// Source Repositories API base URL
    pub sourcerepo_api_url: String,
    /// Commit status context label
    pub status_context: String,
    /// Pre-minted Google access token; the metadata server is used when unset
    pub google_access_token: Option<String>,
    /// Metadata server host
    pub metadata_host: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("github_api_url", &self.github_api_url)
            .field("github_token", &"<redacted>")
            .field("sourcerepo_api_url", &self.sourcerepo_api_url)
            .field("status_context", &self.status_context)
            .field(
                "google_access_token",
                &self.google_access_token.as_ref().map(|_| "<redacted>"),
            )
            .field("metadata_host", &self.metadata_host)
            .finish()
    }
}

impl Config {
    /// Config with defaults for everything but the GitHub token
    pub fn new(github_token: impl Into<String>) -> Self {
        Self {
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            github_token: github_token.into(),
            sourcerepo_api_url: DEFAULT_SOURCEREPO_API_URL.to_string(),
            status_context: DEFAULT_STATUS_CONTEXT.to_string(),
            google_access_token: None,
            metadata_host: DEFAULT_METADATA_HOST.to_string(),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token = get("GITHUB_TOKEN")
            .ok_or_else(|| Error::Config("GITHUB_TOKEN not set".to_string()))?;

        let mut config = Self::new(token);
        if let Some(url) = get("GITHUB_API_URL") {
            config.github_api_url = url;
        }
        if let Some(url) = get("SOURCEREPO_API_URL") {
            config.sourcerepo_api_url = url;
        }
        if let Some(context) = get("CBSTATUS_CONTEXT") {
            config.status_context = context;
        }
        if let Some(host) = get("GCE_METADATA_HOST") {
            config.metadata_host = host;
        }
        config.google_access_token = get("GOOGLE_OAUTH_ACCESS_TOKEN");

        Ok(config)
    }

    /// Token source for Google APIs
    pub fn token_source(&self) -> Arc<dyn TokenSource> {
        match self.google_access_token {
            Some(ref token) => Arc::new(StaticToken::new(token.clone())),
            None => Arc::new(MetadataServerToken::new(format!(
                "http://{}",
                self.metadata_host
            ))),
        }
    }

    /// Build a reporter wired to the production clients
    pub fn reporter(&self) -> StatusReporter<SourceRepoClient, GitHubApiClient> {
        let mirrors = SourceRepoClient::new(self.sourcerepo_api_url.clone(), self.token_source());
        let github =
            GitHubApiClient::new(self.github_api_url.clone(), Some(self.github_token.clone()));
        StatusReporter::new(mirrors, github).with_context(self.status_context.clone())
    }
}
