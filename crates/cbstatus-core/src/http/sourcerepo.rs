//! Cloud Source Repositories API client (v1)

use crate::error::{Error, Result};
use crate::traits::{MirrorLookup, TokenSource};
use crate::types::MirrorInfo;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

/// Default Source Repositories API base
pub const DEFAULT_SOURCEREPO_API_URL: &str = "https://sourcerepo.googleapis.com";

/// OAuth scopes requested for the repository metadata read
pub const SOURCE_REPO_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/source.read_only",
    "https://www.googleapis.com/auth/cloud-platform",
];

/// `Repo` resource
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Repo {
    #[serde(default)]
    mirror_config: Option<MirrorConfig>,
}

#[derive(Debug, Deserialize)]
struct MirrorConfig {
    #[serde(default)]
    url: Option<String>,
}

/// Google API error envelope
#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleError,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    message: String,
}

/// Source Repositories client for mirror lookups
pub struct SourceRepoClient {
    client: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
}

impl std::fmt::Debug for SourceRepoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRepoClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl SourceRepoClient {
    /// Create a new client authenticating with `tokens`
    pub fn new(base_url: String, tokens: Arc<dyn TokenSource>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(super::USER_AGENT)
            .timeout(super::REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url,
            tokens,
        }
    }
}

#[async_trait]
impl MirrorLookup for SourceRepoClient {
    /// Endpoint: GET /v1/projects/{project}/repos/{repo}
    async fn fetch_repo_mirror(&self, project_id: &str, repo_name: &str) -> Result<MirrorInfo> {
        let url = super::endpoint(
            &self.base_url,
            ["v1", "projects", project_id, "repos"],
            &[repo_name],
        )
        .map_err(Error::Config)?;

        // Minted per call; any caching belongs to the token source
        let token = self.tokens.access_token(SOURCE_REPO_SCOPES).await?;
        tracing::debug!(project = project_id, repo = repo_name, "fetching repository metadata");

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                Error::SourceRepo(format!("Failed to fetch repository: {}", e.without_url()))
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<GoogleErrorBody>()
                .await
                .map(|b| format!(" ({})", b.error.message))
                .unwrap_or_default();
            return Err(Error::SourceRepo(format!(
                "projects/{}/repos/{} returned {}{}",
                project_id, repo_name, status, detail
            )));
        }

        let repo: Repo = response.json().await.map_err(|e| {
            Error::SourceRepo(format!("Failed to parse repository: {}", e.without_url()))
        })?;

        Ok(MirrorInfo {
            url: repo
                .mirror_config
                .and_then(|m| m.url)
                .filter(|u| !u.trim().is_empty()),
        })
    }
}
