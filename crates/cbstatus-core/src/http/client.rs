//! GitHub REST API client for commit lookup and commit statuses

use crate::error::{Error, Result};
use crate::traits::CommitStatusApi;
use crate::types::{ExternalRepo, StatusRequest};
use async_trait::async_trait;
use serde::Deserialize;

/// Default GitHub API base
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// GitHub error body
#[derive(Debug, Deserialize)]
struct GitHubErrorBody {
    message: String,
}

/// GitHub API client for ref resolution and status updates
pub struct GitHubApiClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for GitHubApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubApiClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl GitHubApiClient {
    /// Create a new GitHub API client
    pub fn new(base_url: String, token: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(super::USER_AGENT)
            .timeout(super::REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url,
            token,
        }
    }

    fn repo_url(&self, repo: &ExternalRepo, tail: &[&str]) -> Result<url::Url> {
        super::endpoint(
            &self.base_url,
            ["repos", repo.owner.as_str(), repo.name.as_str()],
            tail,
        )
        .map_err(Error::Config)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request.header("X-GitHub-Api-Version", "2022-11-28");
        match self.token {
            Some(ref token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    /// Turn a non-success response into an error, keeping GitHub's message
    async fn api_error(response: reqwest::Response, what: &str) -> Error {
        let status = response.status();
        let detail = response
            .json::<GitHubErrorBody>()
            .await
            .map(|b| format!(" ({})", b.message))
            .unwrap_or_default();

        if status == reqwest::StatusCode::FORBIDDEN
            || status == reqwest::StatusCode::TOO_MANY_REQUESTS
        {
            return Error::GitHub(format!(
                "{} forbidden or rate limited: {}{}",
                what, status, detail
            ));
        }

        Error::GitHub(format!("{} failed: {}{}", what, status, detail))
    }
}

/// Loose check that a body is a hex commit id, possibly abbreviated
fn looks_like_sha(s: &str) -> bool {
    (1..=64).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_hexdigit())
}

#[async_trait]
impl CommitStatusApi for GitHubApiClient {
    /// Endpoint: GET /repos/{owner}/{repo}/commits/{ref}
    ///
    /// Uses the `application/vnd.github.sha` media type, so the body is the
    /// bare SHA.
    async fn resolve_commit_sha(&self, repo: &ExternalRepo, reference: &str) -> Result<String> {
        let url = self.repo_url(repo, &["commits", reference])?;
        tracing::debug!(%repo, reference, "resolving commit ref");

        let response = self
            .authorize(self.client.get(url))
            .header("Accept", "application/vnd.github.sha")
            .send()
            .await
            .map_err(|e| Error::GitHub(format!("Failed to resolve ref: {}", e.without_url())))?;

        if !response.status().is_success() {
            let what = format!("Resolving ref '{}' in {}", reference, repo);
            return Err(Self::api_error(response, &what).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| {
                Error::GitHub(format!("Failed to read ref response: {}", e.without_url()))
            })?;
        let sha = body.trim();

        if !looks_like_sha(sha) {
            return Err(Error::GitHub(format!(
                "Resolving ref '{}' in {} returned no commit SHA",
                reference, repo
            )));
        }

        Ok(sha.to_string())
    }

    /// Endpoint: POST /repos/{owner}/{repo}/statuses/{sha}
    async fn create_status(
        &self,
        repo: &ExternalRepo,
        sha: &str,
        status: &StatusRequest,
    ) -> Result<()> {
        let url = self.repo_url(repo, &["statuses", sha])?;
        tracing::debug!(
            %repo,
            sha,
            state = %status.state,
            context = %status.context,
            "creating commit status"
        );

        let response = self
            .authorize(self.client.post(url))
            .header("Accept", "application/vnd.github+json")
            .json(status)
            .send()
            .await
            .map_err(|e| Error::GitHub(format!("Failed to create status: {}", e.without_url())))?;

        if !response.status().is_success() {
            let what = format!("Creating status on {}@{}", repo, sha);
            return Err(Self::api_error(response, &what).await);
        }

        Ok(())
    }
}
