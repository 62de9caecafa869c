//! Collaborator seams for the remote services the reporter talks to
//!
//! The reporter is generic over these, so the pipeline can run against
//! in-memory fakes in tests and against the real HTTP clients in production.

use crate::error::Result;
use crate::types::{ExternalRepo, MirrorInfo, StatusRequest};
use async_trait::async_trait;

/// Repository metadata lookup (Cloud Source Repositories)
#[async_trait]
pub trait MirrorLookup: Send + Sync {
    /// Fetch the mirror configuration of `projects/{project_id}/repos/{repo_name}`
    async fn fetch_repo_mirror(&self, project_id: &str, repo_name: &str) -> Result<MirrorInfo>;
}

/// Commit lookup and status publishing on the external host (GitHub)
#[async_trait]
pub trait CommitStatusApi: Send + Sync {
    /// Resolve a branch, tag or SHA to the commit it points at
    async fn resolve_commit_sha(&self, repo: &ExternalRepo, reference: &str) -> Result<String>;

    /// Create or replace the status for `(sha, status.context)`
    async fn create_status(
        &self,
        repo: &ExternalRepo,
        sha: &str,
        status: &StatusRequest,
    ) -> Result<()>;
}

/// OAuth2 access token provider
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Mint an access token covering `scopes`
    async fn access_token(&self, scopes: &[&str]) -> Result<String>;
}
