//! Status reporter: the decode → mirror → ref → status pipeline
//!
//! Each call to [`StatusReporter::report`] is one invocation. The steps run
//! strictly in order, each awaiting the previous remote call, and the first
//! error ends the invocation. Nothing is retried here; redelivery is the
//! trigger's business.

use crate::config::DEFAULT_STATUS_CONTEXT;
use crate::error::Result;
use crate::event::decode_event;
use crate::mirror::parse_mirror_url;
use crate::traits::{CommitStatusApi, MirrorLookup};
use crate::types::{BuildNotification, ReportOutcome, StatusRequest};

/// GitHub rejects status descriptions longer than this
pub const MAX_DESCRIPTION_CHARS: usize = 140;

/// Reports build notifications as commit statuses
#[derive(Debug)]
pub struct StatusReporter<M, G> {
    mirrors: M,
    github: G,
    context: String,
}

impl<M, G> StatusReporter<M, G>
where
    M: MirrorLookup,
    G: CommitStatusApi,
{
    /// Create a reporter using the default `ci/cloudbuild` context
    pub fn new(mirrors: M, github: G) -> Self {
        Self {
            mirrors,
            github,
            context: DEFAULT_STATUS_CONTEXT.to_string(),
        }
    }

    /// Override the status context label
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Status context label
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Decode a raw event and report it
    pub async fn report_event(&self, raw: &[u8]) -> Result<ReportOutcome> {
        let notification = decode_event(raw)?;
        self.report(&notification).await
    }

    /// Report a decoded notification
    #[tracing::instrument(
        skip_all,
        fields(build = notification.id.as_deref(), status = notification.status.as_str())
    )]
    pub async fn report(&self, notification: &BuildNotification) -> Result<ReportOutcome> {
        let Some(source) = notification.repo_source() else {
            tracing::info!("build has no source repository, nothing to report");
            return Ok(ReportOutcome::NoSource);
        };

        let mirror = self
            .mirrors
            .fetch_repo_mirror(&source.project_id, &source.repo_name)
            .await?;

        let Some(url) = mirror.url else {
            tracing::info!(
                project = %source.project_id,
                repo = %source.repo_name,
                "repository is not mirrored, nothing to report"
            );
            return Ok(ReportOutcome::NotMirrored {
                repo: format!("projects/{}/repos/{}", source.project_id, source.repo_name),
            });
        };

        let repo = parse_mirror_url(&url)?;

        // An empty ref is sent as-is; GitHub rejects it
        let commit_ref = source.commit_ref();
        let reference = commit_ref.map_or("", |r| r.as_str());
        tracing::info!(
            owner = %repo.owner,
            name = %repo.name,
            reference,
            kind = commit_ref.map_or("none", |r| r.kind()),
            "resolved mirror"
        );

        let sha = self.github.resolve_commit_sha(&repo, reference).await?;

        let state = notification.status.commit_state();
        let request = StatusRequest {
            state,
            description: truncate_description(&notification.status_detail),
            target_url: notification.log_url.clone(),
            context: self.context.clone(),
        };

        self.github.create_status(&repo, &sha, &request).await?;
        tracing::info!(%repo, %sha, %state, "commit status posted");

        Ok(ReportOutcome::Posted { repo, sha, state })
    }
}

/// Clip to GitHub's description limit on a char boundary
fn truncate_description(detail: &str) -> String {
    if detail.chars().count() <= MAX_DESCRIPTION_CHARS {
        return detail.to_string();
    }
    let mut out: String = detail.chars().take(MAX_DESCRIPTION_CHARS - 1).collect();
    out.push('…');
    out
}
