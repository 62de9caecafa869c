//! Core type definitions for the build-status bridge

use serde::{Deserialize, Serialize};

/// Build status as reported by Cloud Build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum BuildStatus {
    /// Status could not be determined
    StatusUnknown,
    /// Build is waiting on approval or resources
    Pending,
    /// Build is queued
    Queued,
    /// Build is running
    Working,
    /// Build finished successfully
    Success,
    /// Build or a step failed
    Failure,
    /// Build was cancelled by a user
    Cancelled,
    /// Build exceeded its timeout
    Timeout,
    /// Build system failure
    InternalError,
    /// Build expired in the queue
    Expired,
}

impl BuildStatus {
    /// All statuses, in declaration order
    pub const ALL: [BuildStatus; 10] = [
        BuildStatus::StatusUnknown,
        BuildStatus::Pending,
        BuildStatus::Queued,
        BuildStatus::Working,
        BuildStatus::Success,
        BuildStatus::Failure,
        BuildStatus::Cancelled,
        BuildStatus::Timeout,
        BuildStatus::InternalError,
        BuildStatus::Expired,
    ];

    /// Map to the GitHub commit state.
    ///
    /// This is the status table; it is total over every build status.
    #[inline]
    pub const fn commit_state(&self) -> CommitState {
        match self {
            Self::Pending | Self::Queued | Self::Working => CommitState::Pending,
            Self::Success => CommitState::Success,
            Self::Failure | Self::Cancelled | Self::Timeout | Self::Expired => {
                CommitState::Failure
            }
            Self::InternalError | Self::StatusUnknown => CommitState::Error,
        }
    }

    /// Wire representation
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::StatusUnknown => "STATUS_UNKNOWN",
            Self::Pending => "PENDING",
            Self::Queued => "QUEUED",
            Self::Working => "WORKING",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::Cancelled => "CANCELLED",
            Self::Timeout => "TIMEOUT",
            Self::InternalError => "INTERNAL_ERROR",
            Self::Expired => "EXPIRED",
        }
    }
}

/// GitHub commit status state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum CommitState {
    /// Build in progress
    Pending,
    /// Build passed
    Success,
    /// Build failed
    Failure,
    /// Build could not run
    Error,
}

impl CommitState {
    /// Get string representation
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for CommitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cloud Source Repositories reference a build was triggered from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoSource {
    /// Project that owns the repository
    #[serde(default)]
    pub project_id: String,
    /// Repository name within the project
    #[serde(default)]
    pub repo_name: String,
    /// Branch the build ran on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
    /// Tag the build ran on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,
    /// Exact commit the build ran on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
}

impl RepoSource {
    /// Pick the reference to resolve: branch, then tag, then commit SHA.
    ///
    /// Empty strings count as unset. Returns `None` when nothing is set.
    pub fn commit_ref(&self) -> Option<CommitRef<'_>> {
        fn set(v: &Option<String>) -> Option<&str> {
            v.as_deref().filter(|s| !s.is_empty())
        }

        set(&self.branch_name)
            .map(CommitRef::Branch)
            .or_else(|| set(&self.tag_name).map(CommitRef::Tag))
            .or_else(|| set(&self.commit_sha).map(CommitRef::Commit))
    }
}

/// A reference naming a commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitRef<'a> {
    /// Branch name
    Branch(&'a str),
    /// Tag name
    Tag(&'a str),
    /// Literal commit SHA
    Commit(&'a str),
}

impl<'a> CommitRef<'a> {
    /// The ref as sent to the commits API
    #[inline]
    pub const fn as_str(&self) -> &'a str {
        match self {
            Self::Branch(s) | Self::Tag(s) | Self::Commit(s) => s,
        }
    }

    /// Kind label for logs
    #[inline]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Branch(_) => "branch",
            Self::Tag(_) => "tag",
            Self::Commit(_) => "commit",
        }
    }
}

/// Normalized build-completion notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildNotification {
    /// Build ID, when present; used for log correlation only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Build status
    pub status: BuildStatus,
    /// Human-readable status detail; empty when absent
    pub status_detail: String,
    /// Build log URL; empty when absent
    pub log_url: String,
    /// Repository the build was triggered from, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<RepoSource>,
}

impl BuildNotification {
    /// Source repository, if the build names one
    pub fn repo_source(&self) -> Option<&RepoSource> {
        self.source.as_ref().filter(|s| !s.repo_name.is_empty())
    }
}

/// Mirror configuration of a Source Repositories repository
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorInfo {
    /// URL of the external repository, when mirrored
    pub url: Option<String>,
}

/// Repository on the external host
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ExternalRepo {
    /// Owner (user or organization), possibly nested
    pub owner: String,
    /// Repository name without `.git`
    pub name: String,
}

impl std::fmt::Display for ExternalRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Commit status body for `POST /repos/{owner}/{repo}/statuses/{sha}`
///
/// Empty `description` and `target_url` are left out of the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusRequest {
    /// Commit state
    pub state: CommitState,
    /// Short description, at most 140 characters
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Link shown next to the status
    #[serde(skip_serializing_if = "String::is_empty")]
    pub target_url: String,
    /// Status context; one status per commit and context
    pub context: String,
}

/// How an invocation settled
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReportOutcome {
    /// Build is not tied to a source repository
    NoSource,
    /// Repository has no external mirror
    NotMirrored {
        /// `projects/{project}/repos/{repo}`
        repo: String,
    },
    /// Status was posted
    Posted {
        /// Repository the status was posted to
        repo: ExternalRepo,
        /// Commit the ref resolved to
        sha: String,
        /// State that was posted
        state: CommitState,
    },
}
