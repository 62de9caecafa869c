//! # cbstatus core
//!
//! Reports Cloud Build results as GitHub commit statuses.
//!
//! A build-completion event is decoded, the Cloud Source Repositories mirror
//! of the build's repository is looked up, the build's branch, tag or commit
//! is resolved to a SHA on GitHub, and a commit status with the context
//! `ci/cloudbuild` is created for that SHA.
//!
//! ## Example
//!
//! ```no_run
//! use cbstatus_core::{report_build_status, Config};
//!
//! # async fn example() -> cbstatus_core::Result<()> {
//! let config = Config::from_env()?;
//! let event = br#"{"message": {"data": "eyJzdGF0dXMiOiAiU1VDQ0VTUyJ9"}}"#;
//!
//! let outcome = report_build_status(&config, event).await?;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs, rust_2018_idioms)]

pub mod config;
pub mod coordination;
pub mod error;
pub mod event;
pub mod http;
pub mod mirror;
pub mod traits;
pub mod types;

pub use config::Config;
pub use coordination::StatusReporter;
pub use error::{Error, ErrorKind, Result};
pub use event::{decode_event, decode_payload};
pub use mirror::parse_mirror_url;
pub use types::{
    BuildNotification, BuildStatus, CommitRef, CommitState, ExternalRepo, MirrorInfo,
    RepoSource, ReportOutcome, StatusRequest,
};

/// Report one raw build event using the production clients
///
/// This is the main entry point. The event may be a bare base64 payload, a
/// Pub/Sub message or push envelope, or a background-function event.
pub async fn report_build_status(config: &Config, raw: &[u8]) -> Result<ReportOutcome> {
    config.reporter().report_event(raw).await
}

/// Synchronous variant of `report_build_status`
///
/// This creates a new Tokio runtime and blocks on the async version.
/// Prefer the async version if you're already in an async context.
pub fn report_build_status_sync(config: &Config, raw: &[u8]) -> Result<ReportOutcome> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Error::Runtime(e.to_string()))?
        .block_on(report_build_status(config, raw))
}
