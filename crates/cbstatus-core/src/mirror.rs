//! Mirror URL parsing
//!
//! Extracts the `{owner, name}` pair from a git remote URL. Supported shapes:
//!
//! - `https://github.com/acme/widgets(.git)`
//! - `ssh://git@github.com/acme/widgets.git`, `git://...`, `git+ssh://...`
//! - scp-like `git@github.com:acme/widgets.git`

use crate::error::{Error, Result};
use crate::types::ExternalRepo;

/// Parse a mirror URL into the external repository identity
pub fn parse_mirror_url(raw: &str) -> Result<ExternalRepo> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::MirrorUrl("empty URL".to_string()));
    }

    let path = if trimmed.contains("://") {
        let url = url::Url::parse(trimmed)
            .map_err(|e| Error::MirrorUrl(format!("{}: {}", trimmed, e)))?;
        if url.host_str().map_or(true, str::is_empty) {
            return Err(Error::MirrorUrl(format!("{}: missing host", trimmed)));
        }
        url.path().to_string()
    } else {
        scp_path(trimmed)
            .ok_or_else(|| Error::MirrorUrl(format!("{}: not a git remote URL", trimmed)))?
            .to_string()
    };

    split_owner_name(&path)
        .ok_or_else(|| Error::MirrorUrl(format!("{}: no owner/repository in path", trimmed)))
}

/// Path part of an scp-like remote (`[user@]host:path`)
fn scp_path(remote: &str) -> Option<&str> {
    let (authority, path) = remote.split_once(':')?;
    let host = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    if host.is_empty() || host.contains('/') || path.is_empty() {
        return None;
    }
    Some(path)
}

/// Last segment is the name, everything before it the owner
fn split_owner_name(path: &str) -> Option<ExternalRepo> {
    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path).trim_end_matches('/');

    let (owner, name) = path.rsplit_once('/')?;
    let owner = owner.trim_matches('/');
    if owner.is_empty() || name.is_empty() {
        return None;
    }

    Some(ExternalRepo {
        owner: owner.to_string(),
        name: name.to_string(),
    })
}
