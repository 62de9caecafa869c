//! HTTP clients for GitHub, Cloud Source Repositories and token minting

pub mod auth;
pub mod client;
pub mod sourcerepo;

pub use auth::{MetadataServerToken, StaticToken};
pub use client::GitHubApiClient;
pub use sourcerepo::SourceRepoClient;

use std::time::Duration;

pub(crate) const USER_AGENT: &str = concat!("cbstatus/", env!("CARGO_PKG_VERSION"));

pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Join `base` with path segments. Each segment is percent-encoded on its
/// own, so a ref like `feature/x` stays a single segment.
pub(crate) fn endpoint<'a>(
    base: &str,
    head: impl IntoIterator<Item = &'a str>,
    tail: &[&str],
) -> std::result::Result<url::Url, String> {
    let mut url =
        url::Url::parse(base).map_err(|e| format!("invalid API URL '{}': {}", base, e))?;
    url.path_segments_mut()
        .map_err(|_| format!("API URL '{}' cannot be a base", base))?
        .pop_if_empty()
        .extend(head)
        .extend(tail.iter().copied());
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_segments() {
        let url = endpoint(
            "https://api.github.com",
            ["repos", "acme", "widgets"],
            &["commits", "main"],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/acme/widgets/commits/main"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let url = endpoint("https://ghe.example.com/api/v3/", ["repos"], &[]).unwrap();
        assert_eq!(url.as_str(), "https://ghe.example.com/api/v3/repos");
    }

    #[test]
    fn test_endpoint_encodes_slash_in_segment() {
        let url = endpoint("https://api.github.com", ["repos"], &["feature/x"]).unwrap();
        assert_eq!(url.path(), "/repos/feature%2Fx");
    }

    #[test]
    fn test_endpoint_rejects_bad_base() {
        assert!(endpoint("not a url", ["repos"], &[]).is_err());
        assert!(endpoint("mailto:someone@example.com", ["repos"], &[]).is_err());
    }
}
