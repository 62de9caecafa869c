//! Build event decoding
//!
//! Cloud Build publishes each build to the `cloud-builds` Pub/Sub topic as a
//! base64 JSON document. Depending on how the event reaches us, that payload
//! may be wrapped in a Pub/Sub message, a push-subscription envelope, or a
//! background-function event. Everything is normalized into a single
//! [`BuildNotification`] here, before any pipeline logic runs.

use crate::error::{Error, Result};
use crate::types::{BuildNotification, BuildStatus, RepoSource};
use base64::Engine;
use serde::Deserialize;

/// Build document as published by Cloud Build (only the fields we use)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireBuild {
    #[serde(default)]
    id: Option<String>,
    status: BuildStatus,
    #[serde(default)]
    status_detail: Option<String>,
    #[serde(default)]
    log_url: Option<String>,
    #[serde(default)]
    source: Option<WireSource>,
    #[serde(default)]
    source_provenance: Option<WireProvenance>,
}

/// `source` object. The legacy shape carries the repository fields inline,
/// the current one nests them under `repoSource`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSource {
    #[serde(default)]
    repo_source: Option<RepoSource>,
    #[serde(flatten)]
    inline: RepoSource,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireProvenance {
    #[serde(default)]
    resolved_repo_source: Option<RepoSource>,
}

impl WireBuild {
    fn into_notification(self) -> BuildNotification {
        let named = |s: &RepoSource| !s.repo_name.is_empty();

        // Resolved provenance wins: it carries the exact commit
        let source = self
            .source_provenance
            .and_then(|p| p.resolved_repo_source)
            .filter(named)
            .or_else(|| {
                self.source.and_then(|s| {
                    s.repo_source
                        .filter(named)
                        .or_else(|| Some(s.inline).filter(named))
                })
            });

        BuildNotification {
            id: self.id,
            status: self.status,
            status_detail: self.status_detail.unwrap_or_default(),
            log_url: self.log_url.unwrap_or_default(),
            source,
        }
    }
}

/// Parse a build JSON document
pub fn parse_build(json: &str) -> Result<BuildNotification> {
    let build: WireBuild = serde_json::from_str(json)?;
    Ok(build.into_notification())
}

/// Decode a base64 Pub/Sub `data` field into a build notification
pub fn decode_payload(data: &str) -> Result<BuildNotification> {
    let bytes = base64::engine::general_purpose::STANDARD.decode(data.trim())?;
    let json = String::from_utf8(bytes)?;
    parse_build(&json)
}

/// Decode a raw event as received by a trigger.
///
/// Accepts a bare base64 payload, a Pub/Sub message (`{"data": ...}`), a push
/// envelope (`{"message": {"data": ...}}`), a background-function event
/// (`{"data": {"data": ...}}`), or an already-decoded build document.
pub fn decode_event(raw: &[u8]) -> Result<BuildNotification> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| Error::Decode(format!("event is not UTF-8: {}", e)))?
        .trim();

    if !text.starts_with('{') {
        return decode_payload(text);
    }

    let value: serde_json::Value = serde_json::from_str(text)?;

    if value.get("status").is_some() {
        return parse_build(text);
    }

    let data = value
        .pointer("/message/data")
        .or_else(|| value.pointer("/data/data"))
        .or_else(|| value.get("data"))
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| Error::Decode("event has no base64 data field".to_string()))?;

    decode_payload(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CommitRef;
    use assert_matches::assert_matches;

    fn b64(s: &str) -> String {
        base64::engine::general_purpose::STANDARD.encode(s)
    }

    const FLAT: &str = r#"{
        "id": "b-1",
        "status": "SUCCESS",
        "statusDetail": "Build passed",
        "logUrl": "https://ci/x",
        "source": {"projectId": "p", "repoName": "r", "branchName": "main"}
    }"#;

    #[test]
    fn test_decode_flat_source() {
        let n = decode_payload(&b64(FLAT)).unwrap();
        assert_eq!(n.id.as_deref(), Some("b-1"));
        assert_eq!(n.status, BuildStatus::Success);
        assert_eq!(n.status_detail, "Build passed");
        assert_eq!(n.log_url, "https://ci/x");
        let src = n.repo_source().unwrap();
        assert_eq!(src.project_id, "p");
        assert_eq!(src.repo_name, "r");
        assert_eq!(src.commit_ref(), Some(CommitRef::Branch("main")));
    }

    #[test]
    fn test_decode_provenance_shape() {
        let json = r#"{
            "status": "FAILURE",
            "statusDetail": "step 2 failed",
            "logUrl": "https://ci/y",
            "sourceProvenance": {
                "resolvedRepoSource": {"projectId": "p", "repoName": "r", "commitSha": "abc123"}
            }
        }"#;
        let n = decode_payload(&b64(json)).unwrap();
        let src = n.repo_source().unwrap();
        assert_eq!(src.commit_ref(), Some(CommitRef::Commit("abc123")));
    }

    #[test]
    fn test_decode_nested_repo_source() {
        let json = r#"{
            "status": "WORKING",
            "source": {"repoSource": {"projectId": "p", "repoName": "r", "tagName": "v1"}}
        }"#;
        let n = parse_build(json).unwrap();
        assert_eq!(n.repo_source().unwrap().commit_ref(), Some(CommitRef::Tag("v1")));
        assert_eq!(n.status_detail, "");
        assert_eq!(n.log_url, "");
    }

    #[test]
    fn test_provenance_preferred_over_source() {
        let json = r#"{
            "status": "SUCCESS",
            "source": {"projectId": "p", "repoName": "r", "branchName": "main"},
            "sourceProvenance": {
                "resolvedRepoSource": {"projectId": "p", "repoName": "r", "commitSha": "f00d"}
            }
        }"#;
        let n = parse_build(json).unwrap();
        assert_eq!(n.repo_source().unwrap().commit_sha.as_deref(), Some("f00d"));
    }

    #[test]
    fn test_no_source_in_either_shape() {
        let none = parse_build(r#"{"status": "SUCCESS"}"#).unwrap();
        assert!(none.repo_source().is_none());

        let storage = parse_build(
            r#"{"status": "SUCCESS", "source": {"storageSource": {"bucket": "b", "object": "o"}}}"#,
        )
        .unwrap();
        assert!(storage.repo_source().is_none());

        let empty_prov =
            parse_build(r#"{"status": "QUEUED", "sourceProvenance": {}}"#).unwrap();
        assert!(empty_prov.repo_source().is_none());
    }

    #[test]
    fn test_unknown_status_is_decode_error() {
        let err = parse_build(r#"{"status": "EXPLODED"}"#).unwrap_err();
        assert_matches!(err, Error::Decode(_));
    }

    #[test]
    fn test_bad_base64() {
        assert_matches!(decode_payload("%%%not-base64%%%"), Err(Error::Decode(_)));
    }

    #[test]
    fn test_base64_of_non_json() {
        assert_matches!(decode_payload(&b64("hello")), Err(Error::Decode(_)));
    }

    #[test]
    fn test_decode_event_bare_payload() {
        let raw = format!("  {}\n", b64(FLAT));
        let n = decode_event(raw.as_bytes()).unwrap();
        assert_eq!(n.status, BuildStatus::Success);
    }

    #[test]
    fn test_decode_event_pubsub_message() {
        let raw = serde_json::json!({
            "data": b64(FLAT),
            "attributes": {"buildId": "b-1", "status": "SUCCESS"},
            "messageId": "1"
        })
        .to_string();
        let n = decode_event(raw.as_bytes()).unwrap();
        assert_eq!(n.repo_source().unwrap().repo_name, "r");
    }

    #[test]
    fn test_decode_event_push_envelope() {
        let raw = serde_json::json!({
            "message": {"data": b64(FLAT), "messageId": "1"},
            "subscription": "projects/p/subscriptions/cloud-builds"
        })
        .to_string();
        let n = decode_event(raw.as_bytes()).unwrap();
        assert_eq!(n.log_url, "https://ci/x");
    }

    #[test]
    fn test_decode_event_background_function() {
        let raw = serde_json::json!({"data": {"data": b64(FLAT)}}).to_string();
        let n = decode_event(raw.as_bytes()).unwrap();
        assert_eq!(n.id.as_deref(), Some("b-1"));
    }

    #[test]
    fn test_decode_event_plain_build_json() {
        let n = decode_event(FLAT.as_bytes()).unwrap();
        assert_eq!(n.status_detail, "Build passed");
    }

    #[test]
    fn test_decode_event_without_data() {
        let err = decode_event(br#"{"message": {"attributes": {}}}"#).unwrap_err();
        assert_eq!(err.message(), "event has no base64 data field");
    }

    #[test]
    fn test_decode_event_not_utf8() {
        assert_matches!(decode_event(&[0xff, 0xfe, 0x00]), Err(Error::Decode(_)));
    }
}
