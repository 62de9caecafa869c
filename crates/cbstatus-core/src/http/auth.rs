//! Access token sources for Google APIs

use crate::error::{Error, Result};
use crate::traits::TokenSource;
use async_trait::async_trait;
use serde::Deserialize;

/// Default metadata server host on GCE, Cloud Run and Cloud Functions
pub const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";

/// A pre-minted OAuth access token (e.g. `gcloud auth print-access-token`)
pub struct StaticToken(String);

impl StaticToken {
    /// Wrap an existing token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticToken(<redacted>)")
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self, _scopes: &[&str]) -> Result<String> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
}

/// Tokens for the attached service account, minted by the metadata server
#[derive(Debug)]
pub struct MetadataServerToken {
    client: reqwest::Client,
    base_url: String,
}

impl MetadataServerToken {
    /// Create a token source against `base_url` (e.g. `http://metadata.google.internal`)
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(super::USER_AGENT)
            .timeout(super::REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client, base_url }
    }
}

#[async_trait]
impl TokenSource for MetadataServerToken {
    /// Endpoint: GET /computeMetadata/v1/instance/service-accounts/default/token
    async fn access_token(&self, scopes: &[&str]) -> Result<String> {
        let url = super::endpoint(
            &self.base_url,
            ["computeMetadata", "v1", "instance", "service-accounts", "default"],
            &["token"],
        )
        .map_err(Error::Config)?;

        let mut request = self.client.get(url).header("Metadata-Flavor", "Google");
        if !scopes.is_empty() {
            request = request.query(&[("scopes", scopes.join(","))]);
        }

        let response = request.send().await.map_err(|e| {
            Error::Auth(format!("metadata server unreachable: {}", e.without_url()))
        })?;

        if !response.status().is_success() {
            return Err(Error::Auth(format!(
                "metadata server returned {}",
                response.status()
            )));
        }

        let token: MetadataToken = response.json().await.map_err(|e| {
            Error::Auth(format!("invalid metadata token response: {}", e.without_url()))
        })?;

        Ok(token.access_token)
    }
}
