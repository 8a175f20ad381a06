// HTTP metadata client — one JSON document per member.
//
// The provider serves each member at `{base}/{collection}/{id}.json` as a
// flat JSON object of category -> value strings. Anything else (non-2xx,
// timeout, non-object body, non-string values) is a failure for that member.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use super::traits::MetadataSource;
use crate::models::{MemberId, Traits};

/// Default metadata provider endpoint.
pub const DEFAULT_API_URL: &str = "https://go-challenge.skip.money";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Thin reqwest wrapper for the metadata provider.
///
/// One client (and its connection pool) is shared by every fetch task, so
/// it is cheap to hand out behind an `Arc`.
pub struct MetadataClient {
    client: reqwest::Client,
    base_url: String,
}

impl MetadataClient {
    /// Create a client for the given base URL with a per-request timeout.
    ///
    /// A request that exceeds `timeout` fails like any other network error.
    /// A base URL that is not an absolute http(s) URL is rejected here, not
    /// once per member.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let parsed = reqwest::Url::parse(base_url)
            .with_context(|| format!("Invalid metadata provider URL: {base_url}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("Metadata provider URL must be http or https: {base_url}");
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("rarity/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// URL of one member's metadata document.
    pub fn member_url(&self, collection: &str, id: MemberId) -> String {
        format!("{}/{}/{}.json", self.base_url, collection, id)
    }
}

#[async_trait]
impl MetadataSource for MetadataClient {
    async fn fetch_traits(&self, collection: &str, id: MemberId) -> Result<Traits> {
        let url = self.member_url(collection, id);

        debug!(id, url = url.as_str(), "Fetching member metadata");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Request for member {id} failed"))?;

        if !response.status().is_success() {
            let status = response.status();
            anyhow::bail!("Provider returned {status} for member {id}");
        }

        response
            .json::<Traits>()
            .await
            .with_context(|| format!("Malformed metadata payload for member {id}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_url_layout() {
        let client = MetadataClient::new("https://example.test", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.member_url("azuki1", 42),
            "https://example.test/azuki1/42.json"
        );
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = MetadataClient::new("https://example.test///", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.member_url("azuki1", 1),
            "https://example.test/azuki1/1.json"
        );
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        for bad in ["not a url at all", "", "example.test/no-scheme", "ftp://example.test"] {
            assert!(
                MetadataClient::new(bad, Duration::from_secs(1)).is_err(),
                "accepted {bad:?}"
            );
        }
    }
}
