//! Network seam for the cache agent.
//!
//! Every outbound request the agent makes on behalf of a page goes through
//! the [`Fetch`] trait. [`HttpFetch`] is the production implementation; the
//! test suite substitutes scripted fakes to simulate offline and flaky
//! networks.

use crate::config::NetworkConfig;
use crate::error::Result;
use crate::types::{FetchRequest, StoredResponse};
use async_trait::async_trait;
use chrono::Utc;

/// Issues a network fetch for an intercepted request.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetch the request from the network.
    ///
    /// Returns `Ok` for any response the transport produced, whatever its
    /// status code; `Err` means the transport itself failed (offline, DNS,
    /// timeout). Routes decide what each case means.
    async fn fetch(&self, request: &FetchRequest) -> Result<StoredResponse>;
}

/// HTTP implementation of [`Fetch`] backed by a shared `reqwest` client.
pub struct HttpFetch {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFetch {
    /// Create a new fetcher from network configuration.
    pub fn new(config: &NetworkConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Fetch for HttpFetch {
    async fn fetch(&self, request: &FetchRequest) -> Result<StoredResponse> {
        let url = format!("{}{}", self.base_url, request.url);
        let response = self.client.get(&url).send().await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();

        Ok(StoredResponse {
            status,
            content_type,
            body,
            fetched_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkConfig;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let fetcher = HttpFetch::new(&NetworkConfig {
            base_url: "https://example.test/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(fetcher.base_url, "https://example.test");
    }

    #[test]
    fn test_client_builds_from_default_config() {
        assert!(HttpFetch::new(&NetworkConfig::default()).is_ok());
    }
}
