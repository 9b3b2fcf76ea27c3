//! Remote face sources
//!
//! Fetches a JSON document over HTTP(S) for face specs given as a URL.

use std::time::Duration;

use anyhow::Context;
use reqwest::{header::ACCEPT, Client};
use tracing::debug;

use crate::error::{DiceError, DiceResult};

/// HTTP client for JSON face payloads
#[derive(Debug, Clone)]
pub struct JsonFetcher {
    client: Client,
}

impl JsonFetcher {
    /// Create a fetcher whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }

    /// GET `url` and decode the body as JSON
    pub async fn fetch_json(&self, url: &str) -> DiceResult<serde_json::Value> {
        debug!("Fetching faces from {}", url);

        let fail = |reason: String| DiceError::FetchFailed {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| fail(e.to_string()))?;

        if !response.status().is_success() {
            return Err(fail(format!("HTTP error: {}", response.status())));
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| fail(format!("response is not JSON: {}", e)))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_source_is_fetch_failed() {
        let fetcher = JsonFetcher::new(Duration::from_secs(2)).unwrap();
        // Port 1 is never served in the test environment
        let url = "http://127.0.0.1:1/faces.json";
        match fetcher.fetch_json(url).await {
            Err(DiceError::FetchFailed { url: failed, .. }) => assert_eq!(failed, url),
            other => panic!("unexpected result {:?}", other),
        }
    }
}
