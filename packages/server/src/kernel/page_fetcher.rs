//! HTTP page fetcher used by the watch pipeline.
//!
//! One GET per firing, no crawling. Certificate verification is off because
//! many watched pages sit behind self-signed or expired certificates.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use super::{BasePageFetcher, FetchError, FetchedPage};

pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> anyhow::Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .default_headers(headers)
            .danger_accept_invalid_certs(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl BasePageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Request {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        // Error pages are still pages; the pattern decides whether they matter
        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = %status, "Page returned non-success status");
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let bytes = response.bytes().await.map_err(|e| FetchError::Body {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        debug!(url = %url, bytes = bytes.len(), "Fetched page");
        Ok(FetchedPage {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}
