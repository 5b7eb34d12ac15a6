//! Video title lookup through YouTube's oEmbed endpoint.

use super::TitleProvider;
use crate::error::{EchoError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

const OEMBED_URL: &str = "https://www.youtube.com/oembed";

#[derive(Debug, Deserialize)]
struct OembedResponse {
    title: String,
}

/// Title provider using the public oEmbed endpoint (no API key).
pub struct OembedTitleProvider {
    client: reqwest::Client,
}

impl OembedTitleProvider {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EchoError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

/// oEmbed request URL for a watch URL.
fn oembed_url(watch_url: &str) -> Result<Url> {
    Url::parse_with_params(OEMBED_URL, &[("url", watch_url), ("format", "json")])
        .map_err(|e| EchoError::Title(e.to_string()))
}

#[async_trait]
impl TitleProvider for OembedTitleProvider {
    async fn fetch_title(&self, watch_url: &str) -> Result<String> {
        let response = self
            .client
            .get(oembed_url(watch_url)?)
            .send()
            .await
            .map_err(|e| EchoError::Title(e.to_string()))?
            .error_for_status()
            .map_err(|e| EchoError::Title(e.to_string()))?;

        let body: OembedResponse = response
            .json()
            .await
            .map_err(|e| EchoError::Title(e.to_string()))?;

        Ok(body.title)
    }
}
