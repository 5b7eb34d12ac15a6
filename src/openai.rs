//! OpenAI-compatible client configuration.
//!
//! The hosted model is reached through an OpenAI-compatible endpoint, so the same
//! client serves Gemini, OpenAI or a local gateway depending on the configured base URL.

use crate::config::LlmSettings;
use crate::error::{EchoError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create a client for the configured chat endpoint with the given API key.
pub fn create_client(settings: &LlmSettings, api_key: &str) -> Result<Client<OpenAIConfig>> {
    create_client_for(
        &settings.api_base,
        api_key,
        Duration::from_secs(settings.timeout_seconds),
    )
}

/// Create a client for any OpenAI-compatible base URL.
pub fn create_client_for(
    api_base: &str,
    api_key: &str,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| EchoError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let config = OpenAIConfig::new()
        .with_api_base(api_base.trim_end_matches('/'))
        .with_api_key(api_key);

    Ok(Client::with_config(config).with_http_client(http_client))
}
