//! Pre-flight checks before expensive operations.
//!
//! Validates that required configuration is available before starting operations that
//! would otherwise fail midway.

use crate::config::{EmbeddingProvider, Settings};
use crate::error::{EchoError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Answering questions needs captions, the LLM key and an embedding backend.
    Ask,
    /// Fetching a transcript needs at least one caption language.
    Transcript,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Ask => {
            check_languages(settings)?;
            check_api_key(settings)?;
            check_embedding_backend(settings)?;
        }
        Operation::Transcript => check_languages(settings)?,
    }
    Ok(())
}

/// Check that at least one caption language is configured.
fn check_languages(settings: &Settings) -> Result<()> {
    if settings.transcript.languages.is_empty() {
        return Err(EchoError::Config(
            "transcript.languages is empty. Add at least one language code, e.g. [\"en\"]."
                .to_string(),
        ));
    }
    Ok(())
}

/// Check that the configured LLM key is present.
fn check_api_key(settings: &Settings) -> Result<()> {
    settings.llm.api_key().map(|_| ())
}

/// Check that the selected embedding provider is compiled in and, when remote, has a key.
fn check_embedding_backend(settings: &Settings) -> Result<()> {
    match settings.embedding.provider {
        EmbeddingProvider::Local if !cfg!(feature = "local-embeddings") => {
            Err(EchoError::Config(
                "This build has no local embedding model. Set embedding.provider = \"openai\"."
                    .to_string(),
            ))
        }
        EmbeddingProvider::Local => Ok(()),
        EmbeddingProvider::OpenAI => settings.embedding.api_key().map(|_| ()),
    }
}
