//! Embedding generation for chunk retrieval.

#[cfg(feature = "local-embeddings")]
mod local;
mod openai;

#[cfg(feature = "local-embeddings")]
pub use local::{select_target, ExecutionTarget, LocalEmbedder};
pub use openai::OpenAIEmbedder;

use crate::config::{EmbeddingProvider, Settings};
use crate::error::Result;
use crate::openai::create_client_for;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;
}

/// Create the embedder selected in settings.
///
/// The remote provider talks to `embedding.api_base` with the key from
/// `embedding.api_key_env`, independent of the chat endpoint.
pub fn create_embedder(settings: &Settings) -> Result<Arc<dyn Embedder>> {
    match settings.embedding.provider {
        EmbeddingProvider::Local => local_embedder(settings),
        EmbeddingProvider::OpenAI => {
            let api_key = settings.embedding.api_key()?;
            let client = create_client_for(
                &settings.embedding.api_base,
                &api_key,
                Duration::from_secs(settings.llm.timeout_seconds),
            )?;
            Ok(Arc::new(OpenAIEmbedder::with_client(
                client,
                &settings.embedding.model,
                settings.embedding.dimensions as usize,
            )))
        }
    }
}

#[cfg(feature = "local-embeddings")]
fn local_embedder(settings: &Settings) -> Result<Arc<dyn Embedder>> {
    Ok(Arc::new(LocalEmbedder::new(
        settings.model_cache_dir(),
        settings.embedding.show_download_progress,
        settings.embedding.device,
    )))
}

#[cfg(not(feature = "local-embeddings"))]
fn local_embedder(_settings: &Settings) -> Result<Arc<dyn Embedder>> {
    Err(crate::error::EchoError::Config(
        "Local embeddings are not compiled in. Rebuild with the `local-embeddings` feature \
         or set embedding.provider = \"openai\"."
            .to_string(),
    ))
}
