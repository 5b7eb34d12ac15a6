//! Vector index over transcript chunks.
//!
//! Indexes are built once from a complete chunk list and never modified afterwards. Loading
//! another video builds a fresh index.

mod memory;

pub use memory::MemoryIndex;

use crate::chunking::Chunk;
use crate::embedding::Embedder;
use crate::error::{EchoError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

/// A chunk stored in the index together with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Order of the chunk in the transcript.
    pub chunk_order: usize,
    /// Text content of the chunk.
    pub content: String,
    /// Embedding vector.
    pub embedding: Vec<f32>,
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched document.
    pub document: Document,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Embeds chunks and builds an index from them.
pub struct IndexBuilder {
    embedder: Arc<dyn Embedder>,
}

impl IndexBuilder {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    /// Embed every chunk and build a new index.
    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    pub async fn build(&self, chunks: Vec<Chunk>) -> Result<MemoryIndex> {
        if chunks.is_empty() {
            return Err(EchoError::Index(
                "the transcript produced no text to index".to_string(),
            ));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let index = MemoryIndex::build(chunks, embeddings)?;
        info!("Built index with {} chunks", index.len());
        Ok(index)
    }
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
