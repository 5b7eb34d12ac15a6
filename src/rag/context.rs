//! Context retrieval for answers.

use super::ContextChunk;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::MemoryIndex;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Default number of chunks placed in a prompt.
pub const DEFAULT_TOP_K: usize = 3;

/// Finds the transcript chunks closest to a question.
pub struct ContextBuilder {
    embedder: Arc<dyn Embedder>,
    top_k: usize,
}

impl ContextBuilder {
    /// Create a new context builder.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Set the number of chunks to retrieve.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Retrieve the `top_k` nearest chunks for a question, best first.
    #[instrument(skip(self, index))]
    pub async fn retrieve(&self, index: &MemoryIndex, question: &str) -> Result<Vec<ContextChunk>> {
        self.retrieve_k(index, question, self.top_k).await
    }

    /// Retrieve an explicit number of chunks.
    pub async fn retrieve_k(
        &self,
        index: &MemoryIndex,
        question: &str,
        k: usize,
    ) -> Result<Vec<ContextChunk>> {
        let query_embedding = self.embedder.embed(question).await?;
        let results = index.search(&query_embedding, k)?;
        debug!("Retrieved {} chunks", results.len());

        Ok(results.into_iter().map(ContextChunk::from).collect())
    }
}

/// Join retrieved chunks into the prompt's context block.
pub fn format_context_for_prompt(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
