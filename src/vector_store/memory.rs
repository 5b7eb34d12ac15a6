//! Exact in-memory nearest-neighbour index.

use super::{cosine_similarity, Document, SearchResult};
use crate::chunking::Chunk;
use crate::error::{EchoError, Result};

/// Immutable index scanned by brute-force cosine similarity.
#[derive(Debug, Clone)]
pub struct MemoryIndex {
    documents: Vec<Document>,
    dimensions: usize,
}

impl MemoryIndex {
    /// Build an index from chunks and their embeddings (same order, same length).
    pub fn build(chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Result<Self> {
        if chunks.is_empty() {
            return Err(EchoError::Index("cannot build an index without chunks".to_string()));
        }
        if chunks.len() != embeddings.len() {
            return Err(EchoError::Index(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        let dimensions = embeddings[0].len();
        if dimensions == 0 || embeddings.iter().any(|e| e.len() != dimensions) {
            return Err(EchoError::Index(
                "embeddings must share one non-zero dimension".to_string(),
            ));
        }

        let documents = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| Document {
                chunk_order: chunk.order,
                content: chunk.text,
                embedding,
            })
            .collect();

        Ok(Self {
            documents,
            dimensions,
        })
    }

    /// Return the `limit` most similar documents, best first.
    ///
    /// Equal scores are ordered by chunk position so results are reproducible.
    pub fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        if query_embedding.len() != self.dimensions {
            return Err(EchoError::Index(format!(
                "query has {} dimensions, index has {}",
                query_embedding.len(),
                self.dimensions
            )));
        }

        let mut results: Vec<SearchResult> = self
            .documents
            .iter()
            .map(|doc| SearchResult {
                document: doc.clone(),
                score: cosine_similarity(query_embedding, &doc.embedding),
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.document.chunk_order.cmp(&b.document.chunk_order))
        });
        results.truncate(limit);

        Ok(results)
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Always false for a successfully built index.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Embedding dimensions of this index.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}
