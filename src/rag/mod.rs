//! Retrieval-augmented answers about the loaded video.
//!
//! Questions are embedded with the same model as the transcript chunks, the nearest chunks
//! become the prompt context, and a chat model writes the answer.

pub mod context;
mod llm;
mod response;

pub use context::ContextBuilder;
pub use llm::{ChatMessage, ChatRole, LanguageModel, OpenAIChatModel};
pub use response::{excerpt, RagEngine, RagResponse};

use crate::vector_store::SearchResult;

/// A retrieved chunk ready to be placed in a prompt or shown to the user.
#[derive(Debug, Clone)]
pub struct ContextChunk {
    /// Position of the chunk in the transcript.
    pub chunk_order: usize,
    /// Text content.
    pub content: String,
    /// Similarity score.
    pub score: f32,
}

impl From<SearchResult> for ContextChunk {
    fn from(result: SearchResult) -> Self {
        Self {
            chunk_order: result.document.chunk_order,
            content: result.document.content,
            score: result.score,
        }
    }
}
