//! Error types for EchoVerse.

use serde::Serialize;
use thiserror::Error;

/// Library-level error type for EchoVerse operations.
#[derive(Error, Debug)]
pub enum EchoError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid YouTube URL: {0}")]
    InvalidUrl(String),

    #[error("Please enter a question")]
    EmptyQuestion,

    #[error("No video loaded. Process a video before asking questions.")]
    NoActiveVideo,

    #[error("No transcript found for video {video_id} in languages {languages:?}")]
    TranscriptNotFound {
        video_id: String,
        languages: Vec<String>,
    },

    #[error("Video unavailable: {0}")]
    VideoUnavailable(String),

    #[error("Transcript fetch failed: {0}")]
    Transcript(String),

    #[error("Title lookup failed: {0}")]
    Title(String),

    #[error("Chunking error: {0}")]
    Chunking(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector index error: {0}")]
    Index(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Coarse classification of an [`EchoError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad user input, rejected before any network call.
    Validation,
    /// The requested video or transcript does not exist.
    NotFound,
    /// The video exists but cannot be served (private, blocked, age-gated).
    Unavailable,
    /// A remote service failed (network, quota, auth).
    Upstream,
    /// Local failure: configuration, I/O, model loading.
    Internal,
}

impl EchoError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EchoError::InvalidInput(_)
            | EchoError::InvalidUrl(_)
            | EchoError::EmptyQuestion
            | EchoError::NoActiveVideo => ErrorKind::Validation,
            EchoError::TranscriptNotFound { .. } => ErrorKind::NotFound,
            EchoError::VideoUnavailable(_) => ErrorKind::Unavailable,
            EchoError::Transcript(_)
            | EchoError::Title(_)
            | EchoError::Llm(_)
            | EchoError::Http(_) => ErrorKind::Upstream,
            EchoError::Config(_)
            | EchoError::Chunking(_)
            | EchoError::Embedding(_)
            | EchoError::Index(_)
            | EchoError::Io(_)
            | EchoError::Json(_)
            | EchoError::TomlParse(_) => ErrorKind::Internal,
        }
    }
}

/// Result type alias for EchoVerse operations.
pub type Result<T> = std::result::Result<T, EchoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(EchoError::EmptyQuestion.kind(), ErrorKind::Validation);
        assert_eq!(
            EchoError::InvalidUrl("x".to_string()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            EchoError::TranscriptNotFound {
                video_id: "dQw4w9WgXcQ".to_string(),
                languages: vec!["tr".to_string()],
            }
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            EchoError::VideoUnavailable("private".to_string()).kind(),
            ErrorKind::Unavailable
        );
        assert_eq!(EchoError::Llm("quota".to_string()).kind(), ErrorKind::Upstream);
    }

    #[test]
    fn test_transcript_not_found_message() {
        let err = EchoError::TranscriptNotFound {
            video_id: "abc".to_string(),
            languages: vec!["tr".to_string(), "en".to_string()],
        };
        assert_eq!(
            err.to_string(),
            r#"No transcript found for video abc in languages ["tr", "en"]"#
        );
    }
}
