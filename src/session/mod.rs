//! Per-user conversation state.
//!
//! A [`Session`] owns the index of the loaded video and the conversation about it. Loading a
//! new video replaces both at once; a failed load leaves the session as it was.

use crate::transcript::Transcript;
use crate::vector_store::MemoryIndex;
use crate::video_source::VideoReference;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A processed video. Swapped into a session whole, and kept there as the active video.
#[derive(Debug, Clone)]
pub struct LoadedVideo {
    pub reference: VideoReference,
    pub transcript: Transcript,
    pub index: MemoryIndex,
    pub chunk_count: usize,
}

/// One question and its answer.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationTurn {
    pub question: String,
    pub answer: String,
    /// Transcript excerpts behind the answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
    pub asked_at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(question: String, answer: String, sources: Option<Vec<String>>) -> Self {
        Self {
            question,
            answer,
            sources,
            asked_at: Utc::now(),
        }
    }
}

/// Conversation state for one user.
#[derive(Debug, Default)]
pub struct Session {
    active: Option<LoadedVideo>,
    turns: Vec<ConversationTurn>,
    raw_history: Vec<(String, String)>,
}

impl Session {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the loaded video and the whole conversation.
    pub fn reset(&mut self) {
        self.active = None;
        self.turns.clear();
        self.raw_history.clear();
    }

    /// Make `video` the active video and start a fresh conversation.
    pub fn replace(&mut self, video: LoadedVideo) {
        self.active = Some(video);
        self.turns.clear();
        self.raw_history.clear();
    }

    /// Record an answered question.
    pub fn push_turn(&mut self, turn: ConversationTurn) -> &ConversationTurn {
        self.raw_history
            .push((turn.question.clone(), turn.answer.clone()));
        self.turns.push(turn);
        &self.turns[self.turns.len() - 1]
    }

    /// Title of the active video.
    pub fn title(&self) -> Option<&str> {
        self.active.as_ref().map(|v| v.transcript.title.as_str())
    }

    /// True when a video is loaded and questions can be asked.
    pub fn is_ready(&self) -> bool {
        self.active.is_some()
    }

    /// The video questions are answered about.
    pub fn active(&self) -> Option<&LoadedVideo> {
        self.active.as_ref()
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Earlier `(question, answer)` pairs, oldest first.
    pub fn raw_history(&self) -> &[(String, String)] {
        &self.raw_history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::Chunk;

    fn loaded(video_id: &str, title: &str) -> LoadedVideo {
        let reference =
            VideoReference::parse(&format!("https://www.youtube.com/watch?v={}", video_id)).unwrap();
        let transcript = Transcript {
            video_id: video_id.to_string(),
            title: title.to_string(),
            full_text: "some words".to_string(),
            language: "en".to_string(),
        };
        let index = MemoryIndex::build(
            vec![Chunk::new("some words".to_string(), 0)],
            vec![vec![1.0, 0.0]],
        )
        .unwrap();
        LoadedVideo {
            reference,
            transcript,
            index,
            chunk_count: 1,
        }
    }

    #[test]
    fn test_new_session_is_empty() {
        let session = Session::new();
        assert!(!session.is_ready());
        assert!(session.title().is_none());
        assert!(session.turns().is_empty());
        assert!(session.raw_history().is_empty());
    }

    #[test]
    fn test_replace_clears_conversation() {
        let mut session = Session::new();
        session.replace(loaded("dQw4w9WgXcQ", "First"));
        session.push_turn(ConversationTurn::new(
            "q".to_string(),
            "a".to_string(),
            None,
        ));
        assert_eq!(session.turns().len(), 1);
        assert_eq!(session.raw_history(), &[("q".to_string(), "a".to_string())]);

        session.replace(loaded("aaaaaaaaaaa", "Second"));
        assert_eq!(session.title(), Some("Second"));
        assert!(session.turns().is_empty());
        assert!(session.raw_history().is_empty());
        assert_eq!(
            session.active().unwrap().reference.video_id,
            "aaaaaaaaaaa"
        );
    }

    #[test]
    fn test_active_video_is_the_loaded_one() {
        let mut session = Session::new();
        session.replace(loaded("dQw4w9WgXcQ", "First"));

        let active = session.active().unwrap();
        assert_eq!(active.chunk_count, 1);
        assert_eq!(active.index.len(), 1);
        assert_eq!(active.transcript.language, "en");
    }

    #[test]
    fn test_reset() {
        let mut session = Session::new();
        session.replace(loaded("dQw4w9WgXcQ", "First"));
        session.push_turn(ConversationTurn::new(
            "q".to_string(),
            "a".to_string(),
            Some(vec!["excerpt".to_string()]),
        ));

        session.reset();
        assert!(!session.is_ready());
        assert!(session.turns().is_empty());
        assert!(session.raw_history().is_empty());
    }

    #[test]
    fn test_turn_serialization_skips_missing_sources() {
        let turn = ConversationTurn::new("q".to_string(), "a".to_string(), None);
        let json = serde_json::to_value(&turn).unwrap();
        assert!(json.get("sources").is_none());
        assert_eq!(json["question"], "q");
    }
}
