//! Offline stand-ins for the network-backed components.

use crate::chunking::Chunk;
use crate::embedding::Embedder;
use crate::error::{EchoError, Result};
use crate::rag::{ChatMessage, LanguageModel};
use crate::transcript::{CaptionFragment, CaptionProvider, CaptionTrackData, TitleProvider};
use crate::vector_store::{IndexBuilder, MemoryIndex};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

const KEYWORD_DIMENSIONS: usize = 384;

/// Bag-of-words embedder. Every distinct lowercase word gets its own dimension in order of
/// first appearance, so texts sharing words are similar and unrelated texts are orthogonal.
#[derive(Default)]
pub struct KeywordEmbedder {
    vocabulary: Mutex<HashMap<String, usize>>,
}

impl KeywordEmbedder {
    pub fn vector(&self, text: &str) -> Vec<f32> {
        let mut vocabulary = self.vocabulary.lock().unwrap();
        let mut vector = vec![0.0; KEYWORD_DIMENSIONS];

        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let next = vocabulary.len();
            let slot = *vocabulary.entry(word.to_lowercase()).or_insert(next);
            vector[slot % KEYWORD_DIMENSIONS] += 1.0;
        }

        vector
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        KEYWORD_DIMENSIONS
    }
}

/// Build an index with one chunk per text, using a fresh [`KeywordEmbedder`].
pub async fn keyword_index(texts: &[&str]) -> (Arc<dyn Embedder>, MemoryIndex) {
    let embedder: Arc<dyn Embedder> = Arc::new(KeywordEmbedder::default());
    let chunks = texts
        .iter()
        .enumerate()
        .map(|(i, t)| Chunk::new(t.to_string(), i))
        .collect();
    let index = IndexBuilder::new(embedder.clone())
        .build(chunks)
        .await
        .unwrap();
    (embedder, index)
}

/// Caption provider returning a fixed track, or nothing at all.
pub struct ScriptedCaptions {
    track: Option<CaptionTrackData>,
}

impl ScriptedCaptions {
    pub fn with_track(language: &str, fragments: Vec<CaptionFragment>) -> Self {
        Self {
            track: Some(CaptionTrackData {
                language: language.to_string(),
                fragments,
            }),
        }
    }

    /// A single fragment in English carrying `text`.
    pub fn with_text(text: &str) -> Self {
        Self::with_track("en", vec![CaptionFragment::new(text, 0.0, 1.0)])
    }

    pub fn missing() -> Self {
        Self { track: None }
    }
}

#[async_trait]
impl CaptionProvider for ScriptedCaptions {
    async fn fetch_captions(
        &self,
        video_id: &str,
        languages: &[String],
    ) -> Result<CaptionTrackData> {
        match &self.track {
            Some(track) if languages.contains(&track.language) => Ok(track.clone()),
            _ => Err(EchoError::TranscriptNotFound {
                video_id: video_id.to_string(),
                languages: languages.to_vec(),
            }),
        }
    }
}

/// Title provider that always answers with the same title.
pub struct FixedTitles(pub String);

#[async_trait]
impl TitleProvider for FixedTitles {
    async fn fetch_title(&self, _watch_url: &str) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Title provider that always fails.
pub struct FailingTitles;

#[async_trait]
impl TitleProvider for FailingTitles {
    async fn fetch_title(&self, watch_url: &str) -> Result<String> {
        Err(EchoError::Title(format!("no metadata for {}", watch_url)))
    }
}

/// Language model that plays back canned replies and records what it was sent.
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<String>>,
    failure: Option<String>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedLlm {
    pub fn new<I>(replies: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            failure: Some(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every message list received so far.
    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedLlm {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        self.calls.lock().unwrap().push(messages.to_vec());

        if let Some(message) = &self.failure {
            return Err(EchoError::Llm(message.clone()));
        }

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| EchoError::Llm("no scripted reply left".to_string()))
    }
}
