//! Pipeline orchestrator for EchoVerse.
//!
//! Coordinates the whole flow from a pasted URL to an answered question.

use crate::chunking::{ChunkingConfig, WindowChunker};
use crate::config::{Prompts, Settings};
use crate::embedding::{create_embedder, Embedder};
use crate::error::{EchoError, Result};
use crate::openai::create_client;
use crate::rag::{ContextBuilder, ContextChunk, LanguageModel, OpenAIChatModel, RagEngine};
use crate::session::{ConversationTurn, LoadedVideo, Session};
use crate::transcript::{CaptionProvider, TitleProvider, TranscriptService};
use crate::vector_store::{IndexBuilder, MemoryIndex};
use crate::video_source::VideoReference;
use std::sync::Arc;
use tracing::{info, instrument};

/// Milestones reported while a video is processed.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    /// A video identifier was found in the URL.
    VideoIdFound(String),
    /// Captions and title were fetched.
    TranscriptFetched { title: String, characters: usize },
    /// The transcript was split into this many chunks.
    Chunked(usize),
    /// The index is built and the video can be queried.
    Ready,
}

/// The main orchestrator for the EchoVerse pipeline.
pub struct Orchestrator {
    transcripts: TranscriptService,
    chunker: WindowChunker,
    index_builder: IndexBuilder,
    engine: RagEngine,
}

impl Orchestrator {
    /// Create an orchestrator from settings.
    ///
    /// API keys are read from the environment when the orchestrator is built.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let api_key = settings.llm.api_key()?;
        let client = create_client(&settings.llm, &api_key)?;

        let embedder = create_embedder(&settings)?;
        info!(
            "Using {} embeddings, chat model {}",
            settings.embedding.provider, settings.llm.model
        );

        let llm: Arc<dyn LanguageModel> = Arc::new(OpenAIChatModel::new(client, &settings.llm));
        let transcripts = TranscriptService::from_settings(&settings.transcript)?;

        Self::with_components(settings, prompts, transcripts, embedder, llm)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        transcripts: TranscriptService,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LanguageModel>,
    ) -> Result<Self> {
        let chunker = WindowChunker::new(ChunkingConfig::from_settings(&settings.chunking)?);
        let index_builder = IndexBuilder::new(embedder.clone());

        let context_builder = ContextBuilder::new(embedder).with_top_k(settings.rag.top_k);
        let engine = RagEngine::new(llm, context_builder)
            .with_prompts(prompts)
            .with_settings(&settings.rag);

        Ok(Self {
            transcripts,
            chunker,
            index_builder,
            engine,
        })
    }

    /// Create an orchestrator from explicit providers. Used by tests and embedders of the
    /// library that bring their own caption source.
    pub fn with_providers(
        settings: Settings,
        captions: Arc<dyn CaptionProvider>,
        titles: Arc<dyn TitleProvider>,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LanguageModel>,
    ) -> Result<Self> {
        let transcripts =
            TranscriptService::new(captions, titles, settings.transcript.languages.clone());
        Self::with_components(settings, Prompts::default(), transcripts, embedder, llm)
    }

    /// Run the full pipeline for a URL.
    pub async fn process_video(&self, url: &str) -> Result<LoadedVideo> {
        self.process_video_with_progress(url, |_| {}).await
    }

    /// Run the full pipeline, reporting each milestone to `on_event`.
    ///
    /// Nothing outside the returned value is touched, so a failure at any stage leaves the
    /// caller's state unchanged.
    #[instrument(skip(self, on_event))]
    pub async fn process_video_with_progress<F>(
        &self,
        url: &str,
        mut on_event: F,
    ) -> Result<LoadedVideo>
    where
        F: FnMut(&ProcessEvent) + Send,
    {
        let reference = VideoReference::parse(url)?;
        info!("Processing video {}", reference.video_id);
        on_event(&ProcessEvent::VideoIdFound(reference.video_id.clone()));

        let transcript = self.transcripts.acquire(&reference).await?;
        on_event(&ProcessEvent::TranscriptFetched {
            title: transcript.title.clone(),
            characters: transcript.char_count(),
        });

        let chunks = self.chunker.split(&transcript.full_text);
        if chunks.is_empty() {
            return Err(EchoError::Chunking(format!(
                "Transcript for {} contains no usable text",
                reference.video_id
            )));
        }
        let chunk_count = chunks.len();
        info!("Created {} chunks", chunk_count);
        on_event(&ProcessEvent::Chunked(chunk_count));

        let index = self.index_builder.build(chunks).await?;
        on_event(&ProcessEvent::Ready);

        Ok(LoadedVideo {
            reference,
            transcript,
            index,
            chunk_count,
        })
    }

    /// Process a URL and make it the session's active video.
    ///
    /// On failure the session keeps its previous video and conversation.
    pub async fn load_into(&self, session: &mut Session, url: &str) -> Result<()> {
        let video = self.process_video(url).await?;
        session.replace(video);
        Ok(())
    }

    /// Answer a question about the session's active video and record the turn.
    #[instrument(skip(self, session))]
    pub async fn ask<'s>(
        &self,
        session: &'s mut Session,
        question: &str,
    ) -> Result<&'s ConversationTurn> {
        let question = question.trim();
        if question.is_empty() {
            return Err(EchoError::EmptyQuestion);
        }

        let active = session.active().ok_or(EchoError::NoActiveVideo)?;
        let response = self
            .engine
            .answer(&active.index, question, session.raw_history())
            .await?;

        let turn = ConversationTurn::new(question.to_string(), response.answer, response.sources);
        Ok(session.push_turn(turn))
    }

    /// Retrieve the `k` chunks closest to `query` without calling the LLM.
    pub async fn search(
        &self,
        index: &MemoryIndex,
        query: &str,
        k: usize,
    ) -> Result<Vec<ContextChunk>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(EchoError::EmptyQuestion);
        }
        self.engine
            .context_builder()
            .retrieve_k(index, query, k)
            .await
    }
}
