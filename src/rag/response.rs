//! Answer generation.

use super::context::format_context_for_prompt;
use super::{ChatMessage, ContextBuilder, ContextChunk, LanguageModel};
use crate::config::{Prompts, RagSettings};
use crate::error::Result;
use crate::vector_store::MemoryIndex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Answers questions about a loaded video.
pub struct RagEngine {
    llm: Arc<dyn LanguageModel>,
    context_builder: ContextBuilder,
    prompts: Prompts,
    return_sources: bool,
    max_sources: usize,
    excerpt_chars: usize,
    condense_question: bool,
}

impl RagEngine {
    /// Create a new engine with default prompts and source settings.
    pub fn new(llm: Arc<dyn LanguageModel>, context_builder: ContextBuilder) -> Self {
        let defaults = RagSettings::default();
        Self {
            llm,
            context_builder,
            prompts: Prompts::default(),
            return_sources: defaults.return_sources,
            max_sources: defaults.max_sources,
            excerpt_chars: defaults.source_excerpt_chars,
            condense_question: defaults.condense_question,
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Apply source and condensing options.
    pub fn with_settings(mut self, settings: &RagSettings) -> Self {
        self.return_sources = settings.return_sources;
        self.max_sources = settings.max_sources;
        self.excerpt_chars = settings.source_excerpt_chars;
        self.condense_question = settings.condense_question;
        self
    }

    pub fn context_builder(&self) -> &ContextBuilder {
        &self.context_builder
    }

    /// Answer `question` from the chunks in `index`.
    ///
    /// `history` holds earlier `(question, answer)` pairs, oldest first. They are sent to the
    /// model ahead of the rendered prompt.
    #[instrument(skip(self, index, history), fields(turns = history.len()))]
    pub async fn answer(
        &self,
        index: &MemoryIndex,
        question: &str,
        history: &[(String, String)],
    ) -> Result<RagResponse> {
        info!("Processing question: {}", question);

        let question = if self.condense_question && !history.is_empty() {
            self.condense(question, history).await?
        } else {
            question.to_string()
        };

        let context = self.context_builder.retrieve(index, &question).await?;

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.clone());
        vars.insert("context".to_string(), format_context_for_prompt(&context));
        let prompt = self.prompts.render_with_custom(&self.prompts.rag.answer, &vars);

        let mut messages = Vec::with_capacity(history.len() * 2 + 1);
        for (asked, answered) in history {
            messages.push(ChatMessage::user(asked.clone()));
            messages.push(ChatMessage::assistant(answered.clone()));
        }
        messages.push(ChatMessage::user(prompt));

        let answer = self.llm.complete(&messages).await?.trim().to_string();

        let sources = if self.return_sources && !context.is_empty() {
            Some(
                context
                    .iter()
                    .take(self.max_sources)
                    .map(|chunk| excerpt(&chunk.content, self.excerpt_chars))
                    .collect(),
            )
        } else {
            None
        };

        debug!("Answered with {} context chunks", context.len());

        Ok(RagResponse {
            answer,
            sources,
            context,
        })
    }

    /// Rewrite a follow-up into a standalone question.
    async fn condense(&self, question: &str, history: &[(String, String)]) -> Result<String> {
        let chat_history = history
            .iter()
            .map(|(q, a)| format!("Human: {}\nAssistant: {}", q, a))
            .collect::<Vec<_>>()
            .join("\n");

        let mut vars = HashMap::new();
        vars.insert("chat_history".to_string(), chat_history);
        vars.insert("question".to_string(), question.to_string());
        let prompt = self.prompts.render_with_custom(&self.prompts.rag.condense, &vars);

        let rewritten = self.llm.complete(&[ChatMessage::user(prompt)]).await?;
        let rewritten = rewritten.trim();

        if rewritten.is_empty() {
            Ok(question.to_string())
        } else {
            debug!("Condensed question: {}", rewritten);
            Ok(rewritten.to_string())
        }
    }
}

/// An answer together with the material it was based on.
#[derive(Debug, Clone)]
pub struct RagResponse {
    /// The generated answer.
    pub answer: String,
    /// Source excerpts shown to the user, if enabled and anything was retrieved.
    pub sources: Option<Vec<String>>,
    /// Every chunk placed in the prompt.
    pub context: Vec<ContextChunk>,
}

/// First `max_chars` characters of `text`.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RagSettings;
    use crate::error::{EchoError, ErrorKind};
    use crate::rag::ChatRole;
    use crate::testing::{keyword_index, ScriptedLlm};

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt("hello", 10), "hello");
        assert_eq!(excerpt("hello", 3), "hel");
        assert_eq!(excerpt("çğüşöı", 2), "çğ");
        assert_eq!(excerpt(&"a".repeat(800), 500).chars().count(), 500);
    }

    #[tokio::test]
    async fn test_answer_uses_context_and_sources() {
        let long = format!("rust {}", "b".repeat(700));
        let (embedder, index) = keyword_index(&[
            "rust ownership rules",
            "pasta recipe",
            long.as_str(),
            "rust lifetimes",
        ])
        .await;
        let llm = Arc::new(ScriptedLlm::new(["Ownership moves values."]));
        let engine = RagEngine::new(llm.clone(), ContextBuilder::new(embedder));

        let response = engine.answer(&index, "rust", &[]).await.unwrap();

        assert_eq!(response.answer, "Ownership moves values.");
        assert_eq!(response.context.len(), 3);
        let sources = response.sources.unwrap();
        assert_eq!(sources.len(), 3);
        assert!(sources.iter().all(|s| s.chars().count() <= 500));

        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 1);
        let prompt = &calls[0][0].content;
        assert!(prompt.contains("Question: rust"));
        assert!(prompt.contains("rust ownership rules"));
        assert!(!prompt.contains("{{context}}"));
    }

    #[tokio::test]
    async fn test_history_is_sent_before_prompt() {
        let (embedder, index) = keyword_index(&["rust ownership rules"]).await;
        let llm = Arc::new(ScriptedLlm::new(["second answer"]));
        let engine = RagEngine::new(llm.clone(), ContextBuilder::new(embedder));

        let history = vec![("first question".to_string(), "first answer".to_string())];
        engine.answer(&index, "ownership", &history).await.unwrap();

        let messages = &llm.calls()[0];
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0], ChatMessage::user("first question"));
        assert_eq!(messages[1], ChatMessage::assistant("first answer"));
        assert_eq!(messages[2].role, ChatRole::User);
    }

    #[tokio::test]
    async fn test_placeholder_text_in_transcript_is_kept() {
        let (embedder, index) = keyword_index(&["the speaker says {{question}} out loud"]).await;
        let llm = Arc::new(ScriptedLlm::new(["ok"]));
        let engine = RagEngine::new(llm.clone(), ContextBuilder::new(embedder));

        engine
            .answer(&index, "What does the speaker say?", &[])
            .await
            .unwrap();

        let prompt = &llm.calls()[0][0].content;
        assert!(prompt.contains("the speaker says {{question}} out loud"));
        assert!(prompt.contains("Question: What does the speaker say?"));
    }

    #[tokio::test]
    async fn test_sources_disabled() {
        let (embedder, index) = keyword_index(&["rust ownership rules"]).await;
        let llm = Arc::new(ScriptedLlm::new(["ok"]));
        let settings = RagSettings {
            return_sources: false,
            ..RagSettings::default()
        };
        let engine =
            RagEngine::new(llm, ContextBuilder::new(embedder)).with_settings(&settings);

        let response = engine.answer(&index, "rust", &[]).await.unwrap();
        assert!(response.sources.is_none());
    }

    #[tokio::test]
    async fn test_condense_rewrites_follow_up() {
        let (embedder, index) = keyword_index(&["pasta recipe", "rust ownership rules"]).await;
        let llm = Arc::new(ScriptedLlm::new(["What are rust ownership rules?", "answer"]));
        let settings = RagSettings {
            condense_question: true,
            ..RagSettings::default()
        };
        let engine = RagEngine::new(llm.clone(), ContextBuilder::new(embedder).with_top_k(1))
            .with_settings(&settings);

        let history = vec![("What is rust?".to_string(), "A language.".to_string())];
        let response = engine.answer(&index, "And its rules?", &history).await.unwrap();

        assert_eq!(response.answer, "answer");
        assert_eq!(response.context[0].content, "rust ownership rules");

        let calls = llm.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0][0].content.contains("Human: What is rust?"));
        assert!(calls[0][0].content.contains("Follow Up Input: And its rules?"));
        assert!(calls[1]
            .last()
            .unwrap()
            .content
            .contains("Question: What are rust ownership rules?"));
    }

    #[tokio::test]
    async fn test_llm_failure_is_upstream() {
        let (embedder, index) = keyword_index(&["rust ownership rules"]).await;
        let engine = RagEngine::new(
            Arc::new(ScriptedLlm::failing("quota exceeded")),
            ContextBuilder::new(embedder),
        );

        let err = engine.answer(&index, "rust", &[]).await.unwrap_err();
        assert!(matches!(err, EchoError::Llm(_)));
        assert_eq!(err.kind(), ErrorKind::Upstream);
    }
}
