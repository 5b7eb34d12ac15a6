//! Transcript acquisition.
//!
//! Caption data and the display title come from two independent providers. A missing
//! caption track aborts the whole acquisition; a missing title never does.

mod title;
mod youtube;

pub use title::OembedTitleProvider;
pub use youtube::YoutubeCaptionProvider;

use crate::config::TranscriptSettings;
use crate::error::Result;
use crate::video_source::VideoReference;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// One caption cue as delivered by the caption provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionFragment {
    /// Spoken text of the cue.
    pub text: String,
    /// Cue start in seconds.
    pub start_seconds: f64,
    /// Cue duration in seconds.
    pub duration_seconds: f64,
}

impl CaptionFragment {
    pub fn new(text: impl Into<String>, start_seconds: f64, duration_seconds: f64) -> Self {
        Self {
            text: text.into(),
            start_seconds,
            duration_seconds,
        }
    }
}

/// Caption track contents in one language.
#[derive(Debug, Clone)]
pub struct CaptionTrackData {
    /// Language code of the track that was selected.
    pub language: String,
    /// Cues in playback order.
    pub fragments: Vec<CaptionFragment>,
}

/// The flattened transcript of a single video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Video ID this transcript belongs to.
    pub video_id: String,
    /// Display title, or a placeholder when the lookup failed.
    pub title: String,
    /// All caption text joined by single spaces.
    pub full_text: String,
    /// Language code of the caption track used.
    pub language: String,
}

impl Transcript {
    /// Build a transcript from caption fragments, discarding their timing.
    pub fn from_fragments(
        video_id: String,
        title: String,
        language: String,
        fragments: &[CaptionFragment],
    ) -> Self {
        let full_text = fragments
            .iter()
            .map(|f| f.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            video_id,
            title,
            full_text,
            language,
        }
    }

    /// Number of characters in the transcript text.
    pub fn char_count(&self) -> usize {
        self.full_text.chars().count()
    }
}

/// Title used when the metadata lookup fails.
pub fn placeholder_title(video_id: &str) -> String {
    format!("Video (ID: {})", video_id)
}

/// Source of caption tracks.
#[async_trait]
pub trait CaptionProvider: Send + Sync {
    /// Fetch the first available track from `languages`, in order of preference.
    async fn fetch_captions(&self, video_id: &str, languages: &[String])
        -> Result<CaptionTrackData>;
}

/// Source of display titles.
#[async_trait]
pub trait TitleProvider: Send + Sync {
    /// Look up the title for a canonical watch URL.
    async fn fetch_title(&self, watch_url: &str) -> Result<String>;
}

/// Combines caption and title lookups into a [`Transcript`].
pub struct TranscriptService {
    captions: Arc<dyn CaptionProvider>,
    titles: Arc<dyn TitleProvider>,
    languages: Vec<String>,
}

impl TranscriptService {
    /// Create a new transcript service.
    pub fn new(
        captions: Arc<dyn CaptionProvider>,
        titles: Arc<dyn TitleProvider>,
        languages: Vec<String>,
    ) -> Self {
        Self {
            captions,
            titles,
            languages,
        }
    }

    /// Create a service backed by YouTube captions and oEmbed titles.
    pub fn from_settings(settings: &TranscriptSettings) -> Result<Self> {
        let timeout = Duration::from_secs(settings.timeout_seconds);
        Ok(Self::new(
            Arc::new(YoutubeCaptionProvider::new(timeout)?),
            Arc::new(OembedTitleProvider::new(timeout)?),
            settings.languages.clone(),
        ))
    }

    /// Fetch captions and title for a video.
    #[instrument(skip(self), fields(video_id = %reference.video_id))]
    pub async fn acquire(&self, reference: &VideoReference) -> Result<Transcript> {
        info!("Fetching transcript for {}", reference.video_id);

        let track = self
            .captions
            .fetch_captions(&reference.video_id, &self.languages)
            .await?;

        let title = match self.titles.fetch_title(&reference.watch_url()).await {
            Ok(title) if !title.trim().is_empty() => title,
            Ok(_) => placeholder_title(&reference.video_id),
            Err(e) => {
                warn!("Title lookup failed, using placeholder: {}", e);
                placeholder_title(&reference.video_id)
            }
        };

        let transcript = Transcript::from_fragments(
            reference.video_id.clone(),
            title,
            track.language,
            &track.fragments,
        );

        info!(
            "Transcript fetched: {} fragments, {} characters",
            track.fragments.len(),
            transcript.char_count()
        );

        Ok(transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EchoError;
    use crate::testing::{FailingTitles, FixedTitles, ScriptedCaptions};

    fn reference() -> VideoReference {
        VideoReference::parse("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap()
    }

    fn languages() -> Vec<String> {
        vec!["tr".to_string(), "en".to_string()]
    }

    #[tokio::test]
    async fn test_acquire_joins_fragments() {
        let captions = ScriptedCaptions::with_track(
            "en",
            vec![
                CaptionFragment::new("Never gonna", 0.0, 1.5),
                CaptionFragment::new("  give you up ", 1.5, 2.0),
                CaptionFragment::new("\n", 3.5, 0.1),
                CaptionFragment::new("never gonna let you down", 3.6, 2.0),
            ],
        );
        let service = TranscriptService::new(
            Arc::new(captions),
            Arc::new(FixedTitles("Rick Astley".to_string())),
            languages(),
        );

        let transcript = service.acquire(&reference()).await.unwrap();
        assert_eq!(transcript.video_id, "dQw4w9WgXcQ");
        assert_eq!(transcript.title, "Rick Astley");
        assert_eq!(transcript.language, "en");
        assert_eq!(
            transcript.full_text,
            "Never gonna give you up never gonna let you down"
        );
    }

    #[tokio::test]
    async fn test_title_failure_uses_placeholder() {
        let captions = ScriptedCaptions::with_track(
            "tr",
            vec![CaptionFragment::new("merhaba", 0.0, 1.0)],
        );
        let service =
            TranscriptService::new(Arc::new(captions), Arc::new(FailingTitles), languages());

        let transcript = service.acquire(&reference()).await.unwrap();
        assert_eq!(transcript.title, "Video (ID: dQw4w9WgXcQ)");
        assert_eq!(transcript.full_text, "merhaba");
    }

    #[tokio::test]
    async fn test_caption_failure_aborts() {
        let service = TranscriptService::new(
            Arc::new(ScriptedCaptions::missing()),
            Arc::new(FixedTitles("unused".to_string())),
            languages(),
        );

        let err = service.acquire(&reference()).await.unwrap_err();
        match err {
            EchoError::TranscriptNotFound {
                video_id,
                languages,
            } => {
                assert_eq!(video_id, "dQw4w9WgXcQ");
                assert_eq!(languages, vec!["tr", "en"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_placeholder_title() {
        assert_eq!(placeholder_title("abc123def45"), "Video (ID: abc123def45)");
    }
}
