//! YouTube video references.
//!
//! Turns whatever the user pasted into an 11-character video identifier.

use crate::error::{EchoError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// `watch?v=`, `embed/`, `v/`, `shorts/` and `live/` URLs on youtube.com.
static CANONICAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        youtube(?:-nocookie)?\.com/
        (?:
            watch\?(?:[^\#\s]*&)?v=
            | embed/
            | v/
            | shorts/
            | live/
        )
        ([0-9A-Za-z_-]{11})
        (?:$|[^0-9A-Za-z_-])
    ",
    )
    .unwrap()
});

/// `youtu.be/<id>` short links.
static SHORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"youtu\.be/([0-9A-Za-z_-]{11})(?:$|[^0-9A-Za-z_-])").unwrap());

/// Extract the video identifier from a YouTube URL.
///
/// Canonical forms are tried before short links; the first match wins.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    [&*CANONICAL_RE, &*SHORT_RE]
        .into_iter()
        .find_map(|re| re.captures(input))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// A user-supplied URL together with the identifier found in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoReference {
    /// What the user typed.
    pub raw_url: String,
    /// 11-character YouTube identifier.
    pub video_id: String,
}

impl VideoReference {
    /// Parse user input, rejecting empty or unrecognised URLs.
    pub fn parse(input: &str) -> Result<Self> {
        if input.trim().is_empty() {
            return Err(EchoError::InvalidInput(
                "Please enter a YouTube URL".to_string(),
            ));
        }

        let video_id = extract_video_id(input)
            .ok_or_else(|| EchoError::InvalidUrl(input.trim().to_string()))?;

        Ok(Self {
            raw_url: input.trim().to_string(),
            video_id,
        })
    }

    /// Canonical watch URL for this video.
    pub fn watch_url(&self) -> String {
        watch_url(&self.video_id)
    }
}

/// Canonical watch URL for a video identifier.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_video_id() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://m.youtube.com/watch?feature=share&v=dQw4w9WgXcQ&t=42s"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ?si=abc"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("  https://www.youtube.com/shorts/aB-_9xYz0Q1  "),
            Some("aB-_9xYz0Q1".to_string())
        );
    }

    #[test]
    fn test_extract_is_case_sensitive() {
        assert_eq!(
            extract_video_id("https://youtu.be/AbCdEfGhIjK"),
            Some("AbCdEfGhIjK".to_string())
        );
        assert_ne!(
            extract_video_id("https://youtu.be/AbCdEfGhIjK"),
            Some("abcdefghijk".to_string())
        );
    }

    #[test]
    fn test_extract_rejects_non_videos() {
        assert_eq!(extract_video_id("https://example.com/not-a-video"), None);
        assert_eq!(extract_video_id("https://www.youtube.com/watch?v=short"), None);
        assert_eq!(extract_video_id("https://youtu.be/dQw4w9WgXcQtoolong"), None);
        assert_eq!(extract_video_id(""), None);
        assert_eq!(extract_video_id("dQw4w9WgXcQ"), None);
    }

    #[test]
    fn test_reference_parse() {
        let reference = VideoReference::parse("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(reference.video_id, "dQw4w9WgXcQ");
        assert_eq!(
            reference.watch_url(),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_reference_parse_errors() {
        assert!(matches!(
            VideoReference::parse("   "),
            Err(EchoError::InvalidInput(_))
        ));
        assert!(matches!(
            VideoReference::parse("https://example.com/not-a-video"),
            Err(EchoError::InvalidUrl(_))
        ));
    }
}
