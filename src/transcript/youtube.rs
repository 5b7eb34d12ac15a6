//! YouTube caption provider.
//!
//! Reads the InnerTube key from the watch page, asks the player endpoint for the caption
//! track list, then downloads the chosen track in `json3` format.

use super::{CaptionFragment, CaptionProvider, CaptionTrackData};
use crate::error::{EchoError, Result};
use crate::video_source::watch_url;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

const PLAYER_URL: &str = "https://www.youtube.com/youtubei/v1/player";

static API_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#).unwrap());

/// Caption provider backed by YouTube's public player API.
pub struct YoutubeCaptionProvider {
    client: reqwest::Client,
}

impl YoutubeCaptionProvider {
    /// Create a provider whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static("en-US"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| EchoError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    async fn fetch_watch_page(&self, video_id: &str) -> Result<String> {
        let response = self
            .client
            .get(watch_url(video_id))
            .send()
            .await
            .map_err(|e| EchoError::Transcript(format!("Failed to fetch watch page: {}", e)))?;

        check_status(&response, video_id)?;

        response
            .text()
            .await
            .map_err(|e| EchoError::Transcript(format!("Failed to read watch page: {}", e)))
    }

    async fn fetch_player(&self, video_id: &str, api_key: &str) -> Result<PlayerResponse> {
        let url = Url::parse_with_params(PLAYER_URL, &[("key", api_key)])
            .map_err(|e| EchoError::Transcript(e.to_string()))?;

        let body = serde_json::json!({
            "context": {
                "client": {
                    "clientName": "ANDROID",
                    "clientVersion": "20.10.38"
                }
            },
            "videoId": video_id
        });

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| EchoError::Transcript(format!("Player request failed: {}", e)))?;

        check_status(&response, video_id)?;

        response
            .json::<PlayerResponse>()
            .await
            .map_err(|e| EchoError::Transcript(format!("Unreadable player response: {}", e)))
    }

    async fn fetch_track(&self, track: &CaptionTrack) -> Result<Vec<CaptionFragment>> {
        let url = json3_url(&track.base_url)?;
        let body = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| EchoError::Transcript(format!("Caption download failed: {}", e)))?
            .error_for_status()
            .map_err(|e| EchoError::Transcript(format!("Caption download failed: {}", e)))?
            .text()
            .await
            .map_err(|e| EchoError::Transcript(format!("Caption download failed: {}", e)))?;

        parse_json3(&body)
    }
}

#[async_trait]
impl CaptionProvider for YoutubeCaptionProvider {
    #[instrument(skip(self))]
    async fn fetch_captions(
        &self,
        video_id: &str,
        languages: &[String],
    ) -> Result<CaptionTrackData> {
        let html = self.fetch_watch_page(video_id).await?;
        let api_key = extract_api_key(&html, video_id)?;
        debug!("Found InnerTube key");

        let player = self.fetch_player(video_id, &api_key).await?;
        let tracks = caption_tracks(video_id, languages, player)?;
        debug!("{} caption tracks available", tracks.len());

        let track = select_track(&tracks, languages).ok_or_else(|| {
            EchoError::TranscriptNotFound {
                video_id: video_id.to_string(),
                languages: languages.to_vec(),
            }
        })?;
        debug!(
            "Using {} track ({})",
            track.language_code,
            if track.is_generated() { "generated" } else { "manual" }
        );

        let fragments = self.fetch_track(track).await?;

        Ok(CaptionTrackData {
            language: track.language_code.clone(),
            fragments,
        })
    }
}

fn check_status(response: &reqwest::Response, video_id: &str) -> Result<()> {
    let status = response.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(EchoError::VideoUnavailable(format!(
            "{}: YouTube is rate limiting requests from this IP",
            video_id
        )));
    }
    if !status.is_success() {
        return Err(EchoError::Transcript(format!(
            "{}: YouTube returned HTTP {}",
            video_id, status
        )));
    }
    Ok(())
}

fn extract_api_key(html: &str, video_id: &str) -> Result<String> {
    if html.contains("g-recaptcha") {
        return Err(EchoError::VideoUnavailable(format!(
            "{}: requests from this IP are blocked by YouTube",
            video_id
        )));
    }

    API_KEY_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            EchoError::Transcript(format!("{}: could not parse the watch page", video_id))
        })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    playability_status: Option<PlayabilityStatus>,
    captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    #[serde(default)]
    status: String,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Captions {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    renderer: TracklistRenderer,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracklistRenderer {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
    kind: Option<String>,
}

impl CaptionTrack {
    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

/// Validate playability and return the caption tracks of a player response.
fn caption_tracks(
    video_id: &str,
    languages: &[String],
    player: PlayerResponse,
) -> Result<Vec<CaptionTrack>> {
    if let Some(playability) = &player.playability_status {
        if playability.status != "OK" && !playability.status.is_empty() {
            let reason = playability
                .reason
                .clone()
                .unwrap_or_else(|| playability.status.to_lowercase());
            return Err(EchoError::VideoUnavailable(format!("{}: {}", video_id, reason)));
        }
    }

    let tracks = player
        .captions
        .map(|c| c.renderer.caption_tracks)
        .unwrap_or_default();

    if tracks.is_empty() {
        return Err(EchoError::TranscriptNotFound {
            video_id: video_id.to_string(),
            languages: languages.to_vec(),
        });
    }

    Ok(tracks)
}

/// Pick the first language with a track, preferring manual captions over generated ones.
fn select_track<'a>(tracks: &'a [CaptionTrack], languages: &[String]) -> Option<&'a CaptionTrack> {
    languages.iter().find_map(|lang| {
        let mut candidates = tracks.iter().filter(|t| &t.language_code == lang);
        let manual = candidates.clone().find(|t| !t.is_generated());
        manual.or_else(|| candidates.next())
    })
}

/// Rewrite a track URL to request the `json3` format.
fn json3_url(base_url: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)
        .map_err(|e| EchoError::Transcript(format!("Invalid caption URL: {}", e)))?;

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "fmt")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(pairs)
        .append_pair("fmt", "json3");

    Ok(url)
}

#[derive(Debug, Deserialize)]
struct Json3 {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    #[serde(default)]
    t_start_ms: u64,
    #[serde(default)]
    d_duration_ms: u64,
    segs: Option<Vec<Json3Segment>>,
}

#[derive(Debug, Deserialize)]
struct Json3Segment {
    #[serde(default)]
    utf8: String,
}

/// Parse a `json3` caption body into fragments, skipping empty cues.
fn parse_json3(body: &str) -> Result<Vec<CaptionFragment>> {
    let parsed: Json3 = serde_json::from_str(body)
        .map_err(|e| EchoError::Transcript(format!("Unreadable caption track: {}", e)))?;

    Ok(parsed
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event.segs?.into_iter().map(|s| s.utf8).collect();
            let text = text.replace('\n', " ");
            if text.trim().is_empty() {
                return None;
            }
            Some(CaptionFragment::new(
                text.trim(),
                event.t_start_ms as f64 / 1000.0,
                event.d_duration_ms as f64 / 1000.0,
            ))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn langs(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    fn track(code: &str, kind: Option<&str>) -> CaptionTrack {
        CaptionTrack {
            base_url: format!("https://www.youtube.com/api/timedtext?v=x&lang={}", code),
            language_code: code.to_string(),
            kind: kind.map(|k| k.to_string()),
        }
    }

    #[test]
    fn test_extract_api_key() {
        let html = r#"<script>ytcfg.set({"INNERTUBE_API_KEY": "AIzaSyA-test_key","X":1})</script>"#;
        assert_eq!(extract_api_key(html, "vid").unwrap(), "AIzaSyA-test_key");
    }

    #[test]
    fn test_extract_api_key_blocked() {
        let html = r#"<div class="g-recaptcha"></div>"#;
        assert!(matches!(
            extract_api_key(html, "vid"),
            Err(EchoError::VideoUnavailable(_))
        ));
        assert!(matches!(
            extract_api_key("<html></html>", "vid"),
            Err(EchoError::Transcript(_))
        ));
    }

    #[test]
    fn test_select_track_follows_preference() {
        let tracks = vec![track("en", None), track("tr", Some("asr"))];
        let chosen = select_track(&tracks, &langs(&["tr", "en"])).unwrap();
        assert_eq!(chosen.language_code, "tr");

        let chosen = select_track(&tracks, &langs(&["de", "en"])).unwrap();
        assert_eq!(chosen.language_code, "en");

        assert!(select_track(&tracks, &langs(&["de"])).is_none());
    }

    #[test]
    fn test_select_track_prefers_manual() {
        let tracks = vec![track("en", Some("asr")), track("en", None)];
        let chosen = select_track(&tracks, &langs(&["en"])).unwrap();
        assert!(!chosen.is_generated());
    }

    #[test]
    fn test_caption_tracks_from_player() {
        let player: PlayerResponse = serde_json::from_str(
            r#"{
                "playabilityStatus": {"status": "OK"},
                "captions": {"playerCaptionsTracklistRenderer": {"captionTracks": [
                    {"baseUrl": "https://www.youtube.com/api/timedtext?v=a&lang=en&fmt=srv3",
                     "languageCode": "en", "kind": "asr", "name": {"runs": [{"text": "English"}]}}
                ]}}
            }"#,
        )
        .unwrap();

        let tracks = caption_tracks("a", &langs(&["en"]), player).unwrap();
        assert_eq!(tracks.len(), 1);
        assert!(tracks[0].is_generated());
    }

    #[test]
    fn test_caption_tracks_private_video() {
        let player: PlayerResponse = serde_json::from_str(
            r#"{"playabilityStatus": {"status": "LOGIN_REQUIRED", "reason": "This video is private"}}"#,
        )
        .unwrap();

        let err = caption_tracks("a", &langs(&["en"]), player).unwrap_err();
        assert!(matches!(err, EchoError::VideoUnavailable(ref m) if m.contains("private")));
    }

    #[test]
    fn test_caption_tracks_disabled() {
        let player: PlayerResponse =
            serde_json::from_str(r#"{"playabilityStatus": {"status": "OK"}}"#).unwrap();
        let err = caption_tracks("a", &langs(&["tr", "en"]), player).unwrap_err();
        assert!(matches!(err, EchoError::TranscriptNotFound { .. }));
    }

    #[test]
    fn test_json3_url_replaces_format() {
        let url =
            json3_url("https://www.youtube.com/api/timedtext?v=a&lang=en&fmt=srv3").unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.youtube.com/api/timedtext?v=a&lang=en&fmt=json3"
        );
    }

    #[test]
    fn test_parse_json3() {
        let body = r#"{"events": [
            {"tStartMs": 0, "dDurationMs": 1500, "segs": [{"utf8": "Hello "}, {"utf8": "there"}]},
            {"tStartMs": 1500, "dDurationMs": 10, "segs": [{"utf8": "\n"}]},
            {"tStartMs": 1600},
            {"tStartMs": 2000, "dDurationMs": 1000, "segs": [{"utf8": "it's\nme"}]}
        ]}"#;

        let fragments = parse_json3(body).unwrap();
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0], CaptionFragment::new("Hello there", 0.0, 1.5));
        assert_eq!(fragments[1].text, "it's me");
        assert!((fragments[1].start_seconds - 2.0).abs() < f64::EPSILON);
    }
}
