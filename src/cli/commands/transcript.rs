//! Transcript export command.

use crate::cli::preflight::{self, Operation};
use crate::cli::{Output, TranscriptFormat};
use crate::config::Settings;
use crate::transcript::{Transcript, TranscriptService};
use crate::video_source::VideoReference;
use anyhow::Result;

/// Run the transcript command.
pub async fn run_transcript(
    url: &str,
    output: Option<String>,
    format: TranscriptFormat,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Transcript, &settings) {
        Output::error(&e.to_string());
        return Err(e.into());
    }

    let reference = VideoReference::parse(url)?;
    let service = TranscriptService::from_settings(&settings.transcript)?;

    let spinner = Output::spinner("Fetching transcript...");
    let transcript = service.acquire(&reference).await;
    spinner.finish_and_clear();

    let transcript = match transcript {
        Ok(t) => t,
        Err(e) => {
            Output::error(&format!("Could not fetch transcript: {}", e));
            return Err(e.into());
        }
    };

    let rendered = render(&transcript, format)?;

    match output {
        Some(path) => {
            let path = Settings::expand_path(&path);
            std::fs::write(&path, rendered)?;
            Output::success(&format!(
                "Exported \"{}\" ({} characters) to {}",
                transcript.title,
                transcript.char_count(),
                path.display()
            ));
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

fn render(transcript: &Transcript, format: TranscriptFormat) -> Result<String> {
    Ok(match format {
        TranscriptFormat::Text => transcript.full_text.clone(),
        TranscriptFormat::Json => serde_json::to_string_pretty(transcript)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Transcript {
        Transcript {
            video_id: "dQw4w9WgXcQ".to_string(),
            title: "Talk".to_string(),
            full_text: "hello there".to_string(),
            language: "en".to_string(),
        }
    }

    #[test]
    fn test_render_text() {
        assert_eq!(render(&sample(), TranscriptFormat::Text).unwrap(), "hello there");
    }

    #[test]
    fn test_render_json() {
        let json: serde_json::Value =
            serde_json::from_str(&render(&sample(), TranscriptFormat::Json).unwrap()).unwrap();
        assert_eq!(json["video_id"], "dQw4w9WgXcQ");
        assert_eq!(json["language"], "en");
        assert_eq!(json["full_text"], "hello there");
    }
}
