//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod doctor;
mod search;
mod serve;
mod transcript;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use doctor::run_doctor;
pub use search::run_search;
pub use serve::run_serve;
pub use transcript::run_transcript;

use crate::cli::Output;
use crate::error::Result;
use crate::orchestrator::{Orchestrator, ProcessEvent};
use crate::session::LoadedVideo;

/// Process a video behind a spinner, printing each milestone as it completes.
async fn load_video(orchestrator: &Orchestrator, url: &str) -> Result<LoadedVideo> {
    let spinner = Output::spinner("Looking for the video...");
    let progress = spinner.clone();

    let result = orchestrator
        .process_video_with_progress(url, move |event| match event {
            ProcessEvent::VideoIdFound(id) => {
                progress.println(format!("  Video ID: {}", id));
                progress.set_message("Fetching transcript...");
            }
            ProcessEvent::TranscriptFetched { title, characters } => {
                progress.println(format!("  Title: {}", title));
                progress.println(format!("  Transcript: {} characters", characters));
                progress.set_message("Indexing transcript...");
            }
            ProcessEvent::Chunked(count) => {
                progress.println(format!("  Split into {} chunks", count));
                progress.set_message("Generating embeddings...");
            }
            ProcessEvent::Ready => {}
        })
        .await;

    spinner.finish_and_clear();

    match &result {
        Ok(video) => Output::success(&format!("Ready: {}", video.transcript.title)),
        Err(e) => Output::error(&format!("Could not load video: {}", e)),
    }

    result
}
