//! Search command implementation.

use super::load_video;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(url: &str, query: &str, limit: usize, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;
    let video = load_video(&orchestrator, url).await?;

    let spinner = Output::spinner("Searching...");
    let results = orchestrator.search(&video.index, query, limit).await;
    spinner.finish_and_clear();

    match results {
        Ok(chunks) => {
            Output::success(&format!("Found {} passages", chunks.len()));
            for chunk in &chunks {
                Output::search_result(chunk.chunk_order, chunk.score, &chunk.content);
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
