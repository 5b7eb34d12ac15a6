//! Ask command implementation.

use super::load_video;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::session::Session;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(url: &str, question: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'echoverse doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;

    let mut session = Session::new();
    session.replace(load_video(&orchestrator, url).await?);

    let spinner = Output::spinner("Thinking...");

    match orchestrator.ask(&mut session, question).await {
        Ok(turn) => {
            spinner.finish_and_clear();
            Output::answer(&turn.answer);
            if let Some(sources) = &turn.sources {
                Output::sources(sources);
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
