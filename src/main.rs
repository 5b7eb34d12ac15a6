//! EchoVerse CLI entry point.

use anyhow::Result;
use clap::Parser;
use echoverse::cli::{commands, Cli, Commands};
use echoverse::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = match &cli.config {
        Some(path) => Settings::expand_path(path),
        None => Settings::default_config_path(),
    };
    let settings = Settings::load_from(Some(&config_path))?;

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("echoverse={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    std::fs::create_dir_all(settings.data_dir())?;

    // Execute command
    match cli.command {
        Commands::Chat { url } => {
            commands::run_chat(url, settings).await?;
        }

        Commands::Ask { url, question } => {
            commands::run_ask(&url, &question, settings).await?;
        }

        Commands::Search { url, query, limit } => {
            commands::run_search(&url, &query, limit, settings).await?;
        }

        Commands::Transcript {
            url,
            output,
            format,
        } => {
            commands::run_transcript(&url, output, format, settings).await?;
        }

        Commands::Serve {
            host,
            port,
            idle_minutes,
        } => {
            commands::run_serve(&host, port, idle_minutes, settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings, &config_path)?;
        }

        Commands::Config { action } => {
            commands::run_config(&action, settings, &config_path)?;
        }
    }

    Ok(())
}
