//! CLI module for EchoVerse.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand, ValueEnum};

/// EchoVerse - talk to a YouTube video
///
/// Paste a YouTube link, and EchoVerse fetches its captions, indexes them and answers your
/// questions from what is actually said in the video.
#[derive(Parser, Debug)]
#[command(name = "echoverse")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive conversation about a video
    Chat {
        /// YouTube URL (can also be loaded later with `load <url>`)
        url: Option<String>,
    },

    /// Ask a single question about a video
    Ask {
        /// YouTube URL
        url: String,

        /// The question to ask
        question: String,
    },

    /// Show the transcript passages closest to a query
    Search {
        /// YouTube URL
        url: String,

        /// Search query
        query: String,

        /// Number of passages to show
        #[arg(short = 'k', long, default_value = "3")]
        limit: usize,
    },

    /// Fetch and export a video's transcript
    Transcript {
        /// YouTube URL
        url: String,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = TranscriptFormat::Text)]
        format: TranscriptFormat,
    },

    /// Start HTTP API server for integration with other systems
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Minutes a session may stay idle before it is dropped
        #[arg(long, default_value = "60")]
        idle_minutes: u64,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Transcript export formats.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptFormat {
    /// Plain text
    Text,
    /// JSON with video id, title and language
    Json,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_defaults() {
        let cli = Cli::try_parse_from([
            "echoverse",
            "search",
            "https://youtu.be/dQw4w9WgXcQ",
            "chorus",
        ])
        .unwrap();
        match cli.command {
            Commands::Search { limit, query, .. } => {
                assert_eq!(limit, 3);
                assert_eq!(query, "chorus");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_transcript_format() {
        let cli = Cli::try_parse_from([
            "echoverse",
            "-vv",
            "transcript",
            "https://youtu.be/dQw4w9WgXcQ",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Commands::Transcript {
                format: TranscriptFormat::Json,
                output: None,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_serve_idle_timeout() {
        let cli = Cli::try_parse_from(["echoverse", "serve", "--idle-minutes", "5"]).unwrap();
        match cli.command {
            Commands::Serve {
                port, idle_minutes, ..
            } => {
                assert_eq!(port, 3000);
                assert_eq!(idle_minutes, 5);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_chat_url_is_optional() {
        let cli = Cli::try_parse_from(["echoverse", "chat"]).unwrap();
        assert!(matches!(cli.command, Commands::Chat { url: None }));
    }
}
