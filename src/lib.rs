//! EchoVerse - conversational Q&A over a YouTube video.
//!
//! Paste a video link and ask questions about what is said in it. Answers are grounded in
//! the video's own captions.
//!
//! # Overview
//!
//! For each video EchoVerse:
//! - extracts the video identifier from the URL
//! - fetches the caption track (preferred languages first) and the title
//! - splits the transcript into overlapping chunks
//! - embeds the chunks into an in-memory similarity index
//! - answers questions from the closest chunks, with the excerpts as sources
//!
//! # Architecture
//!
//! - `config` - Configuration and prompt templates
//! - `video_source` - Video identifier extraction
//! - `transcript` - Caption and title acquisition
//! - `chunking` - Overlapping window splitting
//! - `embedding` - Embedding generation (local MiniLM or remote)
//! - `vector_store` - In-memory similarity index
//! - `rag` - Retrieval and answer generation
//! - `session` - Per-user conversation state
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use echoverse::config::Settings;
//! use echoverse::orchestrator::Orchestrator;
//! use echoverse::session::Session;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let orchestrator = Orchestrator::new(Settings::load()?)?;
//!     let mut session = Session::new();
//!
//!     orchestrator
//!         .load_into(&mut session, "https://www.youtube.com/watch?v=dQw4w9WgXcQ")
//!         .await?;
//!     let turn = orchestrator.ask(&mut session, "What is this video about?").await?;
//!     println!("{}", turn.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod session;
pub mod transcript;
pub mod vector_store;
pub mod video_source;

#[cfg(test)]
mod testing;

pub use error::{EchoError, ErrorKind, Result};
