//! Interactive chat command.

use super::load_video;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::session::Session;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// A line typed at the chat prompt.
#[derive(Debug, PartialEq)]
enum ChatInput<'a> {
    Empty,
    Exit,
    Help,
    Reset,
    History,
    Load(&'a str),
    Question(&'a str),
}

fn parse_input(line: &str) -> ChatInput<'_> {
    let line = line.trim();
    if line.is_empty() {
        return ChatInput::Empty;
    }

    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command.to_ascii_lowercase().as_str() {
        "exit" | "quit" if rest.is_empty() => ChatInput::Exit,
        "help" if rest.is_empty() => ChatInput::Help,
        "reset" if rest.is_empty() => ChatInput::Reset,
        "history" if rest.is_empty() => ChatInput::History,
        "load" if !rest.is_empty() => ChatInput::Load(rest),
        _ => ChatInput::Question(line),
    }
}

/// Run the interactive chat command.
pub async fn run_chat(url: Option<String>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'echoverse doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;
    let mut session = Session::new();

    println!("\n{}", style("EchoVerse Chat").bold().cyan());
    println!(
        "{}\n",
        style("Ask anything about the video. Type 'help' for commands, 'exit' to quit.").dim()
    );

    if let Some(url) = url {
        if let Ok(video) = load_video(&orchestrator, &url).await {
            session.replace(video);
        }
    } else {
        Output::info("Load a video with: load <youtube url>");
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match parse_input(&line) {
            ChatInput::Empty => continue,
            ChatInput::Exit => {
                Output::info("Goodbye!");
                break;
            }
            ChatInput::Help => print_help(),
            ChatInput::Reset => {
                session.reset();
                Output::info("Session cleared. Load a new video with: load <youtube url>");
            }
            ChatInput::History => print_history(&session),
            ChatInput::Load(url) => {
                // A failed load keeps the current video.
                if let Ok(video) = load_video(&orchestrator, url).await {
                    session.replace(video);
                }
            }
            ChatInput::Question(question) => {
                if !session.is_ready() {
                    Output::warning("No video loaded yet. Use: load <youtube url>");
                    continue;
                }

                let spinner = Output::spinner("Thinking...");
                let result = orchestrator.ask(&mut session, question).await;
                spinner.finish_and_clear();

                match result {
                    Ok(turn) => {
                        Output::answer(&turn.answer);
                        if let Some(sources) = &turn.sources {
                            Output::sources(sources);
                        }
                    }
                    Err(e) => Output::error(&format!("Error: {}", e)),
                }
            }
        }
    }

    Ok(())
}

fn print_help() {
    Output::header("Commands");
    Output::kv("load <url>", "switch to another video (clears the conversation)");
    Output::kv("reset", "forget the video and the conversation");
    Output::kv("history", "show earlier questions, answers and sources");
    Output::kv("exit", "leave the chat");
    println!();
}

fn print_history(session: &Session) {
    let Some(title) = session.title() else {
        Output::warning("No video loaded.");
        return;
    };

    Output::header(title);
    if session.turns().is_empty() {
        Output::info("No questions asked yet.");
        return;
    }

    for turn in session.turns() {
        println!(
            "\n{} {} {}",
            style(turn.asked_at.format("%H:%M:%S")).dim(),
            style("You:").green().bold(),
            turn.question
        );
        Output::answer(&turn.answer);
        if let Some(sources) = &turn.sources {
            Output::sources(sources);
        }
    }
}
