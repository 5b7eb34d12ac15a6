//! Doctor command - verify configuration and local resources.

use crate::cli::Output;
use crate::config::{EmbeddingProvider, Settings};
use console::style;
use std::path::{Path, PathBuf};

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("EchoVerse Doctor");
    println!();
    println!("Checking configuration and local resources...\n");

    let mut checks = Vec::new();

    println!("{}", style("Language Model").bold());
    let llm_checks = vec![
        check_api_key(settings),
        CheckResult::ok("Endpoint", &settings.llm.api_base),
        CheckResult::ok(
            "Model",
            &format!("{} (temperature {})", settings.llm.model, settings.llm.temperature),
        ),
    ];
    for check in &llm_checks {
        check.print();
    }
    checks.extend(llm_checks);

    println!();

    println!("{}", style("Embeddings").bold());
    let mut embedding_checks = vec![check_embeddings(settings)];
    if settings.embedding.provider == EmbeddingProvider::Local {
        embedding_checks.push(check_device(settings));
    }
    for check in &embedding_checks {
        check.print();
    }
    checks.extend(embedding_checks);

    println!();

    println!("{}", style("Directories").bold());
    let dir_check = check_data_dir(settings);
    dir_check.print();
    checks.push(dir_check);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file(config_path);
    config_check.print();
    checks.push(config_check);
    Output::kv(
        "Caption languages",
        &settings.transcript.languages.join(", "),
    );
    Output::kv(
        "Chunking",
        &format!(
            "{} chars, {} overlap",
            settings.chunking.chunk_size, settings.chunking.chunk_overlap
        ),
    );

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using EchoVerse.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! EchoVerse is ready to use.");
    }

    Ok(())
}

/// Check the LLM API key without printing it.
fn check_api_key(settings: &Settings) -> CheckResult {
    let name = settings.llm.api_key_env.as_str();
    match settings.llm.api_key() {
        Ok(key) => CheckResult::ok(name, &format!("configured ({})", mask_key(&key))),
        Err(_) => CheckResult::error(
            name,
            "not set",
            &format!("Set with: export {}='...'", name),
        ),
    }
}

/// Keep only the edges of a secret.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Check that the embedding backend can run.
fn check_embeddings(settings: &Settings) -> CheckResult {
    let embedding = &settings.embedding;
    match embedding.provider {
        EmbeddingProvider::OpenAI => match embedding.api_key() {
            Ok(_) => CheckResult::ok(
                "Provider",
                &format!(
                    "remote {} at {} ({} dimensions)",
                    embedding.model, embedding.api_base, embedding.dimensions
                ),
            ),
            Err(_) => CheckResult::error(
                "Provider",
                &format!("remote embeddings need {}", embedding.api_key_env),
                &format!("Set with: export {}='...'", embedding.api_key_env),
            ),
        },
        EmbeddingProvider::Local if !cfg!(feature = "local-embeddings") => CheckResult::error(
            "Provider",
            "local model not compiled in",
            "Rebuild with --features local-embeddings or set embedding.provider = \"openai\"",
        ),
        EmbeddingProvider::Local => {
            let cache = settings.model_cache_dir();
            if cache.exists() {
                CheckResult::ok(
                    "Provider",
                    &format!(
                        "all-MiniLM-L6-v2, cached in {} ({})",
                        cache.display(),
                        format_size(dir_size(&cache))
                    ),
                )
            } else {
                CheckResult::warning(
                    "Provider",
                    "all-MiniLM-L6-v2 (not downloaded yet)",
                    "The model is downloaded on first use",
                )
            }
        }
    }
}

/// Report the execution provider the local model will use.
#[cfg(feature = "local-embeddings")]
fn check_device(settings: &Settings) -> CheckResult {
    use crate::config::EmbeddingDevice;
    use crate::embedding::{select_target, ExecutionTarget};

    let device = settings.embedding.device;
    let target = select_target(device);
    let message = format!("{} (embedding.device = {})", target, device);
    if target == ExecutionTarget::Cpu && device == EmbeddingDevice::Auto && cfg!(feature = "cuda")
    {
        CheckResult::warning(
            "Device",
            &message,
            "CUDA was not detected; the model runs on the CPU",
        )
    } else {
        CheckResult::ok("Device", &message)
    }
}

#[cfg(not(feature = "local-embeddings"))]
fn check_device(_settings: &Settings) -> CheckResult {
    CheckResult::ok("Device", "not used without the local model")
}

/// Check data directory.
fn check_data_dir(settings: &Settings) -> CheckResult {
    let data_dir = settings.data_dir();
    if data_dir.exists() {
        CheckResult::ok("Data directory", &format!("{}", data_dir.display()))
    } else {
        CheckResult::warning(
            "Data directory",
            &format!("{} (will be created)", data_dir.display()),
            "Directory will be created on first use",
        )
    }
}

/// Check if config file exists.
fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: echoverse config edit",
        )
    }
}

/// Total size of the files below `path`.
fn dir_size(path: &Path) -> u64 {
    let mut total = 0;
    let mut pending: Vec<PathBuf> = vec![path.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            match entry.metadata() {
                Ok(meta) if meta.is_dir() => pending.push(entry.path()),
                Ok(meta) => total += meta.len(),
                Err(_) => {}
            }
        }
    }

    total
}

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
