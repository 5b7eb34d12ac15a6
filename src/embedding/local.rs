//! In-process sentence embeddings with all-MiniLM-L6-v2.
//!
//! The ONNX model is loaded once per process on first use and shared by every
//! [`LocalEmbedder`]. It is never reloaded; settings passed to later embedders do not
//! affect an already loaded model.
//!
//! With the `cuda` feature the model is placed on the CUDA execution provider when the
//! ONNX runtime supports it. ONNX Runtime falls back to the CPU if registration fails.
//! Vectors are the same on either device, so indexes do not depend on it.

use super::Embedder;
use crate::config::EmbeddingDevice;
use crate::error::{EchoError, Result};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, ExecutionProviderDispatch, InitOptions, TextEmbedding};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, instrument};

/// Output size of all-MiniLM-L6-v2.
pub const MINILM_DIMENSIONS: usize = 384;

// `TextEmbedding::embed` takes `&mut self`.
static MODEL: OnceCell<Mutex<TextEmbedding>> = OnceCell::new();

/// Execution provider the local model is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionTarget {
    Cpu,
    Cuda,
}

impl std::fmt::Display for ExecutionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionTarget::Cpu => write!(f, "CPU"),
            ExecutionTarget::Cuda => write!(f, "CUDA"),
        }
    }
}

/// Pick the execution provider for `device`.
pub fn select_target(device: EmbeddingDevice) -> ExecutionTarget {
    match device {
        EmbeddingDevice::Cpu => ExecutionTarget::Cpu,
        EmbeddingDevice::Auto if cuda_available() => ExecutionTarget::Cuda,
        EmbeddingDevice::Auto => ExecutionTarget::Cpu,
    }
}

#[cfg(feature = "cuda")]
fn cuda_available() -> bool {
    use ort::execution_providers::{ExecutionProvider, CUDA};

    match CUDA::default().is_available() {
        Ok(available) => available,
        Err(e) => {
            tracing::warn!("Could not query CUDA support: {}", e);
            false
        }
    }
}

#[cfg(not(feature = "cuda"))]
fn cuda_available() -> bool {
    false
}

/// Providers handed to ONNX Runtime. An empty list means the default CPU provider.
fn execution_providers(target: ExecutionTarget) -> Vec<ExecutionProviderDispatch> {
    match target {
        ExecutionTarget::Cpu => Vec::new(),
        #[cfg(feature = "cuda")]
        ExecutionTarget::Cuda => vec![ort::execution_providers::CUDA::default().build()],
        #[cfg(not(feature = "cuda"))]
        ExecutionTarget::Cuda => Vec::new(),
    }
}

fn load_model(
    cache_dir: &Path,
    show_download_progress: bool,
    device: EmbeddingDevice,
) -> Result<&'static Mutex<TextEmbedding>> {
    MODEL.get_or_try_init(|| -> Result<Mutex<TextEmbedding>> {
        let target = select_target(device);
        info!(
            "Loading all-MiniLM-L6-v2 on {} (cache: {})",
            target,
            cache_dir.display()
        );
        std::fs::create_dir_all(cache_dir)?;

        let options = InitOptions::new(EmbeddingModel::AllMiniLML6V2)
            .with_cache_dir(cache_dir.to_path_buf())
            .with_show_download_progress(show_download_progress)
            .with_execution_providers(execution_providers(target));

        let model = TextEmbedding::try_new(options)
            .map_err(|e| EchoError::Embedding(format!("Failed to load embedding model: {}", e)))?;

        info!("Embedding model ready");
        Ok(Mutex::new(model))
    })
}

/// Embedder backed by the process-wide MiniLM model.
pub struct LocalEmbedder {
    cache_dir: PathBuf,
    show_download_progress: bool,
    device: EmbeddingDevice,
}

impl LocalEmbedder {
    pub fn new(cache_dir: PathBuf, show_download_progress: bool, device: EmbeddingDevice) -> Self {
        Self {
            cache_dir,
            show_download_progress,
            device,
        }
    }
}

#[async_trait]
impl Embedder for LocalEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EchoError::Embedding("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let texts = texts.to_vec();
        let cache_dir = self.cache_dir.clone();
        let show_download_progress = self.show_download_progress;
        let device = self.device;

        let embeddings = tokio::task::spawn_blocking(move || -> Result<Vec<Vec<f32>>> {
            let model = load_model(&cache_dir, show_download_progress, device)?;
            let mut model = model
                .lock()
                .map_err(|_| EchoError::Embedding("Embedding model lock poisoned".to_string()))?;
            model
                .embed(texts, None)
                .map_err(|e| EchoError::Embedding(e.to_string()))
        })
        .await
        .map_err(|e| EchoError::Embedding(format!("Embedding task failed: {}", e)))??;

        debug!("Generated {} local embeddings", embeddings.len());
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        MINILM_DIMENSIONS
    }
}
