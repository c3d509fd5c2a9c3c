//! Embedding service.
//!
//! Turns names into fixed-length vectors for the vector index. The production
//! implementation runs a local fastembed model; everything else talks to the
//! `Embedder` trait.

use crate::error::{Result, SeekError};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::Mutex;

pub trait Embedder: Send + Sync {
    /// Embed a batch of texts. Output order matches input order.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Vector length produced by this model.
    fn dimension(&self) -> usize;

    fn model_name(&self) -> &str;

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| SeekError::Embedding("Model returned no vector".into()))
    }
}

/// Supported model names with their fastembed ids and dimensions.
const MODEL_NAMES: &[&str] = &[
    "bge-small-en-v1.5",
    "bge-base-en-v1.5",
    "all-minilm-l6-v2",
    "nomic-embed-text-v1.5",
];

fn resolve_model(name: &str) -> Option<(EmbeddingModel, usize)> {
    match name.to_ascii_lowercase().as_str() {
        "bge-small-en-v1.5" => Some((EmbeddingModel::BGESmallENV15, 384)),
        "bge-base-en-v1.5" => Some((EmbeddingModel::BGEBaseENV15, 768)),
        "all-minilm-l6-v2" => Some((EmbeddingModel::AllMiniLML6V2, 384)),
        "nomic-embed-text-v1.5" => Some((EmbeddingModel::NomicEmbedTextV15, 768)),
        _ => None,
    }
}

pub struct FastEmbedder {
    model: Mutex<TextEmbedding>,
    name: String,
    dimension: usize,
}

impl FastEmbedder {
    /// Load a model by name. Blocks while the model is downloaded/initialized.
    pub fn new(model_name: &str) -> Result<Self> {
        let (model_id, dimension) = resolve_model(model_name).ok_or_else(|| {
            SeekError::InvalidArgument(format!(
                "Unknown embedding model '{}' (known: {})",
                model_name,
                MODEL_NAMES.join(", ")
            ))
        })?;
        let name = model_name.to_ascii_lowercase();

        tracing::info!("[Embedder] Initializing embedding model {}...", name);
        let model = TextEmbedding::try_new(InitOptions::new(model_id))
            .map_err(|e| SeekError::Embedding(format!("Failed to load {}: {}", name, e)))?;
        tracing::info!("[Embedder] Embedding model loaded ({} dims)", dimension);

        Ok(Self {
            model: Mutex::new(model),
            name,
            dimension,
        })
    }
}

impl Embedder for FastEmbedder {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let mut model = self
            .model
            .lock()
            .map_err(|_| SeekError::State("Poisoned lock".into()))?;
        let vectors = model
            .embed(texts.to_vec(), None)
            .map_err(|e| SeekError::Embedding(format!("Failed to embed batch: {}", e)))?;
        if vectors.len() != texts.len() {
            return Err(SeekError::Embedding(format!(
                "Model returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            )));
        }
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}
