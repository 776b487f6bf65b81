//! Embedding generation using fastembed

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use crate::{Config, KbError, Result};

/// Anything that can turn a chunk of text into a fixed-size vector.
pub trait TextEmbedder {
    /// Length of every vector returned by [`TextEmbedder::embed`].
    fn dimension(&self) -> usize;

    /// Embed a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

impl<T: TextEmbedder + ?Sized> TextEmbedder for &T {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        (**self).embed(text)
    }
}

/// Map a model name to its fastembed model and output dimension.
pub fn resolve_model(name: &str) -> Result<(EmbeddingModel, usize)> {
    let resolved = match name {
        // General-purpose models
        "all-MiniLM-L6-v2" => (EmbeddingModel::AllMiniLML6V2, 384),
        "all-MiniLM-L12-v2" => (EmbeddingModel::AllMiniLML12V2, 384),
        "bge-small-en-v1.5" => (EmbeddingModel::BGESmallENV15, 384),
        "bge-base-en-v1.5" => (EmbeddingModel::BGEBaseENV15, 768),
        // Code-optimized model
        "jina-embeddings-v2-base-code" => (EmbeddingModel::JinaEmbeddingsV2BaseCode, 768),
        other => {
            return Err(KbError::Embedding(format!(
                "Unknown model: {}. Supported: all-MiniLM-L6-v2, all-MiniLM-L12-v2, bge-small-en-v1.5, bge-base-en-v1.5, jina-embeddings-v2-base-code",
                other
            )));
        }
    };
    Ok(resolved)
}

/// Wrapper around fastembed for generating embeddings.
pub struct Embedder {
    model: TextEmbedding,
    dimension: usize,
}

impl Embedder {
    /// Create a new embedder with the model specified in config.
    pub fn new(config: &Config) -> Result<Self> {
        let (model_type, dimension) = resolve_model(&config.model)?;

        let mut options = InitOptions::new(model_type).with_show_download_progress(true);
        if let Some(cache_dir) = &config.cache_dir {
            options = options.with_cache_dir(cache_dir.clone());
        }

        let model =
            TextEmbedding::try_new(options).map_err(|e| KbError::Embedding(e.to_string()))?;

        tracing::info!("Loaded embedding model {} ({} dims)", config.model, dimension);

        Ok(Self { model, dimension })
    }

    /// Generate embeddings for a batch of texts.
    pub fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self
            .model
            .embed(texts.to_vec(), None)
            .map_err(|e| KbError::Embedding(e.to_string()))?;

        Ok(embeddings)
    }
}

impl TextEmbedder for Embedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text])?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| KbError::Embedding("No embedding generated".to_string()))
    }
}
