//! Configuration handling for kbpush.json

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{DEFAULT_CHUNK_SIZE, DEFAULT_MODEL, DEFAULT_ROOT_DIR, KbError, Result};

/// Ingestion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory to walk
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,

    /// Chunk size in lines
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Embedding model name (fastembed model ID)
    #[serde(default = "default_model")]
    pub model: String,

    /// Where fastembed keeps downloaded model files
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Remote index settings
    #[serde(default)]
    pub pinecone: PineconeConfig,
}

/// Connection settings for a Pinecone index.
///
/// Every field is optional here; [`crate::PineconeIndex::connect`] decides
/// which ones it actually needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PineconeConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    /// Accepted for older `.env` files; host lookup ignores it
    #[serde(default)]
    pub environment: Option<String>,

    /// Index name
    #[serde(default)]
    pub index: Option<String>,

    /// Data-plane host; skips host lookup when set
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub namespace: Option<String>,
}

fn default_root_dir() -> PathBuf {
    PathBuf::from(DEFAULT_ROOT_DIR)
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            chunk_size: default_chunk_size(),
            model: default_model(),
            cache_dir: None,
            pinecone: PineconeConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a JSON file, falling back to defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Check values that would make the pipeline misbehave.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(KbError::Config("chunk_size must be at least 1".to_string()));
        }
        if self.model.trim().is_empty() {
            return Err(KbError::Config("model must not be empty".to_string()));
        }
        Ok(())
    }
}
