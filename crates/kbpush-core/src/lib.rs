//! kbpush-core: knowledge-base ingestion library
//!
//! This library walks a directory tree, splits files into fixed-size line
//! chunks, embeds each chunk with fastembed and upserts the vectors into a
//! Pinecone index.

pub mod chunk;
pub mod config;
pub mod consts;
pub mod embed;
pub mod ingest;
pub mod pinecone;
pub mod storage;
pub mod walk;

pub use chunk::{Chunk, ChunkedFile};
pub use config::{Config, PineconeConfig};
pub use consts::*;
pub use embed::{Embedder, TextEmbedder};
pub use ingest::{IngestStats, Ingester};
pub use pinecone::PineconeIndex;
pub use storage::{ChunkMetadata, DryRunIndex, IndexRecord, VectorIndex};

#[derive(Debug, thiserror::Error)]
pub enum KbError {
    #[error("Root directory not found: {0}")]
    RootNotFound(std::path::PathBuf),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Embedding has {actual} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Index error: {0}")]
    Index(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, KbError>;
