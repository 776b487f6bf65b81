//! Ingestion: walk files, chunk, embed, upsert

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::{
    Chunk, ChunkMetadata, ChunkedFile, Config, IndexRecord, KbError, Result, TextEmbedder,
    VectorIndex, walk,
};

/// Progress events emitted during ingestion.
#[derive(Debug)]
pub enum ProgressEvent<'a> {
    /// Starting on a file.
    File { path: &'a str },
    /// A chunk was stored.
    Uploaded {
        id: &'a str,
        file: &'a str,
        start_line: usize,
        end_line: usize,
    },
    /// A chunk could not be embedded or stored; ingestion carries on.
    Failed {
        file: &'a str,
        start_line: usize,
        end_line: usize,
        error: &'a KbError,
    },
}

/// Type alias for progress callback.
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send>;

/// Stats from an ingestion run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestStats {
    pub files: usize,
    pub chunks: usize,
    pub blank_chunks: usize,
    pub uploaded: usize,
    pub failed: usize,
}

/// The ingester drives the walker, chunker, embedder and index.
pub struct Ingester<E, I> {
    root: PathBuf,
    chunk_size: usize,
    embedder: E,
    index: I,
    progress_callback: Option<ProgressCallback>,
}

impl<E: TextEmbedder, I: VectorIndex> Ingester<E, I> {
    /// Create a new ingester for `config.root_dir`.
    pub fn new(config: &Config, embedder: E, index: I) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            root: config.root_dir.clone(),
            chunk_size: config.chunk_size,
            embedder,
            index,
            progress_callback: None,
        })
    }

    /// Set a callback to receive progress updates during ingestion.
    pub fn set_progress_callback(&mut self, callback: ProgressCallback) {
        self.progress_callback = Some(callback);
    }

    /// Emit a progress event if a callback is registered.
    fn emit_progress(&self, event: ProgressEvent) {
        if let Some(ref callback) = self.progress_callback {
            callback(event);
        }
    }

    /// Ingest every file under the root.
    ///
    /// Per-chunk failures are reported and skipped; anything else (missing
    /// root, unreadable file) aborts the run.
    pub fn run(&self) -> Result<IngestStats> {
        let mut stats = IngestStats::default();

        for path in walk::walk_files(&self.root)? {
            self.ingest_file(&path, &mut stats)?;
        }

        Ok(stats)
    }

    /// Ingest a single file.
    pub fn ingest_file(&self, path: &Path, stats: &mut IngestStats) -> Result<()> {
        let rel_path = walk::relative_path(&self.root, path);
        self.emit_progress(ProgressEvent::File { path: &rel_path });
        stats.files += 1;

        let file = ChunkedFile::open(path, self.chunk_size)?;
        tracing::debug!("{}: {} lines", rel_path, file.line_count());

        for chunk in file.chunks() {
            stats.chunks += 1;

            if chunk.is_blank() {
                stats.blank_chunks += 1;
                continue;
            }

            match self.upload_chunk(&rel_path, &chunk) {
                Ok(id) => {
                    stats.uploaded += 1;
                    self.emit_progress(ProgressEvent::Uploaded {
                        id: &id,
                        file: &rel_path,
                        start_line: chunk.start_line,
                        end_line: chunk.end_line,
                    });
                }
                Err(e) => {
                    stats.failed += 1;
                    tracing::debug!(
                        "Failed chunk {} of {} ({}-{}): {}",
                        chunk.index,
                        rel_path,
                        chunk.start_line,
                        chunk.end_line,
                        e
                    );
                    self.emit_progress(ProgressEvent::Failed {
                        file: &rel_path,
                        start_line: chunk.start_line,
                        end_line: chunk.end_line,
                        error: &e,
                    });
                }
            }
        }

        Ok(())
    }

    /// Embed one chunk and upsert it under a fresh id.
    fn upload_chunk(&self, rel_path: &str, chunk: &Chunk) -> Result<String> {
        let values = self.embedder.embed(&chunk.text)?;

        let expected = self.embedder.dimension();
        if values.len() != expected {
            return Err(KbError::DimensionMismatch {
                expected,
                actual: values.len(),
            });
        }

        let record = IndexRecord {
            id: Uuid::new_v4().to_string(),
            values,
            metadata: ChunkMetadata {
                file: rel_path.to_string(),
                start_line: chunk.start_line,
                end_line: chunk.end_line,
                code: chunk.text.clone(),
            },
        };

        self.index.upsert(&record)?;
        tracing::debug!(
            "Upserted {} from {} (chunk {})",
            record.id,
            rel_path,
            chunk.index
        );

        Ok(record.id)
    }
}
