//! Index records and the write-side interface to a vector index

use serde::{Deserialize, Serialize};

use crate::Result;

/// Metadata stored with each vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// File path relative to the ingested root
    pub file: String,
    /// Starting line number
    pub start_line: usize,
    /// Ending line number
    pub end_line: usize,
    /// The chunk text
    pub code: String,
}

/// One vector plus its id and metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: ChunkMetadata,
}

/// A vector index that records can be written to.
pub trait VectorIndex {
    /// Insert or overwrite a single record, keyed by its id.
    fn upsert(&self, record: &IndexRecord) -> Result<()>;
}

impl<T: VectorIndex + ?Sized> VectorIndex for &T {
    fn upsert(&self, record: &IndexRecord) -> Result<()> {
        (**self).upsert(record)
    }
}

/// Index that accepts everything and stores nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunIndex;

impl VectorIndex for DryRunIndex {
    fn upsert(&self, record: &IndexRecord) -> Result<()> {
        tracing::debug!(
            "dry run: would upsert {} ({} dims) for {}:{}-{}",
            record.id,
            record.values.len(),
            record.metadata.file,
            record.metadata.start_line,
            record.metadata.end_line
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_field_names() {
        let metadata = ChunkMetadata {
            file: "docs/a.md".to_string(),
            start_line: 1,
            end_line: 200,
            code: "hello\n".to_string(),
        };

        let value = serde_json::to_value(&metadata).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "file": "docs/a.md",
                "start_line": 1,
                "end_line": 200,
                "code": "hello\n"
            })
        );
    }

    #[test]
    fn test_dry_run_accepts_records() {
        let record = IndexRecord {
            id: "id-1".to_string(),
            values: vec![0.0; 384],
            metadata: ChunkMetadata {
                file: "a.txt".to_string(),
                start_line: 1,
                end_line: 1,
                code: "a".to_string(),
            },
        };
        assert!(DryRunIndex.upsert(&record).is_ok());
        assert!((&DryRunIndex).upsert(&record).is_ok());
    }
}
