//! Line-based chunking of text files
//!
//! Files are read best-effort (undecodable bytes are dropped) and split
//! into non-overlapping runs of `chunk_size` lines.

use std::path::Path;

use crate::{KbError, Result};

/// A chunk of text with its line range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// The text content, line terminators included
    pub text: String,
    /// Starting line number (1-indexed)
    pub start_line: usize,
    /// Ending line number (1-indexed, inclusive)
    pub end_line: usize,
    /// Chunk index within the file
    pub index: usize,
}

impl Chunk {
    /// True when the chunk holds nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A file's lines, ready to be cut into chunks.
#[derive(Debug, Clone)]
pub struct ChunkedFile {
    lines: Vec<String>,
    chunk_size: usize,
}

impl ChunkedFile {
    /// Read a file from disk.
    pub fn open(path: &Path, chunk_size: usize) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_text(&decode_lossy(&bytes), chunk_size)
    }

    /// Build from text already in memory.
    pub fn from_text(text: &str, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(KbError::Config("chunk_size must be at least 1".to_string()));
        }

        Ok(Self {
            lines: split_lines(text),
            chunk_size,
        })
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Iterate over the chunks from the first line. Each call starts over.
    pub fn chunks(&self) -> Chunks<'_> {
        Chunks {
            lines: &self.lines,
            chunk_size: self.chunk_size,
            next_line: 0,
        }
    }
}

/// Lazy iterator over the chunks of a [`ChunkedFile`].
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    lines: &'a [String],
    chunk_size: usize,
    next_line: usize,
}

impl Iterator for Chunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.next_line >= self.lines.len() {
            return None;
        }

        let start = self.next_line;
        let end = (start + self.chunk_size).min(self.lines.len());
        self.next_line = end;

        Some(Chunk {
            text: self.lines[start..end].concat(),
            start_line: start + 1,
            end_line: end,
            index: start / self.chunk_size,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.lines.len() - self.next_line).div_ceil(self.chunk_size);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Chunks<'_> {}

/// Decode UTF-8, silently dropping invalid byte sequences.
pub fn decode_lossy(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

/// Split into lines, keeping terminators. `\r\n` and lone `\r` become `\n`.
fn split_lines(text: &str) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    normalized
        .split_inclusive('\n')
        .map(str::to_string)
        .collect()
}
