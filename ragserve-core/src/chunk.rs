//! Fixed-size text chunking with overlap.

use crate::document::{Chunk, Document};

/// Splits document text into fixed-size chunks measured in characters.
///
/// Consecutive chunks overlap by `overlap` characters so that sentences
/// cut at a boundary still appear whole in one chunk. Chunk ids are
/// `{document_id}_{index}`; each chunk inherits the document metadata plus
/// a `chunk_index` entry. Splitting is char-boundary safe for multibyte
/// text.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    overlap: usize,
}

impl TextSplitter {
    /// Create a splitter. `overlap` must be less than `chunk_size`
    /// (enforced by configuration validation upstream).
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self { chunk_size, overlap }
    }

    /// Split a document into chunks with empty embedding vectors.
    ///
    /// Returns an empty `Vec` for empty text.
    pub fn split(&self, document: &Document) -> Vec<Chunk> {
        if document.text.is_empty() {
            return Vec::new();
        }

        // Byte offset of every char boundary, plus the end of the string.
        let bounds: Vec<usize> = document
            .text
            .char_indices()
            .map(|(offset, _)| offset)
            .chain(std::iter::once(document.text.len()))
            .collect();
        let char_count = bounds.len() - 1;
        let step = self.chunk_size.saturating_sub(self.overlap).max(1);

        let mut chunks = Vec::new();
        let mut start = 0;
        let mut index = 0;
        loop {
            let end = (start + self.chunk_size).min(char_count);
            let text = document.text[bounds[start]..bounds[end]].to_string();

            let mut metadata = document.metadata.clone();
            metadata.insert("chunk_index".to_string(), index.to_string());

            chunks.push(Chunk {
                id: format!("{}_{index}", document.id),
                text,
                embedding: Vec::new(),
                metadata,
                document_id: document.id.clone(),
            });

            if end == char_count {
                break;
            }
            start += step;
            index += 1;
        }
        chunks
    }
}

impl Default for TextSplitter {
    /// 512-character chunks with 100 characters of overlap.
    fn default() -> Self {
        Self::new(512, 100)
    }
}
