//! Read-optimized chunk projection used inside vector indexes

use crate::document::{Chunk, ChunkId, DocumentId};
use crate::embedding::Embedding;
use crate::error::Result;
use crate::metadata::{ChunkFilter, ChunkMetadata};
use serde::Serialize;

/// A denormalized copy of a chunk plus its owning document's id.
///
/// Not a source of truth: documents are. An `IndexedChunk` goes stale the
/// moment its source chunk changes, which is why libraries invalidate their
/// index instead of keeping it incrementally in sync.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexedChunk {
    pub chunk_id: ChunkId,
    pub document_id: DocumentId,
    pub text: String,
    pub embedding: Embedding,
    pub metadata: ChunkMetadata,
}

impl IndexedChunk {
    /// Project a document-owned chunk into its index representation.
    pub fn from_chunk(chunk: &Chunk, document_id: DocumentId) -> Self {
        Self {
            chunk_id: chunk.id,
            document_id,
            text: chunk.text.clone(),
            embedding: chunk.embedding.clone(),
            metadata: chunk.metadata.clone(),
        }
    }

    /// Cosine similarity between this chunk's embedding and a query.
    pub fn similarity(&self, query: &Embedding) -> Result<f32> {
        self.embedding.cosine_similarity(query)
    }

    /// Euclidean distance between this chunk's embedding and a query.
    pub fn distance(&self, query: &Embedding) -> Result<f32> {
        self.embedding.euclidean_distance(query)
    }

    pub fn matches_filter(&self, filter: &ChunkFilter) -> bool {
        self.metadata.matches_filter(filter)
    }

    pub fn dimension(&self) -> usize {
        self.embedding.dimension()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_projection_copies_chunk_fields() {
        let chunk = Chunk::new(
            "hello",
            Embedding::from_values(vec![1.0, 0.0]).unwrap(),
            ChunkMetadata::new("a.pdf", Some(2)),
        )
        .unwrap();
        let doc_id = DocumentId::generate();

        let indexed = IndexedChunk::from_chunk(&chunk, doc_id);
        assert_eq!(indexed.chunk_id, chunk.id);
        assert_eq!(indexed.document_id, doc_id);
        assert_eq!(indexed.text, "hello");
        assert_eq!(indexed.dimension(), 2);
        assert_eq!(indexed.metadata.source, "a.pdf");
    }

    #[test]
    fn test_similarity_and_distance() {
        let chunk = Chunk::new(
            "hello",
            Embedding::from_values(vec![1.0, 0.0]).unwrap(),
            ChunkMetadata::new("a.pdf", None),
        )
        .unwrap();
        let indexed = IndexedChunk::from_chunk(&chunk, DocumentId::generate());

        let query = Embedding::from_values(vec![1.0, 0.0]).unwrap();
        assert_relative_eq!(indexed.similarity(&query).unwrap(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(indexed.distance(&query).unwrap(), 0.0, epsilon = 1e-6);
    }
}
