//! Chunk and Document aggregates

use crate::embedding::Embedding;
use crate::error::{ChunkDbError, Result};
use crate::metadata::{ChunkMetadata, ChunkMetadataUpdate, DocumentMetadata, DocumentMetadataUpdate};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkId(Uuid);

impl ChunkId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| ChunkDbError::invalid(format!("Invalid chunk id: {s}")))
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identity of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| ChunkDbError::invalid(format!("Invalid document id: {s}")))
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A piece of text with its embedding and metadata, owned by a [`Document`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
    pub embedding: Embedding,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Create a chunk with a fresh id. Fails on empty or blank text.
    pub fn new(text: impl Into<String>, embedding: Embedding, metadata: ChunkMetadata) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ChunkDbError::invalid("Chunk text cannot be empty"));
        }
        Ok(Self {
            id: ChunkId::generate(),
            text,
            embedding,
            metadata,
        })
    }

    /// Apply a partial update, refreshing `updated_at`.
    ///
    /// Validation mirrors the constructor: a blank replacement text fails
    /// and leaves the chunk untouched.
    pub fn update(&mut self, update: ChunkUpdate) -> Result<()> {
        if let Some(text) = &update.text {
            if text.trim().is_empty() {
                return Err(ChunkDbError::invalid("Chunk text cannot be empty"));
            }
        }
        // Validate before mutating anything so a failure leaves the chunk
        // in its pre-call state.
        let embedding = update.embedding.map(Embedding::from_values).transpose()?;

        if let Some(text) = update.text {
            self.text = text;
        }
        if let Some(embedding) = embedding {
            self.embedding = embedding;
        }
        self.metadata = match update.metadata {
            Some(meta) => self.metadata.updated(&meta),
            None => self.metadata.touched(),
        };
        Ok(())
    }
}

/// Partial update for a [`Chunk`]; unset fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkUpdate {
    pub text: Option<String>,
    pub embedding: Option<Vec<f32>>,
    pub metadata: Option<ChunkMetadataUpdate>,
}

/// Document aggregate root: an ordered collection of chunks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub chunks: Vec<Chunk>,
    pub metadata: DocumentMetadata,
}

impl Document {
    /// Create a document. Zero initial chunks is legal.
    pub fn new(chunks: Vec<Chunk>, metadata: DocumentMetadata) -> Result<Self> {
        let mut document = Self {
            id: DocumentId::generate(),
            chunks: Vec::with_capacity(chunks.len()),
            metadata,
        };
        for chunk in chunks {
            document.push_chunk(chunk)?;
        }
        Ok(document)
    }

    fn push_chunk(&mut self, chunk: Chunk) -> Result<()> {
        if self.contains_chunk(&chunk.id) {
            return Err(ChunkDbError::invalid(format!(
                "Chunk {} already exists in document",
                chunk.id
            )));
        }
        self.chunks.push(chunk);
        Ok(())
    }

    /// Append a chunk. Fails on a duplicate chunk id.
    pub fn add_chunk(&mut self, chunk: Chunk) -> Result<()> {
        self.push_chunk(chunk)?;
        self.touch();
        Ok(())
    }

    /// Remove the chunk with the given id if present.
    pub fn remove_chunk(&mut self, chunk_id: &ChunkId) {
        self.chunks.retain(|c| &c.id != chunk_id);
        self.touch();
    }

    /// Find the chunk by id and delegate the update to it.
    pub fn update_chunk(&mut self, chunk_id: &ChunkId, update: ChunkUpdate) -> Result<()> {
        let document_id = self.id;
        let chunk = self
            .chunks
            .iter_mut()
            .find(|c| &c.id == chunk_id)
            .ok_or_else(|| ChunkDbError::not_found("Chunk", chunk_id))?;
        chunk.update(update).map_err(|e| match e {
            // Keep the document id in context for invalid updates
            ChunkDbError::InvalidEntity { reason } => ChunkDbError::invalid(format!(
                "{reason} (chunk {chunk_id} in document {document_id})"
            )),
            other => other,
        })?;
        self.touch();
        Ok(())
    }

    /// Update the document's metadata, preserving `created_at`.
    pub fn update_metadata(&mut self, update: &DocumentMetadataUpdate) {
        self.metadata = self.metadata.updated(update);
    }

    pub fn contains_chunk(&self, chunk_id: &ChunkId) -> bool {
        self.chunks.iter().any(|c| &c.id == chunk_id)
    }

    pub fn get_chunk(&self, chunk_id: &ChunkId) -> Option<&Chunk> {
        self.chunks.iter().find(|c| &c.id == chunk_id)
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    fn touch(&mut self) {
        self.metadata = self.metadata.touched();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str) -> Chunk {
        Chunk::new(
            text,
            Embedding::from_values(vec![1.0, 0.0]).unwrap(),
            ChunkMetadata::new("test", None),
        )
        .unwrap()
    }

    #[test]
    fn test_empty_chunk_text_rejected() {
        let result = Chunk::new(
            "   ",
            Embedding::from_values(vec![1.0]).unwrap(),
            ChunkMetadata::new("test", None),
        );
        assert!(matches!(result, Err(ChunkDbError::InvalidEntity { .. })));
    }

    #[test]
    fn test_chunk_update_refreshes_timestamp() {
        let mut c = chunk("hello");
        let before = c.metadata.updated_at;
        c.update(ChunkUpdate {
            text: Some("world".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(c.text, "world");
        assert!(c.metadata.updated_at >= before);
    }

    #[test]
    fn test_chunk_update_rejects_blank_text() {
        let mut c = chunk("hello");
        let result = c.update(ChunkUpdate {
            text: Some("  ".to_string()),
            embedding: Some(vec![2.0, 0.0]),
            ..Default::default()
        });
        assert!(result.is_err());
        // Failed update leaves the chunk in its pre-call state
        assert_eq!(c.text, "hello");
        assert_eq!(c.embedding.values(), &[1.0, 0.0]);
    }

    #[test]
    fn test_duplicate_chunk_id_rejected() {
        let c = chunk("a");
        let mut doc = Document::new(vec![c.clone()], DocumentMetadata::new("doc", None)).unwrap();
        assert!(doc.add_chunk(c).is_err());
        assert_eq!(doc.chunk_count(), 1);
    }

    #[test]
    fn test_remove_chunk_is_idempotent() {
        let c = chunk("a");
        let id = c.id;
        let mut doc = Document::new(vec![c], DocumentMetadata::new("doc", None)).unwrap();
        doc.remove_chunk(&id);
        assert_eq!(doc.chunk_count(), 0);
        doc.remove_chunk(&id);
        assert_eq!(doc.chunk_count(), 0);
    }

    #[test]
    fn test_update_missing_chunk() {
        let mut doc = Document::new(vec![], DocumentMetadata::new("doc", None)).unwrap();
        let result = doc.update_chunk(&ChunkId::generate(), ChunkUpdate::default());
        assert!(matches!(result, Err(ChunkDbError::NotFound { .. })));
    }

    #[test]
    fn test_mutations_refresh_document_timestamp() {
        let mut doc = Document::new(vec![], DocumentMetadata::new("doc", None)).unwrap();
        let created = doc.metadata.created_at;
        let before = doc.metadata.updated_at;
        doc.add_chunk(chunk("a")).unwrap();
        assert!(doc.metadata.updated_at >= before);
        assert_eq!(doc.metadata.created_at, created);
    }
}
