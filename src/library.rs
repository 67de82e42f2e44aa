//! Library aggregate: document references plus one owned vector index

use crate::document::DocumentId;
use crate::embedding::Embedding;
use crate::error::{ChunkDbError, Result};
use crate::index::VectorIndex;
use crate::indexed_chunk::IndexedChunk;
use crate::metadata::{ChunkFilter, LibraryMetadata, LibraryMetadataUpdate};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of a library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LibraryId(Uuid);

impl LibraryId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| ChunkDbError::invalid(format!("Invalid library id: {s}")))
    }
}

impl fmt::Display for LibraryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Library aggregate root.
///
/// Holds `DocumentId` references, not document bodies — documents are
/// separate aggregates. `is_indexed` is true only while the owned index is
/// known-consistent with the current references; any membership change
/// invalidates it.
#[derive(Debug, Clone)]
pub struct Library {
    pub id: LibraryId,
    documents: Vec<DocumentId>,
    pub metadata: LibraryMetadata,
    vector_index: Box<dyn VectorIndex>,
    is_indexed: bool,
}

impl Library {
    pub fn new(metadata: LibraryMetadata, vector_index: Box<dyn VectorIndex>) -> Self {
        Self {
            id: LibraryId::generate(),
            documents: Vec::new(),
            metadata,
            vector_index,
            is_indexed: false,
        }
    }

    /// Append a document reference. Fails on a duplicate; on success the
    /// index is invalidated.
    pub fn add_document(&mut self, document_id: DocumentId) -> Result<()> {
        if self.contains_document(&document_id) {
            return Err(ChunkDbError::invalid(format!(
                "Document {document_id} already exists in library {}",
                self.id
            )));
        }
        self.documents.push(document_id);
        self.invalidate_index();
        Ok(())
    }

    /// Remove a document reference if present (idempotent), always
    /// invalidating the index.
    pub fn remove_document(&mut self, document_id: &DocumentId) {
        self.documents.retain(|d| d != document_id);
        self.invalidate_index();
    }

    /// Build the owned index from the given chunks.
    ///
    /// Re-indexing while already indexed is allowed: the backing documents
    /// may have changed in place, so a rebuild must be reachable without a
    /// remove/add cycle. `build` replaces the old contents wholesale; a
    /// failed build leaves them intact.
    pub fn index(&mut self, chunks: Vec<IndexedChunk>) -> Result<()> {
        if chunks.is_empty() {
            return Err(ChunkDbError::invalid("No chunks provided for indexing"));
        }
        self.vector_index.build(chunks)?;
        self.is_indexed = true;
        self.touch();
        Ok(())
    }

    /// Force the transition to the unindexed state, clearing index storage.
    pub fn invalidate_index(&mut self) {
        self.is_indexed = false;
        self.vector_index.clear();
        self.touch();
    }

    /// Update the library's metadata, preserving `created_at`.
    pub fn update_metadata(&mut self, update: &LibraryMetadataUpdate) -> Result<()> {
        self.metadata = self.metadata.updated(update)?;
        Ok(())
    }

    /// Find the k most similar chunks to the query embedding.
    ///
    /// Candidates come from the owned index (an unbuilt index surfaces
    /// [`ChunkDbError::IndexNotBuilt`] unchanged); each is re-scored by
    /// cosine similarity — the KD-tree ranks by distance — and anything
    /// below `min_similarity` is dropped. Results are `(chunk, similarity)`
    /// pairs, similarity descending.
    pub fn find_similar_chunks(
        &self,
        query: &Embedding,
        k: usize,
        filter: Option<&ChunkFilter>,
        min_similarity: f32,
    ) -> Result<Vec<(IndexedChunk, f32)>> {
        if k == 0 {
            return Err(ChunkDbError::invalid("k must be a positive integer"));
        }

        let candidates = self.vector_index.search(query, k, filter)?;

        let mut scored = Vec::with_capacity(candidates.len());
        for chunk in candidates {
            let similarity = chunk.similarity(query)?;
            if similarity >= min_similarity {
                scored.push((chunk, similarity));
            }
        }
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored)
    }

    /// All chunks currently held by the owned index; empty if never built.
    pub fn get_indexed_chunks(&self) -> Vec<IndexedChunk> {
        self.vector_index.get_chunks()
    }

    pub fn contains_document(&self, document_id: &DocumentId) -> bool {
        self.documents.contains(document_id)
    }

    pub fn documents(&self) -> &[DocumentId] {
        &self.documents
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn is_indexed(&self) -> bool {
        self.is_indexed
    }

    fn touch(&mut self) {
        self.metadata = self.metadata.touched();
    }
}
