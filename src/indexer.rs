//! Cross-aggregate service that rebuilds a library's index from its
//! referenced documents

use crate::error::{ChunkDbError, Result};
use crate::indexed_chunk::IndexedChunk;
use crate::library::Library;
use crate::repository::DocumentRepository;
use std::sync::Arc;

/// Loads every document a library references and rebuilds the library's
/// index from their current chunks.
#[derive(Clone)]
pub struct LibraryIndexerService {
    documents: Arc<dyn DocumentRepository>,
}

impl LibraryIndexerService {
    pub fn new(documents: Arc<dyn DocumentRepository>) -> Self {
        Self { documents }
    }

    /// Collect every chunk from every referenced document, in reference
    /// order then chunk order, and build the library's index from them.
    ///
    /// Fails fast with `NotFound` if any referenced document is missing —
    /// a library is never indexed from a partial set. Zero aggregated
    /// chunks surfaces the index's empty-build failure.
    pub fn index(&self, library: &mut Library) -> Result<()> {
        let mut indexed_chunks = Vec::new();
        for document_id in library.documents().to_vec() {
            let document = self
                .documents
                .find_by_id(&document_id)
                .ok_or_else(|| ChunkDbError::not_found("Document", document_id))?;
            for chunk in &document.chunks {
                indexed_chunks.push(IndexedChunk::from_chunk(chunk, document_id));
            }
        }

        library.index(indexed_chunks)
    }
}
