//! Application facade: translates external calls into aggregate operations
//!
//! Every mutation follows load → mutate → save-back, so aggregates are
//! checked out of a repository for the duration of one command and replaced
//! wholesale on save.

use crate::document::{Chunk, ChunkId, ChunkUpdate, Document, DocumentId};
use crate::embedding::Embedding;
use crate::error::{ChunkDbError, Result};
use crate::index::IndexKind;
use crate::indexed_chunk::IndexedChunk;
use crate::indexer::LibraryIndexerService;
use crate::library::{Library, LibraryId};
use crate::metadata::{
    ChunkFilter, ChunkMetadata, CustomFields, DocumentMetadata, DocumentMetadataUpdate,
    LibraryMetadata, LibraryMetadataUpdate,
};
use crate::repository::{
    DocumentRepository, InMemoryDocumentRepository, InMemoryLibraryRepository, LibraryRepository,
};
use serde::Deserialize;
use std::sync::Arc;

/// Input for a chunk to be created.
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkInput {
    pub text: String,
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub metadata: ChunkMetadataInput,
}

/// Input metadata for a new chunk; `source` defaults to "unknown".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkMetadataInput {
    pub source: Option<String>,
    pub page_number: Option<u32>,
    #[serde(default)]
    pub custom_fields: CustomFields,
}

impl ChunkInput {
    fn into_chunk(self) -> Result<Chunk> {
        let metadata = ChunkMetadata::new(
            self.metadata.source.unwrap_or_else(|| "unknown".to_string()),
            self.metadata.page_number,
        )
        .with_custom_fields(self.metadata.custom_fields);
        Chunk::new(self.text, Embedding::from_values(self.embedding)?, metadata)
    }
}

/// The vector database: repositories, the indexer service, and the index
/// factory libraries are created with.
#[derive(Clone)]
pub struct ChunkDb {
    documents: Arc<dyn DocumentRepository>,
    libraries: Arc<dyn LibraryRepository>,
    indexer: LibraryIndexerService,
    index_kind: IndexKind,
}

impl ChunkDb {
    /// Create a database backed by in-memory repositories.
    pub fn new(index_kind: IndexKind) -> Self {
        Self::with_repositories(
            Arc::new(InMemoryDocumentRepository::new()),
            Arc::new(InMemoryLibraryRepository::new()),
            index_kind,
        )
    }

    /// Create a database over explicit repository implementations.
    pub fn with_repositories(
        documents: Arc<dyn DocumentRepository>,
        libraries: Arc<dyn LibraryRepository>,
        index_kind: IndexKind,
    ) -> Self {
        let indexer = LibraryIndexerService::new(Arc::clone(&documents));
        Self {
            documents,
            libraries,
            indexer,
            index_kind,
        }
    }

    // --- Documents ---

    pub fn create_document(
        &self,
        title: &str,
        author: Option<String>,
        custom_fields: CustomFields,
        chunks: Vec<ChunkInput>,
    ) -> Result<Document> {
        let chunks = chunks
            .into_iter()
            .map(ChunkInput::into_chunk)
            .collect::<Result<Vec<_>>>()?;
        let metadata = DocumentMetadata::new(title, author).with_custom_fields(custom_fields);
        let document = Document::new(chunks, metadata)?;
        self.documents.save(document.clone());
        Ok(document)
    }

    pub fn get_document(&self, id: &DocumentId) -> Result<Document> {
        self.documents
            .find_by_id(id)
            .ok_or_else(|| ChunkDbError::not_found("Document", id))
    }

    pub fn update_document(
        &self,
        id: &DocumentId,
        update: &DocumentMetadataUpdate,
    ) -> Result<Document> {
        let mut document = self.get_document(id)?;
        document.update_metadata(update);
        self.documents.save(document.clone());
        Ok(document)
    }

    pub fn delete_document(&self, id: &DocumentId) -> Result<()> {
        if !self.documents.delete(id) {
            return Err(ChunkDbError::not_found("Document", id));
        }
        Ok(())
    }

    // --- Chunks ---

    pub fn add_chunk(&self, document_id: &DocumentId, input: ChunkInput) -> Result<Chunk> {
        let mut document = self.get_document(document_id)?;
        let chunk = input.into_chunk()?;
        document.add_chunk(chunk.clone())?;
        self.documents.save(document);
        Ok(chunk)
    }

    pub fn get_chunk(&self, document_id: &DocumentId, chunk_id: &ChunkId) -> Result<Chunk> {
        let document = self.get_document(document_id)?;
        document
            .get_chunk(chunk_id)
            .cloned()
            .ok_or_else(|| ChunkDbError::not_found("Chunk", chunk_id))
    }

    pub fn update_chunk(
        &self,
        document_id: &DocumentId,
        chunk_id: &ChunkId,
        update: ChunkUpdate,
    ) -> Result<Chunk> {
        let mut document = self.get_document(document_id)?;
        document.update_chunk(chunk_id, update)?;
        let chunk = document
            .get_chunk(chunk_id)
            .cloned()
            .ok_or_else(|| ChunkDbError::not_found("Chunk", chunk_id))?;
        self.documents.save(document);
        Ok(chunk)
    }

    pub fn delete_chunk(&self, document_id: &DocumentId, chunk_id: &ChunkId) -> Result<()> {
        let mut document = self.get_document(document_id)?;
        if !document.contains_chunk(chunk_id) {
            return Err(ChunkDbError::not_found("Chunk", chunk_id));
        }
        document.remove_chunk(chunk_id);
        self.documents.save(document);
        Ok(())
    }

    // --- Libraries ---

    pub fn create_library(
        &self,
        name: &str,
        description: &str,
        custom_fields: CustomFields,
        document_ids: Vec<DocumentId>,
    ) -> Result<Library> {
        let metadata = LibraryMetadata::new(name, description)?.with_custom_fields(custom_fields);
        let mut library = Library::new(metadata, self.index_kind.create());
        for document_id in document_ids {
            if !self.documents.exists(&document_id) {
                return Err(ChunkDbError::not_found("Document", document_id));
            }
            library.add_document(document_id)?;
        }
        self.libraries.save(library.clone());
        Ok(library)
    }

    pub fn get_library(&self, id: &LibraryId) -> Result<Library> {
        self.libraries
            .find_by_id(id)
            .ok_or_else(|| ChunkDbError::not_found("Library", id))
    }

    pub fn list_libraries(&self) -> Vec<Library> {
        self.libraries.list()
    }

    pub fn update_library(
        &self,
        id: &LibraryId,
        update: &LibraryMetadataUpdate,
    ) -> Result<Library> {
        let mut library = self.get_library(id)?;
        library.update_metadata(update)?;
        self.libraries.save(library.clone());
        Ok(library)
    }

    pub fn delete_library(&self, id: &LibraryId) -> Result<()> {
        if !self.libraries.delete(id) {
            return Err(ChunkDbError::not_found("Library", id));
        }
        Ok(())
    }

    pub fn add_document_to_library(
        &self,
        library_id: &LibraryId,
        document_id: DocumentId,
    ) -> Result<()> {
        let mut library = self.get_library(library_id)?;
        if !self.documents.exists(&document_id) {
            return Err(ChunkDbError::not_found("Document", document_id));
        }
        library.add_document(document_id)?;
        self.libraries.save(library);
        Ok(())
    }

    pub fn remove_document_from_library(
        &self,
        library_id: &LibraryId,
        document_id: &DocumentId,
    ) -> Result<()> {
        let mut library = self.get_library(library_id)?;
        if !library.contains_document(document_id) {
            return Err(ChunkDbError::not_found("Document", document_id));
        }
        library.remove_document(document_id);
        self.libraries.save(library);
        Ok(())
    }

    /// Rebuild the library's index from its referenced documents' current
    /// chunks.
    pub fn index_library(&self, library_id: &LibraryId) -> Result<()> {
        let mut library = self.get_library(library_id)?;
        self.indexer.index(&mut library)?;
        // Saving replaces the aggregate in one step, so concurrent searches
        // see the old or new index, never a partial one.
        self.libraries.save(library);
        Ok(())
    }

    pub fn find_similar_chunks(
        &self,
        library_id: &LibraryId,
        embedding: Vec<f32>,
        k: usize,
        filter: Option<&ChunkFilter>,
        min_similarity: f32,
    ) -> Result<Vec<(IndexedChunk, f32)>> {
        let library = self.get_library(library_id)?;
        let query = Embedding::from_values(embedding)?;
        library.find_similar_chunks(&query, k, filter, min_similarity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> ChunkDb {
        ChunkDb::new(IndexKind::BruteForce)
    }

    fn chunk_input(text: &str, embedding: Vec<f32>) -> ChunkInput {
        ChunkInput {
            text: text.to_string(),
            embedding,
            metadata: ChunkMetadataInput::default(),
        }
    }

    #[test]
    fn test_create_document_with_chunks() {
        let db = db();
        let doc = db
            .create_document(
                "intro",
                Some("ada".to_string()),
                CustomFields::new(),
                vec![chunk_input("hello", vec![1.0, 0.0])],
            )
            .unwrap();
        assert_eq!(doc.chunk_count(), 1);
        assert_eq!(doc.chunks[0].metadata.source, "unknown");
        assert!(db.get_document(&doc.id).is_ok());
    }

    #[test]
    fn test_create_document_rejects_empty_chunk_text() {
        let db = db();
        let result = db.create_document(
            "doc",
            None,
            CustomFields::new(),
            vec![chunk_input(" ", vec![1.0])],
        );
        assert!(matches!(result, Err(ChunkDbError::InvalidEntity { .. })));
    }

    #[test]
    fn test_add_and_delete_chunk() {
        let db = db();
        let doc = db
            .create_document("doc", None, CustomFields::new(), vec![])
            .unwrap();

        let chunk = db
            .add_chunk(&doc.id, chunk_input("text", vec![1.0]))
            .unwrap();
        assert!(db.get_chunk(&doc.id, &chunk.id).is_ok());

        db.delete_chunk(&doc.id, &chunk.id).unwrap();
        assert!(matches!(
            db.delete_chunk(&doc.id, &chunk.id),
            Err(ChunkDbError::NotFound { .. })
        ));
    }

    #[test]
    fn test_add_chunk_to_missing_document() {
        let db = db();
        let result = db.add_chunk(&DocumentId::generate(), chunk_input("x", vec![1.0]));
        assert!(matches!(result, Err(ChunkDbError::NotFound { .. })));
    }

    #[test]
    fn test_create_library_validates_document_refs() {
        let db = db();
        let result = db.create_library(
            "lib",
            "",
            CustomFields::new(),
            vec![DocumentId::generate()],
        );
        assert!(matches!(result, Err(ChunkDbError::NotFound { .. })));
    }

    #[test]
    fn test_remove_unreferenced_document_is_not_found() {
        let db = db();
        let lib = db
            .create_library("lib", "", CustomFields::new(), vec![])
            .unwrap();
        let result = db.remove_document_from_library(&lib.id, &DocumentId::generate());
        assert!(matches!(result, Err(ChunkDbError::NotFound { .. })));
    }

    #[test]
    fn test_index_and_search_round_trip() {
        let db = db();
        let doc = db
            .create_document(
                "doc",
                None,
                CustomFields::new(),
                vec![chunk_input("hello", vec![1.0, 0.0])],
            )
            .unwrap();
        let lib = db
            .create_library("lib", "", CustomFields::new(), vec![doc.id])
            .unwrap();

        db.index_library(&lib.id).unwrap();

        let results = db
            .find_similar_chunks(&lib.id, vec![1.0, 0.0], 1, None, 0.0)
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0.chunk_id, doc.chunks[0].id);
        assert!((results[0].1 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_search_unindexed_library() {
        let db = db();
        let lib = db
            .create_library("lib", "", CustomFields::new(), vec![])
            .unwrap();
        let result = db.find_similar_chunks(&lib.id, vec![1.0], 1, None, 0.0);
        assert!(matches!(result, Err(ChunkDbError::IndexNotBuilt)));
    }

    #[test]
    fn test_membership_change_invalidates_saved_library() {
        let db = db();
        let doc = db
            .create_document(
                "doc",
                None,
                CustomFields::new(),
                vec![chunk_input("a", vec![1.0])],
            )
            .unwrap();
        let lib = db
            .create_library("lib", "", CustomFields::new(), vec![doc.id])
            .unwrap();
        db.index_library(&lib.id).unwrap();
        assert!(db.get_library(&lib.id).unwrap().is_indexed());

        let other = db
            .create_document("other", None, CustomFields::new(), vec![])
            .unwrap();
        db.add_document_to_library(&lib.id, other.id).unwrap();

        let reloaded = db.get_library(&lib.id).unwrap();
        assert!(!reloaded.is_indexed());
        assert!(reloaded.get_indexed_chunks().is_empty());
    }
}
