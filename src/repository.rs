//! Concurrency-safe in-memory repositories

use crate::document::{Document, DocumentId};
use crate::library::{Library, LibraryId};
use std::collections::HashMap;
use std::sync::RwLock;

/// Keyed store for document aggregates.
///
/// `find_by_id` hands out a clone: the caller owns the copy for the duration
/// of one command and writes it back with `save`. Missing ids are an absence,
/// not an error; `delete` reports whether anything was removed and never
/// fails.
pub trait DocumentRepository: Send + Sync {
    fn save(&self, document: Document);
    fn find_by_id(&self, id: &DocumentId) -> Option<Document>;
    fn delete(&self, id: &DocumentId) -> bool;
    fn exists(&self, id: &DocumentId) -> bool;
}

/// Keyed store for library aggregates, same contract as
/// [`DocumentRepository`].
pub trait LibraryRepository: Send + Sync {
    fn save(&self, library: Library);
    fn find_by_id(&self, id: &LibraryId) -> Option<Library>;
    fn delete(&self, id: &LibraryId) -> bool;
    fn exists(&self, id: &LibraryId) -> bool;
    fn list(&self) -> Vec<Library>;
}

/// In-memory document store guarded by a single reader/writer lock.
///
/// Operations are short and never call into other repositories while
/// holding the lock.
#[derive(Debug, Default)]
pub struct InMemoryDocumentRepository {
    store: RwLock<HashMap<DocumentId, Document>>,
}

impl InMemoryDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentRepository for InMemoryDocumentRepository {
    fn save(&self, document: Document) {
        let mut store = self.store.write().unwrap_or_else(|e| e.into_inner());
        store.insert(document.id, document);
    }

    fn find_by_id(&self, id: &DocumentId) -> Option<Document> {
        let store = self.store.read().unwrap_or_else(|e| e.into_inner());
        store.get(id).cloned()
    }

    fn delete(&self, id: &DocumentId) -> bool {
        let mut store = self.store.write().unwrap_or_else(|e| e.into_inner());
        store.remove(id).is_some()
    }

    fn exists(&self, id: &DocumentId) -> bool {
        let store = self.store.read().unwrap_or_else(|e| e.into_inner());
        store.contains_key(id)
    }
}

/// In-memory library store guarded by a single reader/writer lock.
///
/// Saving replaces the whole aggregate, so a concurrent reader observes
/// either the fully-old or fully-new library — never a partial rebuild.
#[derive(Debug, Default)]
pub struct InMemoryLibraryRepository {
    store: RwLock<HashMap<LibraryId, Library>>,
}

impl InMemoryLibraryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LibraryRepository for InMemoryLibraryRepository {
    fn save(&self, library: Library) {
        let mut store = self.store.write().unwrap_or_else(|e| e.into_inner());
        store.insert(library.id, library);
    }

    fn find_by_id(&self, id: &LibraryId) -> Option<Library> {
        let store = self.store.read().unwrap_or_else(|e| e.into_inner());
        store.get(id).cloned()
    }

    fn delete(&self, id: &LibraryId) -> bool {
        let mut store = self.store.write().unwrap_or_else(|e| e.into_inner());
        store.remove(id).is_some()
    }

    fn exists(&self, id: &LibraryId) -> bool {
        let store = self.store.read().unwrap_or_else(|e| e.into_inner());
        store.contains_key(id)
    }

    fn list(&self) -> Vec<Library> {
        let store = self.store.read().unwrap_or_else(|e| e.into_inner());
        store.values().cloned().collect()
    }
}
