//! # chunkdb
//!
//! An in-memory vector database for text chunks.
//!
//! Chunks carry an embedding and metadata, documents own ordered chunks,
//! and libraries reference documents while owning one searchable vector
//! index over their chunks. This library provides:
//! - Immutable embeddings with cosine similarity and Euclidean distance
//! - Pluggable k-NN indexes: brute-force and KD-tree
//! - Library index lifecycle with automatic invalidation on membership
//!   changes
//! - Concurrency-safe in-memory repositories
//!
//! ## Example
//!
//! ```rust
//! use chunkdb::{ChunkDb, ChunkInput, IndexKind};
//!
//! let db = ChunkDb::new(IndexKind::BruteForce);
//!
//! let doc = db
//!     .create_document(
//!         "greetings",
//!         None,
//!         Default::default(),
//!         vec![ChunkInput {
//!             text: "hello".to_string(),
//!             embedding: vec![1.0, 0.0],
//!             metadata: Default::default(),
//!         }],
//!     )
//!     .unwrap();
//!
//! let lib = db
//!     .create_library("demo", "", Default::default(), vec![doc.id])
//!     .unwrap();
//! db.index_library(&lib.id).unwrap();
//!
//! let results = db
//!     .find_similar_chunks(&lib.id, vec![1.0, 0.0], 1, None, 0.0)
//!     .unwrap();
//! assert_eq!(results[0].0.text, "hello");
//! ```

pub mod document;
pub mod embedding;
pub mod error;
pub mod index;
pub mod indexed_chunk;
pub mod indexer;
pub mod library;
pub mod metadata;
pub mod repository;
pub mod server;
pub mod service;

pub use document::{Chunk, ChunkId, ChunkUpdate, Document, DocumentId};
pub use embedding::Embedding;
pub use error::{ChunkDbError, Result};
pub use index::{BruteForceIndex, IndexKind, KdTreeIndex, VectorIndex};
pub use indexed_chunk::IndexedChunk;
pub use indexer::LibraryIndexerService;
pub use library::{Library, LibraryId};
pub use metadata::{
    ChunkFilter, ChunkMetadata, ChunkMetadataUpdate, CustomFields, DocumentMetadata,
    DocumentMetadataUpdate, LibraryMetadata, LibraryMetadataUpdate,
};
pub use repository::{
    DocumentRepository, InMemoryDocumentRepository, InMemoryLibraryRepository, LibraryRepository,
};
pub use service::{ChunkDb, ChunkInput, ChunkMetadataInput};
