//! Pluggable vector index implementations

pub mod brute_force;
pub mod kd_tree;
pub mod neighbor;

pub use brute_force::BruteForceIndex;
pub use kd_tree::KdTreeIndex;

use crate::embedding::Embedding;
use crate::error::{ChunkDbError, Result};
use crate::indexed_chunk::IndexedChunk;
use crate::metadata::ChunkFilter;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A k-NN search index over a snapshot of indexed chunks.
///
/// The snapshot is valid until explicitly cleared or rebuilt; implementations
/// never track changes to the documents the chunks were copied from.
pub trait VectorIndex: fmt::Debug + Send + Sync {
    /// Build the index from the given chunks, replacing any prior contents.
    ///
    /// Fails if `chunks` is empty or the chunks do not all share one
    /// embedding dimension.
    fn build(&mut self, chunks: Vec<IndexedChunk>) -> Result<()>;

    /// Search for the `k` most similar chunks to `query`.
    ///
    /// Fails with [`ChunkDbError::IndexNotBuilt`] before any successful
    /// build (or after a clear), and on `k == 0`. The filter is applied
    /// before ranking: an excluded chunk never counts toward k.
    fn search(
        &self,
        query: &Embedding,
        k: usize,
        filter: Option<&ChunkFilter>,
    ) -> Result<Vec<IndexedChunk>>;

    /// Reset to the unbuilt state, discarding all contents.
    fn clear(&mut self);

    /// The chunks currently stored in the index.
    fn get_chunks(&self) -> Vec<IndexedChunk>;

    /// The number of chunks in the index.
    fn len(&self) -> usize;

    /// Whether the index holds no chunks.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clone into a new boxed trait object.
    fn boxed_clone(&self) -> Box<dyn VectorIndex>;
}

impl Clone for Box<dyn VectorIndex> {
    fn clone(&self) -> Self {
        self.boxed_clone()
    }
}

/// The closed set of index implementations; doubles as the factory a
/// library-creation path is parameterized with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    BruteForce,
    KdTree,
}

impl IndexKind {
    /// Construct a fresh, unbuilt index of this kind.
    pub fn create(&self) -> Box<dyn VectorIndex> {
        match self {
            IndexKind::BruteForce => Box::new(BruteForceIndex::new()),
            IndexKind::KdTree => Box::new(KdTreeIndex::new()),
        }
    }
}

/// Validate a build set and return its shared embedding dimension.
pub(crate) fn uniform_dimension(chunks: &[IndexedChunk]) -> Result<usize> {
    let first = chunks
        .first()
        .ok_or_else(|| ChunkDbError::invalid("No chunks provided for indexing"))?;
    let dimension = first.dimension();
    if chunks.iter().any(|c| c.dimension() != dimension) {
        return Err(ChunkDbError::invalid(
            "All chunks must have the same embedding dimension",
        ));
    }
    Ok(dimension)
}
