//! Brute-force vector index — exhaustive O(n·d) k-NN search

use crate::embedding::Embedding;
use crate::error::{ChunkDbError, Result};
use crate::index::neighbor::{BoundedNeighborHeap, Neighbor};
use crate::index::{uniform_dimension, VectorIndex};
use crate::indexed_chunk::IndexedChunk;
use crate::metadata::ChunkFilter;

/// A brute-force index: stores the build snapshot verbatim and scores every
/// candidate on search.
///
/// Build is O(1); search is O(n·d). Suitable for small libraries and as the
/// ground truth the KD-tree is checked against.
#[derive(Debug, Clone, Default)]
pub struct BruteForceIndex {
    chunks: Vec<IndexedChunk>,
    dimension: usize,
    built: bool,
}

impl BruteForceIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VectorIndex for BruteForceIndex {
    fn build(&mut self, chunks: Vec<IndexedChunk>) -> Result<()> {
        let dimension = uniform_dimension(&chunks)?;
        self.chunks = chunks;
        self.dimension = dimension;
        self.built = true;
        Ok(())
    }

    fn search(
        &self,
        query: &Embedding,
        k: usize,
        filter: Option<&ChunkFilter>,
    ) -> Result<Vec<IndexedChunk>> {
        if !self.built {
            return Err(ChunkDbError::IndexNotBuilt);
        }
        if k == 0 {
            return Err(ChunkDbError::invalid("k must be a positive integer"));
        }
        if query.dimension() != self.dimension {
            return Err(ChunkDbError::DimensionMismatch {
                expected: self.dimension,
                actual: query.dimension(),
            });
        }

        // Filter before ranking: excluded chunks never count toward k.
        let candidates: Vec<&IndexedChunk> = match filter {
            Some(f) => self.chunks.iter().filter(|c| c.matches_filter(f)).collect(),
            None => self.chunks.iter().collect(),
        };
        if candidates.is_empty() {
            return Ok(vec![]);
        }

        // Negated similarity makes lower scores better, with the sequence
        // number breaking ties by insertion order.
        let mut heap = BoundedNeighborHeap::new(k);
        for (seq, chunk) in candidates.into_iter().enumerate() {
            let similarity = chunk.similarity(query)?;
            heap.push(Neighbor::new(-similarity, seq, chunk));
        }

        Ok(heap
            .into_sorted_vec()
            .into_iter()
            .map(|n| n.chunk.clone())
            .collect())
    }

    fn clear(&mut self) {
        self.chunks.clear();
        self.dimension = 0;
        self.built = false;
    }

    fn get_chunks(&self) -> Vec<IndexedChunk> {
        self.chunks.clone()
    }

    fn len(&self) -> usize {
        self.chunks.len()
    }

    fn boxed_clone(&self) -> Box<dyn VectorIndex> {
        Box::new(self.clone())
    }
}
