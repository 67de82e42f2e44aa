//! KD-tree vector index — median-split spatial partition

use crate::embedding::Embedding;
use crate::error::{ChunkDbError, Result};
use crate::index::neighbor::{BoundedNeighborHeap, Neighbor};
use crate::index::{uniform_dimension, VectorIndex};
use crate::indexed_chunk::IndexedChunk;
use crate::metadata::ChunkFilter;

/// A node in the KD-tree.
#[derive(Debug, Clone)]
struct KdNode {
    chunk: IndexedChunk,
    left: Option<Box<KdNode>>,
    right: Option<Box<KdNode>>,
    axis: usize,
}

/// A balanced KD-tree over the build snapshot.
///
/// Build is O(n log n); search is O(log n) average, O(n) worst case.
/// Performance degrades in very high dimensions, where the pruning bound
/// rarely excludes a branch.
#[derive(Debug, Clone, Default)]
pub struct KdTreeIndex {
    root: Option<Box<KdNode>>,
    dimension: usize,
    len: usize,
}

impl KdTreeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recursively build a subtree: sort the subset on the cycling axis,
    /// take the exact median as the node, recurse on the strict halves.
    fn build_tree(&self, mut chunks: Vec<IndexedChunk>, depth: usize) -> Option<Box<KdNode>> {
        if chunks.is_empty() {
            return None;
        }

        let axis = depth % self.dimension;
        chunks.sort_by(|a, b| {
            a.embedding.values()[axis]
                .partial_cmp(&b.embedding.values()[axis])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let median = chunks.len() / 2;
        let right = chunks.split_off(median + 1);
        // The median element is now the tail of the left half.
        let chunk = chunks.pop().expect("median element exists");

        Some(Box::new(KdNode {
            chunk,
            left: self.build_tree(chunks, depth + 1),
            right: self.build_tree(right, depth + 1),
            axis,
        }))
    }

    fn search_tree<'a>(
        &self,
        node: &'a KdNode,
        query: &Embedding,
        filter: Option<&ChunkFilter>,
        heap: &mut BoundedNeighborHeap<'a>,
        seq: &mut usize,
    ) -> Result<()> {
        // A filtered-out node is skipped as a candidate, but its subtrees
        // are still traversed to reach matching descendants.
        let is_candidate = filter.map_or(true, |f| node.chunk.matches_filter(f));
        if is_candidate {
            let distance = node.chunk.distance(query)?;
            heap.push(Neighbor::new(distance, *seq, &node.chunk));
            *seq += 1;
        }

        let diff = query.values()[node.axis] - node.chunk.embedding.values()[node.axis];
        let (near, far) = if diff < 0.0 {
            (&node.left, &node.right)
        } else {
            (&node.right, &node.left)
        };

        if let Some(near) = near {
            self.search_tree(near, query, filter, heap, seq)?;
        }

        // Visit the far branch unless the heap is full and the axis-distance
        // bound cannot strictly beat the current worst kept distance.
        let must_visit_far =
            !heap.is_full() || diff.abs() < heap.worst_score().unwrap_or(f32::INFINITY);
        if must_visit_far {
            if let Some(far) = far {
                self.search_tree(far, query, filter, heap, seq)?;
            }
        }

        Ok(())
    }

    fn collect(node: &Option<Box<KdNode>>, out: &mut Vec<IndexedChunk>) {
        if let Some(node) = node {
            out.push(node.chunk.clone());
            Self::collect(&node.left, out);
            Self::collect(&node.right, out);
        }
    }
}

impl VectorIndex for KdTreeIndex {
    fn build(&mut self, chunks: Vec<IndexedChunk>) -> Result<()> {
        self.dimension = uniform_dimension(&chunks)?;
        self.len = chunks.len();
        self.root = self.build_tree(chunks, 0);
        Ok(())
    }

    fn search(
        &self,
        query: &Embedding,
        k: usize,
        filter: Option<&ChunkFilter>,
    ) -> Result<Vec<IndexedChunk>> {
        let root = self.root.as_ref().ok_or(ChunkDbError::IndexNotBuilt)?;
        if k == 0 {
            return Err(ChunkDbError::invalid("k must be a positive integer"));
        }
        if query.dimension() != self.dimension {
            return Err(ChunkDbError::DimensionMismatch {
                expected: self.dimension,
                actual: query.dimension(),
            });
        }

        let mut heap = BoundedNeighborHeap::new(k);
        let mut seq = 0;
        self.search_tree(root, query, filter, &mut heap, &mut seq)?;

        // Ascending distance: nearest first.
        Ok(heap
            .into_sorted_vec()
            .into_iter()
            .map(|n| n.chunk.clone())
            .collect())
    }

    fn clear(&mut self) {
        self.root = None;
        self.dimension = 0;
        self.len = 0;
    }

    fn get_chunks(&self) -> Vec<IndexedChunk> {
        let mut chunks = Vec::with_capacity(self.len);
        Self::collect(&self.root, &mut chunks);
        chunks
    }

    fn len(&self) -> usize {
        self.len
    }

    fn boxed_clone(&self) -> Box<dyn VectorIndex> {
        Box::new(self.clone())
    }
}
