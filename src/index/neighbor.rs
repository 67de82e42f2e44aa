//! Bounded candidate heap shared by the index implementations.
//!
//! Handles f32 ordering for `BinaryHeap` and carries a sequence number so
//! equal-score candidates resolve by insertion order instead of comparing
//! chunks directly.

use crate::indexed_chunk::IndexedChunk;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A search candidate: a score (lower is better), the order it was seen in,
/// and a borrow of the chunk it refers to.
///
/// Brute-force search pushes negated cosine similarity; KD-tree search
/// pushes Euclidean distance. Either way, sorting ascending by score yields
/// best-first results.
#[derive(Debug, Clone, Copy)]
pub struct Neighbor<'a> {
    pub score: f32,
    pub seq: usize,
    pub chunk: &'a IndexedChunk,
}

impl<'a> Neighbor<'a> {
    pub fn new(score: f32, seq: usize, chunk: &'a IndexedChunk) -> Self {
        Self { score, seq, chunk }
    }
}

impl PartialEq for Neighbor<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score && self.seq == other.seq
    }
}

impl Eq for Neighbor<'_> {}

impl PartialOrd for Neighbor<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Max-heap ordering: the greatest element is the worst candidate — highest
// score, and among equal scores the one seen latest.
impl Ord for Neighbor<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .partial_cmp(&other.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// A max-heap of candidates bounded to the best `capacity` entries.
///
/// Pushing into a full heap evicts the worst candidate; on a score tie the
/// later-seen candidate loses, so earlier insertions are kept.
#[derive(Debug)]
pub struct BoundedNeighborHeap<'a> {
    heap: BinaryHeap<Neighbor<'a>>,
    capacity: usize,
}

impl<'a> BoundedNeighborHeap<'a> {
    pub fn new(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn push(&mut self, neighbor: Neighbor<'a>) {
        self.heap.push(neighbor);
        if self.heap.len() > self.capacity {
            self.heap.pop();
        }
    }

    /// The score of the current worst kept candidate.
    pub fn worst_score(&self) -> Option<f32> {
        self.heap.peek().map(|n| n.score)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Whether the heap holds `capacity` candidates.
    pub fn is_full(&self) -> bool {
        self.heap.len() >= self.capacity
    }

    /// Drain into a Vec ordered best-first (ascending score, then insertion
    /// order).
    pub fn into_sorted_vec(self) -> Vec<Neighbor<'a>> {
        let mut v = self.heap.into_vec();
        v.sort_unstable();
        v
    }
}
