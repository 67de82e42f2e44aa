//! Embedding value type and similarity operations

use crate::error::{ChunkDbError, Result};
use serde::{Deserialize, Serialize};

/// An immutable fixed-length embedding vector.
///
/// Created once from client input and never mutated; replacing an embedding
/// means constructing a new `Embedding`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding {
    values: Vec<f32>,
}

impl Embedding {
    /// Create an embedding from raw values.
    ///
    /// Fails if the input is empty or contains a non-finite value.
    pub fn from_values(values: Vec<f32>) -> Result<Self> {
        if values.is_empty() {
            return Err(ChunkDbError::invalid("Embedding cannot be empty"));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ChunkDbError::invalid(
                "All embedding values must be finite numbers",
            ));
        }
        Ok(Self { values })
    }

    /// The number of components in this embedding.
    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    /// The underlying values as a slice.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Check if this embedding has the same dimension as another.
    pub fn has_same_dimension(&self, other: &Embedding) -> bool {
        self.dimension() == other.dimension()
    }

    /// Compute the L2 norm (magnitude) of the embedding.
    pub fn norm(&self) -> f32 {
        self.values.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    /// Cosine similarity with another embedding, in [-1, 1].
    ///
    /// Returns `0.0` when either vector has zero norm instead of failing,
    /// so degenerate inputs never produce NaN.
    pub fn cosine_similarity(&self, other: &Embedding) -> Result<f32> {
        if !self.has_same_dimension(other) {
            return Err(ChunkDbError::DimensionMismatch {
                expected: self.dimension(),
                actual: other.dimension(),
            });
        }

        let norm_a = self.norm();
        let norm_b = other.norm();
        if norm_a == 0.0 || norm_b == 0.0 {
            return Ok(0.0);
        }

        let dot: f32 = self
            .values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| a * b)
            .sum();

        // Clamp to [-1, 1] to handle floating point errors
        Ok((dot / (norm_a * norm_b)).clamp(-1.0, 1.0))
    }

    /// Euclidean (L2) distance to another embedding.
    pub fn euclidean_distance(&self, other: &Embedding) -> Result<f32> {
        if !self.has_same_dimension(other) {
            return Err(ChunkDbError::DimensionMismatch {
                expected: self.dimension(),
                actual: other.dimension(),
            });
        }

        Ok(self
            .values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_embedding_creation() {
        let e = Embedding::from_values(vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(e.dimension(), 3);
        assert_eq!(e.values(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_empty_embedding_rejected() {
        assert!(matches!(
            Embedding::from_values(vec![]),
            Err(ChunkDbError::InvalidEntity { .. })
        ));
    }

    #[test]
    fn test_non_finite_values_rejected() {
        assert!(Embedding::from_values(vec![1.0, f32::NAN]).is_err());
        assert!(Embedding::from_values(vec![f32::INFINITY]).is_err());
    }

    #[test]
    fn test_norm() {
        let e = Embedding::from_values(vec![3.0, 4.0]).unwrap();
        assert_relative_eq!(e.norm(), 5.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cosine_identical() {
        let a = Embedding::from_values(vec![1.0, 2.0, 3.0]).unwrap();
        let sim = a.cosine_similarity(&a).unwrap();
        assert_relative_eq!(sim, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal() {
        let a = Embedding::from_values(vec![1.0, 0.0]).unwrap();
        let b = Embedding::from_values(vec![0.0, 1.0]).unwrap();
        assert_relative_eq!(a.cosine_similarity(&b).unwrap(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cosine_opposite() {
        let a = Embedding::from_values(vec![1.0, 0.0]).unwrap();
        let b = Embedding::from_values(vec![-1.0, 0.0]).unwrap();
        assert_relative_eq!(a.cosine_similarity(&b).unwrap(), -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cosine_zero_norm_returns_zero() {
        let a = Embedding::from_values(vec![0.0, 0.0]).unwrap();
        let b = Embedding::from_values(vec![1.0, 2.0]).unwrap();
        assert_eq!(a.cosine_similarity(&b).unwrap(), 0.0);
        assert_eq!(b.cosine_similarity(&a).unwrap(), 0.0);
    }

    #[test]
    fn test_euclidean_distance() {
        let a = Embedding::from_values(vec![1.0, 2.0, 3.0]).unwrap();
        let b = Embedding::from_values(vec![4.0, 5.0, 6.0]).unwrap();
        assert_relative_eq!(a.euclidean_distance(&b).unwrap(), 5.196152, epsilon = 1e-5);
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = Embedding::from_values(vec![1.0, 2.0]).unwrap();
        let b = Embedding::from_values(vec![1.0, 2.0, 3.0]).unwrap();
        assert!(matches!(
            a.cosine_similarity(&b),
            Err(ChunkDbError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            a.euclidean_distance(&b),
            Err(ChunkDbError::DimensionMismatch { .. })
        ));
    }
}
