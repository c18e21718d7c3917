//! Exact nearest-neighbor index over embedding vectors.
//!
//! Every query is compared against every stored vector using squared
//! Euclidean distance. Row position at insertion time is the vector's
//! identity for the lifetime of the index.

use std::cmp::Ordering;

use thiserror::Error;

use crate::embedding::EmbeddingMatrix;

/// Errors that can occur while loading or querying the index.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("dimension mismatch: index holds {expected}-d vectors, got {found}-d")]
    DimensionMismatch { expected: usize, found: usize },
}

/// Result type for index operations.
pub type IndexResult<T> = Result<T, IndexError>;

/// One search hit: the stored row position and its squared L2 distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub distance: f32,
}

impl Neighbor {
    /// Similarity score for this hit, see [`similarity`].
    pub fn similarity(&self) -> f64 {
        similarity(self.distance)
    }
}

/// Maps a distance onto `(0, 1]`: `1 / (1 + distance)`.
///
/// Strictly decreasing in distance and equal to 1 only at distance 0.
/// Computed in `f64` so small non-zero distances stay below 1.
pub fn similarity(distance: f32) -> f64 {
    1.0 / (1.0 + f64::from(distance))
}

/// Flat, exhaustive-search vector index.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    vectors: EmbeddingMatrix,
}

impl VectorIndex {
    /// Creates an empty index for vectors of the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            vectors: EmbeddingMatrix::empty(dimension),
        }
    }

    /// Builds an index holding every row of `matrix`, in order.
    pub fn build(matrix: &EmbeddingMatrix) -> Self {
        Self {
            vectors: matrix.clone(),
        }
    }

    /// Appends rows after the ones already stored.
    pub fn add(&mut self, matrix: &EmbeddingMatrix) -> IndexResult<()> {
        let expected = self.vectors.dimension();
        self.vectors
            .extend(matrix)
            .map_err(|_| IndexError::DimensionMismatch {
                expected,
                found: matrix.dimension(),
            })
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.vectors.dimension()
    }

    /// Finds the `k` closest stored vectors for every query row.
    ///
    /// Each inner list is sorted by ascending distance with ties broken by
    /// the lower stored index, and holds `min(k, len)` entries.
    pub fn search(&self, queries: &EmbeddingMatrix, k: usize) -> IndexResult<Vec<Vec<Neighbor>>> {
        if self.is_empty() || k == 0 {
            return Ok(vec![Vec::new(); queries.len()]);
        }
        if queries.dimension() != self.dimension() && !queries.is_empty() {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension(),
                found: queries.dimension(),
            });
        }

        Ok(queries.rows().map(|query| self.nearest(query, k)).collect())
    }

    fn nearest(&self, query: &[f32], k: usize) -> Vec<Neighbor> {
        let mut scored: Vec<Neighbor> = self
            .vectors
            .rows()
            .enumerate()
            .map(|(index, stored)| Neighbor {
                index,
                distance: squared_l2(query, stored),
            })
            .collect();

        let k = k.min(scored.len());
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, rank);
            scored.truncate(k);
        }
        scored.sort_unstable_by(rank);
        scored
    }
}

/// Total order on hits: distance first, then insertion position.
fn rank(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| a.index.cmp(&b.index))
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: &[&[f32]]) -> EmbeddingMatrix {
        EmbeddingMatrix::from_rows(rows.iter().map(|r| r.to_vec()).collect()).unwrap()
    }

    #[test]
    fn search_returns_sorted_results() {
        let index = VectorIndex::build(&matrix(&[&[0.0, 1.0], &[1.0, 0.0], &[0.9, 0.1]]));

        let results = index.search(&matrix(&[&[1.0, 0.0]]), 3).unwrap();

        let order: Vec<usize> = results[0].iter().map(|n| n.index).collect();
        assert_eq!(order, vec![1, 2, 0]);
        assert_eq!(results[0][0].distance, 0.0);
        assert!(results[0]
            .windows(2)
            .all(|pair| pair[0].distance <= pair[1].distance));
    }

    #[test]
    fn ties_prefer_first_inserted() {
        let index = VectorIndex::build(&matrix(&[&[0.0, 1.0], &[1.0, 0.0], &[0.0, 1.0], &[1.0, 0.0]]));

        let results = index.search(&matrix(&[&[1.0, 0.0]]), 2).unwrap();
        let order: Vec<usize> = results[0].iter().map(|n| n.index).collect();
        assert_eq!(order, vec![1, 3]);

        let results = index.search(&matrix(&[&[0.0, 1.0]]), 4).unwrap();
        let order: Vec<usize> = results[0].iter().map(|n| n.index).collect();
        assert_eq!(order, vec![0, 2, 1, 3]);
    }

    #[test]
    fn search_respects_k() {
        let rows: Vec<Vec<f32>> = (0..10).map(|i| vec![i as f32]).collect();
        let index = VectorIndex::build(&EmbeddingMatrix::from_rows(rows).unwrap());

        let results = index.search(&matrix(&[&[4.2]]), 3).unwrap();
        let order: Vec<usize> = results[0].iter().map(|n| n.index).collect();
        assert_eq!(order, vec![4, 5, 3]);
    }

    #[test]
    fn k_larger_than_index_returns_available() {
        let index = VectorIndex::build(&matrix(&[&[1.0, 1.0]]));
        let results = index.search(&matrix(&[&[0.0, 0.0], &[1.0, 1.0]]), 5).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].len(), 1);
        assert_eq!(results[0][0].distance, 2.0);
        assert_eq!(results[1].len(), 1);
    }

    #[test]
    fn search_empty_index() {
        let index = VectorIndex::new(2);
        let results = index.search(&matrix(&[&[1.0, 0.0]]), 10).unwrap();
        assert_eq!(results, vec![Vec::new()]);
    }

    #[test]
    fn dimension_mismatch_is_an_error() {
        let index = VectorIndex::build(&matrix(&[&[1.0, 0.0]]));
        let err = index.search(&matrix(&[&[1.0, 0.0, 0.0]]), 1).unwrap_err();
        assert_eq!(
            err,
            IndexError::DimensionMismatch {
                expected: 2,
                found: 3
            }
        );
    }

    #[test]
    fn add_appends_after_existing_rows() {
        let mut index = VectorIndex::new(2);
        index.add(&matrix(&[&[5.0, 5.0]])).unwrap();
        index.add(&matrix(&[&[0.0, 0.0]])).unwrap();
        assert_eq!(index.len(), 2);

        let results = index.search(&matrix(&[&[0.0, 0.0]]), 1).unwrap();
        assert_eq!(results[0][0].index, 1);

        assert!(index.add(&matrix(&[&[1.0]])).is_err());
    }

    #[test]
    fn similarity_bounds() {
        assert_eq!(similarity(0.0), 1.0);
        assert_eq!(similarity(1.0), 0.5);
        assert!(similarity(1e-7) < 1.0);
        assert!(similarity(1e30) > 0.0);
        assert!(similarity(0.5) > similarity(0.6));
    }

    #[test]
    fn identical_vector_scores_one() {
        let index = VectorIndex::build(&matrix(&[&[0.3, -0.7, 0.1], &[1.0, 1.0, 1.0]]));
        let results = index.search(&matrix(&[&[0.3, -0.7, 0.1]]), 1).unwrap();
        assert_eq!(results[0][0].similarity(), 1.0);
    }
}
