//! Dense row-major embedding matrix.
//!
//! Row `i` belongs to document `i` of whatever sequence the matrix was
//! derived from. Position is the only link between the two.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Errors raised while assembling a matrix from rows.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatrixError {
    #[error("row {row} has {found} values, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// An ordered sequence of equal-length embedding vectors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddingMatrix {
    dimension: usize,
    data: Vec<f32>,
}

impl EmbeddingMatrix {
    /// Creates an empty matrix whose rows will have `dimension` values.
    pub fn empty(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    /// Builds a matrix from owned rows.
    ///
    /// The first row fixes the dimension; an empty input yields a
    /// zero-dimension, zero-row matrix.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self, MatrixError> {
        let dimension = rows.first().map(Vec::len).unwrap_or(0);
        let mut matrix = Self {
            dimension,
            data: Vec::with_capacity(dimension * rows.len()),
        };
        for row in rows {
            matrix.push_row(&row)?;
        }
        Ok(matrix)
    }

    /// Appends one row, checking its length.
    pub fn push_row(&mut self, row: &[f32]) -> Result<(), MatrixError> {
        if row.len() != self.dimension {
            return Err(MatrixError::Ragged {
                row: self.len(),
                expected: self.dimension,
                found: row.len(),
            });
        }
        self.data.extend_from_slice(row);
        Ok(())
    }

    /// Appends every row of `other`.
    pub fn extend(&mut self, other: &EmbeddingMatrix) -> Result<(), MatrixError> {
        if other.is_empty() {
            return Ok(());
        }
        if self.dimension == 0 {
            self.dimension = other.dimension;
        }
        if other.dimension != self.dimension {
            return Err(MatrixError::Ragged {
                row: self.len(),
                expected: self.dimension,
                found: other.dimension,
            });
        }
        self.data.extend_from_slice(&other.data);
        Ok(())
    }

    /// Number of values per row.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns row `index`, if present.
    pub fn row(&self, index: usize) -> Option<&[f32]> {
        if index >= self.len() {
            return None;
        }
        let start = index * self.dimension;
        Some(&self.data[start..start + self.dimension])
    }

    /// Iterates rows in order.
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        // chunks_exact panics on a zero chunk size
        self.data.chunks_exact(self.dimension.max(1))
    }

    /// The flat row-major buffer.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Copies the matrix out as owned rows.
    pub fn to_rows(&self) -> Vec<Vec<f32>> {
        self.rows().map(<[f32]>::to_vec).collect()
    }
}

impl Serialize for EmbeddingMatrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.rows())
    }
}
