//! Text embeddings and nearest-neighbor search.
//!
//! This module turns text into dense vectors with a local Candle model and
//! answers k-nearest-neighbor queries over those vectors.
//!
//! # Architecture
//!
//! - [`TextEncoder`] - Batched text-to-vector contract; [`BertEncoder`] runs a sentence-transformer
//! - [`EmbeddingMatrix`] - Row-aligned vectors, one per input text
//! - [`VectorIndex`] - Exact squared-L2 search with stable tie-breaking
//! - [`mean_pool`] - Attention-masked averaging of token states
//!
//! # Example
//!
//! ```ignore
//! use docsim::embedding::{BertEncoder, EncoderConfig, TextEncoder, VectorIndex};
//!
//! let encoder = BertEncoder::load(EncoderConfig::default())?;
//! let corpus = encoder.encode(&["cat sat", "dog ran"], 16)?;
//! let index = VectorIndex::build(&corpus);
//!
//! let query = encoder.encode(&["cat napped"], 1)?;
//! let hits = index.search(&query, 1)?;
//! ```

mod engine;
mod index;
mod matrix;
mod models;
mod pooling;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{
    select_device, BertEncoder, EncoderConfig, EncoderError, EncoderResult, TextEncoder,
};
pub use index::{similarity, IndexError, IndexResult, Neighbor, VectorIndex};
pub use matrix::{EmbeddingMatrix, MatrixError};
pub use models::ModelType;
pub use pooling::{mean_pool, MASK_EPSILON};
