//! File-backed storage for corpora, embedding caches and reports.
//!
//! Everything on disk is JSON:
//!
//! - Corpus files: arrays of document records, read with [`load_corpus`]
//! - The embedding cache: documents plus their vectors, see [`EmbeddingCache`]
//! - Relation reports and search results, written with [`write_report`] and [`write_results`]
//!
//! Writes go through a temporary sibling file that is renamed into place.

mod cache;
mod corpus;
mod error;
mod json_file;
mod report;

pub use cache::EmbeddingCache;
pub use corpus::load_corpus;
pub use error::{StorageError, StorageResult};
pub use report::{read_report, write_report, write_results};
