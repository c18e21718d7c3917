//! Domain types for documents, corpora and cross-corpus relations.
//!
//! These types are plain data: loading and persisting them lives in
//! [`crate::storage`], computing them in [`crate::services`].

mod document;
mod relation;
mod types;

pub use document::{Corpus, CorpusFormat, Document};
pub use relation::{RelatedDocument, RelationRecord, RelationReport, RelationStats};
pub use types::DocumentId;
