//! docsim - Document similarity search over sentence embeddings
//!
//! This crate encodes document corpora with a local sentence-transformer,
//! persists the embeddings alongside the documents, and answers two kinds
//! of question: which documents in one corpus are closest to each document
//! in another, and which cached documents best match a free-text query.

pub mod config;
pub mod domain;
pub mod embedding;
pub mod services;
pub mod storage;
