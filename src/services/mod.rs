//! Services layer.
//!
//! Orchestrates the encoder, the vector index and file storage into the
//! operations the binary and any request handler call.
//!
//! # Services Overview
//!
//! - [`rebuild_cache`]: Encodes a corpus and replaces the embedding cache
//! - [`RelationExtractor`]: Relates each document of one corpus to its nearest documents in another
//! - [`QueryService`]: Searches the embedding cache with a free-text query
//! - [`SearchService`]: Async, shareable wrapper around [`QueryService`]

mod cache_service;
mod error;
mod neighbors;
mod query_service;
mod relation_service;
mod search_service;

pub use cache_service::{rebuild_cache, CacheSummary};
pub use error::{ServiceError, ServiceResult};
pub use query_service::{IndexPolicy, QueryService, SearchHit};
pub use relation_service::RelationExtractor;
pub use search_service::{SearchResponse, SearchService};
