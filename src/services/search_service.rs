//! Async boundary for serving searches to a request handler.
//!
//! Searching is synchronous and CPU-bound, so it runs on the blocking
//! thread pool. Calls are serialized through one mutex-guarded
//! [`QueryService`].

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::embedding::TextEncoder;
use crate::services::{QueryService, SearchHit};

/// Response payload: `{"results": [...]}` or `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SearchResponse {
    Results { results: Vec<SearchHit> },
    Error { error: String },
}

impl SearchResponse {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Shared, cloneable handle for answering queries against one cache file.
pub struct SearchService<E> {
    inner: Arc<Mutex<QueryService<E>>>,
    cache_path: PathBuf,
    top_k: usize,
}

impl<E> Clone for SearchService<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            cache_path: self.cache_path.clone(),
            top_k: self.top_k,
        }
    }
}

impl<E: TextEncoder + Send + 'static> SearchService<E> {
    pub fn new(service: QueryService<E>, cache_path: impl Into<PathBuf>, top_k: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
            cache_path: cache_path.into(),
            top_k,
        }
    }

    /// Runs one search, turning any failure into an error payload.
    pub async fn search(&self, query: impl Into<String>) -> SearchResponse {
        let query = query.into();
        let inner = Arc::clone(&self.inner);
        let path = self.cache_path.clone();
        let top_k = self.top_k;

        let outcome = tokio::task::spawn_blocking(move || {
            let mut service = inner.blocking_lock();
            let result = service.search(&query, &path, top_k);
            (query, result)
        })
        .await;

        match outcome {
            Ok((_, Ok(results))) => SearchResponse::Results { results },
            Ok((query, Err(e))) => {
                tracing::warn!(query = %query, error = %e, "Search failed");
                SearchResponse::Error {
                    error: e.to_string(),
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Search task failed");
                SearchResponse::Error {
                    error: e.to_string(),
                }
            }
        }
    }
}
