//! Full-corpus encode pass that (re)writes the embedding cache.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::domain::Corpus;
use crate::embedding::TextEncoder;
use crate::services::ServiceResult;
use crate::storage::EmbeddingCache;

/// What a cache rebuild produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSummary {
    pub path: PathBuf,
    pub documents: usize,
    pub dimension: usize,
}

/// Encodes every document in `corpus` and replaces the cache at `path`.
///
/// Nothing is written unless every batch encodes successfully.
pub fn rebuild_cache<E: TextEncoder + ?Sized>(
    encoder: &E,
    corpus: &Corpus,
    batch_size: usize,
    path: &Path,
) -> ServiceResult<CacheSummary> {
    let started = Instant::now();
    let inputs = corpus.encoder_inputs();
    let texts: Vec<&str> = inputs.iter().map(String::as_str).collect();

    tracing::info!(documents = texts.len(), batch_size, "Encoding corpus");
    let embeddings = encoder.encode(&texts, batch_size)?;

    EmbeddingCache::write(&corpus.documents, &embeddings, path)?;

    tracing::info!(
        path = %path.display(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Embedding cache rebuilt"
    );
    Ok(CacheSummary {
        path: path.to_path_buf(),
        documents: corpus.len(),
        dimension: embeddings.dimension(),
    })
}
