//! Cross-corpus relation extraction.
//!
//! For every document in a source corpus, find its `k` nearest documents in
//! a target corpus. The target is encoded once and indexed; the source is
//! encoded and queried one batch at a time.

use std::time::Instant;

use crate::domain::{
    Corpus, Document, RelatedDocument, RelationRecord, RelationReport, RelationStats,
};
use crate::embedding::{EmbeddingMatrix, EncoderError, TextEncoder, VectorIndex};
use crate::services::neighbors::resolve;
use crate::services::ServiceResult;
use crate::storage::EmbeddingCache;

/// Relates documents of one corpus to their nearest neighbors in another.
#[derive(Debug)]
pub struct RelationExtractor<'a, E: ?Sized> {
    encoder: &'a E,
    batch_size: usize,
}

impl<'a, E: TextEncoder + ?Sized> RelationExtractor<'a, E> {
    pub fn new(encoder: &'a E, batch_size: usize) -> Self {
        Self {
            encoder,
            batch_size,
        }
    }

    /// Encodes both corpora and relates every source document to `target`.
    pub fn extract(&self, source: &Corpus, target: &Corpus, k: usize) -> ServiceResult<RelationReport> {
        let inputs = target.encoder_inputs();
        let texts: Vec<&str> = inputs.iter().map(String::as_str).collect();
        tracing::info!(documents = texts.len(), "Encoding target corpus");
        let embeddings = self.encoder.encode(&texts, self.batch_size)?;

        self.extract_against(source, &target.documents, &embeddings, k)
    }

    /// Relates every source document to targets already in the cache.
    pub fn extract_from_cache(
        &self,
        source: &Corpus,
        cache: &EmbeddingCache,
        k: usize,
    ) -> ServiceResult<RelationReport> {
        self.extract_against(source, cache.documents(), cache.embeddings(), k)
    }

    /// Relates every source document to `targets`, whose vectors are the
    /// rows of `target_embeddings` in the same order.
    ///
    /// Hits without a matching target document are dropped, so each record
    /// holds at most `min(k, targets.len())` entries.
    pub fn extract_against(
        &self,
        source: &Corpus,
        targets: &[Document],
        target_embeddings: &EmbeddingMatrix,
        k: usize,
    ) -> ServiceResult<RelationReport> {
        if self.batch_size == 0 {
            return Err(EncoderError::InvalidBatchSize.into());
        }

        let started = Instant::now();
        let index = VectorIndex::build(target_embeddings);
        let inputs = source.encoder_inputs();
        let mut relations = Vec::with_capacity(source.len());

        for (documents, texts) in source
            .documents
            .chunks(self.batch_size)
            .zip(inputs.chunks(self.batch_size))
        {
            let texts: Vec<&str> = texts.iter().map(String::as_str).collect();
            let queries = self.encoder.encode(&texts, self.batch_size)?;
            let hits = index.search(&queries, k)?;

            for (document, neighbors) in documents.iter().zip(hits) {
                let related = resolve(targets, neighbors)
                    .map(|(target, similarity)| RelatedDocument {
                        target_id: target.id.clone(),
                        target_title: target.title.clone(),
                        similarity,
                    })
                    .collect();
                relations.push(RelationRecord {
                    source_id: document.id.clone(),
                    source_title: document.title.clone(),
                    related,
                });
            }
        }

        let report = RelationReport::new(relations);
        tracing::info!(
            sources = report.stats.count,
            targets = targets.len(),
            k,
            neighbors = RelationStats::neighbor_count(&report.relations),
            average_similarity = ?report.stats.mean_similarity,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Extracted relations"
        );
        Ok(report)
    }
}
