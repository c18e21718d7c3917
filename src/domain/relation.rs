//! Cross-corpus relation records and their summary report.

use serde::{Deserialize, Serialize};

use super::DocumentId;

/// One target document judged similar to a source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedDocument {
    pub target_id: DocumentId,
    pub target_title: String,
    pub similarity: f64,
}

/// Nearest target documents for one source document, most similar first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationRecord {
    pub source_id: DocumentId,
    pub source_title: String,
    pub related: Vec<RelatedDocument>,
}

/// Aggregate figures over a set of relation records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationStats {
    /// Number of relation records (one per source document).
    #[serde(rename = "total_relations")]
    pub count: usize,
    /// Mean of every similarity in every record, or `None` when no record
    /// has any related document.
    #[serde(rename = "average_similarity")]
    pub mean_similarity: Option<f64>,
}

impl RelationStats {
    /// Computes the stats for `records`.
    pub fn from_records(records: &[RelationRecord]) -> Self {
        let (sum, neighbors) = records
            .iter()
            .flat_map(|record| &record.related)
            .fold((0.0, 0usize), |(sum, n), related| (sum + related.similarity, n + 1));

        Self {
            count: records.len(),
            mean_similarity: (neighbors > 0).then(|| sum / neighbors as f64),
        }
    }

    /// Total related documents across all records.
    pub fn neighbor_count(records: &[RelationRecord]) -> usize {
        records.iter().map(|r| r.related.len()).sum()
    }
}

/// Relation records plus their stats, as persisted to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationReport {
    #[serde(rename = "document_relations")]
    pub relations: Vec<RelationRecord>,
    #[serde(rename = "statistics")]
    pub stats: RelationStats,
}

impl RelationReport {
    pub fn new(relations: Vec<RelationRecord>) -> Self {
        let stats = RelationStats::from_records(&relations);
        Self { relations, stats }
    }
}
