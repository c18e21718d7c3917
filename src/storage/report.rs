//! Relation reports and search result files.

use std::path::Path;

use serde::Serialize;

use super::json_file::{read_json, write_json};
use super::StorageResult;
use crate::domain::RelationReport;

/// Writes `report` to `path` as indented JSON, replacing any existing file.
pub fn write_report(report: &RelationReport, path: &Path) -> StorageResult<()> {
    write_json(path, report, true)?;
    tracing::info!(
        path = %path.display(),
        relations = report.stats.count,
        average_similarity = ?report.stats.mean_similarity,
        "Wrote relation report"
    );
    Ok(())
}

/// Reads a report previously written by [`write_report`].
pub fn read_report(path: &Path) -> StorageResult<RelationReport> {
    read_json(path)
}

/// Writes search results to `path` as an indented JSON array.
pub fn write_results<T: Serialize>(results: &[T], path: &Path) -> StorageResult<()> {
    write_json(path, results, true)?;
    tracing::info!(path = %path.display(), results = results.len(), "Wrote search results");
    Ok(())
}
