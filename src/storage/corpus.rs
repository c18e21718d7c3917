//! Corpus file loading.
//!
//! A corpus file is a JSON array of objects. Which keys hold the id, title
//! and text is described by a [`CorpusFormat`]; the records themselves are
//! kept unmodified.

use std::path::Path;

use serde_json::Value;

use super::json_file::read_json;
use super::{StorageError, StorageResult};
use crate::domain::{Corpus, CorpusFormat, Document};

/// Loads the corpus at `path`, mapping fields as `format` describes.
pub fn load_corpus(path: &Path, format: &CorpusFormat) -> StorageResult<Corpus> {
    let records: Vec<Value> = read_json(path)?;
    let documents = parse_records(path, records, format)?;

    tracing::info!(
        path = %path.display(),
        documents = documents.len(),
        text_field = %format.text_field,
        "Loaded corpus"
    );
    Ok(Corpus::new(documents, format.separator.clone()))
}

/// Reads every record as a [`Document`], naming the first bad one.
pub(crate) fn parse_records(
    path: &Path,
    records: Vec<Value>,
    format: &CorpusFormat,
) -> StorageResult<Vec<Document>> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            Document::from_record(record, format).map_err(|reason| StorageError::InvalidRecord {
                path: path.to_path_buf(),
                index,
                reason,
            })
        })
        .collect()
}
