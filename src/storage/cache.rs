//! Persisted pairing of a corpus with its precomputed embeddings.
//!
//! On disk the cache is one JSON object:
//!
//! ```text
//! {"articles": [Document, ...], "embeddings": [[f32, ...], ...]}
//! ```
//!
//! Row `i` of `embeddings` belongs to `articles[i]`. Nothing else links the
//! two, and nothing links the cache to the corpus file it came from: if the
//! corpus changes, the cache is stale until it is rebuilt.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::corpus::parse_records;
use super::json_file::{read_json, write_json};
use super::{StorageError, StorageResult};
use crate::domain::{CorpusFormat, Document};
use crate::embedding::{EmbeddingMatrix, MatrixError};

#[derive(Serialize)]
struct CacheFileRef<'a> {
    articles: &'a [Document],
    embeddings: &'a EmbeddingMatrix,
}

#[derive(Deserialize)]
struct CacheFile {
    articles: Vec<Value>,
    embeddings: Vec<Vec<f32>>,
}

/// Documents and their embedding rows, positionally aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingCache {
    documents: Vec<Document>,
    embeddings: EmbeddingMatrix,
}

impl EmbeddingCache {
    /// Replaces the cache file at `path` with `documents` and `embeddings`.
    ///
    /// There is no append or merge: whatever was at `path` is gone.
    pub fn write(documents: &[Document], embeddings: &EmbeddingMatrix, path: &Path) -> StorageResult<()> {
        if documents.len() != embeddings.len() {
            return Err(StorageError::LengthMismatch {
                path: path.to_path_buf(),
                documents: documents.len(),
                embeddings: embeddings.len(),
            });
        }

        write_json(
            path,
            &CacheFileRef {
                articles: documents,
                embeddings,
            },
            false,
        )?;

        tracing::info!(
            path = %path.display(),
            documents = documents.len(),
            dimension = embeddings.dimension(),
            "Wrote embedding cache"
        );
        Ok(())
    }

    /// Loads and validates the cache at `path`, reading articles with the
    /// default [`CorpusFormat`].
    pub fn read(path: &Path) -> StorageResult<Self> {
        Self::read_as(path, &CorpusFormat::default())
    }

    /// Loads and validates the cache at `path`.
    ///
    /// Fails if the file is missing or unparsable, if an article lacks the
    /// id or title `format` names, if the number of embeddings differs from
    /// the number of articles, or if the embedding rows are not all the
    /// same length.
    pub fn read_as(path: &Path, format: &CorpusFormat) -> StorageResult<Self> {
        let file: CacheFile = read_json(path)?;

        if file.articles.len() != file.embeddings.len() {
            return Err(StorageError::LengthMismatch {
                path: path.to_path_buf(),
                documents: file.articles.len(),
                embeddings: file.embeddings.len(),
            });
        }

        let embeddings = EmbeddingMatrix::from_rows(file.embeddings).map_err(|err| match err {
            MatrixError::Ragged {
                row,
                expected,
                found,
            } => StorageError::RaggedEmbeddings {
                path: path.to_path_buf(),
                row,
                expected,
                found,
            },
        })?;

        // all-empty rows collapse to a zero-row matrix
        if embeddings.len() != file.articles.len() {
            return Err(StorageError::LengthMismatch {
                path: path.to_path_buf(),
                documents: file.articles.len(),
                embeddings: embeddings.len(),
            });
        }

        let documents = parse_records(path, file.articles, format)?;

        tracing::debug!(
            path = %path.display(),
            documents = documents.len(),
            "Read embedding cache"
        );
        Ok(Self {
            documents,
            embeddings,
        })
    }

    /// Writes this cache to `path`.
    pub fn save(&self, path: &Path) -> StorageResult<()> {
        Self::write(&self.documents, &self.embeddings, path)
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn embeddings(&self) -> &EmbeddingMatrix {
        &self.embeddings
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn into_parts(self) -> (Vec<Document>, EmbeddingMatrix) {
        (self.documents, self.embeddings)
    }
}
