//! Errors raised by file-backed storage.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while reading or writing corpus, cache and report files.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("file not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed JSON in {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to serialize {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid record {index} in {}: {reason}", path.display())]
    InvalidRecord {
        path: PathBuf,
        index: usize,
        reason: String,
    },

    #[error("cache integrity error in {}: {documents} articles but {embeddings} embeddings", path.display())]
    LengthMismatch {
        path: PathBuf,
        documents: usize,
        embeddings: usize,
    },

    #[error("cache integrity error in {}: embedding {row} has {found} values, expected {expected}", path.display())]
    RaggedEmbeddings {
        path: PathBuf,
        row: usize,
        expected: usize,
        found: usize,
    },
}

impl StorageError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::Missing(path.to_path_buf())
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    /// Whether the error means the data on disk cannot be trusted, as
    /// opposed to the file being absent or unreadable.
    pub fn is_integrity_error(&self) -> bool {
        matches!(
            self,
            Self::LengthMismatch { .. } | Self::RaggedEmbeddings { .. }
        )
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
