//! Single-query search against the embedding cache.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::domain::{CorpusFormat, Document};
use crate::embedding::{EmbeddingMatrix, TextEncoder, VectorIndex};
use crate::services::neighbors::resolve;
use crate::services::{ServiceError, ServiceResult};
use crate::storage::{EmbeddingCache, StorageError};

/// When the search index over the cache is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IndexPolicy {
    /// Read the cache and build a fresh index on every search.
    #[default]
    RebuildPerCall,
    /// Keep the cache and index in memory, reloading when the file changes.
    ///
    /// A change is noticed through the file's length, modification time
    /// and (on Unix) inode. Cache writes rename a new file into place, so
    /// every rewrite gets a new inode. Elsewhere, a same-length rewrite
    /// within the filesystem's timestamp granularity goes unnoticed.
    ResidentIndex,
}

/// A cached document and how similar it is to the query.
///
/// Serializes as the document's source record with `similarity` set,
/// replacing any `similarity` field the record already had.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub document: Document,
    pub similarity: f64,
}

impl Serialize for SearchHit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let record = self.document.record();
        let mut map = serializer.serialize_map(None)?;
        for (key, value) in record.iter().filter(|(key, _)| *key != "similarity") {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry("similarity", &self.similarity)?;
        map.end()
    }
}

/// Identifies one version of a file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    len: u64,
    modified: Option<SystemTime>,
    file_id: Option<u64>,
}

impl FileStamp {
    fn of(path: &Path) -> ServiceResult<Self> {
        let meta = fs::metadata(path).map_err(|e| StorageError::io(path, e))?;
        Ok(Self {
            len: meta.len(),
            modified: meta.modified().ok(),
            file_id: file_id(&meta),
        })
    }
}

#[cfg(unix)]
fn file_id(meta: &fs::Metadata) -> Option<u64> {
    use std::os::unix::fs::MetadataExt;
    Some(meta.ino())
}

#[cfg(not(unix))]
fn file_id(_meta: &fs::Metadata) -> Option<u64> {
    None
}

#[derive(Debug)]
struct ResidentIndex {
    path: PathBuf,
    stamp: FileStamp,
    documents: Vec<Document>,
    index: VectorIndex,
}

impl ResidentIndex {
    fn load(path: &Path, format: &CorpusFormat, stamp: FileStamp) -> ServiceResult<Self> {
        let (documents, embeddings) = EmbeddingCache::read_as(path, format)?.into_parts();
        tracing::info!(
            path = %path.display(),
            documents = documents.len(),
            "Loaded resident search index"
        );
        Ok(Self {
            path: path.to_path_buf(),
            stamp,
            documents,
            index: VectorIndex::build(&embeddings),
        })
    }

    /// Returns the index held in `slot`, reloading it if it was built from
    /// another path or an older version of the file.
    fn refresh<'s>(
        slot: &'s mut Option<Self>,
        path: &Path,
        format: &CorpusFormat,
    ) -> ServiceResult<&'s Self> {
        let stamp = FileStamp::of(path)?;
        let resident = match slot.take() {
            Some(resident) if resident.path == path && resident.stamp == stamp => resident,
            previous => {
                if previous.is_some() {
                    tracing::warn!(path = %path.display(), "Embedding cache changed, reloading index");
                }
                Self::load(path, format, stamp)?
            }
        };
        Ok(slot.insert(resident))
    }
}

/// Answers free-text queries with the most similar cached documents.
#[derive(Debug)]
pub struct QueryService<E> {
    encoder: E,
    policy: IndexPolicy,
    format: CorpusFormat,
    resident: Option<ResidentIndex>,
}

impl<E: TextEncoder> QueryService<E> {
    pub fn new(encoder: E, policy: IndexPolicy) -> Self {
        Self {
            encoder,
            policy,
            format: CorpusFormat::default(),
            resident: None,
        }
    }

    /// Sets the format used to read id, title and text from cached articles.
    pub fn with_format(mut self, format: CorpusFormat) -> Self {
        self.format = format;
        self.resident = None;
        self
    }

    /// Returns up to `top_k` cached documents most similar to `query`,
    /// most similar first.
    ///
    /// The cache file is only read, never written.
    pub fn search(&mut self, query: &str, cache_path: &Path, top_k: usize) -> ServiceResult<Vec<SearchHit>> {
        if query.trim().is_empty() {
            return Err(ServiceError::EmptyQuery);
        }

        let hits = match self.policy {
            IndexPolicy::RebuildPerCall => {
                let (documents, embeddings) = EmbeddingCache::read_as(cache_path, &self.format)?.into_parts();
                let index = VectorIndex::build(&embeddings);
                let queries = self.encoder.encode(&[query], 1)?;
                rank(&documents, &index, &queries, top_k)?
            }
            IndexPolicy::ResidentIndex => {
                let resident = ResidentIndex::refresh(&mut self.resident, cache_path, &self.format)?;
                let queries = self.encoder.encode(&[query], 1)?;
                rank(&resident.documents, &resident.index, &queries, top_k)?
            }
        };

        tracing::debug!(query, top_k, hits = hits.len(), "Search complete");
        Ok(hits)
    }
}

fn rank(
    documents: &[Document],
    index: &VectorIndex,
    queries: &EmbeddingMatrix,
    top_k: usize,
) -> ServiceResult<Vec<SearchHit>> {
    let neighbors = index
        .search(queries, top_k)?
        .into_iter()
        .next()
        .unwrap_or_default();

    Ok(resolve(documents, neighbors)
        .map(|(document, similarity)| SearchHit {
            document: document.clone(),
            similarity,
        })
        .collect())
}
