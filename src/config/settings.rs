//! Settings for corpora, the encoder, search and relation extraction.
//!
//! Settings are persisted as JSON to `<config dir>/docsim/settings.json`
//! (XDG or platform equivalent) unless a path is given explicitly. Every
//! section has defaults, so a partial file is valid.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::CorpusFormat;
use crate::embedding::EncoderConfig;
use crate::services::IndexPolicy;

/// Errors that can occur while loading or saving settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid settings in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("settings file already exists: {} (use --force to overwrite)", .0.display())]
    AlreadyExists(PathBuf),

    #[error("could not determine a configuration directory")]
    NoConfigDir,
}

/// Result type for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Top-level settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Embedding model and batching.
    pub encoder: EncoderConfig,
    /// Where the corpora live and how to read them.
    pub corpora: CorpusSettings,
    /// Embedding cache and query settings.
    pub search: SearchSettings,
    /// Cross-corpus relation settings.
    pub relations: RelationSettings,
}

/// One corpus file and the layout of its records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusSource {
    /// Path to the JSON array of records.
    pub path: PathBuf,
    /// Which fields hold id, title and text.
    pub format: CorpusFormat,
}

/// The two corpora the engine works with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusSettings {
    /// Corpus whose documents are related to the target (one record each).
    pub source: CorpusSource,
    /// Corpus that is cached, searched and related against.
    pub target: CorpusSource,
}

impl Default for CorpusSettings {
    fn default() -> Self {
        Self {
            source: CorpusSource {
                path: PathBuf::from("arxiv_papers_clear.json"),
                format: CorpusFormat::arxiv(),
            },
            target: CorpusSource {
                path: PathBuf::from("sorted_hackernews.json"),
                format: CorpusFormat::hackernews(),
            },
        }
    }
}

/// Search configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Embedding cache built from the target corpus.
    pub cache_path: PathBuf,
    /// Number of results per query.
    pub top_k: usize,
    /// Whether the index is rebuilt per query or kept in memory.
    pub index_policy: IndexPolicy,
    /// Where `search` writes its ranked results.
    pub results_path: PathBuf,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            cache_path: PathBuf::from("data2/article_embeddings.json"),
            top_k: 10,
            index_policy: IndexPolicy::default(),
            results_path: PathBuf::from("data2/search_results.json"),
        }
    }
}

/// Relation extraction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationSettings {
    /// Related target documents kept per source document.
    pub k: usize,
    /// Where the relation report is written.
    pub report_path: PathBuf,
}

impl Default for RelationSettings {
    fn default() -> Self {
        Self {
            k: 5,
            report_path: PathBuf::from("data2/document_relations.json"),
        }
    }
}

impl Settings {
    /// Default settings file location for this platform.
    pub fn default_path() -> SettingsResult<PathBuf> {
        ProjectDirs::from("", "", "docsim")
            .map(|dirs| dirs.config_dir().join("settings.json"))
            .ok_or(SettingsError::NoConfigDir)
    }

    /// Loads settings from `path`.
    pub fn load_from(path: &Path) -> SettingsResult<Self> {
        let bytes = fs::read(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads settings from `path` if given, otherwise from the default
    /// location. A missing default file yields [`Settings::default`]; a
    /// missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> SettingsResult<Self> {
        if let Some(path) = path {
            return Self::load_from(path);
        }

        let path = match Self::default_path() {
            Ok(path) => path,
            Err(_) => return Ok(Self::default()),
        };
        if path.is_file() {
            tracing::debug!(path = %path.display(), "Loading settings");
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Saves settings to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> SettingsResult<()> {
        let io = |source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(io)
    }

    /// Writes default settings to `path`, refusing to overwrite unless `force`.
    pub fn init_config_file(path: &Path, force: bool) -> SettingsResult<()> {
        if !force && path.exists() {
            return Err(SettingsError::AlreadyExists(path.to_path_buf()));
        }
        Self::default().save(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::ModelType;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.encoder.validate().is_ok());
        assert_eq!(settings.encoder.model, ModelType::AllMiniLmL12V2);
        assert_eq!(settings.encoder.batch_size, 16);
        assert_eq!(settings.search.top_k, 10);
        assert_eq!(settings.relations.k, 5);
        assert_eq!(settings.corpora.target.format, CorpusFormat::hackernews());
        assert_eq!(settings.corpora.source.format, CorpusFormat::arxiv());
    }

    #[test]
    fn settings_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("settings.json");

        let mut settings = Settings::default();
        settings.search.index_policy = IndexPolicy::ResidentIndex;
        settings.search.top_k = 3;
        settings.encoder.model = ModelType::BgeSmallEnV15;
        settings.save(&path).unwrap();

        assert_eq!(Settings::load(Some(&path)).unwrap(), settings);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"search": {"index_policy": "resident-index"}, "encoder": {"batch_size": 4}}"#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();

        assert_eq!(settings.search.index_policy, IndexPolicy::ResidentIndex);
        assert_eq!(settings.search.top_k, 10);
        assert_eq!(settings.encoder.batch_size, 4);
        assert_eq!(settings.encoder.max_seq_length, 512);
        assert_eq!(settings.relations, RelationSettings::default());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(Some(&dir.path().join("nope.json"))).unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"search": {"top_k": "ten"}}"#).unwrap();

        assert!(matches!(
            Settings::load_from(&path),
            Err(SettingsError::Parse { .. })
        ));
    }

    #[test]
    fn init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        Settings::init_config_file(&path, false).unwrap();
        assert!(matches!(
            Settings::init_config_file(&path, false),
            Err(SettingsError::AlreadyExists(_))
        ));
        Settings::init_config_file(&path, true).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), Settings::default());
    }
}
