//! Embedding engine for semantic search.
//!
//! Uses Candle to run a sentence-transformer locally. Texts are encoded in
//! contiguous batches; each batch is tokenized, run through the model, and
//! mean-pooled into one vector per text.

use std::path::{Path, PathBuf};

use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

use crate::embedding::pooling::mean_pool;
use crate::embedding::{EmbeddingMatrix, ModelType};

/// Errors that can occur while loading or running an encoder.
#[derive(Debug, Error)]
pub enum EncoderError {
    #[error("batch size must be at least 1")]
    InvalidBatchSize,

    #[error("invalid encoder config: {0}")]
    InvalidConfig(String),

    #[error("model assets unavailable: {0}")]
    Assets(String),

    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    #[error("inference error: {0}")]
    Inference(#[from] candle_core::Error),

    #[error("encoder returned {found} rows for {expected} inputs")]
    RowCount { expected: usize, found: usize },

    #[error("encoder returned a {found}-d vector, expected {expected}-d")]
    Dimension { expected: usize, found: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid model config: {0}")]
    ModelConfig(#[from] serde_json::Error),
}

/// Result type for encoder operations.
pub type EncoderResult<T> = Result<T, EncoderError>;

/// Anything that turns texts into fixed-dimension vectors.
///
/// Implementors provide single-batch inference; [`TextEncoder::encode`]
/// handles chunking and assembly so batch size never changes the output.
pub trait TextEncoder {
    /// Dimension of every vector this encoder produces.
    fn dimension(&self) -> usize;

    /// Encodes one contiguous batch, returning one row per text in order.
    fn encode_batch(&self, texts: &[&str]) -> EncoderResult<Vec<Vec<f32>>>;

    /// Encodes `texts` in chunks of `batch_size`.
    ///
    /// Rows come back in input order. A failed batch fails the whole call;
    /// nothing from earlier batches is returned.
    fn encode(&self, texts: &[&str], batch_size: usize) -> EncoderResult<EmbeddingMatrix> {
        if batch_size == 0 {
            return Err(EncoderError::InvalidBatchSize);
        }

        let dimension = self.dimension();
        let mut matrix = EmbeddingMatrix::empty(dimension);
        let batches = texts.len().div_ceil(batch_size);

        for (batch_idx, batch) in texts.chunks(batch_size).enumerate() {
            tracing::debug!(batch = batch_idx + 1, batches, size = batch.len(), "Encoding batch");
            let rows = self.encode_batch(batch)?;
            if rows.len() != batch.len() {
                return Err(EncoderError::RowCount {
                    expected: batch.len(),
                    found: rows.len(),
                });
            }
            for row in &rows {
                matrix.push_row(row).map_err(|_| EncoderError::Dimension {
                    expected: dimension,
                    found: row.len(),
                })?;
            }
        }

        Ok(matrix)
    }
}

/// Configuration for the embedding engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Which sentence-transformer to run.
    pub model: ModelType,
    /// Local directory holding `config.json`, `tokenizer.json` and
    /// `model.safetensors`. When unset the files come from the Hugging Face hub.
    pub model_path: Option<PathBuf>,
    /// Hub revision to download.
    pub revision: String,
    /// Maximum sequence length for tokenization; longer inputs are truncated.
    pub max_seq_length: usize,
    /// Texts per inference batch.
    pub batch_size: usize,
    /// Whether to use GPU acceleration if available.
    pub use_accelerator: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        let model = ModelType::default();
        Self {
            model,
            model_path: None,
            revision: "main".to_string(),
            max_seq_length: model.max_seq_length(),
            batch_size: 16,
            use_accelerator: true,
        }
    }
}

impl EncoderConfig {
    /// Checks values that would otherwise fail deep inside inference.
    pub fn validate(&self) -> EncoderResult<()> {
        if self.batch_size == 0 {
            return Err(EncoderError::InvalidBatchSize);
        }
        if self.max_seq_length == 0 || self.max_seq_length > self.model.max_seq_length() {
            return Err(EncoderError::InvalidConfig(format!(
                "max_seq_length must be in 1..={}, got {}",
                self.model.max_seq_length(),
                self.max_seq_length
            )));
        }
        Ok(())
    }
}

/// Picks the compute device: CUDA, then Metal, then CPU.
///
/// Accelerators are only considered when the crate is built with the
/// matching `cuda` / `metal` feature.
pub fn select_device(use_accelerator: bool) -> EncoderResult<Device> {
    if use_accelerator {
        if candle_core::utils::cuda_is_available() {
            return Ok(Device::new_cuda(0)?);
        }
        if candle_core::utils::metal_is_available() {
            return Ok(Device::new_metal(0)?);
        }
    }
    Ok(Device::Cpu)
}

#[derive(Deserialize)]
struct HiddenSize {
    hidden_size: usize,
}

/// Rejects checkpoints whose width differs from what `model` declares.
fn check_dimension(model: ModelType, hidden_size: usize) -> EncoderResult<()> {
    if hidden_size != model.embedding_dim() {
        return Err(EncoderError::Dimension {
            expected: model.embedding_dim(),
            found: hidden_size,
        });
    }
    Ok(())
}

/// Paths of the three files a BERT checkpoint needs.
#[derive(Debug, Clone)]
struct ModelFiles {
    config: PathBuf,
    tokenizer: PathBuf,
    weights: PathBuf,
}

impl ModelFiles {
    fn in_dir(dir: &Path) -> EncoderResult<Self> {
        let files = Self {
            config: dir.join("config.json"),
            tokenizer: dir.join("tokenizer.json"),
            weights: dir.join("model.safetensors"),
        };
        for path in [&files.config, &files.tokenizer, &files.weights] {
            if !path.is_file() {
                return Err(EncoderError::Assets(format!("missing {}", path.display())));
            }
        }
        Ok(files)
    }

    fn from_hub(model: ModelType, revision: &str) -> EncoderResult<Self> {
        let api = Api::new().map_err(|e| EncoderError::Assets(e.to_string()))?;
        let repo = api.repo(Repo::with_revision(
            model.hf_model_id().to_string(),
            RepoType::Model,
            revision.to_string(),
        ));
        let fetch = |name: &str| {
            repo.get(name)
                .map_err(|e| EncoderError::Assets(format!("{}/{name}: {e}", model.hf_model_id())))
        };
        Ok(Self {
            config: fetch("config.json")?,
            tokenizer: fetch("tokenizer.json")?,
            weights: fetch("model.safetensors")?,
        })
    }
}

/// Sentence-transformer encoder backed by a Candle BERT model.
///
/// The model and tokenizer are loaded once in [`BertEncoder::load`] and
/// released when the encoder is dropped. Per-batch tensors never outlive
/// the batch that created them.
pub struct BertEncoder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    config: EncoderConfig,
    dimension: usize,
}

impl std::fmt::Debug for BertEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BertEncoder")
            .field("model", &self.config.model)
            .field("device", &self.device)
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

impl BertEncoder {
    /// Resolves model files, loads weights and configures the tokenizer.
    pub fn load(config: EncoderConfig) -> EncoderResult<Self> {
        config.validate()?;

        let files = match &config.model_path {
            Some(dir) => ModelFiles::in_dir(dir)?,
            None => ModelFiles::from_hub(config.model, &config.revision)?,
        };
        let device = select_device(config.use_accelerator)?;
        tracing::info!(
            model_id = config.model.hf_model_id(),
            device = ?device,
            "Loading embedding model"
        );

        let raw_config = std::fs::read_to_string(&files.config)?;
        let bert_config: BertConfig = serde_json::from_str(&raw_config)?;
        let dimension = serde_json::from_str::<HiddenSize>(&raw_config)?.hidden_size;
        check_dimension(config.model, dimension)?;

        let mut tokenizer = Tokenizer::from_file(&files.tokenizer)
            .map_err(|e| EncoderError::Tokenizer(e.to_string()))?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            ..Default::default()
        }));
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: config.max_seq_length,
                ..Default::default()
            }))
            .map_err(|e| EncoderError::Tokenizer(e.to_string()))?;

        // SAFETY: the weights file is opened read-only and not modified
        // while the mapping is alive.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[&files.weights], DTYPE, &device)? };
        let model = BertModel::load(vb, &bert_config)?;

        Ok(Self {
            model,
            tokenizer,
            device,
            config,
            dimension,
        })
    }

    /// Runs tokenizer + model + pooling for one batch.
    ///
    /// Every tensor created here is dropped before the function returns;
    /// the pooled values are copied to host memory first.
    fn infer(&self, texts: &[&str]) -> EncoderResult<Vec<Vec<f32>>> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| EncoderError::Tokenizer(e.to_string()))?;

        let ids = encodings
            .iter()
            .map(|enc| Tensor::new(enc.get_ids(), &self.device))
            .collect::<candle_core::Result<Vec<_>>>()?;
        let masks = encodings
            .iter()
            .map(|enc| Tensor::new(enc.get_attention_mask(), &self.device))
            .collect::<candle_core::Result<Vec<_>>>()?;

        let input_ids = Tensor::stack(&ids, 0)?;
        let attention_mask = Tensor::stack(&masks, 0)?;
        let token_type_ids = input_ids.zeros_like()?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = mean_pool(&hidden, &attention_mask)?;

        Ok(pooled.to_vec2::<f32>()?)
    }
}

impl TextEncoder for BertEncoder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode_batch(&self, texts: &[&str]) -> EncoderResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.infer(texts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::testing::{KeywordEncoder, ScriptedEncoder};

    #[test]
    fn encode_preserves_order_and_dimension() {
        let encoder = KeywordEncoder::new(&["alpha", "beta", "gamma"]);
        let matrix = encoder.encode(&["gamma", "alpha", "beta alpha"], 2).unwrap();

        assert_eq!(matrix.len(), 3);
        assert_eq!(matrix.dimension(), encoder.dimension());
        assert_eq!(matrix.row(0).unwrap()[2], 1.0);
        assert_eq!(matrix.row(1).unwrap()[0], 1.0);
        assert_eq!(matrix.row(2).unwrap()[..2], [0.5, 0.5]);
    }

    #[test]
    fn batch_size_does_not_change_output() {
        let encoder = KeywordEncoder::new(&["cat", "dog", "sat", "ran"]);
        let texts = ["cat sat", "dog ran", "cat", "", "ran ran dog", "bird"];

        let one = encoder.encode(&texts, 1).unwrap();
        let many = encoder.encode(&texts, 16).unwrap();
        let three = encoder.encode(&texts, 3).unwrap();

        assert_eq!(one, many);
        assert_eq!(one, three);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let encoder = KeywordEncoder::new(&["cat"]);
        assert!(matches!(
            encoder.encode(&["cat"], 0),
            Err(EncoderError::InvalidBatchSize)
        ));
    }

    #[test]
    fn empty_input_gives_empty_matrix() {
        let encoder = KeywordEncoder::new(&["cat"]);
        let matrix = encoder.encode(&[], 4).unwrap();
        assert!(matrix.is_empty());
        assert_eq!(matrix.dimension(), encoder.dimension());
    }

    #[test]
    fn failing_batch_fails_the_call() {
        let encoder = ScriptedEncoder::new(2, |call, texts| {
            if call == 1 {
                Err(EncoderError::Tokenizer("bad input".into()))
            } else {
                Ok(texts.iter().map(|_| vec![0.0, 1.0]).collect())
            }
        });

        let err = encoder.encode(&["a", "b", "c"], 1).unwrap_err();
        assert!(matches!(err, EncoderError::Tokenizer(_)));
        assert_eq!(encoder.calls(), 2);
    }

    #[test]
    fn short_batch_is_an_error() {
        let encoder = ScriptedEncoder::new(2, |_, _| Ok(vec![vec![0.0, 1.0]]));

        let err = encoder.encode(&["a", "b"], 2).unwrap_err();
        assert!(matches!(
            err,
            EncoderError::RowCount {
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn wrong_dimension_is_an_error() {
        let encoder =
            ScriptedEncoder::new(3, |_, texts| Ok(texts.iter().map(|_| vec![0.0, 1.0]).collect()));

        let err = encoder.encode(&["a"], 1).unwrap_err();
        assert!(matches!(
            err,
            EncoderError::Dimension {
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn checkpoint_width_must_match_model() {
        assert!(check_dimension(ModelType::AllMiniLmL12V2, 384).is_ok());

        let err = check_dimension(ModelType::AllMiniLmL12V2, 768).unwrap_err();
        assert!(matches!(
            err,
            EncoderError::Dimension {
                expected: 384,
                found: 768
            }
        ));
    }

    #[test]
    fn default_config() {
        let config = EncoderConfig::default();
        assert_eq!(config.model, ModelType::AllMiniLmL12V2);
        assert_eq!(config.max_seq_length, 512);
        assert_eq!(config.batch_size, 16);
        assert!(config.model_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_validation() {
        let config = EncoderConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(EncoderError::InvalidBatchSize)));

        let config = EncoderConfig {
            max_seq_length: 4096,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(EncoderError::InvalidConfig(_))));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: EncoderConfig =
            serde_json::from_str(r#"{"model": "all-MiniLM-L6-v2", "batch_size": 4}"#).unwrap();
        assert_eq!(config.model, ModelType::AllMiniLmL6V2);
        assert_eq!(config.batch_size, 4);
        assert_eq!(config.revision, "main");
    }

    #[test]
    fn cpu_device_when_accelerator_disabled() {
        let device = select_device(false).unwrap();
        assert!(device.is_cpu());
    }

    #[test]
    fn missing_local_model_dir_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = EncoderConfig {
            model_path: Some(dir.path().to_path_buf()),
            use_accelerator: false,
            ..Default::default()
        };
        let err = BertEncoder::load(config).unwrap_err();
        assert!(matches!(err, EncoderError::Assets(_)));
    }

    #[test]
    #[ignore = "downloads sentence-transformers weights from the Hugging Face hub"]
    fn real_model_batches_match() {
        let encoder = BertEncoder::load(EncoderConfig {
            use_accelerator: false,
            ..Default::default()
        })
        .unwrap();
        let texts = ["cat sat", "dog ran", "cat slept", ""];

        let one = encoder.encode(&texts, 1).unwrap();
        let all = encoder.encode(&texts, 16).unwrap();

        assert_eq!(one.len(), texts.len());
        assert_eq!(one.dimension(), 384);
        for (a, b) in one.as_slice().iter().zip(all.as_slice()) {
            assert!((a - b).abs() < 1e-4, "{a} vs {b}");
        }
    }
}
