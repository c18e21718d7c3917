//! Sentence-embedding model definitions.
//!
//! Every model here is a BERT-family sentence-transformer whose token
//! states are mean-pooled into one vector per text.

use serde::{Deserialize, Serialize};

/// Available embedding model types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ModelType {
    /// all-MiniLM-L12-v2 - twelve layers, the reference quality setting.
    #[default]
    #[serde(rename = "all-MiniLM-L12-v2")]
    AllMiniLmL12V2,
    /// all-MiniLM-L6-v2 - half the depth, roughly twice as fast.
    #[serde(rename = "all-MiniLM-L6-v2")]
    AllMiniLmL6V2,
    /// paraphrase-MiniLM-L6-v2 - tuned for paraphrase detection.
    #[serde(rename = "paraphrase-MiniLM-L6-v2")]
    ParaphraseMiniLmL6V2,
    /// BGE-Small - optimized for retrieval tasks.
    #[serde(rename = "bge-small-en-v1.5")]
    BgeSmallEnV15,
}

impl ModelType {
    /// Returns the Hugging Face model ID.
    pub fn hf_model_id(&self) -> &'static str {
        match self {
            Self::AllMiniLmL12V2 => "sentence-transformers/all-MiniLM-L12-v2",
            Self::AllMiniLmL6V2 => "sentence-transformers/all-MiniLM-L6-v2",
            Self::ParaphraseMiniLmL6V2 => "sentence-transformers/paraphrase-MiniLM-L6-v2",
            Self::BgeSmallEnV15 => "BAAI/bge-small-en-v1.5",
        }
    }

    /// Returns the expected embedding dimension.
    pub fn embedding_dim(&self) -> usize {
        384
    }

    /// Longest token sequence the model's position table accepts.
    pub fn max_seq_length(&self) -> usize {
        512
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_model_properties() {
        let model = ModelType::default();
        assert_eq!(model, ModelType::AllMiniLmL12V2);
        assert_eq!(model.embedding_dim(), 384);
        assert_eq!(model.max_seq_length(), 512);
    }

    #[test]
    fn hub_ids() {
        assert_eq!(
            ModelType::AllMiniLmL12V2.hf_model_id(),
            "sentence-transformers/all-MiniLM-L12-v2"
        );
        assert_eq!(ModelType::BgeSmallEnV15.hf_model_id(), "BAAI/bge-small-en-v1.5");
    }

    #[test]
    fn model_serialization() {
        let json = serde_json::to_string(&ModelType::BgeSmallEnV15).unwrap();
        assert_eq!(json, "\"bge-small-en-v1.5\"");

        let deserialized: ModelType = serde_json::from_str("\"all-MiniLM-L12-v2\"").unwrap();
        assert_eq!(deserialized, ModelType::AllMiniLmL12V2);
    }
}
