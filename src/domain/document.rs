//! Documents and the corpora they belong to.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use super::DocumentId;

/// A single document: identity, title and body text, plus the record it
/// was read from.
///
/// The record is kept exactly as the corpus file had it and is what gets
/// serialized, so a document round-trips through the cache unchanged. `id`,
/// `title` and `text` are read out of it through a [`CorpusFormat`].
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    /// Summary or body text. Empty when the record has none.
    pub text: String,
    record: Map<String, Value>,
}

impl Document {
    /// Builds a document whose record holds `id`, `title` and `text` keys.
    pub fn new(id: impl Into<DocumentId>, title: impl Into<String>, text: impl Into<String>) -> Self {
        let (id, title, text) = (id.into(), title.into(), text.into());
        let mut record = Map::new();
        record.insert("id".to_string(), Value::String(id.0.clone()));
        record.insert("title".to_string(), Value::String(title.clone()));
        record.insert("text".to_string(), Value::String(text.clone()));
        Self {
            id,
            title,
            text,
            record,
        }
    }

    /// Reads a document out of one corpus record.
    ///
    /// The id may be a string or a number; the title is required; a missing
    /// or null text field reads as empty. The record itself is kept as is.
    pub fn from_record(record: Value, format: &CorpusFormat) -> Result<Self, String> {
        let Value::Object(record) = record else {
            return Err(format!("expected a JSON object, got {}", kind(&record)));
        };

        let id = match record.get(&format.id_field) {
            Some(Value::String(s)) => DocumentId(s.clone()),
            Some(Value::Number(n)) => DocumentId(n.to_string()),
            Some(other) => {
                return Err(format!(
                    "field `{}` must be a string or number, got {}",
                    format.id_field,
                    kind(other)
                ))
            }
            None => return Err(format!("missing field `{}`", format.id_field)),
        };

        let title = match record.get(&format.title_field) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                return Err(format!(
                    "field `{}` must be a string, got {}",
                    format.title_field,
                    kind(other)
                ))
            }
            None => return Err(format!("missing field `{}`", format.title_field)),
        };

        let text = match record.get(&format.text_field) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => {
                return Err(format!(
                    "field `{}` must be a string, got {}",
                    format.text_field,
                    kind(other)
                ))
            }
        };

        Ok(Self {
            id,
            title,
            text,
            record,
        })
    }

    /// Sets a field on the record. Does not change `id`, `title` or `text`.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.record.insert(key.into(), value.into());
        self
    }

    /// Looks up a field of the source record.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.record.get(key)
    }

    /// The source record.
    pub fn record(&self) -> &Map<String, Value> {
        &self.record
    }

    /// The text handed to the encoder: title and body joined by `separator`.
    pub fn encoder_input(&self, separator: &str) -> String {
        format!("{}{}{}", self.title, separator, self.text)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.record.serialize(serializer)
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Describes where a corpus file keeps each document field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusFormat {
    /// Field holding the identifier (string or number).
    pub id_field: String,
    /// Field holding the title.
    pub title_field: String,
    /// Field holding the body text or summary. Missing values read as empty.
    pub text_field: String,
    /// Placed between title and text when building encoder input.
    pub separator: String,
}

impl CorpusFormat {
    /// Story records with a generated summary in `aiSummary`.
    pub fn hackernews() -> Self {
        Self {
            id_field: "id".to_string(),
            title_field: "title".to_string(),
            text_field: "aiSummary".to_string(),
            separator: " ".to_string(),
        }
    }

    /// Paper records with their abstract in `summary`.
    pub fn arxiv() -> Self {
        Self {
            id_field: "id".to_string(),
            title_field: "title".to_string(),
            text_field: "summary".to_string(),
            separator: ". ".to_string(),
        }
    }
}

impl Default for CorpusFormat {
    fn default() -> Self {
        Self::hackernews()
    }
}

/// An ordered collection of documents plus how to turn each into encoder input.
#[derive(Debug, Clone, PartialEq)]
pub struct Corpus {
    pub documents: Vec<Document>,
    pub separator: String,
}

impl Corpus {
    pub fn new(documents: Vec<Document>, separator: impl Into<String>) -> Self {
        Self {
            documents,
            separator: separator.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Encoder inputs, one per document, in document order.
    pub fn encoder_inputs(&self) -> Vec<String> {
        self.documents
            .iter()
            .map(|doc| doc.encoder_input(&self.separator))
            .collect()
    }
}
