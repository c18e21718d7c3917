//! Deterministic encoders for unit tests.

use std::cell::Cell;

use crate::embedding::{EncoderResult, TextEncoder};

/// Bag-of-words encoder: each known word is a one-hot "token state" and a
/// text is the mean of its token states. Unknown words share the last slot.
#[derive(Debug, Clone)]
pub(crate) struct KeywordEncoder {
    vocabulary: Vec<String>,
}

impl KeywordEncoder {
    pub(crate) fn new(words: &[&str]) -> Self {
        Self {
            vocabulary: words.iter().map(|w| w.to_string()).collect(),
        }
    }

    fn slot(&self, word: &str) -> usize {
        self.vocabulary
            .iter()
            .position(|v| v == word)
            .unwrap_or(self.vocabulary.len())
    }
}

impl TextEncoder for KeywordEncoder {
    fn dimension(&self) -> usize {
        self.vocabulary.len() + 1
    }

    fn encode_batch(&self, texts: &[&str]) -> EncoderResult<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut row = vec![0.0; self.dimension()];
                let words: Vec<String> = text
                    .split_whitespace()
                    .map(|w| {
                        w.trim_matches(|c: char| !c.is_alphanumeric())
                            .to_lowercase()
                    })
                    .collect();
                for word in &words {
                    row[self.slot(word)] += 1.0;
                }
                let count = words.len().max(1) as f32;
                row.iter_mut().for_each(|v| *v /= count);
                row
            })
            .collect())
    }
}

type Script = Box<dyn Fn(usize, &[&str]) -> EncoderResult<Vec<Vec<f32>>>>;

/// Encoder whose batch output is decided by a closure, given the zero-based
/// call number and the batch texts.
pub(crate) struct ScriptedEncoder {
    dimension: usize,
    script: Script,
    calls: Cell<usize>,
}

impl ScriptedEncoder {
    pub(crate) fn new<F>(dimension: usize, script: F) -> Self
    where
        F: Fn(usize, &[&str]) -> EncoderResult<Vec<Vec<f32>>> + 'static,
    {
        Self {
            dimension,
            script: Box::new(script),
            calls: Cell::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl TextEncoder for ScriptedEncoder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode_batch(&self, texts: &[&str]) -> EncoderResult<Vec<Vec<f32>>> {
        let call = self.calls.get();
        self.calls.set(call + 1);
        (self.script)(call, texts)
    }
}
