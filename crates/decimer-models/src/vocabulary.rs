//! Token vocabulary and SMILES output rewriting
//!
//! The DECIMER graphs emit token ids. The vocabulary file maps them back to
//! text and carries the rewrite rules that turn DECIMER's internal notation
//! into plain SMILES.

use decimer_core::{Error, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

pub const START_TOKEN: &str = "<start>";
pub const END_TOKEN: &str = "<end>";

/// Padding id emitted after the end of a sequence
const PAD_ID: i64 = 0;

#[derive(Debug, Deserialize)]
struct VocabularyFile {
    index_word: HashMap<String, String>,
    #[serde(default)]
    replacements: Vec<(String, String)>,
}

/// Id-to-token table plus ordered rewrite rules
#[derive(Debug, Clone)]
pub struct Vocabulary {
    index_word: HashMap<i64, String>,
    replacements: Vec<(Regex, String)>,
}

impl Vocabulary {
    /// Load from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read vocabulary {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Parse from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let file: VocabularyFile = serde_json::from_str(json)?;

        let mut index_word = HashMap::with_capacity(file.index_word.len());
        for (id, word) in file.index_word {
            let id: i64 = id
                .parse()
                .map_err(|_| Error::config(format!("Vocabulary id '{}' is not an integer", id)))?;
            index_word.insert(id, word);
        }

        let replacements = file
            .replacements
            .into_iter()
            .map(|(pattern, replacement)| {
                Regex::new(&pattern)
                    .map(|re| (re, replacement))
                    .map_err(|e| Error::config(format!("Invalid rewrite rule '{}': {}", pattern, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            index_word,
            replacements,
        })
    }

    /// Number of known tokens
    pub fn len(&self) -> usize {
        self.index_word.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index_word.is_empty()
    }

    /// Map predicted ids back to DECIMER notation.
    ///
    /// Start markers and padding are dropped; decoding stops at the first end marker.
    pub fn detokenize(&self, ids: &[i64]) -> Result<String> {
        let mut text = String::new();
        for &id in ids {
            if id == PAD_ID && !self.index_word.contains_key(&PAD_ID) {
                continue;
            }
            let word = self
                .index_word
                .get(&id)
                .ok_or_else(|| Error::decode(format!("unknown token id {}", id)))?;
            match word.as_str() {
                END_TOKEN => break,
                START_TOKEN => continue,
                _ => text.push_str(word),
            }
        }
        Ok(text)
    }

    /// Apply the rewrite rules to produce SMILES
    pub fn decode(&self, text: &str) -> Result<String> {
        let mut smiles = text.trim().to_string();
        for (pattern, replacement) in &self.replacements {
            smiles = pattern.replace_all(&smiles, replacement.as_str()).into_owned();
        }

        if smiles.is_empty() {
            return Err(Error::decode("model produced an empty sequence"));
        }
        Ok(smiles)
    }

    /// Detokenize and decode in one step
    pub fn to_smiles(&self, ids: &[i64]) -> Result<String> {
        self.decode(&self.detokenize(ids)?)
    }
}
