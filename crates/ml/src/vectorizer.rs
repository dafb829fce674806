use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;

use crate::tokenize::{tokenize, word_ngrams, DEFAULT_TOKEN_PATTERN};
use crate::ArtifactError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

#[derive(Debug, Deserialize)]
struct VectorizerArtifact {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    #[serde(default = "default_lowercase")]
    lowercase: bool,
    #[serde(default = "default_ngram_range")]
    ngram_range: (usize, usize),
    #[serde(default)]
    sublinear_tf: bool,
    #[serde(default = "default_norm")]
    norm: Option<Norm>,
    #[serde(default = "default_token_pattern")]
    token_pattern: String,
}

fn default_lowercase() -> bool {
    true
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

fn default_token_pattern() -> String {
    DEFAULT_TOKEN_PATTERN.to_string()
}

/// Feature vector with strictly increasing column indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    pub entries: Vec<(usize, f64)>,
}

impl SparseVector {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, column: usize) -> Option<f64> {
        self.entries
            .binary_search_by_key(&column, |(index, _)| *index)
            .ok()
            .map(|pos| self.entries[pos].1)
    }
}

/// Pre-fitted TF-IDF feature extractor.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    lowercase: bool,
    ngram_range: (usize, usize),
    sublinear_tf: bool,
    norm: Option<Norm>,
    token_pattern: Regex,
}

impl TfidfVectorizer {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw).map_err(|err| err.at(path))
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ArtifactError> {
        let artifact: VectorizerArtifact =
            serde_json::from_str(raw).map_err(ArtifactError::parse)?;

        let features = artifact.idf.len();
        if features == 0 {
            return Err(ArtifactError::invalid("vectorizer has an empty idf table"));
        }
        if let Some((term, index)) = artifact
            .vocabulary
            .iter()
            .find(|(_, index)| **index >= features)
        {
            return Err(ArtifactError::invalid(format!(
                "vocabulary term {term:?} maps to column {index} but idf has {features} entries"
            )));
        }
        if artifact.idf.iter().any(|weight| !weight.is_finite()) {
            return Err(ArtifactError::invalid("idf table contains a non-finite weight"));
        }
        let (min_n, max_n) = artifact.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(ArtifactError::invalid(format!(
                "invalid ngram_range ({min_n}, {max_n})"
            )));
        }
        let token_pattern = Regex::new(&artifact.token_pattern).map_err(|err| {
            ArtifactError::invalid(format!("invalid token_pattern: {err}"))
        })?;

        Ok(Self {
            vocabulary: artifact.vocabulary,
            idf: artifact.idf,
            lowercase: artifact.lowercase,
            ngram_range: artifact.ngram_range,
            sublinear_tf: artifact.sublinear_tf,
            norm: artifact.norm,
            token_pattern,
        })
    }

    pub fn n_features(&self) -> usize {
        self.idf.len()
    }

    pub fn transform(&self, text: &str) -> SparseVector {
        let tokens = tokenize(&self.token_pattern, text, self.lowercase);
        let grams = word_ngrams(tokens, self.ngram_range.0, self.ngram_range.1);

        let mut counts: BTreeMap<usize, u32> = BTreeMap::new();
        for gram in &grams {
            if let Some(column) = self.vocabulary.get(gram) {
                *counts.entry(*column).or_default() += 1;
            }
        }

        let mut entries = counts
            .into_iter()
            .map(|(column, count)| {
                let tf = if self.sublinear_tf {
                    1.0 + f64::from(count).ln()
                } else {
                    f64::from(count)
                };
                (column, tf * self.idf[column])
            })
            .collect::<Vec<_>>();

        let norm = match self.norm {
            Some(Norm::L2) => entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt(),
            Some(Norm::L1) => entries.iter().map(|(_, v)| v.abs()).sum::<f64>(),
            None => 0.0,
        };
        if norm > 0.0 {
            for (_, value) in entries.iter_mut() {
                *value /= norm;
            }
        }

        SparseVector { entries }
    }
}
