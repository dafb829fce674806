use std::fs;
use std::path::Path;

use serde::Deserialize;
use teller_core::IntentLabel;

use crate::vectorizer::SparseVector;
use crate::{ArtifactError, InferenceError};

#[derive(Debug, Deserialize)]
struct LinearModelArtifact {
    classes: Vec<String>,
    coef: Vec<Vec<f64>>,
    intercept: Vec<f64>,
}

/// Pre-trained one-vs-rest (or binary) linear classifier.
#[derive(Debug, Clone)]
pub struct LinearModel {
    classes: Vec<IntentLabel>,
    coef: Vec<Vec<f64>>,
    intercept: Vec<f64>,
    binary: bool,
}

impl LinearModel {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw).map_err(|err| err.at(path))
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ArtifactError> {
        let artifact: LinearModelArtifact =
            serde_json::from_str(raw).map_err(ArtifactError::parse)?;

        if artifact.classes.is_empty() {
            return Err(ArtifactError::invalid("model declares no classes"));
        }
        let rows = artifact.coef.len();
        let binary = artifact.classes.len() == 2 && rows == 1;
        if !binary && rows != artifact.classes.len() {
            return Err(ArtifactError::invalid(format!(
                "model has {rows} coefficient rows for {} classes",
                artifact.classes.len()
            )));
        }
        if artifact.intercept.len() != rows {
            return Err(ArtifactError::invalid(format!(
                "model has {} intercepts for {rows} coefficient rows",
                artifact.intercept.len()
            )));
        }
        let width = artifact.coef.first().map(Vec::len).unwrap_or(0);
        if artifact.coef.iter().any(|row| row.len() != width) {
            return Err(ArtifactError::invalid("coefficient rows differ in width"));
        }

        Ok(Self {
            classes: artifact.classes.into_iter().map(IntentLabel::from).collect(),
            coef: artifact.coef,
            intercept: artifact.intercept,
            binary,
        })
    }

    pub fn classes(&self) -> &[IntentLabel] {
        &self.classes
    }

    pub fn n_features(&self) -> usize {
        self.coef.first().map(Vec::len).unwrap_or(0)
    }

    pub fn decision_function(&self, features: &SparseVector) -> Vec<f64> {
        self.coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, bias)| {
                features
                    .entries
                    .iter()
                    .map(|(column, value)| row.get(*column).copied().unwrap_or(0.0) * value)
                    .sum::<f64>()
                    + bias
            })
            .collect()
    }

    pub fn predict(&self, features: &SparseVector) -> Result<(IntentLabel, f64), InferenceError> {
        let scores = self.decision_function(features);

        if self.binary {
            let score = scores.first().copied().unwrap_or(0.0);
            if !score.is_finite() {
                return Err(InferenceError::NonFiniteScore {
                    class: self.classes[1].to_string(),
                });
            }
            let index = usize::from(score > 0.0);
            return Ok((self.classes[index].clone(), score));
        }

        let mut best: Option<(usize, f64)> = None;
        for (index, score) in scores.iter().enumerate() {
            if !score.is_finite() {
                return Err(InferenceError::NonFiniteScore {
                    class: self.classes[index].to_string(),
                });
            }
            if best.map_or(true, |(_, top)| *score > top) {
                best = Some((index, *score));
            }
        }

        best.map(|(index, score)| (self.classes[index].clone(), score))
            .ok_or(InferenceError::EmptyModel)
    }
}
