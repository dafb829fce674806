mod linear;
mod tokenize;
mod vectorizer;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use teller_core::IntentLabel;
use thiserror::Error;
use tracing::info;

pub use linear::LinearModel;
pub use tokenize::{tokenize, word_ngrams, DEFAULT_TOKEN_PATTERN};
pub use vectorizer::{Norm, SparseVector, TfidfVectorizer};

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed reading model artifact at {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed model artifact{}: {source}", at_path(.path))]
    Parse {
        path: Option<PathBuf>,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid model artifact{}: {reason}", at_path(.path))]
    Invalid { path: Option<PathBuf>, reason: String },
}

impl ArtifactError {
    fn parse(source: serde_json::Error) -> Self {
        Self::Parse { path: None, source }
    }

    fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            path: None,
            reason: reason.into(),
        }
    }

    fn at(self, location: &Path) -> Self {
        match self {
            Self::Parse { source, .. } => Self::Parse {
                path: Some(location.to_path_buf()),
                source,
            },
            Self::Invalid { reason, .. } => Self::Invalid {
                path: Some(location.to_path_buf()),
                reason,
            },
            other => other,
        }
    }
}

fn at_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|value| format!(" at {}", value.display()))
        .unwrap_or_default()
}

#[derive(Debug, Clone, Error)]
pub enum InferenceError {
    #[error("model produced a non-finite score for class {class:?}")]
    NonFiniteScore { class: String },
    #[error("model has no classes to choose from")]
    EmptyModel,
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntentPrediction {
    pub intent: IntentLabel,
    pub score: f64,
}

pub trait IntentClassifier: Send + Sync {
    fn model_name(&self) -> &str;

    fn predict(&self, text: &str) -> Result<IntentPrediction, InferenceError>;

    fn classify(&self, text: &str) -> Result<IntentLabel, InferenceError> {
        self.predict(text).map(|prediction| prediction.intent)
    }
}

/// TF-IDF features fed into a linear model, both loaded eagerly.
#[derive(Debug, Clone)]
pub struct TfidfIntentClassifier {
    vectorizer: TfidfVectorizer,
    model: LinearModel,
}

impl TfidfIntentClassifier {
    pub fn new(vectorizer: TfidfVectorizer, model: LinearModel) -> Result<Self, ArtifactError> {
        if vectorizer.n_features() != model.n_features() {
            return Err(ArtifactError::invalid(format!(
                "vectorizer emits {} features but model expects {}",
                vectorizer.n_features(),
                model.n_features()
            )));
        }
        Ok(Self { vectorizer, model })
    }

    pub fn load(
        vectorizer_path: impl AsRef<Path>,
        model_path: impl AsRef<Path>,
    ) -> Result<Self, ArtifactError> {
        let vectorizer = TfidfVectorizer::from_path(vectorizer_path.as_ref())?;
        let model = LinearModel::from_path(model_path.as_ref())?;
        let classifier = Self::new(vectorizer, model)?;

        info!(
            vectorizer = %vectorizer_path.as_ref().display(),
            model = %model_path.as_ref().display(),
            features = classifier.vectorizer.n_features(),
            classes = classifier.model.classes().len(),
            "intent classifier loaded"
        );
        Ok(classifier)
    }

    pub fn classes(&self) -> &[IntentLabel] {
        self.model.classes()
    }
}

impl IntentClassifier for TfidfIntentClassifier {
    fn model_name(&self) -> &str {
        "tfidf-linear-intent"
    }

    fn predict(&self, text: &str) -> Result<IntentPrediction, InferenceError> {
        let features = self.vectorizer.transform(text);
        let (intent, score) = self.model.predict(&features)?;
        Ok(IntentPrediction { intent, score })
    }
}

pub fn load_classifier(
    vectorizer_path: impl AsRef<Path>,
    model_path: impl AsRef<Path>,
) -> Result<Arc<dyn IntentClassifier>, ArtifactError> {
    let classifier = TfidfIntentClassifier::load(vectorizer_path, model_path)?;
    Ok(Arc::new(classifier))
}
