use std::sync::Arc;
use std::time::Instant;

use teller_core::{validate_query, PredictionResult, ResponseCatalog, ValidationError};
use teller_llm::ResponseEnhancer;
use teller_ml::{InferenceError, IntentClassifier};
use teller_observability::AppMetrics;
use thiserror::Error;
use tracing::{info, instrument, warn};

#[derive(Debug, Error)]
pub enum PredictError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Model prediction failed: {0}")]
    Inference(#[from] InferenceError),
}

/// Runs one query through validate → classify → template → enhance.
///
/// All collaborators are built once at startup and shared read-only; the
/// agent itself is cheap to clone.
#[derive(Clone)]
pub struct SupportAgent {
    catalog: Arc<ResponseCatalog>,
    classifier: Arc<dyn IntentClassifier>,
    enhancer: Option<Arc<ResponseEnhancer>>,
    metrics: Arc<AppMetrics>,
}

impl SupportAgent {
    pub fn new(
        catalog: Arc<ResponseCatalog>,
        classifier: Arc<dyn IntentClassifier>,
        enhancer: Option<Arc<ResponseEnhancer>>,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            catalog,
            classifier,
            enhancer,
            metrics,
        }
    }

    pub fn llm_enabled(&self) -> bool {
        self.enhancer.is_some()
    }

    pub fn catalog(&self) -> &ResponseCatalog {
        &self.catalog
    }

    pub fn classifier(&self) -> &dyn IntentClassifier {
        self.classifier.as_ref()
    }

    pub fn enhancer(&self) -> Option<&ResponseEnhancer> {
        self.enhancer.as_deref()
    }

    pub fn metrics(&self) -> &AppMetrics {
        &self.metrics
    }

    pub async fn handle_predict(&self, text: &str) -> Result<PredictionResult, PredictError> {
        self.predict(text, true).await
    }

    /// Same pipeline with enhancement optionally skipped for this call.
    #[instrument(skip(self, text), fields(chars = text.len()))]
    pub async fn predict(
        &self,
        text: &str,
        allow_enhancement: bool,
    ) -> Result<PredictionResult, PredictError> {
        let started = Instant::now();
        self.metrics.inc_request();

        let result = self.run(text, allow_enhancement).await;
        self.metrics.observe_latency(started.elapsed());
        result
    }

    async fn run(
        &self,
        text: &str,
        allow_enhancement: bool,
    ) -> Result<PredictionResult, PredictError> {
        let query = validate_query(text).inspect_err(|_| {
            self.metrics.inc_validation_failure();
        })?;

        let intent = self.classifier.classify(query).map_err(|err| {
            self.metrics.inc_inference_failure();
            warn!(error = %err, model = self.classifier.model_name(), "intent classification failed");
            err
        })?;

        let template = self.catalog.lookup(&intent);

        let (response, llm_enhanced) = match self.enhancer.as_ref() {
            Some(enhancer) if allow_enhancement => {
                let outcome = enhancer
                    .enhance(query, &intent, template, enhancer.max_output_tokens())
                    .await;
                let enhanced = outcome.is_enhanced();
                if enhanced {
                    self.metrics.inc_enhanced();
                } else {
                    self.metrics.inc_fallback();
                }
                (outcome.into_text(), enhanced)
            }
            _ => (template.to_string(), false),
        };

        info!(
            intent = %intent,
            templated = self.catalog.contains(&intent),
            llm_enhanced,
            "prediction handled"
        );

        Ok(PredictionResult {
            intent,
            response,
            llm_enhanced,
        })
    }
}
