mod config;
mod error;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Json, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use teller_agents::SupportAgent;
use teller_core::{PredictionResult, Query, ResponseCatalog};
use teller_llm::ResponseEnhancer;
use teller_observability::{AppMetrics, MetricsSnapshot};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use config::{AppConfig, DEFAULT_FRONTEND_ORIGIN};
pub use error::ApiError;

const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct ApiState {
    pub agent: Arc<SupportAgent>,
    pub frontend_origin: HeaderValue,
    pub redact_errors: bool,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct MetricsResponse {
    llm_enabled: bool,
    classifier: String,
    catalog_entries: usize,
    metrics: MetricsSnapshot,
}

/// Loads every startup dependency and wires the router.
///
/// A missing or broken catalog or model artifact is fatal. A missing
/// provider credential only disables enhancement.
pub fn build_app(config: &AppConfig) -> Result<Router> {
    let metrics = AppMetrics::shared();

    let catalog = ResponseCatalog::load(&config.responses_path)
        .context("failed to load response catalog")?;
    let classifier = teller_ml::load_classifier(&config.vectorizer_path, &config.model_path)
        .context("failed to load intent classifier artifacts")?;

    let enhancer = match ResponseEnhancer::new(&config.enhancer) {
        Ok(enhancer) => {
            info!(model = enhancer.model(), "LLM enhancement enabled");
            Some(Arc::new(enhancer))
        }
        Err(err) => {
            warn!(error = %err, "LLM enhancement disabled, serving templates only");
            None
        }
    };

    let frontend_origin = HeaderValue::from_str(&config.frontend_origin)
        .with_context(|| format!("invalid frontend origin {:?}", config.frontend_origin))?;

    info!(
        catalog_entries = catalog.len(),
        classifier = classifier.model_name(),
        frontend_origin = %config.frontend_origin,
        "teller api initialized"
    );

    let agent = SupportAgent::new(Arc::new(catalog), classifier, enhancer, metrics);

    Ok(build_router(ApiState {
        agent: Arc::new(agent),
        frontend_origin,
        redact_errors: config.redact_errors,
    }))
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/predict", post(predict))
        .layer(build_cors_layer(&state.frontend_origin))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

async fn metrics(State(state): State<ApiState>) -> impl IntoResponse {
    let agent = state.agent.as_ref();
    Json(MetricsResponse {
        llm_enabled: agent.llm_enabled(),
        classifier: agent.classifier().model_name().to_string(),
        catalog_entries: agent.catalog().len(),
        metrics: agent.metrics().snapshot(),
    })
}

async fn predict(
    State(state): State<ApiState>,
    Json(query): Json<Query>,
) -> Result<Json<PredictionResult>, ApiError> {
    state
        .agent
        .handle_predict(&query.text)
        .await
        .map(Json)
        .map_err(|err| ApiError::from_predict(err, state.redact_errors))
}

/// One origin, credentials allowed; methods and headers mirror the preflight
/// since wildcards are not permitted alongside credentials.
fn build_cors_layer(origin: &HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list([origin.clone()]))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
