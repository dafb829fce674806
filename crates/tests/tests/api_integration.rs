
use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderValue, Request, StatusCode};
use common::{asset_config, assets_dir, predict_request, send};
use serde_json::json;
use teller_agents::SupportAgent;
use teller_api::{build_app, build_router, ApiState, AppConfig, DEFAULT_FRONTEND_ORIGIN};
use teller_core::{IntentLabel, ResponseCatalog};
use teller_ml::{InferenceError, IntentClassifier, IntentPrediction};
use teller_observability::AppMetrics;

fn catalog() -> ResponseCatalog {
    ResponseCatalog::load(assets_dir().join("response.json")).unwrap()
}

struct BrokenClassifier;

impl IntentClassifier for BrokenClassifier {
    fn model_name(&self) -> &str {
        "broken"
    }

    fn predict(&self, _text: &str) -> Result<IntentPrediction, InferenceError> {
        Err(InferenceError::Other("feature extraction crashed".to_string()))
    }
}

fn broken_app(redact_errors: bool) -> axum::Router {
    let agent = SupportAgent::new(
        Arc::new(catalog()),
        Arc::new(BrokenClassifier),
        None,
        AppMetrics::shared(),
    );
    build_router(ApiState {
        agent: Arc::new(agent),
        frontend_origin: HeaderValue::from_static(DEFAULT_FRONTEND_ORIGIN),
        redact_errors,
    })
}

#[tokio::test]
async fn health_reports_ok() {
    let app = build_app(&asset_config()).unwrap();

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, _, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn predict_returns_intent_and_template() {
    let app = build_app(&asset_config()).unwrap();

    let (status, _, body) = send(app, predict_request("What is my account balance?")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intent"], "balance_inquiry");
    assert_eq!(
        body["response"],
        catalog().lookup(&IntentLabel::from("balance_inquiry"))
    );
    assert_eq!(body["llm_enhanced"], false);
}

#[tokio::test]
async fn intent_without_template_gets_default_reply() {
    let app = build_app(&asset_config()).unwrap();
    let catalog = catalog();
    assert!(!catalog.contains(&IntentLabel::from("atm_support")));

    let (status, _, body) = send(
        app,
        predict_request("Where can I withdraw cash from an ATM?"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intent"], "atm_support");
    assert_eq!(body["response"], catalog.lookup(&IntentLabel::from("default")));
    assert_eq!(body["llm_enhanced"], false);
}

#[tokio::test]
async fn blank_text_is_rejected() {
    let app = build_app(&asset_config()).unwrap();

    for text in ["", "   ", "\n\t "] {
        let (status, _, body) = send(app.clone(), predict_request(text)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "detail": "Text cannot be empty." }));
    }
}

#[tokio::test]
async fn repeated_predictions_are_identical() {
    let app = build_app(&asset_config()).unwrap();

    let (_, _, first) = send(app.clone(), predict_request("I lost my card")).await;
    let (_, _, second) = send(app, predict_request("I lost my card")).await;

    assert_eq!(first["intent"], "card_lost");
    assert_eq!(first, second);
}

#[tokio::test]
async fn classifier_failure_returns_server_error() {
    let (status, _, body) = send(broken_app(false), predict_request("hello")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({ "detail": "Model prediction failed: feature extraction crashed" })
    );
}

#[tokio::test]
async fn classifier_failure_detail_can_be_redacted() {
    let (status, _, body) = send(broken_app(true), predict_request("hello")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let detail = body["detail"].as_str().unwrap();
    assert!(!detail.contains("feature extraction crashed"));
}

#[tokio::test]
async fn cors_preflight_allows_frontend_origin_with_credentials() {
    let app = build_app(&asset_config()).unwrap();

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/predict")
        .header("origin", DEFAULT_FRONTEND_ORIGIN)
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type,x-client")
        .body(Body::empty())
        .unwrap();
    let (status, headers, _) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers["access-control-allow-origin"],
        DEFAULT_FRONTEND_ORIGIN
    );
    assert_eq!(headers["access-control-allow-credentials"], "true");
    assert_eq!(headers["access-control-allow-methods"], "POST");
    assert_eq!(
        headers["access-control-allow-headers"],
        "content-type,x-client"
    );
}

#[tokio::test]
async fn cors_ignores_other_origins() {
    let app = build_app(&asset_config()).unwrap();

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/predict")
        .header("origin", "https://evil.example")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();
    let (_, headers, _) = send(app, request).await;

    assert!(headers.get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn foreign_origin_gets_no_allow_origin_on_predict() {
    let app = build_app(&asset_config()).unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "application/json")
        .header("origin", "https://evil.example")
        .body(Body::from(r#"{"text":"hello"}"#))
        .unwrap();
    let (status, headers, _) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(headers.get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn predict_rejects_body_without_text() {
    let app = build_app(&asset_config()).unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"message":"hello"}"#))
        .unwrap();
    let (status, _, _) = send(app, request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = build_app(&asset_config()).unwrap();

    let (_, headers, _) = send(app, predict_request("open a new account")).await;

    assert!(headers.get("x-request-id").is_some());
}

#[tokio::test]
async fn metrics_track_outcomes() {
    let app = build_app(&asset_config()).unwrap();

    send(app.clone(), predict_request("hello")).await;
    send(app.clone(), predict_request("  ")).await;

    let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let (status, _, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["llm_enabled"], false);
    assert_eq!(body["classifier"], "tfidf-linear-intent");
    assert_eq!(body["catalog_entries"], 7);
    assert_eq!(body["metrics"]["requests_total"], 2);
    assert_eq!(body["metrics"]["validation_failures_total"], 1);
    assert_eq!(body["metrics"]["fallback_total"], 0);
    assert_eq!(body["metrics"]["latency_samples_total"], 2);
}

#[test]
fn startup_fails_without_catalog() {
    let config = AppConfig {
        responses_path: assets_dir().join("missing.json"),
        ..asset_config()
    };

    let err = build_app(&config).err().expect("startup should fail");
    assert!(format!("{err:#}").contains("failed to load response catalog"));
}

#[test]
fn startup_fails_when_catalog_lacks_default() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("response.json");
    let templates = HashMap::from([("card_lost", "Freeze it.")]);
    std::fs::write(&path, serde_json::to_string(&templates).unwrap()).unwrap();

    let config = AppConfig {
        responses_path: path,
        ..asset_config()
    };
    let err = build_app(&config).err().expect("startup should fail");
    assert!(format!("{err:#}").contains("no \"default\" entry"));
}

#[test]
fn startup_fails_on_mismatched_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let model_path = dir.path().join("intent_model.json");
    std::fs::write(
        &model_path,
        r#"{"classes": ["a", "b"], "coef": [[1.0], [0.5]], "intercept": [0.0, 0.0]}"#,
    )
    .unwrap();

    let config = AppConfig {
        model_path,
        ..asset_config()
    };
    let err = build_app(&config).err().expect("startup should fail");
    assert!(format!("{err:#}").contains("failed to load intent classifier artifacts"));
}

#[test]
fn startup_rejects_invalid_origin() {
    let config = AppConfig {
        frontend_origin: "https://bad\norigin".to_string(),
        ..asset_config()
    };
    assert!(build_app(&config).is_err());
}
