
use std::time::Duration;

use axum::http::StatusCode;
use common::{asset_config, assets_dir, predict_request, send, MockProvider};
use teller_api::{build_app, AppConfig};
use teller_core::{IntentLabel, ResponseCatalog};
use teller_llm::DEFAULT_MODEL;

fn enhanced_config(base_url: String) -> AppConfig {
    let mut config = asset_config();
    config.enhancer.api_key = Some("sk-test".to_string());
    config.enhancer.base_url = base_url;
    config
}

fn template(intent: &str) -> String {
    ResponseCatalog::load(assets_dir().join("response.json"))
        .unwrap()
        .lookup(&IntentLabel::from(intent))
        .to_string()
}

#[tokio::test]
async fn provider_reply_replaces_template() {
    let provider = MockProvider::replying("\n  Your card is now frozen. A new one is on its way.  ");
    let app = build_app(&enhanced_config(provider.spawn().await)).unwrap();

    let (status, _, body) = send(app, predict_request("  I lost my card  ")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intent"], "card_lost");
    assert_eq!(
        body["response"],
        "Your card is now frozen. A new one is on its way."
    );
    assert_eq!(body["llm_enhanced"], true);

    let captured = provider.captured();
    assert_eq!(captured.len(), 1);
    let sent = &captured[0].body;
    assert_eq!(sent["model"], DEFAULT_MODEL);
    assert_eq!(sent["max_tokens"], 300);
    let prompt = sent["messages"][0]["content"].as_str().unwrap();
    assert!(prompt.contains("\"I lost my card\""));
    assert!(prompt.contains("\"card_lost\""));
    assert!(prompt.contains(&template("card_lost")));
}

#[tokio::test]
async fn provider_error_falls_back_to_template() {
    let provider = MockProvider::failing(StatusCode::INTERNAL_SERVER_ERROR);
    let app = build_app(&enhanced_config(provider.spawn().await)).unwrap();

    let (status, _, body) = send(app, predict_request("open a new account")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intent"], "account_opening");
    assert_eq!(body["response"], template("account_opening"));
    assert_eq!(body["llm_enhanced"], false);
    assert_eq!(provider.captured().len(), 1);
}

#[tokio::test]
async fn provider_timeout_falls_back_to_template() {
    let provider = MockProvider::replying("too late").delayed(Duration::from_secs(3));
    let mut config = enhanced_config(provider.spawn().await);
    config.enhancer.timeout = Duration::from_secs(1);
    config.enhancer.connect_timeout = Duration::from_secs(1);
    let app = build_app(&config).unwrap();

    let (status, _, body) = send(app, predict_request("What is my account balance?")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], template("balance_inquiry"));
    assert_eq!(body["llm_enhanced"], false);
}

#[tokio::test]
async fn malformed_provider_body_falls_back_to_template() {
    let provider = MockProvider::with_body(serde_json::json!({ "unexpected": true }));
    let app = build_app(&enhanced_config(provider.spawn().await)).unwrap();

    let (status, _, body) = send(app, predict_request("hello")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], template("greeting"));
    assert_eq!(body["llm_enhanced"], false);
}

#[tokio::test]
async fn missing_credential_serves_templates_only() {
    let provider = MockProvider::replying("should never be used");
    let mut config = asset_config();
    config.enhancer.base_url = provider.spawn().await;
    let app = build_app(&config).unwrap();

    let (status, _, body) = send(app, predict_request("send money to my friend")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intent"], "transfer_money");
    assert_eq!(body["response"], template("transfer_money"));
    assert_eq!(body["llm_enhanced"], false);
    assert!(provider.captured().is_empty());
}

#[tokio::test]
async fn validation_happens_before_any_provider_call() {
    let provider = MockProvider::replying("unused");
    let app = build_app(&enhanced_config(provider.spawn().await)).unwrap();

    let (status, _, _) = send(app, predict_request("   ")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(provider.captured().is_empty());
}
