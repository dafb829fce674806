use std::env;
use std::path::PathBuf;
use std::time::Duration;

use teller_llm::{EnhancerConfig, API_KEY_ENV, DEFAULT_BASE_URL, DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_MODEL};

pub const DEFAULT_FRONTEND_ORIGIN: &str = "https://intentclass.netlify.app";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: String,
    pub responses_path: PathBuf,
    pub vectorizer_path: PathBuf,
    pub model_path: PathBuf,
    pub frontend_origin: String,
    pub redact_errors: bool,
    pub enhancer: EnhancerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
            responses_path: PathBuf::from("assets/response.json"),
            vectorizer_path: PathBuf::from("assets/tfidf_vectorizer.json"),
            model_path: PathBuf::from("assets/intent_model.json"),
            frontend_origin: DEFAULT_FRONTEND_ORIGIN.to_string(),
            redact_errors: false,
            enhancer: EnhancerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Reads `TELLER_*` variables and the provider credential. Unset or
    /// unparsable values keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let timeout = Duration::from_secs(
            env::var("TELLER_LLM_TIMEOUT_SECONDS")
                .ok()
                .and_then(|value| value.trim().parse::<u64>().ok())
                .map(|value| value.clamp(1, 300))
                .unwrap_or(20),
        );
        let enhancer = EnhancerConfig {
            api_key: env::var(API_KEY_ENV)
                .ok()
                .filter(|value| !value.trim().is_empty()),
            model: env::var("TELLER_LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            base_url: env::var("TELLER_LLM_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            max_output_tokens: env::var("TELLER_LLM_MAX_TOKENS")
                .ok()
                .and_then(|value| value.trim().parse::<u32>().ok())
                .filter(|value| *value > 0)
                .unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS),
            timeout,
            connect_timeout: timeout.min(Duration::from_secs(6)),
        };

        Self {
            bind: env::var("TELLER_BIND").unwrap_or(defaults.bind),
            responses_path: env_path("TELLER_RESPONSES_PATH").unwrap_or(defaults.responses_path),
            vectorizer_path: env_path("TELLER_VECTORIZER_PATH")
                .unwrap_or(defaults.vectorizer_path),
            model_path: env_path("TELLER_MODEL_PATH").unwrap_or(defaults.model_path),
            frontend_origin: env::var("TELLER_FRONTEND_ORIGIN")
                .ok()
                .map(|value| value.trim().trim_end_matches('/').to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or(defaults.frontend_origin),
            redact_errors: env::var("TELLER_REDACT_ERRORS")
                .ok()
                .map(|value| parse_flag(&value))
                .unwrap_or(defaults.redact_errors),
            enhancer,
        }
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
