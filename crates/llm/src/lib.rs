mod anthropic;
mod prompts;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use teller_core::{ChatTurn, IntentLabel};
use thiserror::Error;
use tracing::{debug, warn};

pub use anthropic::{AnthropicBackend, DEFAULT_BASE_URL};
pub use prompts::{
    support_user_prompt, APOLOGY_REPLY, CONVERSATION_SYSTEM_PROMPT, SUPPORT_SYSTEM_PROMPT,
};

pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 300;

#[derive(Debug, Error)]
pub enum EnhancementError {
    #[error("{0} is not set")]
    MissingCredential(&'static str),
    #[error("provider request timed out")]
    Timeout,
    #[error("provider request failed: {0}")]
    Transport(String),
    #[error("provider returned status {status}: {body}")]
    Provider { status: u16, body: String },
    #[error("provider response malformed: {0}")]
    Malformed(String),
    #[error("provider returned no text content")]
    EmptyContent,
}

impl EnhancementError {
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Result of a best-effort rewrite. `Fallback` still carries a usable reply.
#[derive(Debug)]
pub enum EnhancementOutcome {
    Enhanced(String),
    Fallback {
        text: String,
        cause: EnhancementError,
    },
}

impl EnhancementOutcome {
    pub fn is_enhanced(&self) -> bool {
        matches!(self, Self::Enhanced(_))
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Enhanced(text) | Self::Fallback { text, .. } => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Enhanced(text) | Self::Fallback { text, .. } => text,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub max_tokens: u32,
    pub system: String,
    pub messages: Vec<ChatTurn>,
}

#[async_trait]
pub trait CompletionBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, request: &CompletionRequest) -> Result<String, EnhancementError>;
}

#[derive(Debug, Clone)]
pub struct EnhancerConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub max_output_tokens: u32,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for EnhancerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            timeout: Duration::from_secs(20),
            connect_timeout: Duration::from_secs(6),
        }
    }
}

#[derive(Clone)]
pub struct ResponseEnhancer {
    backend: Arc<dyn CompletionBackend>,
    model: String,
    max_output_tokens: u32,
}

impl ResponseEnhancer {
    /// Fails when no credential is configured so callers can disable
    /// enhancement once at startup.
    pub fn new(config: &EnhancerConfig) -> Result<Self, EnhancementError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(EnhancementError::MissingCredential(API_KEY_ENV))?;

        let backend = AnthropicBackend::new(
            api_key,
            &config.base_url,
            config.timeout,
            config.connect_timeout,
        )?;

        Ok(Self::with_backend(Arc::new(backend), config))
    }

    pub fn with_backend(backend: Arc<dyn CompletionBackend>, config: &EnhancerConfig) -> Self {
        Self {
            backend,
            model: config.model.clone(),
            max_output_tokens: config.max_output_tokens,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens
    }

    pub async fn enhance(
        &self,
        user_query: &str,
        intent: &IntentLabel,
        template: &str,
        max_output_tokens: u32,
    ) -> EnhancementOutcome {
        let request = CompletionRequest {
            model: self.model.clone(),
            max_tokens: max_output_tokens,
            system: SUPPORT_SYSTEM_PROMPT.to_string(),
            messages: vec![ChatTurn::user(support_user_prompt(
                user_query, intent, template,
            ))],
        };

        match self.complete_trimmed(&request).await {
            Ok(text) => {
                debug!(intent = %intent, backend = self.backend.name(), "template enhanced");
                EnhancementOutcome::Enhanced(text)
            }
            Err(cause) => {
                warn!(
                    intent = %intent,
                    backend = self.backend.name(),
                    error = %cause,
                    "enhancement failed, falling back to template"
                );
                EnhancementOutcome::Fallback {
                    text: template.to_string(),
                    cause,
                }
            }
        }
    }

    /// Multi-turn variant: `prior_turns` are sent in order before the query.
    pub async fn enhance_with_history(
        &self,
        user_query: &str,
        prior_turns: &[ChatTurn],
        max_output_tokens: u32,
    ) -> EnhancementOutcome {
        let mut messages = prior_turns.to_vec();
        messages.push(ChatTurn::user(user_query));

        let request = CompletionRequest {
            model: self.model.clone(),
            max_tokens: max_output_tokens,
            system: CONVERSATION_SYSTEM_PROMPT.to_string(),
            messages,
        };

        match self.complete_trimmed(&request).await {
            Ok(text) => EnhancementOutcome::Enhanced(text),
            Err(cause) => {
                warn!(
                    backend = self.backend.name(),
                    turns = prior_turns.len(),
                    error = %cause,
                    "conversational reply failed"
                );
                EnhancementOutcome::Fallback {
                    text: APOLOGY_REPLY.to_string(),
                    cause,
                }
            }
        }
    }

    async fn complete_trimmed(
        &self,
        request: &CompletionRequest,
    ) -> Result<String, EnhancementError> {
        let text = self.backend.complete(request).await?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(EnhancementError::EmptyContent);
        }
        Ok(trimmed.to_string())
    }
}
