use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{CompletionBackend, CompletionRequest, EnhancementError};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

/// Messages API client. One `reqwest::Client` is shared by every call.
#[derive(Clone)]
pub struct AnthropicBackend {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl AnthropicBackend {
    pub fn new(
        api_key: impl Into<String>,
        base_url: &str,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, EnhancementError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(EnhancementError::MissingCredential(crate::API_KEY_ENV));
        }

        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .build()
            .map_err(EnhancementError::from_reqwest)?;

        Ok(Self {
            client,
            api_key,
            endpoint: format!("{}/v1/messages", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[async_trait]
impl CompletionBackend for AnthropicBackend {
    fn name(&self) -> &str {
        "anthropic-messages"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, EnhancementError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(request)
            .send()
            .await
            .map_err(EnhancementError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EnhancementError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|err| EnhancementError::Malformed(err.to_string()))?;

        match body.content.into_iter().next() {
            Some(ContentBlock::Text { text }) => Ok(text),
            Some(ContentBlock::Other) => Err(EnhancementError::Malformed(
                "first content block is not text".to_string(),
            )),
            None => Err(EnhancementError::EmptyContent),
        }
    }
}
