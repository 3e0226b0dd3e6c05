use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::{ChatMessage, ChatProvider};

const ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
const APP_TITLE: &str = "Compli - Interview Prep Assistant";

#[derive(Error, Debug)]
pub enum ChatProviderError {
    /// The provider answered with a non-success status.
    #[error("chat provider returned {status}: {body}")]
    Status { status: u16, body: Value },

    #[error("chat provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

pub struct OpenRouterClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    referer: String,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

impl OpenRouterClient {
    pub fn new(client: reqwest::Client, api_key: String, model: String, referer: String) -> Self {
        Self {
            client,
            api_key,
            model,
            referer,
        }
    }
}

#[async_trait]
impl ChatProvider for OpenRouterClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Value, ChatProviderError> {
        let res = self
            .client
            .post(ENDPOINT)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", APP_TITLE)
            .json(&CompletionRequest {
                model: &self.model,
                messages,
            })
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.json::<Value>().await.unwrap_or(Value::Null);
            return Err(ChatProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(res.json().await?)
    }
}
