use axum::http::StatusCode;
use serde_json::Value;
use std::sync::Arc;

use crate::error::ApiError;
use crate::providers::{ChatMessage, ChatProvider, ChatProviderError};
use crate::rate_limit::{RateDecision, RateLimiter};

pub const SYSTEM_INSTRUCTION: &str = "You are a helpful job interview coach, focused on providing clear, actionable advice and insights.";

/// Rate-limited passthrough to the hosted chat model.
pub struct ChatService {
    provider: Option<Arc<dyn ChatProvider>>,
    limiter: RateLimiter,
}

impl ChatService {
    /// `provider` is `None` when no API key is configured.
    pub fn new(provider: Option<Arc<dyn ChatProvider>>, limiter: RateLimiter) -> Self {
        Self { provider, limiter }
    }

    /// Forwards `messages` behind the coaching instruction and returns the
    /// provider's envelope untouched.
    pub async fn complete(
        &self,
        caller: Option<&str>,
        messages: Vec<ChatMessage>,
    ) -> Result<Value, ApiError> {
        let Some(provider) = &self.provider else {
            return Err(ApiError::Config(
                "Chat provider API key not configured".to_string(),
            ));
        };

        let Some(caller) = caller.map(str::trim).filter(|c| !c.is_empty()) else {
            return Err(ApiError::BadRequest(
                "User ID is required for rate limiting".to_string(),
            ));
        };

        if self.limiter.check(caller) == RateDecision::Limited {
            return Err(ApiError::RateLimited(
                "Rate limit exceeded. Please try again later.".to_string(),
            ));
        }

        let mut forwarded = Vec::with_capacity(messages.len() + 1);
        forwarded.push(ChatMessage::system(SYSTEM_INSTRUCTION));
        forwarded.extend(messages);

        provider.complete(&forwarded).await.map_err(|e| {
            log::error!("chat completion for {caller} failed: {:#}", e);
            match e {
                ChatProviderError::Status { status, .. } => ApiError::Upstream {
                    status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                    message: "Failed to get response from AI model".to_string(),
                },
                ChatProviderError::Transport(_) => {
                    ApiError::Internal("Internal server error".to_string())
                }
            }
        })
    }
}
