//! Seams to the third-party services the gateway aggregates. Each trait has
//! one reqwest-backed implementation; tests substitute their own.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

pub mod gnews;
pub mod google;
pub mod openrouter;
pub mod rapidapi;
pub mod web;

pub use gnews::GNewsClient;
pub use google::GoogleSearchClient;
pub use openrouter::{ChatProviderError, OpenRouterClient};
pub use rapidapi::RapidApiReviewClient;
pub use web::HttpPageFetcher;

/// One ranked hit from a keyword search.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Article {
    pub title: String,
    pub url: String,
}

/// Roles this crate builds messages with. Anything else a caller sends
/// (`tool`, `developer`, ...) is carried through verbatim.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
    #[serde(untagged)]
    Other(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    #[serde(default)]
    pub content: String,
    /// Provider-specific fields such as `name` or `tool_call_id`.
    #[serde(flatten, default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            extra: Map::new(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}

/// Fetches a web page. Only successful (2xx) responses yield a body.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, num: usize) -> Result<Vec<SearchHit>>;
}

#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn articles(&self, query: &str, max: usize) -> Result<Vec<Article>>;
}

/// Company-review provider. Responses are returned untyped because their
/// shape is not stable; the interview aggregator probes them.
#[async_trait]
pub trait ReviewProvider: Send + Sync {
    async fn search_companies(&self, query: &str) -> Result<Value>;
    async fn interviews(&self, employer_id: &str, limit: usize) -> Result<Value>;
    async fn overview(&self, employer_id: &str) -> Result<Value>;
}

#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Value, ChatProviderError>;
}

/// Shared client for every outbound call; the timeout bounds each request.
pub fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("compli/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}
