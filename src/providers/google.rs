use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;

use super::{SearchHit, SearchProvider};

const ENDPOINT: &str = "https://customsearch.googleapis.com/customsearch/v1";

/// Google Programmable Search. Both credentials must be present; otherwise
/// every search fails and callers fall back to an empty result list.
pub struct GoogleSearchClient {
    client: reqwest::Client,
    api_key: Option<String>,
    cse_id: Option<String>,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Deserialize)]
struct Item {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl GoogleSearchClient {
    pub fn new(client: reqwest::Client, api_key: Option<String>, cse_id: Option<String>) -> Self {
        Self {
            client,
            api_key,
            cse_id,
        }
    }
}

#[async_trait]
impl SearchProvider for GoogleSearchClient {
    async fn search(&self, query: &str, num: usize) -> Result<Vec<SearchHit>> {
        let (Some(key), Some(cx)) = (&self.api_key, &self.cse_id) else {
            return Err(anyhow!("custom search is not configured"));
        };
        let num = num.clamp(1, 10).to_string();

        let res = self
            .client
            .get(ENDPOINT)
            .query(&[
                ("key", key.as_str()),
                ("cx", cx.as_str()),
                ("q", query),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .context("custom search request failed")?;

        let status = res.status();
        if !status.is_success() {
            let message = res
                .json::<ErrorEnvelope>()
                .await
                .ok()
                .and_then(|e| e.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| "Failed to fetch search results".to_string());
            return Err(anyhow!("custom search returned {status}: {message}"));
        }

        let body: SearchResponse = res.json().await.context("malformed custom search body")?;
        Ok(body
            .items
            .into_iter()
            .map(|i| SearchHit {
                title: i.title,
                link: i.link,
                snippet: i.snippet,
            })
            .collect())
    }
}
