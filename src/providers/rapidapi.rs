use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;

use super::ReviewProvider;

const HOST: &str = "glassdoor-real-time.p.rapidapi.com";

/// Company-review data served through RapidAPI.
pub struct RapidApiReviewClient {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl RapidApiReviewClient {
    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("review provider is not configured"))?;

        let res = self
            .client
            .get(format!("https://{HOST}{path}"))
            .query(query)
            .header("X-RapidAPI-Key", key)
            .header("X-RapidAPI-Host", HOST)
            .send()
            .await
            .with_context(|| format!("request to {path} failed"))?;

        let status = res.status();
        if !status.is_success() {
            return Err(anyhow!(
                "{path} returned {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown")
            ));
        }
        res.json().await.with_context(|| format!("malformed body from {path}"))
    }
}

#[async_trait]
impl ReviewProvider for RapidApiReviewClient {
    async fn search_companies(&self, query: &str) -> Result<Value> {
        self.get("/companies/search", &[("query", query)]).await
    }

    async fn interviews(&self, employer_id: &str, limit: usize) -> Result<Value> {
        let limit = limit.to_string();
        self.get(
            "/companies/interviews",
            &[("companyId", employer_id), ("limit", limit.as_str())],
        )
        .await
    }

    async fn overview(&self, employer_id: &str) -> Result<Value> {
        self.get("/companies/overview", &[("companyId", employer_id)])
            .await
    }
}
