use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;

use super::{Article, NewsProvider};

const ENDPOINT: &str = "https://gnews.io/api/v4/search";

pub struct GNewsClient {
    client: reqwest::Client,
    token: Option<String>,
}

#[derive(Deserialize)]
struct NewsResponse {
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Deserialize)]
struct RawArticle {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
}

impl GNewsClient {
    pub fn new(client: reqwest::Client, token: Option<String>) -> Self {
        Self { client, token }
    }
}

#[async_trait]
impl NewsProvider for GNewsClient {
    async fn articles(&self, query: &str, max: usize) -> Result<Vec<Article>> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| anyhow!("news provider is not configured"))?;
        let max = max.to_string();

        let res = self
            .client
            .get(ENDPOINT)
            .query(&[
                ("q", query),
                ("lang", "en"),
                ("max", max.as_str()),
                ("token", token),
            ])
            .send()
            .await
            .context("news request failed")?
            .error_for_status()
            .context("news provider returned an error status")?;

        let body: NewsResponse = res.json().await.context("malformed news body")?;
        Ok(body
            .articles
            .into_iter()
            .map(|a| Article {
                title: a.title,
                url: a.url,
            })
            .collect())
    }
}
