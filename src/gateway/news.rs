use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use crate::providers::{Article, NewsProvider};

pub const MAX_ARTICLES: usize = 5;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
}

impl From<Article> for NewsItem {
    fn from(a: Article) -> Self {
        NewsItem {
            title: a.title,
            link: a.url,
        }
    }
}

/// Keeps the first article of every title, comparing trimmed, lower-cased
/// titles.
pub fn dedupe_by_title(items: impl IntoIterator<Item = NewsItem>) -> Vec<NewsItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.title.trim().to_lowercase()))
        .collect()
}

pub struct NewsService {
    provider: Arc<dyn NewsProvider>,
}

impl NewsService {
    pub fn new(provider: Arc<dyn NewsProvider>) -> Self {
        Self { provider }
    }

    /// Recent articles about `company`; empty when the provider fails.
    pub async fn lookup(&self, company: &str) -> Vec<NewsItem> {
        match self.provider.articles(company, MAX_ARTICLES).await {
            Ok(articles) => dedupe_by_title(articles.into_iter().map(NewsItem::from)),
            Err(e) => {
                log::warn!("news lookup for {company} failed: {:#}", e);
                Vec::new()
            }
        }
    }
}
