use reqwest::Url;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::contacts::ProfileContact;
use super::news::NewsItem;
use crate::providers::PageFetcher;
use crate::query::CompanyQuery;

pub const CANDIDATE_PATHS: [&str; 5] = ["/", "/about", "/en", "/home", "/index.html"];
pub const SUMMARY_PLACEHOLDER: &str = "No values summary found.";

/// Paragraphs must be strictly longer than this many characters...
const SUMMARY_MIN_CHARS: usize = 40;
/// ...and strictly shorter than this.
const SUMMARY_MAX_CHARS: usize = 300;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SiteSummary {
    pub url: String,
    pub summary: String,
    pub news: Vec<NewsItem>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub contacts: Option<Vec<ProfileContact>>,
}

/// A homepage candidate that answered successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredPage {
    pub url: String,
    pub html: String,
}

/// Guessed homepage, or `None` when the name cannot form a hostname.
pub fn base_url(company: &CompanyQuery) -> Option<String> {
    company.host_label().map(|label| format!("https://{label}.com"))
}

/// Web-search URL for "<company> official site", used when no homepage
/// candidate responds.
pub fn fallback_url(company: &CompanyQuery) -> String {
    let query = format!("{} official site", company.raw());
    Url::parse_with_params("https://www.google.com/search", &[("q", query.as_str())])
        .map(|u| u.to_string())
        .unwrap_or_else(|_| "https://www.google.com/search".to_string())
}

/// First `<p>` whose collapsed text length falls inside the display band.
pub fn extract_summary(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("p").ok()?;

    document
        .select(&selector)
        .map(|p| {
            p.text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .find(|text| {
            let len = text.chars().count();
            len > SUMMARY_MIN_CHARS && len < SUMMARY_MAX_CHARS
        })
}

pub struct SiteService {
    fetcher: Arc<dyn PageFetcher>,
}

impl SiteService {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    /// Tries each candidate path in order; failures are skipped silently.
    pub async fn discover(&self, company: &CompanyQuery) -> Option<DiscoveredPage> {
        let Some(base) = base_url(company) else {
            log::warn!("{:?} is not a usable hostname, skipping homepage probe", company.raw());
            return None;
        };

        for path in CANDIDATE_PATHS {
            let url = format!("{base}{path}");
            match self.fetcher.fetch(&url).await {
                Ok(html) => return Some(DiscoveredPage { url, html }),
                Err(e) => log::debug!("homepage candidate {url} failed: {:#}", e),
            }
        }
        log::info!("no homepage found for {}", company.raw());
        None
    }

    /// Homepage URL and summary, or the search fallback and placeholder.
    pub async fn locate(&self, company: &CompanyQuery) -> (String, String) {
        match self.discover(company).await {
            Some(page) => {
                let summary =
                    extract_summary(&page.html).unwrap_or_else(|| SUMMARY_PLACEHOLDER.to_string());
                (page.url, summary)
            }
            None => (fallback_url(company), SUMMARY_PLACEHOLDER.to_string()),
        }
    }
}
