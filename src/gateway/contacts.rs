use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::cache::TtlCache;
use crate::error::ApiError;
use crate::providers::{SearchHit, SearchProvider};
use crate::query::composite_key;

pub const MAX_PROFILE_CONTACTS: usize = 8;
pub const MAX_SEARCH_RESULTS: usize = 10;

const PLATFORM_SUFFIXES: [&str; 2] = [" | LinkedIn", " - LinkedIn"];

/// A person surfaced by the profile search on the company overview.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProfileContact {
    pub name: String,
    pub link: String,
    pub description: String,
    pub position: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ContactSearchResponse {
    pub results: Vec<SearchHit>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

/// Query for profiles that mention the company at all.
pub fn profile_query(company: &str) -> String {
    format!(r#"site:linkedin.com/in/ "{company}" OR "{company} employee" OR "works at {company}""#)
}

/// Query for employees, optionally narrowed to a role and a university.
pub fn employee_query(company: &str, role: Option<&str>, university: Option<&str>) -> String {
    let mut query = company.to_string();
    if let Some(role) = role {
        query.push(' ');
        query.push_str(role);
    }
    query.push_str(" employees site:linkedin.com/in");
    if let Some(university) = university {
        query.push_str(&format!(r#" "{university}""#));
    }
    query
}

pub fn strip_platform_suffix(title: &str) -> String {
    PLATFORM_SUFFIXES
        .iter()
        .fold(title.to_string(), |t, suffix| t.replace(suffix, ""))
        .trim()
        .to_string()
}

static POSITION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // "Senior Software Engineer at Acme"
        r"([A-Z][\w&/+.-]*(?:\s+[A-Z][\w&/+.-]*)*)\s+at\s+",
        // "Jane Doe | Product Manager · Acme"
        r"\|\s*([^·|]+?)\s*(?:·|\||$)",
        // "... at Acme Corp · London"
        r"\bat\s+([^·|.]+)",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Best-effort role extraction from a search snippet; empty when nothing
/// matches.
pub fn extract_position(snippet: &str) -> String {
    POSITION_PATTERNS
        .iter()
        .find_map(|re| {
            re.captures(snippet)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim().to_string())
                .filter(|s| !s.is_empty())
        })
        .unwrap_or_default()
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

pub struct ContactService {
    search: Arc<dyn SearchProvider>,
    cache: Arc<TtlCache<Vec<SearchHit>>>,
}

impl ContactService {
    pub fn new(search: Arc<dyn SearchProvider>, cache: Arc<TtlCache<Vec<SearchHit>>>) -> Self {
        Self { search, cache }
    }

    /// Profiles for the overview tab. Never fails; provider trouble yields
    /// an empty list.
    pub async fn profiles(&self, company: &str, max: usize) -> Vec<ProfileContact> {
        let hits = match self.search.search(&profile_query(company), MAX_SEARCH_RESULTS).await {
            Ok(hits) => hits,
            Err(e) => {
                log::warn!("profile search for {company} failed: {:#}", e);
                return Vec::new();
            }
        };

        hits.into_iter()
            .take(max.min(MAX_PROFILE_CONTACTS))
            .map(|hit| {
                let name = strip_platform_suffix(&hit.title);
                ProfileContact {
                    name: if name.is_empty() { "Unknown".to_string() } else { name },
                    position: extract_position(&hit.snippet),
                    link: hit.link,
                    description: hit.snippet,
                }
            })
            .collect()
    }

    /// Employee search for the contacts tab, cached per
    /// `company|role|university`.
    ///
    /// The plain company search degrades to an empty list with an `error`
    /// note; a filtered search reports provider failure to the caller.
    pub async fn employees(
        &self,
        company: &str,
        role: Option<&str>,
        university: Option<&str>,
    ) -> Result<ContactSearchResponse, ApiError> {
        let role = non_blank(role);
        let university = non_blank(university);
        let key = composite_key(company, role, university);

        if let Some(results) = self.cache.get(&key).await {
            log::debug!("contact search cache hit for {key}");
            return Ok(ContactSearchResponse {
                results,
                error: None,
            });
        }

        let query = employee_query(company, role, university);
        match self.search.search(&query, MAX_SEARCH_RESULTS).await {
            Ok(hits) => {
                let results: Vec<SearchHit> = hits
                    .into_iter()
                    .take(MAX_SEARCH_RESULTS)
                    .map(|hit| SearchHit {
                        title: strip_platform_suffix(&hit.title),
                        ..hit
                    })
                    .collect();
                if let Err(e) = self.cache.put(&key, results.clone()).await {
                    log::warn!("failed to write contact cache: {:#}", e);
                }
                Ok(ContactSearchResponse {
                    results,
                    error: None,
                })
            }
            Err(e) if role.is_none() && university.is_none() => {
                log::warn!("contact search for {company} failed: {:#}", e);
                Ok(ContactSearchResponse {
                    results: Vec::new(),
                    error: Some("Failed to fetch search results".to_string()),
                })
            }
            Err(e) => {
                log::error!("filtered contact search for {company} failed: {:#}", e);
                Err(ApiError::Upstream {
                    status: axum::http::StatusCode::BAD_GATEWAY,
                    message: "Failed to fetch search results".to_string(),
                })
            }
        }
    }
}
