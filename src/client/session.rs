use anyhow::{Context, Result, anyhow, bail};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use super::history::SearchHistory;
use super::store::KeyValueStore;
use crate::gateway::contacts::ContactSearchResponse;
use crate::gateway::interviews::InterviewRecord;
use crate::gateway::news::NewsItem;
use crate::gateway::site::SiteSummary;
use crate::providers::{ChatMessage, SearchHit};

/// Result tabs of the search page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Tab {
    #[default]
    Overview,
    News,
    Interviews,
    Contacts,
    Prep,
}

impl Tab {
    pub const ALL: [Tab; 5] = [Tab::Overview, Tab::News, Tab::Interviews, Tab::Contacts, Tab::Prep];

    pub fn as_str(self) -> &'static str {
        match self {
            Tab::Overview => "overview",
            Tab::News => "news",
            Tab::Interviews => "interviews",
            Tab::Contacts => "contacts",
            Tab::Prep => "prep",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Tab::ALL
            .into_iter()
            .find(|tab| tab.as_str() == wanted)
            .ok_or_else(|| format!("unknown tab {s:?}"))
    }
}

/// Everything one search produced. Each call fails on its own; a failure
/// is recorded under the tab it would have filled.
#[derive(Debug, Clone, Default)]
pub struct SearchView {
    pub company: String,
    pub site: Option<SiteSummary>,
    pub news: Vec<NewsItem>,
    pub interviews: Option<InterviewRecord>,
    pub contacts: Vec<SearchHit>,
    pub errors: BTreeMap<Tab, String>,
    pub history: SearchHistory,
}

/// Keeps the first item for each exact title.
pub fn unique_news(items: Vec<NewsItem>) -> Vec<NewsItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.title.clone()))
        .collect()
}

/// HTTP client for the gateway endpoints.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn site(&self, company: &str) -> Result<SiteSummary> {
        let req = self
            .http
            .get(self.url("/api/search"))
            .query(&[("company", company)]);
        send(req).await
    }

    pub async fn questions(&self, company: &str) -> Result<InterviewRecord> {
        let req = self
            .http
            .get(self.url("/api/questions"))
            .query(&[("company", company)]);
        send(req).await
    }

    pub async fn contacts(
        &self,
        company: &str,
        university: Option<&str>,
        role: Option<&str>,
    ) -> Result<ContactSearchResponse> {
        let mut params = vec![("company", company)];
        params.extend(university.map(|u| ("university", u)));
        params.extend(role.map(|r| ("role", r)));
        let req = self.http.get(self.url("/api/google-search")).query(&params);
        send(req).await
    }

    /// Raw completion envelope from `/api/llm`.
    pub async fn chat(&self, user_id: &str, messages: &[ChatMessage]) -> Result<Value> {
        let req = self
            .http
            .post(self.url("/api/llm"))
            .json(&json!({ "messages": messages, "userId": user_id }));
        send(req).await
    }

    pub async fn feedback(&self, name: Option<&str>, email: Option<&str>, feedback: &str) -> Result<()> {
        #[derive(Serialize)]
        struct Body<'a> {
            name: Option<&'a str>,
            email: Option<&'a str>,
            feedback: &'a str,
        }
        let req = self.http.post(self.url("/api/feedback")).json(&Body {
            name,
            email,
            feedback,
        });
        let _: Value = send(req).await?;
        Ok(())
    }

    /// Runs the site, interview and contact lookups concurrently and merges
    /// them into one view. The company is added to the local history first.
    pub async fn search<S: KeyValueStore>(
        &self,
        store: &S,
        company: &str,
        university: Option<&str>,
    ) -> Result<SearchView> {
        let company = company.trim();
        if company.is_empty() {
            bail!("company name is required");
        }
        let history = SearchHistory::record(store, company)?;

        let (site, interviews, contacts) = futures::join!(
            self.site(company),
            self.questions(company),
            self.contacts(company, university.filter(|u| !u.trim().is_empty()), None),
        );

        let mut view = SearchView {
            company: company.to_string(),
            history,
            ..SearchView::default()
        };

        match site {
            Ok(mut summary) => {
                view.news = unique_news(std::mem::take(&mut summary.news));
                view.site = Some(summary);
            }
            Err(e) => {
                log::warn!("site lookup for {company} failed: {e:#}");
                view.errors.insert(Tab::Overview, format!("{e:#}"));
            }
        }
        match interviews {
            Ok(record) => view.interviews = Some(record),
            Err(e) => {
                log::warn!("interview lookup for {company} failed: {e:#}");
                view.errors.insert(Tab::Interviews, format!("{e:#}"));
            }
        }
        match contacts {
            Ok(res) => {
                if let Some(note) = res.error {
                    view.errors.insert(Tab::Contacts, note);
                }
                view.contacts = res.results;
            }
            Err(e) => {
                log::warn!("contact search for {company} failed: {e:#}");
                view.errors.insert(Tab::Contacts, format!("{e:#}"));
            }
        }
        Ok(view)
    }
}

/// Sends `req`; non-2xx answers become errors carrying the body's `error`
/// message when there is one.
async fn send<T: DeserializeOwned>(req: reqwest::RequestBuilder) -> Result<T> {
    let res = req.send().await.context("gateway request failed")?;
    let status = res.status();
    let url = res.url().path().to_string();
    let body: Value = res
        .json()
        .await
        .with_context(|| format!("malformed body from {url}"))?;

    if !status.is_success() {
        let message = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("request failed");
        return Err(anyhow!("{url} returned {status}: {message}"));
    }
    serde_json::from_value(body).with_context(|| format!("unexpected body from {url}"))
}
