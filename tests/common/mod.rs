#![allow(dead_code)]

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use compli::api::create_router;
use compli::clock::ManualClock;
use compli::db::InMemoryUserRecordStore;
use compli::gateway::{Gateway, GatewaySettings, Providers};
use compli::providers::{
    Article, ChatMessage, ChatProvider, ChatProviderError, NewsProvider, PageFetcher,
    ReviewProvider, SearchHit, SearchProvider,
};

pub const ADMIN_EMAIL: &str = "admin@example.com";

/// Serves canned HTML for known URLs; everything else fails.
#[derive(Default)]
pub struct FakePages {
    pub pages: HashMap<String, String>,
    pub requested: Mutex<Vec<String>>,
}

impl FakePages {
    pub fn with(url: &str, html: &str) -> Self {
        let mut pages = HashMap::new();
        pages.insert(url.to_string(), html.to_string());
        Self {
            pages,
            ..Self::default()
        }
    }
}

#[async_trait]
impl PageFetcher for FakePages {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.requested.lock().unwrap().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("404 for {url}"))
    }
}

/// `None` hits means every search fails.
#[derive(Default)]
pub struct FakeSearch {
    pub hits: Option<Vec<SearchHit>>,
    pub queries: Mutex<Vec<String>>,
}

impl FakeSearch {
    pub fn returning(hits: Vec<SearchHit>) -> Self {
        Self {
            hits: Some(hits),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl SearchProvider for FakeSearch {
    async fn search(&self, query: &str, num: usize) -> Result<Vec<SearchHit>> {
        self.queries.lock().unwrap().push(query.to_string());
        match &self.hits {
            Some(hits) => Ok(hits.iter().take(num).cloned().collect()),
            None => Err(anyhow!("search quota exceeded")),
        }
    }
}

#[derive(Default)]
pub struct FakeNews {
    pub articles: Vec<Article>,
}

#[async_trait]
impl NewsProvider for FakeNews {
    async fn articles(&self, _query: &str, max: usize) -> Result<Vec<Article>> {
        Ok(self.articles.iter().take(max).cloned().collect())
    }
}

pub struct FakeReviews {
    pub search: Value,
    pub interviews: Value,
    pub search_ok: bool,
    pub interviews_ok: bool,
    pub overview_ok: bool,
    pub searches: AtomicUsize,
}

impl FakeReviews {
    pub fn new(search: Value, interviews: Value) -> Self {
        Self {
            search,
            interviews,
            search_ok: true,
            interviews_ok: true,
            overview_ok: true,
            searches: AtomicUsize::new(0),
        }
    }

    /// A provider that knows no companies at all.
    pub fn no_matches() -> Self {
        Self::new(json!({"status": true, "data": {"employerResults": []}}), json!({}))
    }

    pub fn search_calls(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReviewProvider for FakeReviews {
    async fn search_companies(&self, _query: &str) -> Result<Value> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if !self.search_ok {
            return Err(anyhow!("company search timed out"));
        }
        Ok(self.search.clone())
    }

    async fn interviews(&self, _employer_id: &str, _limit: usize) -> Result<Value> {
        if !self.interviews_ok {
            return Err(anyhow!("interviews endpoint returned 503"));
        }
        Ok(self.interviews.clone())
    }

    async fn overview(&self, employer_id: &str) -> Result<Value> {
        if self.overview_ok {
            Ok(json!({"id": employer_id}))
        } else {
            Err(anyhow!("overview unavailable"))
        }
    }
}

/// Echoes the number of forwarded messages; `fail_with` makes every call
/// fail with that status.
#[derive(Default)]
pub struct FakeChat {
    pub fail_with: Option<u16>,
    pub received: Mutex<Vec<Vec<ChatMessage>>>,
}

#[async_trait]
impl ChatProvider for FakeChat {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Value, ChatProviderError> {
        self.received.lock().unwrap().push(messages.to_vec());
        if let Some(status) = self.fail_with {
            return Err(ChatProviderError::Status {
                status,
                body: json!({"error": {"message": "upstream said no"}}),
            });
        }
        Ok(json!({
            "choices": [{"message": {"role": "assistant", "content": format!("{} messages", messages.len())}}]
        }))
    }
}

pub struct Fakes {
    pub pages: Arc<FakePages>,
    pub search: Arc<FakeSearch>,
    pub news: Arc<FakeNews>,
    pub reviews: Arc<FakeReviews>,
    pub chat: Option<Arc<FakeChat>>,
}

impl Default for Fakes {
    fn default() -> Self {
        Self {
            pages: Arc::new(FakePages::default()),
            search: Arc::new(FakeSearch::returning(Vec::new())),
            news: Arc::new(FakeNews::default()),
            reviews: Arc::new(FakeReviews::no_matches()),
            chat: Some(Arc::new(FakeChat::default())),
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub gateway: Arc<Gateway>,
    pub clock: Arc<ManualClock>,
}

pub async fn spawn_app(fakes: &Fakes) -> TestApp {
    let clock = Arc::new(ManualClock::default());
    let providers = Providers {
        pages: fakes.pages.clone(),
        search: fakes.search.clone(),
        news: fakes.news.clone(),
        reviews: fakes.reviews.clone(),
        chat: fakes
            .chat
            .clone()
            .map(|c| c as Arc<dyn ChatProvider>),
    };
    let settings = GatewaySettings {
        admin_email: Some(ADMIN_EMAIL.to_string()),
        ..GatewaySettings::default()
    };
    let gateway = Arc::new(
        Gateway::new(
            providers,
            Arc::new(InMemoryUserRecordStore::new()),
            clock.clone(),
            settings,
        )
        .await,
    );
    TestApp {
        router: create_router(gateway.clone()),
        gateway,
        clock,
    }
}

pub fn hit(title: &str, link: &str, snippet: &str) -> SearchHit {
    SearchHit {
        title: title.to_string(),
        link: link.to_string(),
        snippet: snippet.to_string(),
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or_else(|_| {
        Value::String(String::from_utf8_lossy(&bytes).into_owned())
    });
    (status, body)
}

pub async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(router, request).await
}

pub async fn post_json(
    router: &Router,
    uri: &str,
    body: Value,
    headers: &[(&str, &str)],
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();
    send(router, request).await
}
