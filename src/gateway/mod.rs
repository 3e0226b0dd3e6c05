//! The aggregation gateway: one service per external concern, bundled into
//! a [`Gateway`] that the HTTP layer shares between requests.

use anyhow::Result;
use chrono::Duration;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::{DEFAULT_TTL_HOURS, TtlCache};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::db::{Database, InMemoryUserRecordStore, MongoUserRecordStore, UserRecordStore};
use crate::providers::{
    ChatProvider, GNewsClient, GoogleSearchClient, HttpPageFetcher, NewsProvider,
    OpenRouterClient, PageFetcher, RapidApiReviewClient, ReviewProvider, SearchProvider,
    http_client,
};
use crate::query::CompanyQuery;
use crate::rate_limit::{InMemoryRateLimitStore, RateLimiter};

pub mod chat;
pub mod contacts;
pub mod interviews;
pub mod news;
pub mod records;
pub mod site;

use chat::ChatService;
use contacts::{ContactService, MAX_PROFILE_CONTACTS};
use interviews::InterviewService;
use news::NewsService;
use records::RecordService;
use site::{SiteService, SiteSummary};

pub const INTERVIEW_CACHE_FILE: &str = "interviewCache.json";
pub const SEARCH_CACHE_FILE: &str = "searchCache.json";

pub struct Providers {
    pub pages: Arc<dyn PageFetcher>,
    pub search: Arc<dyn SearchProvider>,
    pub news: Arc<dyn NewsProvider>,
    pub reviews: Arc<dyn ReviewProvider>,
    pub chat: Option<Arc<dyn ChatProvider>>,
}

#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub admin_email: Option<String>,
    pub rate_limit_max: usize,
    pub rate_limit_window: Duration,
    pub cache_ttl: Duration,
    /// `None` keeps both caches in memory.
    pub cache_dir: Option<PathBuf>,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            admin_email: None,
            rate_limit_max: crate::rate_limit::DEFAULT_MAX_REQUESTS,
            rate_limit_window: Duration::seconds(crate::rate_limit::DEFAULT_WINDOW_SECS),
            cache_ttl: Duration::hours(DEFAULT_TTL_HOURS),
            cache_dir: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryOptions {
    pub include_contacts: bool,
    pub max_contacts: usize,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            include_contacts: true,
            max_contacts: MAX_PROFILE_CONTACTS,
        }
    }
}

pub struct Gateway {
    pub site: SiteService,
    pub news: NewsService,
    pub contacts: ContactService,
    pub interviews: InterviewService,
    pub chat: ChatService,
    pub records: RecordService,
}

async fn open_cache<T>(
    dir: Option<&PathBuf>,
    file: &str,
    ttl: Duration,
    clock: Arc<dyn Clock>,
) -> Arc<TtlCache<T>>
where
    T: serde::Serialize + serde::de::DeserializeOwned + Clone + Send + Sync,
{
    match dir {
        Some(dir) => Arc::new(TtlCache::open(dir.join(file), ttl, clock).await),
        None => Arc::new(TtlCache::in_memory(ttl, clock)),
    }
}

impl Gateway {
    pub async fn new(
        providers: Providers,
        store: Arc<dyn UserRecordStore>,
        clock: Arc<dyn Clock>,
        settings: GatewaySettings,
    ) -> Self {
        let dir = settings.cache_dir.as_ref();
        let interview_cache =
            open_cache(dir, INTERVIEW_CACHE_FILE, settings.cache_ttl, clock.clone()).await;
        let search_cache =
            open_cache(dir, SEARCH_CACHE_FILE, settings.cache_ttl, clock.clone()).await;

        let limiter = RateLimiter::new(
            Arc::new(InMemoryRateLimitStore::new()),
            clock.clone(),
            settings.rate_limit_window,
            settings.rate_limit_max,
        );

        Gateway {
            site: SiteService::new(providers.pages),
            news: NewsService::new(providers.news),
            contacts: ContactService::new(providers.search, search_cache),
            interviews: InterviewService::new(providers.reviews, interview_cache),
            chat: ChatService::new(providers.chat, limiter),
            records: RecordService::new(store, clock, settings.admin_email),
        }
    }

    /// Wires the real providers and stores described by `config`.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let http = http_client(config.http_timeout_secs)?;

        let chat: Option<Arc<dyn ChatProvider>> = match &config.openrouter_api_key {
            Some(key) => Some(Arc::new(OpenRouterClient::new(
                http.clone(),
                key.clone(),
                config.openrouter_model.clone(),
                config.app_url.clone(),
            ))),
            None => {
                log::warn!("OPENROUTER_API_KEY not set; chat endpoint will be unavailable");
                None
            }
        };

        let providers = Providers {
            pages: Arc::new(HttpPageFetcher::new(http.clone())),
            search: Arc::new(GoogleSearchClient::new(
                http.clone(),
                config.google_api_key.clone(),
                config.google_cse_id.clone(),
            )),
            news: Arc::new(GNewsClient::new(http.clone(), config.gnews_api_key.clone())),
            reviews: Arc::new(RapidApiReviewClient::new(
                http.clone(),
                config.rapidapi_key.clone(),
            )),
            chat,
        };

        let store: Arc<dyn UserRecordStore> = match &config.mongo_uri {
            Some(uri) => {
                let db = Database::new(uri, &config.mongo_db_name).await?;
                Arc::new(MongoUserRecordStore::new(&db))
            }
            None => {
                log::warn!("MONGO_URI not set; sign-ins and feedback are kept in memory");
                Arc::new(InMemoryUserRecordStore::new())
            }
        };

        let settings = GatewaySettings {
            admin_email: config.admin_email.clone(),
            rate_limit_max: config.rate_limit_max,
            rate_limit_window: Duration::seconds(config.rate_limit_window_secs),
            cache_ttl: Duration::hours(DEFAULT_TTL_HOURS),
            cache_dir: Some(config.cache_dir.clone()),
        };

        Ok(Self::new(providers, store, Arc::new(SystemClock), settings).await)
    }

    /// Homepage, news and (optionally) profile contacts, fetched in
    /// parallel. Never fails.
    #[tracing::instrument(skip_all, fields(company = %company.normalized()))]
    pub async fn site_summary(&self, company: &CompanyQuery, options: SummaryOptions) -> SiteSummary {
        let contacts = async {
            if options.include_contacts {
                Some(self.contacts.profiles(company.raw(), options.max_contacts).await)
            } else {
                None
            }
        };
        let ((url, summary), news, contacts) = futures::join!(
            self.site.locate(company),
            self.news.lookup(company.raw()),
            contacts
        );
        log::info!(
            "site summary for {}: {} news, {} contacts",
            company.raw(),
            news.len(),
            contacts.as_ref().map_or(0, Vec::len)
        );

        SiteSummary {
            url,
            summary,
            news,
            contacts,
        }
    }
}
