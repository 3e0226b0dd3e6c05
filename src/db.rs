use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::options::ClientOptions;
use mongodb::{
    Client, Collection, Database as MongoDatabase,
    bson::{self, Document, doc, oid::ObjectId},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;

use crate::data_models::{FeedbackEntry, UserSignIn};

/// Collection names as constants for consistency
pub mod collections {
    pub const USER_SIGN_INS: &str = "userSignIns";
    pub const FEEDBACK: &str = "feedback";
}

/// Main database wrapper providing connection management and collection access
#[derive(Debug, Clone)]
pub struct Database {
    client: Client,
    db: MongoDatabase,
}

impl Database {
    /// Connects and pings the server so misconfiguration fails at startup.
    pub async fn new(uri: &str, db_name: &str) -> Result<Self> {
        let client_options = ClientOptions::parse(uri)
            .await
            .context("Failed to parse MongoDB connection string")?;

        let client =
            Client::with_options(client_options).context("Failed to create MongoDB client")?;

        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .context("Failed to connect to MongoDB")?;

        log::info!("Connected to MongoDB database: {}", db_name);

        let db = client.database(db_name);

        Ok(Self { client, db })
    }

    /// Get a typed collection by name
    pub fn collection<T>(&self, name: &str) -> Collection<T>
    where
        T: Send + Sync,
    {
        self.db.collection(name)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn sign_ins(&self) -> Collection<SignInDoc> {
        self.collection(collections::USER_SIGN_INS)
    }

    fn feedback(&self) -> Collection<FeedbackDoc> {
        self.collection(collections::FEEDBACK)
    }
}

// =============================================================================
// Generic collection helpers
// =============================================================================

pub struct Repository<T>
where
    T: Send + Sync,
{
    collection: Collection<T>,
}

impl<T> Repository<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    pub fn new(collection: Collection<T>) -> Self {
        Self { collection }
    }

    pub async fn insert(&self, doc: &T) -> Result<ObjectId> {
        let result = self
            .collection
            .insert_one(doc)
            .await
            .context("Failed to insert document")?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| anyhow::anyhow!("Failed to get inserted ObjectId"))
    }

    /// Replaces the document matching `filter`, inserting it when absent.
    pub async fn upsert(&self, filter: Document, doc: &T) -> Result<()> {
        self.collection
            .replace_one(filter, doc)
            .upsert(true)
            .await
            .context("Failed to upsert document")?;
        Ok(())
    }

    /// All documents, newest first according to `field`.
    pub async fn find_newest_first(&self, field: &str) -> Result<Vec<T>> {
        let cursor = self
            .collection
            .find(doc! {})
            .sort(doc! { field: -1 })
            .await
            .context("Failed to execute find query")?;

        cursor
            .try_collect()
            .await
            .context("Failed to collect results")
    }
}

// =============================================================================
// User records: sign-ins and feedback
// =============================================================================

/// Persistence for the only two things the gateway writes about users.
#[async_trait]
pub trait UserRecordStore: Send + Sync {
    async fn upsert_sign_in(&self, sign_in: &UserSignIn) -> Result<()>;
    async fn append_feedback(&self, entry: &FeedbackEntry) -> Result<()>;
    /// Newest first.
    async fn list_sign_ins(&self) -> Result<Vec<UserSignIn>>;
    /// Newest first.
    async fn list_feedback(&self) -> Result<Vec<FeedbackEntry>>;
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct SignInDoc {
    #[serde(rename = "_id")]
    id: String,
    email: Option<String>,
    name: Option<String>,
    image: Option<String>,
    timestamp: bson::DateTime,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct FeedbackDoc {
    #[serde(rename = "_id")]
    id: ObjectId,
    name: String,
    email: String,
    feedback: String,
    timestamp: bson::DateTime,
}

fn to_bson_time(at: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(at.timestamp_millis())
}

fn from_bson_time(at: bson::DateTime) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(at.timestamp_millis()).unwrap_or_default()
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

impl From<&UserSignIn> for SignInDoc {
    fn from(s: &UserSignIn) -> Self {
        SignInDoc {
            id: s.user_id.clone(),
            email: s.email.clone(),
            name: s.name.clone(),
            image: s.avatar_url.clone(),
            timestamp: to_bson_time(s.last_seen_at),
        }
    }
}

impl From<SignInDoc> for UserSignIn {
    fn from(d: SignInDoc) -> Self {
        UserSignIn::new(d.id, d.email, d.name, d.image, from_bson_time(d.timestamp))
    }
}

impl From<&FeedbackEntry> for FeedbackDoc {
    fn from(e: &FeedbackEntry) -> Self {
        FeedbackDoc {
            id: ObjectId::new(),
            name: e.name.clone().unwrap_or_default(),
            email: e.email.clone().unwrap_or_default(),
            feedback: e.feedback.clone(),
            timestamp: to_bson_time(e.submitted_at),
        }
    }
}

impl From<FeedbackDoc> for FeedbackEntry {
    fn from(d: FeedbackDoc) -> Self {
        FeedbackEntry::new(
            non_empty(d.name),
            non_empty(d.email),
            d.feedback,
            from_bson_time(d.timestamp),
        )
    }
}

pub struct MongoUserRecordStore {
    sign_ins: Repository<SignInDoc>,
    feedback: Repository<FeedbackDoc>,
}

impl MongoUserRecordStore {
    pub fn new(db: &Database) -> Self {
        Self {
            sign_ins: Repository::new(db.sign_ins()),
            feedback: Repository::new(db.feedback()),
        }
    }
}

#[async_trait]
impl UserRecordStore for MongoUserRecordStore {
    async fn upsert_sign_in(&self, sign_in: &UserSignIn) -> Result<()> {
        let doc = SignInDoc::from(sign_in);
        self.sign_ins.upsert(doc! { "_id": &doc.id }, &doc).await
    }

    async fn append_feedback(&self, entry: &FeedbackEntry) -> Result<()> {
        self.feedback.insert(&FeedbackDoc::from(entry)).await?;
        Ok(())
    }

    async fn list_sign_ins(&self) -> Result<Vec<UserSignIn>> {
        let docs = self.sign_ins.find_newest_first("timestamp").await?;
        Ok(docs.into_iter().map(UserSignIn::from).collect())
    }

    async fn list_feedback(&self) -> Result<Vec<FeedbackEntry>> {
        let docs = self.feedback.find_newest_first("timestamp").await?;
        Ok(docs.into_iter().map(FeedbackEntry::from).collect())
    }
}

/// Process-local store used when no MongoDB is configured.
#[derive(Default)]
pub struct InMemoryUserRecordStore {
    sign_ins: RwLock<Vec<UserSignIn>>,
    feedback: RwLock<Vec<FeedbackEntry>>,
}

impl InMemoryUserRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRecordStore for InMemoryUserRecordStore {
    async fn upsert_sign_in(&self, sign_in: &UserSignIn) -> Result<()> {
        let mut rows = self.sign_ins.write().await;
        match rows.iter_mut().find(|r| r.user_id == sign_in.user_id) {
            Some(existing) => *existing = sign_in.clone(),
            None => rows.push(sign_in.clone()),
        }
        Ok(())
    }

    async fn append_feedback(&self, entry: &FeedbackEntry) -> Result<()> {
        self.feedback.write().await.push(entry.clone());
        Ok(())
    }

    async fn list_sign_ins(&self) -> Result<Vec<UserSignIn>> {
        let mut rows = self.sign_ins.read().await.clone();
        rows.sort_by(|a, b| b.last_seen_at.cmp(&a.last_seen_at));
        Ok(rows)
    }

    async fn list_feedback(&self) -> Result<Vec<FeedbackEntry>> {
        let mut rows = self.feedback.read().await.clone();
        rows.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(rows)
    }
}

// =============================================================================
// Test utilities
// =============================================================================


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sign_in(id: &str, name: &str, at: DateTime<Utc>) -> UserSignIn {
        UserSignIn::new(
            id.to_string(),
            Some(format!("{id}@example.com")),
            Some(name.to_string()),
            None,
            at,
        )
    }

    async fn exercise_store(store: &dyn UserRecordStore) -> Result<()> {
        let t0 = Utc::now();

        store.upsert_sign_in(&sign_in("u1", "Ada", t0)).await?;
        store.upsert_sign_in(&sign_in("u2", "Grace", t0 + Duration::seconds(1))).await?;
        store.upsert_sign_in(&sign_in("u1", "Ada L.", t0 + Duration::seconds(2))).await?;

        let rows = store.list_sign_ins().await?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].user_id, "u1");
        assert_eq!(rows[0].name.as_deref(), Some("Ada L."));
        assert_eq!(rows[1].user_id, "u2");

        store
            .append_feedback(&FeedbackEntry::new(None, None, "first".into(), t0))
            .await?;
        store
            .append_feedback(&FeedbackEntry::new(
                Some("Bo".into()),
                None,
                "second".into(),
                t0 + Duration::seconds(5),
            ))
            .await?;

        let feedback = store.list_feedback().await?;
        assert_eq!(feedback.len(), 2);
        assert_eq!(feedback[0].feedback, "second");
        assert_eq!(feedback[0].name.as_deref(), Some("Bo"));
        assert_eq!(feedback[1].feedback, "first");
        Ok(())
    }

    #[tokio::test]
    async fn in_memory_store_keeps_one_row_per_user() -> Result<()> {
        exercise_store(&InMemoryUserRecordStore::new()).await
    }

    #[tokio::test]
    #[ignore = "requires a running MongoDB (MONGO_URI)"]
    async fn mongo_store_keeps_one_row_per_user() -> Result<()> {
        let (db, db_name) = test_utils::create_test_db().await?;
        let result = exercise_store(&MongoUserRecordStore::new(&db)).await;
        test_utils::cleanup_test_db(&db, &db_name).await?;
        result
    }
}
