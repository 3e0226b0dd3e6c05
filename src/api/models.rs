use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::gateway::contacts::MAX_PROFILE_CONTACTS;
use crate::gateway::news::NewsItem;
use crate::providers::ChatMessage;

#[derive(Debug, Deserialize)]
pub struct CompanyParams {
    pub company: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContactSearchParams {
    pub company: Option<String>,
    pub university: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub company: Option<String>,
    #[serde(default = "default_true")]
    pub include_contacts: bool,
    #[serde(default = "default_max_contacts")]
    pub max_contacts: usize,
}

fn default_true() -> bool {
    true
}

fn default_max_contacts() -> usize {
    MAX_PROFILE_CONTACTS
}

#[derive(Debug, Serialize)]
pub struct NewsResponse {
    pub news: Vec<NewsItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    pub user_id: Option<String>,
}

/// `feedback` stays untyped so a non-string value is reported as missing
/// feedback rather than as a malformed body.
#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub feedback: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}
