use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Latest sign-in of a user. One row per user id, overwritten on every
/// sign-in.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSignIn {
    pub user_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub last_seen_at: DateTime<Utc>,
}

impl UserSignIn {
    pub fn new(
        user_id: String,
        email: Option<String>,
        name: Option<String>,
        avatar_url: Option<String>,
        last_seen_at: DateTime<Utc>,
    ) -> UserSignIn {
        UserSignIn {
            user_id,
            email,
            name,
            avatar_url,
            last_seen_at,
        }
    }
}

/// Append-only user feedback.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEntry {
    pub name: Option<String>,
    pub email: Option<String>,
    pub feedback: String,
    pub submitted_at: DateTime<Utc>,
}

impl FeedbackEntry {
    pub fn new(
        name: Option<String>,
        email: Option<String>,
        feedback: String,
        submitted_at: DateTime<Utc>,
    ) -> FeedbackEntry {
        FeedbackEntry {
            name: name.filter(|n| !n.trim().is_empty()),
            email: email.filter(|e| !e.trim().is_empty()),
            feedback,
            submitted_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdminReport {
    pub sign_ins: Vec<UserSignIn>,
    pub feedback: Vec<FeedbackEntry>,
}
