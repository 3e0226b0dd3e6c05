use serde_json::Value;
use std::sync::Arc;

use crate::clock::Clock;
use crate::data_models::{AdminReport, FeedbackEntry, UserSignIn};
use crate::db::UserRecordStore;
use crate::error::ApiError;

/// Who is calling, as asserted by the upstream identity provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallerIdentity {
    pub id: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Sign-in tracking, feedback and the admin report.
pub struct RecordService {
    store: Arc<dyn UserRecordStore>,
    clock: Arc<dyn Clock>,
    admin_email: Option<String>,
}

impl RecordService {
    pub fn new(
        store: Arc<dyn UserRecordStore>,
        clock: Arc<dyn Clock>,
        admin_email: Option<String>,
    ) -> Self {
        Self {
            store,
            clock,
            admin_email,
        }
    }

    /// Post-auth hook: one row per user, overwritten each time.
    pub async fn record_sign_in(&self, caller: &CallerIdentity) -> Result<UserSignIn, ApiError> {
        let Some(user_id) = caller.id.clone() else {
            return Err(ApiError::BadRequest("Sign-in requires a user id".to_string()));
        };
        let sign_in = UserSignIn::new(
            user_id,
            caller.email.clone(),
            caller.name.clone(),
            caller.avatar_url.clone(),
            self.clock.now(),
        );

        self.store.upsert_sign_in(&sign_in).await.map_err(|e| {
            log::error!("failed to record sign-in for {}: {:#}", sign_in.user_id, e);
            ApiError::Internal("Failed to record sign-in.".to_string())
        })?;
        log::info!("recorded sign-in for {}", sign_in.user_id);
        Ok(sign_in)
    }

    /// `feedback` must be a non-empty JSON string.
    pub async fn submit_feedback(
        &self,
        name: Option<String>,
        email: Option<String>,
        feedback: Option<&Value>,
    ) -> Result<(), ApiError> {
        let Some(text) = feedback
            .and_then(Value::as_str)
            .filter(|f| !f.trim().is_empty())
        else {
            return Err(ApiError::BadRequest("Feedback is required.".to_string()));
        };

        let entry = FeedbackEntry::new(name, email, text.to_string(), self.clock.now());
        self.store.append_feedback(&entry).await.map_err(|e| {
            log::error!("failed to save feedback: {:#}", e);
            ApiError::Internal("Failed to save feedback.".to_string())
        })
    }

    pub fn is_admin(&self, email: Option<&str>) -> bool {
        matches!((self.admin_email.as_deref(), email), (Some(admin), Some(caller)) if admin == caller)
    }

    /// Sign-ins and feedback, newest first. Only the configured
    /// administrator may read it.
    pub async fn admin_report(&self, caller_email: Option<&str>) -> Result<AdminReport, ApiError> {
        if !self.is_admin(caller_email) {
            log::warn!("admin report denied for {:?}", caller_email);
            return Err(ApiError::Forbidden("Access denied".to_string()));
        }

        let (sign_ins, feedback) =
            futures::try_join!(self.store.list_sign_ins(), self.store.list_feedback()).map_err(
                |e| {
                    log::error!("failed to load admin report: {:#}", e);
                    ApiError::Internal("Failed to load report.".to_string())
                },
            )?;
        Ok(AdminReport { sign_ins, feedback })
    }
}
