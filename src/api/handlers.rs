use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

use crate::data_models::{AdminReport, UserSignIn};
use crate::error::{ApiError, ApiResult};
use crate::gateway::contacts::ContactSearchResponse;
use crate::gateway::interviews::InterviewRecord;
use crate::gateway::site::SiteSummary;
use crate::gateway::{Gateway, SummaryOptions};
use crate::query::CompanyQuery;

use super::caller::Caller;
use super::models::{
    ChatRequest, CompanyParams, ContactSearchParams, FeedbackRequest, NewsResponse,
    SearchRequest, SuccessResponse,
};

fn require_company(company: Option<&str>, message: &str) -> ApiResult<CompanyQuery> {
    company
        .and_then(CompanyQuery::parse)
        .ok_or_else(|| ApiError::BadRequest(message.to_string()))
}

pub async fn health_handler() -> &'static str {
    "OK"
}

pub async fn site_summary_handler(
    State(gateway): State<Arc<Gateway>>,
    query: Result<Query<CompanyParams>, QueryRejection>,
) -> ApiResult<Json<SiteSummary>> {
    let Query(params) = query?;
    let company = require_company(params.company.as_deref(), "Missing company")?;
    let start = Instant::now();

    let summary = gateway
        .site_summary(&company, SummaryOptions::default())
        .await;

    log::info!(
        "GET /api/search {} in {}ms",
        company.raw(),
        start.elapsed().as_millis()
    );
    Ok(Json(summary))
}

pub async fn site_summary_post_handler(
    State(gateway): State<Arc<Gateway>>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> ApiResult<Json<SiteSummary>> {
    let Json(request) = payload?;
    let company = require_company(request.company.as_deref(), "Missing company name")?;

    let options = SummaryOptions {
        include_contacts: request.include_contacts,
        max_contacts: request.max_contacts,
    };
    Ok(Json(gateway.site_summary(&company, options).await))
}

pub async fn news_handler(
    State(gateway): State<Arc<Gateway>>,
    query: Result<Query<CompanyParams>, QueryRejection>,
) -> ApiResult<Json<NewsResponse>> {
    let Query(params) = query?;
    let company = require_company(params.company.as_deref(), "Missing company")?;
    let news = gateway.news.lookup(company.raw()).await;
    Ok(Json(NewsResponse { news }))
}

pub async fn contact_search_handler(
    State(gateway): State<Arc<Gateway>>,
    query: Result<Query<ContactSearchParams>, QueryRejection>,
) -> ApiResult<Json<ContactSearchResponse>> {
    let Query(params) = query?;
    let company = require_company(params.company.as_deref(), "Missing company parameter")?;

    let response = gateway
        .contacts
        .employees(
            company.raw(),
            params.role.as_deref(),
            params.university.as_deref(),
        )
        .await?;
    Ok(Json(response))
}

pub async fn interviews_handler(
    State(gateway): State<Arc<Gateway>>,
    query: Result<Query<CompanyParams>, QueryRejection>,
) -> ApiResult<Json<InterviewRecord>> {
    let Query(params) = query?;
    let company = require_company(params.company.as_deref(), "Missing company parameter.")?;
    Ok(Json(gateway.interviews.lookup(&company).await))
}

pub async fn chat_handler(
    State(gateway): State<Arc<Gateway>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(request) = payload?;
    let reply = gateway
        .chat
        .complete(request.user_id.as_deref(), request.messages)
        .await?;
    Ok(Json(reply))
}

pub async fn feedback_handler(
    State(gateway): State<Arc<Gateway>>,
    payload: Result<Json<FeedbackRequest>, JsonRejection>,
) -> ApiResult<Json<SuccessResponse>> {
    let Json(request) = payload?;
    gateway
        .records
        .submit_feedback(request.name, request.email, request.feedback.as_ref())
        .await?;
    Ok(Json(SuccessResponse { success: true }))
}

pub async fn sign_in_handler(
    State(gateway): State<Arc<Gateway>>,
    Caller(caller): Caller,
) -> ApiResult<Json<UserSignIn>> {
    Ok(Json(gateway.records.record_sign_in(&caller).await?))
}

pub async fn admin_report_handler(
    State(gateway): State<Arc<Gateway>>,
    Caller(caller): Caller,
) -> ApiResult<Json<AdminReport>> {
    let report = gateway.records.admin_report(caller.email.as_deref()).await?;
    Ok(Json(report))
}
