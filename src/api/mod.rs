use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::gateway::Gateway;

pub mod caller;
pub mod handlers;
pub mod models;

pub fn create_router(gateway: Arc<Gateway>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route(
            "/api/search",
            get(handlers::site_summary_handler).post(handlers::site_summary_post_handler),
        )
        .route("/api/news", get(handlers::news_handler))
        .route("/api/google-search", get(handlers::contact_search_handler))
        .route("/api/questions", get(handlers::interviews_handler))
        .route("/api/llm", post(handlers::chat_handler))
        .route("/api/feedback", post(handlers::feedback_handler))
        .route("/api/auth/sign-in", post(handlers::sign_in_handler))
        .route("/api/admin/report", get(handlers::admin_report_handler))
        .with_state(gateway)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
