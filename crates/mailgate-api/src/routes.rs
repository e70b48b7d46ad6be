//! API routes

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers::{health, read, send};

/// Create the API router
pub fn create_router() -> Router {
    let health_routes = Router::new()
        .route("/", get(health::health))
        .route("/live", get(health::liveness));

    Router::new()
        .route("/read_emails", post(read::read_emails))
        .route("/read_emails_last_7_days", post(read::read_emails_last_week))
        .route("/send_email", post(send::send_email))
        .route("/reply_email", post(send::reply_email))
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
}
