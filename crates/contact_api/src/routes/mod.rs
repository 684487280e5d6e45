//! API Routes Module
//!
//! - `contact`: contact form submission
//! - `disposable`: disposable domain list status and manual refresh
//! - `health`: liveness and monitoring endpoints

pub mod contact;
pub mod disposable;
pub mod health;

use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Build all API routes and return a configured Router
pub fn build_routes(state: Arc<AppState>) -> Router {
    Router::new()
        // Contact form
        .route("/api/send", post(contact::send_handler))

        // Disposable domain registry
        .route(
            "/api/disposable-domains",
            get(disposable::domains_handler).post(disposable::refresh_handler),
        )

        // Health and monitoring endpoints
        .route("/health", get(health::health_handler))
        .route("/metrics", get(health::metrics_handler))

        .with_state(state)
}
