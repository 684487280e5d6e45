//! Disposable domain registry routes

use crate::{api_handler::DomainsResponse, AppState};
use axum::{extract::State, response::Json};
use std::sync::Arc;
use tracing::info;

/// GET /api/disposable-domains
///
/// Loads the list if it is unset or stale and reports its size.
pub async fn domains_handler(State(state): State<Arc<AppState>>) -> Json<DomainsResponse> {
    let registry = state.pipeline.registry();
    let count = registry.get_domains().await.len();
    let source = registry.stats().source;

    Json(DomainsResponse {
        success: true,
        count,
        source,
        message: format!("Successfully loaded {} disposable email domains", count),
    })
}

/// POST /api/disposable-domains
///
/// Refreshes the list regardless of its freshness window. A fetch made within
/// the configured cooldown is reused instead of hitting the remote again.
pub async fn refresh_handler(State(state): State<Arc<AppState>>) -> Json<DomainsResponse> {
    let registry = state.pipeline.registry();
    let count = registry.refresh().await.len();
    let source = registry.stats().source;

    info!("Disposable domain list refreshed on request: {} domains ({:?})", count, source);

    Json(DomainsResponse {
        success: true,
        count,
        source,
        message: format!("Cache refreshed with {} disposable email domains", count),
    })
}
