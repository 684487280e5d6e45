//! Health check and monitoring routes

use crate::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::Json,
};
use chrono::Utc;
use contact_core::ListSource;
use serde::Serialize;
use std::{fmt::Write, sync::Arc};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// GET /metrics
///
/// Prometheus text exposition of submission outcomes and blocklist state.
/// Never triggers a blocklist fetch and never waits for one in flight.
pub async fn metrics_handler(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    let stats = state.pipeline.get_stats();
    let registry = state.pipeline.registry().stats();

    let mut body = String::new();

    let counters = [
        ("received", "Submissions received", stats.received),
        ("sent", "Submissions delivered to the band inbox", stats.sent),
        ("invalid", "Submissions rejected by field validation", stats.invalid),
        ("disposable", "Submissions from disposable domains", stats.disposable),
        ("no_mx_records", "Submissions from domains without MX records", stats.no_mx_records),
        ("dns_failures", "Submissions rejected after a DNS failure", stats.dns_failures),
        ("send_failures", "Submissions that failed at the SMTP transport", stats.send_failures),
    ];
    for (name, help, value) in counters {
        let _ = writeln!(body, "# HELP contact_submissions_{}_total {}", name, help);
        let _ = writeln!(body, "# TYPE contact_submissions_{}_total counter", name);
        let _ = writeln!(body, "contact_submissions_{}_total {}\n", name, value);
    }

    let _ = writeln!(body, "# HELP contact_disposable_domains Domains in the disposable blocklist");
    let _ = writeln!(body, "# TYPE contact_disposable_domains gauge");
    let _ = writeln!(
        body,
        "contact_disposable_domains{{source=\"{}\"}} {}\n",
        source_label(registry.source),
        registry.domain_count
    );

    if let Some(age) = registry.last_refresh_age_secs {
        let _ = writeln!(body, "# HELP contact_disposable_list_age_seconds Seconds since the last blocklist refresh");
        let _ = writeln!(body, "# TYPE contact_disposable_list_age_seconds gauge");
        let _ = writeln!(body, "contact_disposable_list_age_seconds {}\n", age);
    }

    let _ = writeln!(body, "# HELP contact_api_build_info Build information");
    let _ = writeln!(body, "# TYPE contact_api_build_info gauge");
    let _ = writeln!(body, "contact_api_build_info{{version=\"{}\"}} 1", env!("CARGO_PKG_VERSION"));

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}

fn source_label(source: ListSource) -> &'static str {
    match source {
        ListSource::Unset => "unset",
        ListSource::Remote => "remote",
        ListSource::Fallback => "fallback",
    }
}
