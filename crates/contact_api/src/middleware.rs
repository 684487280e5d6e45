//! Middleware for request correlation, response hardening and panic recovery

use crate::api_handler::unexpected_failure;
use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::any::Any;
use tracing::error;
use uuid::Uuid;

/// Request ID from `x-trace-id` / `x-request-id`, or a fresh UUID
pub fn extract_or_generate_request_id(headers: &HeaderMap) -> String {
    for header in ["x-trace-id", "x-request-id"] {
        if let Some(id) = headers.get(header).and_then(|value| value.to_str().ok()) {
            return id.to_string();
        }
    }

    Uuid::new_v4().to_string()
}

/// Adds security-related headers to all responses
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "strict-transport-security",
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert(
        "referrer-policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        "x-api-version",
        HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
    );

    response
}

/// Turns a panic inside a handler into the catch-all JSON failure
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else {
        "unknown panic payload"
    };

    error!("Unhandled failure while processing request: {}", detail);

    unexpected_failure(StatusCode::INTERNAL_SERVER_ERROR).into_response()
}
