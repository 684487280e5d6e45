//! Contact form submission route

use crate::{
    api_handler::{contact_reply, unreadable_body, ContactReply},
    middleware::extract_or_generate_request_id,
    AppState,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    response::Json,
};
use contact_core::RawSubmission;
use std::sync::Arc;
use tracing::{info, instrument};

/// POST /api/send
///
/// Body: `{"name": "...", "email": "...", "subject": "...", "message": "..."}`.
/// Answers `{"success": true}` or `{"success": false, "error": "..."}`.
#[instrument(skip_all, fields(request_id))]
pub async fn send_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<RawSubmission>, JsonRejection>,
) -> ContactReply {
    let request_id = extract_or_generate_request_id(&headers);
    tracing::Span::current().record("request_id", request_id.as_str());

    let Json(raw) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return unreadable_body(&rejection),
    };

    let start_time = std::time::Instant::now();
    let result = state.pipeline.submit(&raw).await;

    match &result {
        Ok(()) => info!("Contact form submission sent in {:?}", start_time.elapsed()),
        Err(e) => info!("Contact form submission rejected: {}", e),
    }

    contact_reply(&result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{test_state, TransportMode};
    use axum::http::StatusCode;
    use contact_core::ContactResponse;
    use pretty_assertions::assert_eq;

    fn raw(name: &str, email: &str, subject: &str, message: &str) -> RawSubmission {
        RawSubmission {
            name: name.to_string(),
            email: email.to_string(),
            subject: subject.to_string(),
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn test_send_success() {
        let (state, transport) = test_state(TransportMode::Accept);

        let (status, Json(body)) = send_handler(
            State(state),
            HeaderMap::new(),
            Ok(Json(raw("Anna Kowalska", "anna@example.pl", "Koncert", "Czy zagracie w sierpniu?"))),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, ContactResponse::ok());
        assert_eq!(transport.sent(), 1);
    }

    #[tokio::test]
    async fn test_send_disposable_address() {
        let (state, transport) = test_state(TransportMode::Accept);

        let (status, Json(body)) = send_handler(
            State(state),
            HeaderMap::new(),
            Ok(Json(raw("Jan", "jan@mailinator.com", "Hej", "This is a test message."))),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body.success);
        assert!(body.error.unwrap().contains("innego adresu email"));
        assert_eq!(transport.sent(), 0);
    }

    #[tokio::test]
    async fn test_send_validation_failure() {
        let (state, _transport) = test_state(TransportMode::Accept);

        let (status, Json(body)) = send_handler(
            State(state),
            HeaderMap::new(),
            Ok(Json(raw("Jan", "jan@example.pl", "Hej", "short"))),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            ContactResponse::failure("Wiadomość musi mieć co najmniej 10 znaków.")
        );
    }

    #[tokio::test]
    async fn test_send_transport_failure() {
        let (state, transport) = test_state(TransportMode::Fail);

        let (status, Json(body)) = send_handler(
            State(state),
            HeaderMap::new(),
            Ok(Json(raw("Jan", "jan@example.pl", "Hej", "This is a test message."))),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(
            body,
            ContactResponse::failure("Nie udało się wysłać wiadomości. Spróbuj ponownie później.")
        );
        assert_eq!(transport.sent(), 1);
    }
}
