//! Shared API types and utilities
//!
//! Every contact endpoint answers with the same `{success, error?}` body; this
//! module maps pipeline outcomes onto that body and an HTTP status.

use axum::{extract::rejection::JsonRejection, http::StatusCode, response::Json};
use contact_core::{ContactError, ContactResponse, ListSource, UNEXPECTED_ERROR_MESSAGE};
use serde::Serialize;
use tracing::warn;

/// Result type for contact handlers
pub type ContactReply = (StatusCode, Json<ContactResponse>);

/// Disposable domain registry summary
#[derive(Debug, Serialize)]
pub struct DomainsResponse {
    pub success: bool,
    pub count: usize,
    pub source: ListSource,
    pub message: String,
}

/// HTTP status for a pipeline outcome
pub fn status_for(result: &Result<(), ContactError>) -> StatusCode {
    match result {
        Ok(()) => StatusCode::OK,
        Err(ContactError::Invalid(_)) | Err(ContactError::Undeliverable(_)) => {
            StatusCode::BAD_REQUEST
        }
        Err(ContactError::SendFailed(_)) => StatusCode::BAD_GATEWAY,
    }
}

/// Convert a pipeline outcome into the response body and status
pub fn contact_reply(result: &Result<(), ContactError>) -> ContactReply {
    (status_for(result), Json(ContactResponse::from(result)))
}

/// Response for a body that could not be read as a submission
pub fn unreadable_body(rejection: &JsonRejection) -> ContactReply {
    warn!("Rejected unreadable contact request body: {}", rejection.body_text());
    unexpected_failure(StatusCode::BAD_REQUEST)
}

/// Catch-all response; the cause has already been logged
pub fn unexpected_failure(status: StatusCode) -> ContactReply {
    (status, Json(ContactResponse::failure(UNEXPECTED_ERROR_MESSAGE)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use contact_core::{DispatchError, Reachability, SubmissionError};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&Ok(())), StatusCode::OK);
        assert_eq!(
            status_for(&Err(ContactError::Invalid(SubmissionError::NameRequired))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&Err(ContactError::Undeliverable(Reachability::Disposable))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&Err(ContactError::SendFailed(DispatchError))),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_contact_reply_body() {
        let (status, Json(body)) =
            contact_reply(&Err(ContactError::Invalid(SubmissionError::EmailRequired)));

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, ContactResponse::failure("Adres email jest wymagany."));
    }

    #[test]
    fn test_unexpected_failure_body() {
        let (status, Json(body)) = unexpected_failure(StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.as_deref(), Some("Coś poszło nie tak"));
        assert!(!body.success);
    }
}
