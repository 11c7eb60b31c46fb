//! HTTP mapping of bingo errors.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use care_bingo::BingoError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// JSON body of every error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub details: Value,
}

/// Error type for handlers
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

/// HTTP status for each error kind
pub fn status_for(err: &BingoError) -> StatusCode {
    match err {
        BingoError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        BingoError::InvalidTransition { .. }
        | BingoError::ExhaustedPool(_)
        | BingoError::WrongSession { .. }
        | BingoError::SessionNotLive(_) => StatusCode::CONFLICT,
        BingoError::ClaimExpired { .. } => StatusCode::GONE,
        BingoError::NotFound(_) => StatusCode::NOT_FOUND,
        BingoError::SessionUnavailable(_) | BingoError::StorageUnavailable(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Structured fields a client needs to render a specific message
fn details_for(err: &BingoError) -> Value {
    match err {
        BingoError::InvalidTransition {
            session_id,
            from,
            action,
        } => json!({ "session_id": session_id, "from": from, "action": action }),
        BingoError::ExhaustedPool(session_id)
        | BingoError::SessionNotLive(session_id)
        | BingoError::SessionUnavailable(session_id) => json!({ "session_id": session_id }),
        BingoError::ClaimExpired {
            session_id,
            deadline,
        } => json!({ "session_id": session_id, "deadline": deadline }),
        BingoError::NotFound(target) => json!({ "target": target.to_string() }),
        BingoError::WrongSession {
            identifier,
            card_session,
            claimed_session,
        } => json!({
            "identifier": identifier,
            "card_session": card_session,
            "claimed_session": claimed_session,
        }),
        BingoError::InvalidArgument(_) | BingoError::StorageUnavailable(_) => Value::Null,
    }
}

impl From<BingoError> for ApiError {
    fn from(err: BingoError) -> Self {
        let status = status_for(&err);
        if status.is_server_error() {
            tracing::error!(kind = err.kind(), "Request failed: {}", err);
        }

        Self {
            status,
            body: ErrorResponse {
                error: err.client_message(),
                kind: err.kind().to_string(),
                details: details_for(&err),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use care_bingo::LookupTarget;
    use chrono::Utc;

    #[test]
    fn test_status_mapping() {
        let expired = BingoError::ClaimExpired {
            session_id: 1,
            deadline: Utc::now(),
        };
        assert_eq!(status_for(&expired), StatusCode::GONE);
        assert_eq!(status_for(&BingoError::ExhaustedPool(1)), StatusCode::CONFLICT);
        assert_eq!(
            status_for(&BingoError::NotFound(LookupTarget::Session(1))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&BingoError::StorageUnavailable("down".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_wrong_session_details() {
        let err = ApiError::from(BingoError::WrongSession {
            identifier: "GBL-1000000".into(),
            card_session: None,
            claimed_session: 4,
        });
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.body.kind, "wrong_session");
        assert_eq!(err.body.details["claimed_session"], 4);
        assert!(err.body.details["card_session"].is_null());
    }

    #[test]
    fn test_storage_message_sanitized() {
        let err = ApiError::from(BingoError::StorageUnavailable("pg at 10.1.1.1".into()));
        assert!(!err.body.error.contains("10.1.1.1"));
        assert!(err.body.details.is_null());
    }
}
