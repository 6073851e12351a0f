//! HTTP error type.
//!
//! Every failure leaves the API as `{"error": message, "retryable": bool}`.
//! `retryable` tells the client whether resubmitting the same request might
//! succeed; the server itself never retries.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

use portal_core::{AuthErrorKind, Error, ValidationError};

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    PayloadTooLarge(String),
    TooManyRequests(String),
    BadGateway(String),
    ServiceUnavailable(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::TooManyRequests(_) | ApiError::BadGateway(_) | ApiError::ServiceUnavailable(_)
        )
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(m)
            | ApiError::Unauthorized(m)
            | ApiError::Forbidden(m)
            | ApiError::NotFound(m)
            | ApiError::Conflict(m)
            | ApiError::PayloadTooLarge(m)
            | ApiError::TooManyRequests(m)
            | ApiError::BadGateway(m)
            | ApiError::ServiceUnavailable(m)
            | ApiError::Internal(m) => m,
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::NoteNotFound(_) => ApiError::NotFound(err.to_string()),
            Error::Validation(ValidationError::FileTooLarge { .. }) => {
                ApiError::PayloadTooLarge(err.to_string())
            }
            Error::Validation(v) => ApiError::BadRequest(v.to_string()),
            Error::NotPending { .. } => ApiError::Conflict(err.to_string()),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Unauthorized(msg) => ApiError::Unauthorized(msg),
            Error::Forbidden(msg) => ApiError::Forbidden(msg),
            Error::Cancelled => ApiError::BadRequest("Upload cancelled".to_string()),
            Error::Auth(auth) => {
                let msg = auth.user_message().to_string();
                match auth.kind {
                    AuthErrorKind::InvalidEmail | AuthErrorKind::WeakPassword => {
                        ApiError::BadRequest(msg)
                    }
                    AuthErrorKind::WrongPassword | AuthErrorKind::UserNotFound => {
                        ApiError::Unauthorized(msg)
                    }
                    AuthErrorKind::EmailAlreadyInUse => ApiError::Conflict(msg),
                    AuthErrorKind::TooManyRequests => ApiError::TooManyRequests(msg),
                    AuthErrorKind::Network | AuthErrorKind::Unknown => ApiError::BadGateway(msg),
                }
            }
            Error::Request(msg) => ApiError::BadGateway(msg),
            Error::PartialFailure { ref object_key, .. } => {
                warn!(object_key = %object_key, error = %err, "Returning partial failure to client");
                let msg = "The file was uploaded but its details could not be saved. Please submit again."
                    .to_string();
                if err.is_retryable() {
                    ApiError::ServiceUnavailable(msg)
                } else {
                    ApiError::Internal(msg)
                }
            }
            Error::Database(e) => {
                error!(error = %e, "Database error");
                ApiError::ServiceUnavailable("Database unavailable, please try again".to_string())
            }
            Error::Storage(msg) => {
                error!(error = %msg, "Storage error");
                ApiError::ServiceUnavailable("File storage unavailable, please try again".to_string())
            }
            Error::Io(e) => {
                error!(error = %e, "I/O error");
                ApiError::ServiceUnavailable("File storage unavailable, please try again".to_string())
            }
            other => {
                error!(error = %other, "Internal error");
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(serde_json::json!({
            "error": self.message(),
            "retryable": self.is_retryable(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::{AuthError, NoteStatus};
    use uuid::Uuid;

    #[test]
    fn test_not_pending_is_conflict() {
        let err: ApiError = Error::NotPending {
            id: Uuid::nil(),
            status: NoteStatus::Approved,
        }
        .into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert!(err.message().contains("not pending"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_validation_messages_pass_through() {
        let err: ApiError = Error::Validation(ValidationError::TitleTooShort { min: 5 }).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Title must be at least 5 characters long");

        let err: ApiError = Error::Validation(ValidationError::FileTooLarge {
            max: 10,
            actual: 11,
        })
        .into();
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_storage_failure_is_retryable() {
        let err: ApiError = Error::Storage("disk full".to_string()).into();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_auth_kinds_map_to_statuses() {
        let cases = [
            (AuthErrorKind::WrongPassword, StatusCode::UNAUTHORIZED),
            (AuthErrorKind::EmailAlreadyInUse, StatusCode::CONFLICT),
            (AuthErrorKind::WeakPassword, StatusCode::BAD_REQUEST),
            (AuthErrorKind::TooManyRequests, StatusCode::TOO_MANY_REQUESTS),
            (AuthErrorKind::Network, StatusCode::BAD_GATEWAY),
        ];
        for (kind, status) in cases {
            let err: ApiError = Error::Auth(AuthError::new(kind, "x")).into();
            assert_eq!(err.status(), status, "{:?}", kind);
            assert_eq!(err.message(), kind.user_message());
        }
    }

    #[test]
    fn test_partial_failure_follows_source() {
        let err: ApiError = Error::PartialFailure {
            object_key: "notes/a.pdf".to_string(),
            source: Box::new(Error::Request("reset".to_string())),
        }
        .into();
        assert!(err.is_retryable());

        let err: ApiError = Error::PartialFailure {
            object_key: "notes/a.pdf".to_string(),
            source: Box::new(Error::Internal("bad row".to_string())),
        }
        .into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
