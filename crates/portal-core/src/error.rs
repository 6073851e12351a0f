//! Error types for the study portal.

use thiserror::Error;
use uuid::Uuid;

use crate::auth::AuthError;
use crate::models::NoteStatus;
use crate::submission::ValidationError;

/// Result type alias using the portal's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for portal operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Note record not found
    #[error("Note not found: {0}")]
    NoteNotFound(Uuid),

    /// Submission rejected by local validation
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Review transition attempted on a record that already left `pending`
    #[error("Note {id} is not pending (current status: {status})")]
    NotPending { id: Uuid, status: NoteStatus },

    /// Object store operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// File was uploaded but the metadata record could not be written.
    /// The uploaded object is left in place.
    #[error("Upload stored as {object_key} but the note record could not be saved: {source}")]
    PartialFailure {
        object_key: String,
        #[source]
        source: Box<Error>,
    },

    /// In-flight operation was cancelled by the caller
    #[error("Operation cancelled")]
    Cancelled,

    /// Identity provider rejected a request
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Caller presented no usable credential
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is authenticated but not allowed to perform the action
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the caller may reasonably retry the same request unchanged.
    ///
    /// Validation, authorization and state-machine errors are never
    /// retryable; network, storage and database failures are.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Database(_) | Error::Storage(_) | Error::Request(_) | Error::Io(_) => true,
            Error::Auth(e) => e.kind.is_transient(),
            Error::PartialFailure { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthErrorKind;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("test resource".to_string());
        assert_eq!(err.to_string(), "Not found: test resource");
    }

    #[test]
    fn test_error_display_note_not_found() {
        let id = Uuid::nil();
        let err = Error::NoteNotFound(id);
        assert_eq!(err.to_string(), format!("Note not found: {}", id));
    }

    #[test]
    fn test_error_display_not_pending() {
        let id = Uuid::nil();
        let err = Error::NotPending {
            id,
            status: NoteStatus::Approved,
        };
        let msg = err.to_string();
        assert!(msg.contains("not pending"));
        assert!(msg.contains("approved"));
    }

    #[test]
    fn test_validation_error_passes_message_through() {
        let err: Error = ValidationError::TitleTooShort { min: 5 }.into();
        assert_eq!(err.to_string(), "Title must be at least 5 characters long");
    }

    #[test]
    fn test_partial_failure_keeps_object_key() {
        let err = Error::PartialFailure {
            object_key: "notes/1_abc_file.pdf".to_string(),
            source: Box::new(Error::Internal("insert failed".to_string())),
        };
        assert!(err.to_string().contains("notes/1_abc_file.pdf"));
        assert!(err.to_string().contains("insert failed"));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(Error::Storage("disk full".to_string()).is_retryable());
        assert!(Error::Request("timeout".to_string()).is_retryable());
        assert!(!Error::Validation(ValidationError::MissingField("title")).is_retryable());
        assert!(!Error::Forbidden("nope".to_string()).is_retryable());
        assert!(!Error::NotPending {
            id: Uuid::nil(),
            status: NoteStatus::Rejected
        }
        .is_retryable());
        assert!(!Error::Cancelled.is_retryable());
    }

    #[test]
    fn test_auth_retryable_follows_kind() {
        let transient: Error = AuthError::new(AuthErrorKind::Network, "offline").into();
        let permanent: Error = AuthError::new(AuthErrorKind::WrongPassword, "bad").into();
        assert!(transient.is_retryable());
        assert!(!permanent.is_retryable());
    }

    #[test]
    fn test_partial_failure_retryable_follows_source() {
        let err = Error::PartialFailure {
            object_key: "k".to_string(),
            source: Box::new(Error::Request("reset".to_string())),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(ref msg) if !msg.is_empty()));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
