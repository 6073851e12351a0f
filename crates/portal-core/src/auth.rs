//! Identity provider vocabulary: users, error kinds and user-facing messages.
//!
//! Authentication itself is delegated to an external provider. This module
//! only names what comes back from it so the API can report each failure
//! with its own message.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classified identity provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuthErrorKind {
    InvalidEmail,
    WrongPassword,
    EmailAlreadyInUse,
    WeakPassword,
    UserNotFound,
    TooManyRequests,
    Network,
    Unknown,
}

impl AuthErrorKind {
    /// Classify a provider error code.
    ///
    /// Accepts both the REST form (`EMAIL_NOT_FOUND`, `WEAK_PASSWORD : ...`)
    /// and the SDK form (`auth/user-not-found`).
    pub fn from_provider_code(code: &str) -> Self {
        let head = code
            .split(':')
            .next()
            .unwrap_or(code)
            .trim()
            .trim_start_matches("auth/")
            .to_ascii_uppercase()
            .replace('-', "_");
        match head.as_str() {
            "INVALID_EMAIL" | "MISSING_EMAIL" => Self::InvalidEmail,
            "INVALID_PASSWORD" | "WRONG_PASSWORD" | "INVALID_LOGIN_CREDENTIALS"
            | "INVALID_CREDENTIAL" | "MISSING_PASSWORD" => Self::WrongPassword,
            "EMAIL_EXISTS" | "EMAIL_ALREADY_IN_USE" => Self::EmailAlreadyInUse,
            "WEAK_PASSWORD" => Self::WeakPassword,
            "EMAIL_NOT_FOUND" | "USER_NOT_FOUND" | "USER_DISABLED" => Self::UserNotFound,
            "TOO_MANY_ATTEMPTS_TRY_LATER" | "TOO_MANY_REQUESTS" => Self::TooManyRequests,
            "NETWORK_REQUEST_FAILED" | "NETWORK_ERROR" => Self::Network,
            _ => Self::Unknown,
        }
    }

    /// Message shown to the person signing in.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidEmail => "Please enter a valid email address.",
            Self::WrongPassword => "Incorrect password. Please try again.",
            Self::EmailAlreadyInUse => "An account with this email already exists.",
            Self::WeakPassword => "Password should be at least 6 characters.",
            Self::UserNotFound => "No account found with this email.",
            Self::TooManyRequests => "Too many attempts. Please wait a moment and try again.",
            Self::Network => "Network error. Check your connection and try again.",
            Self::Unknown => "Something went wrong. Please try again.",
        }
    }

    /// Failures that may succeed on a later identical attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TooManyRequests | Self::Network)
    }
}

impl std::fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InvalidEmail => "invalid-email",
            Self::WrongPassword => "wrong-password",
            Self::EmailAlreadyInUse => "email-already-in-use",
            Self::WeakPassword => "weak-password",
            Self::UserNotFound => "user-not-found",
            Self::TooManyRequests => "too-many-requests",
            Self::Network => "network-error",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Error returned by an identity provider call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {detail}")]
pub struct AuthError {
    pub kind: AuthErrorKind,
    /// Provider's raw code or message, for logs.
    pub detail: String,
}

impl AuthError {
    pub fn new(kind: AuthErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn from_provider_code(code: &str) -> Self {
        Self::new(AuthErrorKind::from_provider_code(code), code)
    }

    pub fn user_message(&self) -> &'static str {
        self.kind.user_message()
    }
}

/// A signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
    pub id_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Email/password pair submitted to sign-in and sign-up.
#[derive(Clone, Deserialize, utoipa::ToSchema)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
