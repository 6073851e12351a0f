//! Reviewer authorization.
//!
//! Reviewers present a bearer token. The server keeps only SHA-256 hex
//! digests of the accepted tokens (`REVIEWER_API_KEYS`) and compares the
//! digest of what it receives.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use tracing::{debug, warn};

use portal_core::{AccessControl, Error, Result, ReviewerPrincipal};

use crate::{ApiError, AppState};

/// Hex-encoded SHA-256 of a token.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Access control backed by a fixed set of token digests.
pub struct ApiKeyAccessControl {
    digests: HashSet<String>,
}

impl ApiKeyAccessControl {
    pub fn new<I, S>(digests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            digests: digests
                .into_iter()
                .map(|d| d.as_ref().trim().to_ascii_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    /// Build from plaintext tokens (tests and local setups).
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(tokens.into_iter().map(|t| hash_token(t.as_ref())))
    }

    pub fn is_configured(&self) -> bool {
        !self.digests.is_empty()
    }
}

#[async_trait]
impl AccessControl for ApiKeyAccessControl {
    async fn authorize_reviewer(&self, credential: Option<&str>) -> Result<ReviewerPrincipal> {
        let token = credential
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Unauthorized("Reviewer credentials required".to_string()))?;

        if !self.is_configured() {
            warn!(subsystem = "access", "Review attempted but no reviewer keys are configured");
            return Err(Error::Forbidden(
                "Reviewing is not enabled on this server".to_string(),
            ));
        }

        let digest = hash_token(token);
        if !self.digests.contains(&digest) {
            debug!(subsystem = "access", "Unknown reviewer token");
            return Err(Error::Unauthorized(
                "Invalid reviewer credentials".to_string(),
            ));
        }

        Ok(ReviewerPrincipal {
            id: format!("reviewer-{}", &digest[..12]),
            display_name: None,
        })
    }
}

/// Extractor for reviewer-only routes.
#[derive(Debug, Clone)]
pub struct Reviewer {
    pub principal: ReviewerPrincipal,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Reviewer {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let bearer = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "));

        let principal = state.access.authorize_reviewer(bearer).await?;
        Ok(Reviewer { principal })
    }
}
