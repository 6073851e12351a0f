//! Wire types for the serverless form relay endpoint.
//!
//! The relay is an alternate submission path outside the store-based flow: a
//! single HTTP POST that accepts the request fields plus base64-encoded files
//! and answers `{success, message?}`.

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file carried inline in a relay request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RelayFile {
    pub name: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub size: u64,
    /// Standard base64 of the file bytes.
    pub data: String,
}

impl RelayFile {
    pub fn from_bytes(name: impl Into<String>, content_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            size: bytes.len() as u64,
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    /// Decode the inline data back to bytes.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        base64::engine::general_purpose::STANDARD.decode(&self.data)
    }
}

/// Body POSTed to the relay endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelayRequest {
    #[serde(rename = "type")]
    pub request_type: String,
    pub tier: String,
    pub title: String,
    pub description: String,
    pub subject: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub files: Vec<RelayFile>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
}

/// Relay reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RelayResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
