//! HTTP handlers for portal-api.

pub mod auth;
pub mod events;
pub mod notes;
pub mod relay;
pub mod review;

use axum::{response::IntoResponse, Json};

pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
