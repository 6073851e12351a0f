//! Reviewer handlers. Every route requires a reviewer bearer token.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use portal_core::{NoteRecord, NoteStatus, StatusCounts};

use crate::access::Reviewer;
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct QueueQuery {
    /// Defaults to `pending`.
    #[serde(default)]
    pub status: NoteStatus,
    #[serde(default)]
    pub page: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectBody {
    pub reason: Option<String>,
}

/// Notes in a review state, newest upload first.
pub async fn list_queue(
    State(state): State<AppState>,
    _reviewer: Reviewer,
    Query(query): Query<QueueQuery>,
) -> Result<Json<Vec<NoteRecord>>, ApiError> {
    Ok(Json(state.reviews.queue(query.status, query.page).await?))
}

pub async fn status_counts(
    State(state): State<AppState>,
    _reviewer: Reviewer,
) -> Result<Json<StatusCounts>, ApiError> {
    Ok(Json(state.reviews.counts().await?))
}

pub async fn approve_note(
    State(state): State<AppState>,
    reviewer: Reviewer,
    Path(id): Path<Uuid>,
) -> Result<Json<NoteRecord>, ApiError> {
    Ok(Json(state.reviews.approve(&reviewer.principal, id).await?))
}

/// Reject a pending note. The body (`{"reason": "..."}`) is optional.
pub async fn reject_note(
    State(state): State<AppState>,
    reviewer: Reviewer,
    Path(id): Path<Uuid>,
    body: Option<Json<RejectBody>>,
) -> Result<Json<NoteRecord>, ApiError> {
    let reason = body.and_then(|Json(b)| b.reason);
    Ok(Json(
        state
            .reviews
            .reject(&reviewer.principal, id, reason)
            .await?,
    ))
}
