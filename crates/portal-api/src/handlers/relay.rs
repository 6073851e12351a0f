//! Alternate submission path through the form relay.

use axum::{extract::State, Json};

use portal_core::{RelayRequest, RelayResponse};

use crate::{ApiError, AppState};

pub async fn relay_submit(
    State(state): State<AppState>,
    Json(request): Json<RelayRequest>,
) -> Result<Json<RelayResponse>, ApiError> {
    let relay = state.relay.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("Form relay is not configured on this server".to_string())
    })?;
    Ok(Json(relay.submit(&request).await?))
}
