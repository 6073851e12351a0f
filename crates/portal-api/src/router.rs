//! Router assembly: routes, middleware and OpenAPI docs.

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use portal_core::{
    defaults, AuthErrorKind, AuthUser, BrowseFilter, BrowsePage, Credentials, DownloadTicket,
    NoteCategory, NoteRecord, NoteStatus, NoteSubmission, RelayFile, RelayRequest,
    RelayResponse, StatusCounts,
};

use crate::config::ServerConfig;
use crate::handlers::{self, auth, events, notes, relay, review};
use crate::AppState;

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// OpenAPI schema for the public types.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Study Portal API",
        description = "Notes submission, review and browse"
    ),
    components(schemas(
        NoteRecord,
        NoteStatus,
        NoteCategory,
        NoteSubmission,
        BrowseFilter,
        BrowsePage,
        DownloadTicket,
        StatusCounts,
        Credentials,
        AuthUser,
        AuthErrorKind,
        RelayRequest,
        RelayFile,
        RelayResponse
    )),
    tags(
        (name = "Notes", description = "Submission, browse and download"),
        (name = "Review", description = "Reviewer queue and decisions"),
        (name = "Auth", description = "Identity provider pass-through")
    )
)]
pub struct ApiDoc;

/// Parse allowed CORS origins, dropping entries that are not valid header values.
pub fn parse_allowed_origins(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("Invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect()
}

async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    if let Some(limiter) = &state.rate_limiter {
        if limiter.check().is_err() {
            tracing::warn!("Rate limit exceeded");
            return Err((
                StatusCode::TOO_MANY_REQUESTS,
                Json(serde_json::json!({
                    "error": "Too many requests. Please wait before retrying.",
                    "retryable": true
                })),
            ));
        }
    }
    Ok(next.run(request).await)
}

/// Build the application router.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Notes
        .route(
            "/api/v1/notes",
            post(notes::submit_note).get(notes::list_notes),
        )
        .route("/api/v1/notes/:id", get(notes::get_note))
        .route("/api/v1/notes/:id/download", post(notes::download_note))
        .route("/api/v1/files/*key", get(notes::serve_file))
        // Review
        .route("/api/v1/review/notes", get(review::list_queue))
        .route("/api/v1/review/counts", get(review::status_counts))
        .route(
            "/api/v1/review/notes/:id/approve",
            post(review::approve_note),
        )
        .route("/api/v1/review/notes/:id/reject", post(review::reject_note))
        // Auth
        .route("/api/v1/auth/sign-in", post(auth::sign_in))
        .route("/api/v1/auth/sign-up", post(auth::sign_up))
        .route("/api/v1/auth/password-reset", post(auth::password_reset))
        .route("/api/v1/auth/sign-out", post(auth::sign_out))
        // Relay
        .route("/api/v1/relay", post(relay::relay_submit))
        // SSE events
        .route("/api/v1/events", get(events::sse_events))
        .merge(SwaggerUi::new("/docs").url("/api/v1/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(parse_allowed_origins(
                    &config.allowed_origins,
                )))
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
                .allow_credentials(true)
                .max_age(std::time::Duration::from_secs(defaults::CORS_MAX_AGE_SECS)),
        )
        // The largest accepted file plus multipart overhead
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.body_limit_bytes()))
        .with_state(state)
}
