//! Note submission, browse and download handlers.

use axum::{
    body::Body,
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use serde::{Deserialize, Deserializer};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use portal_core::{
    sniff_content_type, BrowseFilter, BrowsePage, DownloadTicket, NoteCategory, NoteRecord,
    NoteSubmission, ProgressReporter, UploadedFile,
};

use crate::access::Reviewer;
use crate::{ApiError, AppState};

/// Query parameters for browsing approved notes.
#[derive(Debug, Default, Deserialize)]
pub struct BrowseQuery {
    pub subject: Option<String>,
    pub semester: Option<i16>,
    /// Any spelling `NoteCategory::from_str` accepts, e.g. `lab` or `Lecture Notes`.
    #[serde(default, deserialize_with = "category_from_str")]
    pub category: Option<NoteCategory>,
    pub search: Option<String>,
    /// 0-based page index.
    #[serde(default)]
    pub page: usize,
}

fn category_from_str<'de, D>(deserializer: D) -> Result<Option<NoteCategory>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

impl BrowseQuery {
    fn into_filter(self) -> (BrowseFilter, usize) {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        (
            BrowseFilter {
                subject: non_empty(self.subject),
                semester: self.semester,
                category: self.category,
                search: non_empty(self.search),
            },
            self.page,
        )
    }
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(e.body_text())
    } else {
        ApiError::BadRequest(e.body_text())
    }
}

/// Read the submission form. Text fields are taken as-is; blank or
/// malformed values are reported by validation, in order.
async fn read_form(
    mut multipart: Multipart,
) -> Result<(NoteSubmission, Option<UploadedFile>), ApiError> {
    let mut form = NoteSubmission::default();
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let data = field.bytes().await.map_err(multipart_error)?;
            file = Some(UploadedFile::new(file_name, content_type, data.to_vec()));
            continue;
        }

        let value = field.text().await.map_err(multipart_error)?;
        match name.as_str() {
            "title" => form.title = Some(value),
            "subject" => form.subject = Some(value),
            "semester" => form.semester = Some(value),
            "category" => form.category = Some(value),
            "description" => form.description = Some(value),
            "uploader_name" | "uploaderName" => form.uploader_name = Some(value),
            other => debug!(field = other, "Ignoring unknown form field"),
        }
    }
    Ok((form, file))
}

/// Submit a note for review (multipart: form fields plus `file`).
pub async fn submit_note(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<NoteRecord>), ApiError> {
    let (form, file) = read_form(multipart).await?;

    // Dropping the request (client went away) cancels the upload.
    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();

    let (progress, mut progress_rx) = ProgressReporter::channel();
    tokio::spawn(async move {
        while progress_rx.changed().await.is_ok() {
            let percent = *progress_rx.borrow_and_update();
            debug!(percent, "Upload progress");
        }
    });

    let record = state
        .submissions
        .submit(&form, file.as_ref(), &progress, &cancel)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// List approved notes, newest approval first, 12 per page.
pub async fn list_notes(
    State(state): State<AppState>,
    Query(query): Query<BrowseQuery>,
) -> Result<Json<BrowsePage>, ApiError> {
    let (filter, page) = query.into_filter();
    Ok(Json(state.browse.list(&filter, page).await?))
}

pub async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<NoteRecord>, ApiError> {
    Ok(Json(state.browse.get(id).await?))
}

/// Count a download and return where to fetch the file.
pub async fn download_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DownloadTicket>, ApiError> {
    Ok(Json(state.browse.download(id).await?))
}

/// Serve a stored file. Files of notes still under review, or rejected,
/// are served to reviewers only.
pub async fn serve_file(
    State(state): State<AppState>,
    reviewer: Option<Reviewer>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    let (record, data) = state
        .browse
        .read_file(&key, reviewer.is_some())
        .await
        .map_err(|e| {
            warn!(object_key = %key, error = %e, "File read failed");
            ApiError::from(e)
        })?;
    let content_type = sniff_content_type(&data).unwrap_or("application/octet-stream");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, data.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", record.file_name.replace('"', "")),
        )
        .header("X-Content-Type-Options", "nosniff")
        .body(Body::from(data))
        .map_err(|e| ApiError::Internal(e.to_string()))
}
