//! Submission intake.
//!
//! ## Steps
//!
//! 1. Validate the form and file (no I/O when this fails)
//! 2. Build a timestamp-prefixed object key
//! 3. Upload the file, publishing progress
//! 4. Derive tags and insert a `pending` record
//! 5. Emit `note.submitted`
//!
//! A record insert that fails after the upload succeeded is reported as
//! [`Error::PartialFailure`]. The uploaded object stays where it is.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use portal_core::{
    defaults, extract_keywords, validate_submission, CreateNoteRecordRequest, Error, EventActor,
    EventBus, NoteRecord, NoteRecordRepository, NoteSubmission, ObjectStore, ProgressReporter,
    Result, ServerEvent, SubmissionLimits, UploadedFile,
};

/// Object key for an upload: `notes/{unix_millis}_{8 hex}_{file_name}`.
///
/// `file_name` must already be sanitized.
pub fn object_key(file_name: &str, now: DateTime<Utc>) -> String {
    let nonce = Uuid::new_v4().simple().to_string();
    format!(
        "{}/{}_{}_{}",
        defaults::OBJECT_KEY_PREFIX,
        now.timestamp_millis(),
        &nonce[..8],
        file_name
    )
}

pub struct SubmissionService {
    notes: Arc<dyn NoteRecordRepository>,
    objects: Arc<dyn ObjectStore>,
    events: Arc<EventBus>,
    limits: SubmissionLimits,
}

impl SubmissionService {
    pub fn new(
        notes: Arc<dyn NoteRecordRepository>,
        objects: Arc<dyn ObjectStore>,
        events: Arc<EventBus>,
        limits: SubmissionLimits,
    ) -> Self {
        Self {
            notes,
            objects,
            events,
            limits,
        }
    }

    pub fn limits(&self) -> &SubmissionLimits {
        &self.limits
    }

    #[instrument(skip_all, fields(subsystem = "submission", op = "submit", file_size = file.map(|f| f.data.len()).unwrap_or(0)))]
    pub async fn submit(
        &self,
        submission: &NoteSubmission,
        file: Option<&UploadedFile>,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<NoteRecord> {
        let start = Instant::now();
        let valid = validate_submission(submission, file, &self.limits)?;
        // validate_submission rejects a missing file
        let data = file.map(|f| f.data.as_slice()).unwrap_or_default();

        let key = object_key(&valid.file_name, Utc::now());
        let stored = self
            .objects
            .put_object(&key, data, progress, cancel)
            .await
            .map_err(|e| match e {
                Error::Cancelled | Error::Storage(_) => e,
                other => Error::Storage(other.to_string()),
            })?;

        let tags = extract_keywords(&valid.title, &valid.description);
        let request = CreateNoteRecordRequest {
            title: valid.title,
            subject: valid.subject,
            semester: valid.semester,
            category: valid.category,
            description: valid.description,
            uploader_name: valid.uploader_name,
            file_url: stored.url,
            file_key: stored.key,
            file_name: valid.file_name,
            file_size: valid.file_size as i64,
            tags,
        };

        let record = match self.notes.insert(request).await {
            Ok(record) => record,
            Err(e) => {
                warn!(
                    object_key = %key,
                    error = %e,
                    "Record insert failed after upload; object left orphaned"
                );
                return Err(Error::PartialFailure {
                    object_key: key,
                    source: Box::new(e),
                });
            }
        };

        self.events.emit(
            ServerEvent::NoteSubmitted {
                note_id: record.id,
                title: record.title.clone(),
                subject: record.subject.clone(),
            },
            EventActor::uploader(record.uploader_name.clone()),
        );

        info!(
            note_id = %record.id,
            object_key = %record.file_key,
            tag_count = record.tags.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Note submitted for review"
        );
        Ok(record)
    }
}
