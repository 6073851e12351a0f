//! Core data models for the study portal.
//!
//! These types are shared across all portal crates and represent the notes
//! submission/review domain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults;

// =============================================================================
// STATUS & CATEGORY
// =============================================================================

/// Review status of a submitted note.
///
/// `Pending` is the only non-terminal state; see [`crate::lifecycle`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum NoteStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl NoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Approved and rejected records never change status again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for NoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NoteStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("Invalid note status: {}", s)),
        }
    }
}

/// Kind of study material a note contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NoteCategory {
    LectureNotes,
    Assignment,
    QuestionPaper,
    LabManual,
    Reference,
    Other,
}

impl NoteCategory {
    pub const ALL: [NoteCategory; 6] = [
        Self::LectureNotes,
        Self::Assignment,
        Self::QuestionPaper,
        Self::LabManual,
        Self::Reference,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LectureNotes => "lecture_notes",
            Self::Assignment => "assignment",
            Self::QuestionPaper => "question_paper",
            Self::LabManual => "lab_manual",
            Self::Reference => "reference",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for NoteCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NoteCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "lecture_notes" | "notes" => Ok(Self::LectureNotes),
            "assignment" | "assignments" => Ok(Self::Assignment),
            "question_paper" | "question_papers" | "pyq" => Ok(Self::QuestionPaper),
            "lab_manual" | "lab" => Ok(Self::LabManual),
            "reference" | "reference_material" => Ok(Self::Reference),
            "other" => Ok(Self::Other),
            _ => Err(format!("Invalid note category: {}", s)),
        }
    }
}

// =============================================================================
// NOTE RECORD
// =============================================================================

/// A submitted document's metadata plus its review status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct NoteRecord {
    pub id: Uuid,
    pub title: String,
    pub subject: String,
    pub semester: i16,
    pub category: NoteCategory,
    pub description: String,
    pub uploader_name: String,
    pub file_url: String,
    /// Object-store key of the uploaded file.
    pub file_key: String,
    pub file_name: String,
    pub file_size: i64,
    pub status: NoteStatus,
    pub upload_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    pub download_count: i64,
    pub tags: Vec<String>,
}

impl NoteRecord {
    /// Check that review timestamps agree with the status.
    ///
    /// Pending records carry neither timestamp; approved records carry only
    /// `approved_date`; rejected records carry only `rejected_date` and a
    /// reason.
    pub fn check_review_invariant(&self) -> bool {
        match self.status {
            NoteStatus::Pending => {
                self.approved_date.is_none()
                    && self.rejected_date.is_none()
                    && self.rejection_reason.is_none()
            }
            NoteStatus::Approved => {
                self.approved_date.is_some()
                    && self.rejected_date.is_none()
                    && self.rejection_reason.is_none()
            }
            NoteStatus::Rejected => {
                self.rejected_date.is_some()
                    && self.approved_date.is_none()
                    && self.rejection_reason.is_some()
            }
        }
    }

    /// Whether the record may be offered for download.
    pub fn is_downloadable(&self) -> bool {
        self.status == NoteStatus::Approved
    }
}

// =============================================================================
// SUBMISSION TYPES
// =============================================================================

/// Form fields of a notes submission, as entered by the uploader.
///
/// Every field is optional, untyped text here so that missing and malformed
/// values are both reported by validation, in order, rather than by parsing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct NoteSubmission {
    pub title: Option<String>,
    pub subject: Option<String>,
    /// 1-based semester number.
    pub semester: Option<String>,
    /// Category name; see [`NoteCategory`] for the accepted spellings.
    pub category: Option<String>,
    pub description: Option<String>,
    pub uploader_name: Option<String>,
}

/// The single file attached to a submission.
#[derive(Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data,
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

impl std::fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.data.len())
            .finish()
    }
}

/// Request for persisting a new note record (always created `pending`).
#[derive(Debug, Clone)]
pub struct CreateNoteRecordRequest {
    pub title: String,
    pub subject: String,
    pub semester: i16,
    pub category: NoteCategory,
    pub description: String,
    pub uploader_name: String,
    pub file_url: String,
    pub file_key: String,
    pub file_name: String,
    pub file_size: i64,
    pub tags: Vec<String>,
}

/// Result of writing an object to the object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
    pub size: u64,
}

// =============================================================================
// BROWSE TYPES
// =============================================================================

/// Filter for the public browse listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct BrowseFilter {
    pub subject: Option<String>,
    pub semester: Option<i16>,
    pub category: Option<NoteCategory>,
    /// Free-text search over title, subject, description and tags.
    pub search: Option<String>,
}

/// One page of approved notes.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct BrowsePage {
    pub notes: Vec<NoteRecord>,
    /// Number of records matching the filter across all pages.
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    /// True when "load more" would return further records.
    pub has_more: bool,
}

/// What the caller needs to fetch a downloaded file.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DownloadTicket {
    pub id: Uuid,
    pub file_url: String,
    pub file_name: String,
    pub download_count: i64,
}

/// Number of records in each review state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct StatusCounts {
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}

impl StatusCounts {
    pub fn total(&self) -> i64 {
        self.pending + self.approved + self.rejected
    }
}

/// Reviewer identity handed out by an [`crate::AccessControl`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewerPrincipal {
    pub id: String,
    pub display_name: Option<String>,
}

/// Fallback uploader name when the form leaves it blank.
pub fn default_uploader_name() -> String {
    defaults::ANONYMOUS_UPLOADER.to_string()
}
