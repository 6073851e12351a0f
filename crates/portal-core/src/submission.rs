//! Local validation of notes submissions.
//!
//! Validation is synchronous and performs no I/O, so a rejected submission
//! never reaches the object store or the document store. Checks run in a
//! fixed order and the first failure wins:
//!
//! 1. required fields present
//! 2. semester in range, category known
//! 3. title length
//! 4. description length
//! 5. declared MIME type
//! 6. file size
//! 7. file content agrees with the declared type

use thiserror::Error;

use crate::defaults;
use crate::file_safety::{content_matches_declared, sanitize_filename};
use crate::models::{NoteCategory, NoteSubmission, UploadedFile};

/// Why a submission was refused. Every variant is fixed by correcting the
/// input and resubmitting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please fill in the required field: {0}")]
    MissingField(&'static str),

    #[error("Semester must be between 1 and {max}")]
    SemesterOutOfRange { max: i16 },

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Title must be at least {min} characters long")]
    TitleTooShort { min: usize },

    #[error("Description must be at least {min} characters long")]
    DescriptionTooShort { min: usize },

    #[error("Only {accepted} files are accepted (got {actual})")]
    UnsupportedFileType { accepted: String, actual: String },

    #[error("File is too large: {actual} bytes exceeds the {max} byte limit")]
    FileTooLarge { max: u64, actual: u64 },

    #[error("File content does not match its declared type {declared}")]
    ContentMismatch { declared: String },
}

/// Limits applied during validation.
#[derive(Debug, Clone)]
pub struct SubmissionLimits {
    pub max_file_size: u64,
    pub accepted_mime_type: String,
    pub semester_max: i16,
    pub title_min_chars: usize,
    pub description_min_chars: usize,
}

impl Default for SubmissionLimits {
    fn default() -> Self {
        Self {
            max_file_size: defaults::MAX_FILE_SIZE_BYTES,
            accepted_mime_type: defaults::ACCEPTED_MIME_TYPE.to_string(),
            semester_max: defaults::SEMESTER_MAX,
            title_min_chars: defaults::TITLE_MIN_CHARS,
            description_min_chars: defaults::DESCRIPTION_MIN_CHARS,
        }
    }
}

/// A submission that passed every check, with text fields trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSubmission {
    pub title: String,
    pub subject: String,
    pub semester: i16,
    pub category: NoteCategory,
    pub description: String,
    pub uploader_name: String,
    /// File name safe for use in an object key.
    pub file_name: String,
    pub file_size: u64,
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, ValidationError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ValidationError::MissingField(field))
}

/// Validate a submission and its file against `limits`.
pub fn validate_submission(
    submission: &NoteSubmission,
    file: Option<&UploadedFile>,
    limits: &SubmissionLimits,
) -> Result<ValidSubmission, ValidationError> {
    let title = required(&submission.title, "title")?;
    let subject = required(&submission.subject, "subject")?;
    let semester = required(&submission.semester, "semester")?;
    let category = required(&submission.category, "category")?;
    let description = required(&submission.description, "description")?;
    let file = file
        .filter(|f| !f.data.is_empty())
        .ok_or(ValidationError::MissingField("file"))?;

    let semester = semester
        .parse::<i16>()
        .ok()
        .filter(|s| (1..=limits.semester_max).contains(s))
        .ok_or(ValidationError::SemesterOutOfRange {
            max: limits.semester_max,
        })?;
    let category: NoteCategory = category
        .parse()
        .map_err(|_| ValidationError::UnknownCategory(category.to_string()))?;

    if title.chars().count() < limits.title_min_chars {
        return Err(ValidationError::TitleTooShort {
            min: limits.title_min_chars,
        });
    }

    if description.chars().count() < limits.description_min_chars {
        return Err(ValidationError::DescriptionTooShort {
            min: limits.description_min_chars,
        });
    }

    let declared = file.content_type.trim();
    if !declared.eq_ignore_ascii_case(&limits.accepted_mime_type) {
        return Err(ValidationError::UnsupportedFileType {
            accepted: limits.accepted_mime_type.clone(),
            actual: if declared.is_empty() {
                "unknown".to_string()
            } else {
                declared.to_string()
            },
        });
    }

    if file.size() > limits.max_file_size {
        return Err(ValidationError::FileTooLarge {
            max: limits.max_file_size,
            actual: file.size(),
        });
    }

    if !content_matches_declared(&file.data, declared) {
        return Err(ValidationError::ContentMismatch {
            declared: declared.to_string(),
        });
    }

    let uploader_name = submission
        .uploader_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(defaults::ANONYMOUS_UPLOADER)
        .to_string();

    Ok(ValidSubmission {
        title: title.to_string(),
        subject: subject.to_string(),
        semester,
        category,
        description: description.to_string(),
        uploader_name,
        file_name: sanitize_filename(&file.file_name),
        file_size: file.size(),
    })
}
