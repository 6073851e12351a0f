//! Note record repository implementation.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use portal_core::{
    BrowseFilter, CreateNoteRecordRequest, Error, NoteCategory, NoteRecord, NoteRecordRepository,
    NoteStatus, Result, ReviewAction, StatusCounts,
};

/// Columns selected for every note record query.
const NOTE_COLUMNS: &str = "id, title, subject, semester, category, description, uploader_name, \
     file_url, file_key, file_name, file_size, status, upload_date, approved_date, \
     rejected_date, rejection_reason, download_count, tags";

/// PostgreSQL implementation of NoteRecordRepository.
pub struct PgNoteRecordRepository {
    pool: Pool<Postgres>,
}

impl PgNoteRecordRepository {
    /// Create a new PgNoteRecordRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Current status of a record, or `None` if it does not exist.
    async fn current_status(&self, id: Uuid) -> Result<Option<NoteStatus>> {
        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM note_record WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        status.map(|s| parse_status(&s)).transpose()
    }
}

fn parse_status(s: &str) -> Result<NoteStatus> {
    s.parse()
        .map_err(|e: String| Error::Internal(format!("Corrupt note_record row: {}", e)))
}

/// Map a database row to a NoteRecord.
fn map_row_to_note_record(row: &PgRow) -> Result<NoteRecord> {
    let status: String = row.try_get("status")?;
    let category: String = row.try_get("category")?;
    let category: NoteCategory = category
        .parse()
        .map_err(|e: String| Error::Internal(format!("Corrupt note_record row: {}", e)))?;

    Ok(NoteRecord {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        subject: row.try_get("subject")?,
        semester: row.try_get("semester")?,
        category,
        description: row.try_get("description")?,
        uploader_name: row.try_get("uploader_name")?,
        file_url: row.try_get("file_url")?,
        file_key: row.try_get("file_key")?,
        file_name: row.try_get("file_name")?,
        file_size: row.try_get("file_size")?,
        status: parse_status(&status)?,
        upload_date: row.try_get("upload_date")?,
        approved_date: row.try_get("approved_date")?,
        rejected_date: row.try_get("rejected_date")?,
        rejection_reason: row.try_get("rejection_reason")?,
        download_count: row.try_get("download_count")?,
        tags: row.try_get("tags")?,
    })
}

/// Build the browse query for approved records.
///
/// Returns the SQL text; parameters are bound in the order subject,
/// semester, category for whichever of them are present.
fn build_approved_query(filter: &BrowseFilter) -> String {
    let mut query = format!(
        "SELECT {} FROM note_record WHERE status = 'approved' ",
        NOTE_COLUMNS
    );
    let mut param_idx = 1;
    if filter.subject.is_some() {
        query.push_str(&format!("AND LOWER(subject) = LOWER(${}) ", param_idx));
        param_idx += 1;
    }
    if filter.semester.is_some() {
        query.push_str(&format!("AND semester = ${} ", param_idx));
        param_idx += 1;
    }
    if filter.category.is_some() {
        query.push_str(&format!("AND category = ${} ", param_idx));
    }
    query.push_str("ORDER BY approved_date DESC, id DESC");
    query
}

#[async_trait]
impl NoteRecordRepository for PgNoteRecordRepository {
    #[instrument(skip(self, req), fields(subsystem = "database", op = "insert_note", title = %req.title))]
    async fn insert(&self, req: CreateNoteRecordRequest) -> Result<NoteRecord> {
        let id = Uuid::now_v7();
        let row = sqlx::query(&format!(
            "INSERT INTO note_record \
                (id, title, subject, semester, category, description, uploader_name, \
                 file_url, file_key, file_name, file_size, status, download_count, tags) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'pending', 0, $12) \
             RETURNING {}",
            NOTE_COLUMNS
        ))
        .bind(id)
        .bind(&req.title)
        .bind(&req.subject)
        .bind(req.semester)
        .bind(req.category.as_str())
        .bind(&req.description)
        .bind(&req.uploader_name)
        .bind(&req.file_url)
        .bind(&req.file_key)
        .bind(&req.file_name)
        .bind(req.file_size)
        .bind(&req.tags)
        .fetch_one(&self.pool)
        .await?;

        let record = map_row_to_note_record(&row)?;
        info!(note_id = %record.id, "Note record created");
        Ok(record)
    }

    async fn fetch(&self, id: Uuid) -> Result<NoteRecord> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM note_record WHERE id = $1",
            NOTE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::NoteNotFound(id))?;
        map_row_to_note_record(&row)
    }

    #[instrument(skip(self), fields(subsystem = "database", op = "fetch_by_file_key"))]
    async fn fetch_by_file_key(&self, file_key: &str) -> Result<NoteRecord> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM note_record WHERE file_key = $1",
            NOTE_COLUMNS
        ))
        .bind(file_key)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("File {}", file_key)))?;
        map_row_to_note_record(&row)
    }

    async fn list_by_status(
        &self,
        status: NoteStatus,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<NoteRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM note_record WHERE status = $1 \
             ORDER BY upload_date DESC, id DESC LIMIT $2 OFFSET $3",
            NOTE_COLUMNS
        ))
        .bind(status.as_str())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(map_row_to_note_record).collect()
    }

    #[instrument(skip(self, filter), fields(subsystem = "database", op = "list_approved"))]
    async fn list_approved(&self, filter: &BrowseFilter) -> Result<Vec<NoteRecord>> {
        let sql = build_approved_query(filter);
        let mut q = sqlx::query(&sql);
        if let Some(subject) = &filter.subject {
            q = q.bind(subject.trim());
        }
        if let Some(semester) = filter.semester {
            q = q.bind(semester);
        }
        if let Some(category) = filter.category {
            q = q.bind(category.as_str());
        }
        let rows = q.fetch_all(&self.pool).await?;
        debug!(result_count = rows.len(), "Approved notes fetched");
        rows.iter().map(map_row_to_note_record).collect()
    }

    #[instrument(skip(self, action), fields(subsystem = "database", op = "transition", note_id = %id, action = action.name()))]
    async fn transition(&self, id: Uuid, action: &ReviewAction) -> Result<NoteRecord> {
        let target = action.target_status();
        // Conditional on the row still being pending: a concurrent reviewer
        // that got there first makes this a zero-row update.
        let row = sqlx::query(&format!(
            "UPDATE note_record SET \
                status = $2, \
                approved_date = CASE WHEN $2 = 'approved' THEN NOW() ELSE NULL END, \
                rejected_date = CASE WHEN $2 = 'rejected' THEN NOW() ELSE NULL END, \
                rejection_reason = $3 \
             WHERE id = $1 AND status = 'pending' \
             RETURNING {}",
            NOTE_COLUMNS
        ))
        .bind(id)
        .bind(target.as_str())
        .bind(action.rejection_reason())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => map_row_to_note_record(&row),
            None => match self.current_status(id).await? {
                None => Err(Error::NoteNotFound(id)),
                Some(status) => Err(Error::NotPending { id, status }),
            },
        }
    }

    async fn increment_downloads(&self, id: Uuid) -> Result<NoteRecord> {
        let row = sqlx::query(&format!(
            "UPDATE note_record SET download_count = download_count + 1 \
             WHERE id = $1 AND status = 'approved' \
             RETURNING {}",
            NOTE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::NoteNotFound(id))?;
        map_row_to_note_record(&row)
    }

    async fn status_counts(&self) -> Result<StatusCounts> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM note_record GROUP BY status")
                .fetch_all(&self.pool)
                .await?;

        let mut counts = StatusCounts::default();
        for (status, count) in rows {
            match parse_status(&status)? {
                NoteStatus::Pending => counts.pending = count,
                NoteStatus::Approved => counts.approved = count,
                NoteStatus::Rejected => counts.rejected = count,
            }
        }
        Ok(counts)
    }
}
