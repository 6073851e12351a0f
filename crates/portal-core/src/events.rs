//! Server events and the broadcast bus that carries them.
//!
//! Lifecycle services emit an event for every submission, review decision
//! and download. Subscribers (the SSE stream, logs) each get their own
//! receiver; these events are the transient notifications shown to users.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Who caused an event.
#[derive(Debug, Clone, Serialize)]
pub struct EventActor {
    /// `"system"`, `"uploader"` or `"reviewer"`.
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl EventActor {
    pub fn system() -> Self {
        Self {
            kind: "system".to_string(),
            id: None,
            name: None,
        }
    }

    pub fn uploader(name: impl Into<String>) -> Self {
        Self {
            kind: "uploader".to_string(),
            id: None,
            name: Some(name.into()),
        }
    }

    pub fn reviewer(id: impl Into<String>, name: Option<String>) -> Self {
        Self {
            kind: "reviewer".to_string(),
            id: Some(id.into()),
            name,
        }
    }
}

/// Versioned wrapper around a [`ServerEvent`].
///
/// ```text
/// event: note.approved
/// id: 019508a0-1234-7def-8000-abcdef123456
/// data: {"event_id":"...","event_type":"note.approved","occurred_at":"...","payload":{...}}
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    /// UUIDv7, so IDs sort by emission time.
    pub event_id: Uuid,
    /// Namespaced event type, e.g. `"note.submitted"`.
    pub event_type: String,
    pub occurred_at: DateTime<Utc>,
    pub actor: EventActor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<Uuid>,
    pub payload_version: u32,
    pub payload: ServerEvent,
}

impl EventEnvelope {
    pub fn new(event: ServerEvent, actor: EventActor) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            event_type: event.namespaced_event_type().to_string(),
            occurred_at: Utc::now(),
            actor,
            entity_id: Some(event.note_id()),
            payload_version: 1,
            payload: event,
        }
    }
}

/// Domain events of the notes lifecycle.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// A submission was stored and is awaiting review.
    NoteSubmitted {
        note_id: Uuid,
        title: String,
        subject: String,
    },
    NoteApproved {
        note_id: Uuid,
        title: String,
    },
    NoteRejected {
        note_id: Uuid,
        title: String,
        reason: String,
    },
    NoteDownloaded {
        note_id: Uuid,
        download_count: i64,
    },
}

impl ServerEvent {
    /// Namespaced event type for the envelope and the SSE `event:` line.
    pub fn namespaced_event_type(&self) -> &'static str {
        match self {
            ServerEvent::NoteSubmitted { .. } => "note.submitted",
            ServerEvent::NoteApproved { .. } => "note.approved",
            ServerEvent::NoteRejected { .. } => "note.rejected",
            ServerEvent::NoteDownloaded { .. } => "note.downloaded",
        }
    }

    pub fn note_id(&self) -> Uuid {
        match self {
            ServerEvent::NoteSubmitted { note_id, .. }
            | ServerEvent::NoteApproved { note_id, .. }
            | ServerEvent::NoteRejected { note_id, .. }
            | ServerEvent::NoteDownloaded { note_id, .. } => *note_id,
        }
    }
}

/// Broadcast-based event bus.
///
/// Slow receivers that fall behind get a `Lagged` error and miss events.
pub struct EventBus {
    tx: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event. Dropped silently when nobody is subscribed.
    pub fn emit(&self, event: ServerEvent, actor: EventActor) {
        let envelope = EventEnvelope::new(event, actor);
        tracing::debug!(
            event_type = %envelope.event_type,
            event_id = %envelope.event_id,
            subscriber_count = self.tx.receiver_count(),
            "EventBus emit"
        );
        let _ = self.tx.send(envelope);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(crate::defaults::EVENT_BUS_CAPACITY)
    }
}
