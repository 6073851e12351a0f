//! SSE event stream.

use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive},
        Sse,
    },
};
use futures::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tracing::debug;

use portal_core::EventEnvelope;

use crate::AppState;

/// Envelopes from a bus subscription. A lagging receiver skips what it
/// missed and keeps going.
pub fn envelopes(rx: broadcast::Receiver<EventEnvelope>) -> impl Stream<Item = EventEnvelope> {
    BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(envelope) => Some(envelope),
        Err(e) => {
            debug!(subsystem = "events", error = %e, "SSE client lagged");
            None
        }
    })
}

fn to_sse(envelope: &EventEnvelope) -> Option<Event> {
    let json = serde_json::to_string(envelope).ok()?;
    Some(
        Event::default()
            .event(envelope.event_type.clone())
            .id(envelope.event_id.to_string())
            .data(json),
    )
}

/// Clients connect to `/api/v1/events` and receive one SSE message per
/// lifecycle event.
pub async fn sse_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = envelopes(state.event_bus.subscribe())
        .filter_map(|envelope| to_sse(&envelope).map(Ok));

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keepalive"),
    )
}
