//! Server-Sent Events stream for ingestion progress and record
//! transitions

use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tracing::{debug, info, warn};

use rollbook_common::events::RollbookEvent;

use crate::AppState;

fn event_type(event: &RollbookEvent) -> &'static str {
    match event {
        RollbookEvent::IngestStarted { .. } => "IngestStarted",
        RollbookEvent::IngestProgress { .. } => "IngestProgress",
        RollbookEvent::IngestCompleted { .. } => "IngestCompleted",
        RollbookEvent::RecordTransitioned { .. } => "RecordTransitioned",
    }
}

/// GET /events - SSE event stream
///
/// Forwards every bus event as a named SSE event with a JSON payload.
/// A comment heartbeat every 15 seconds keeps idle connections open.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected");

    let mut rx = state.event_bus.subscribe();

    let stream = async_stream::stream! {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(15)) => {
                    debug!("SSE: Sending heartbeat");
                    yield Ok(Event::default().comment("heartbeat"));
                }

                result = rx.recv() => {
                    match result {
                        Ok(event) => {
                            match serde_json::to_string(&event) {
                                Ok(json) => {
                                    yield Ok(Event::default()
                                        .event(event_type(&event))
                                        .data(json));
                                }
                                Err(e) => {
                                    warn!("SSE: Failed to serialize event: {}", e);
                                }
                            }
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!("SSE: Client lagged, {} events dropped", skipped);
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                            info!("SSE: Event bus closed, ending stream");
                            break;
                        }
                    }
                }
            }
        }
    };

    Sse::new(stream)
}
