use axum::{
    extract::{Query, State},
    response::{sse::Event, Json, Sse},
};
use serde::Deserialize;
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::state::AppState;

#[derive(Deserialize)]
pub struct EventsQuery {
    board: Option<String>,
}

/// SSE endpoint: streams BoardChangeEvent as JSON to connected clients,
/// optionally narrowed to one board with `?board=<id>`.
pub async fn sse_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let rx = state.store.events();
    let board = query.board;
    let stream = BroadcastStream::new(rx).filter_map(move |result| match result {
        Ok(event) => {
            if board.as_deref().is_some_and(|id| id != event.board_id()) {
                return None;
            }
            let json = serde_json::to_string(&event).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(e) => {
            log::warn!("[taskboard.api.events] Dropped events for slow client: {}", e);
            None
        }
    });

    // Keep-alive every 30 seconds
    let stream = stream.merge(tokio_stream::StreamExt::map(
        tokio_stream::wrappers::IntervalStream::new(tokio::time::interval(
            std::time::Duration::from_secs(30),
        )),
        |_| Ok(Event::default().comment("keep-alive")),
    ));

    Sse::new(stream)
}

pub async fn status(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "running",
        "port": state.port,
        "bindAddress": state.bind_address,
        "boards": state.store.board_ids().len(),
    }))
}
