use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};

use taskboard_core::reorder::{DragEvent, DragOutcome};
use taskboard_core::session::BoardSession;
use taskboard_core::storage::StoreError;

use super::{now_millis, projection_json, ApiError};
use crate::auth::authorize;
use crate::state::AppState;

/// Apply one drag gesture and persist its write-back.
///
/// 200 with the new projection when something moved, 200 with
/// `changed: false` for a cancelled or no-op gesture, 409 when the
/// destination column is at its WIP limit.
pub async fn drag_board(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
    headers: HeaderMap,
    Json(event): Json<DragEvent>,
) -> Result<Response, ApiError> {
    authorize(state.identity.as_ref(), &state.store, &headers, &board_id, true)?;
    let board = state
        .store
        .board(&board_id)
        .ok_or_else(|| StoreError::BoardNotFound(board_id.clone()))?;

    let mut session = BoardSession::load(state.store.as_ref(), &board_id)?;
    let outcome = match session.drag(state.store.as_ref(), &event, now_millis()) {
        Ok(outcome) => outcome,
        Err(e) => {
            // Save whatever part of the write-back landed.
            state.persist();
            return Err(e.into());
        }
    };

    let response = match outcome {
        DragOutcome::Unchanged => {
            Json(serde_json::json!({ "changed": false })).into_response()
        }
        DragOutcome::Rejected(rejection) => {
            log::info!(
                "[taskboard.api.drag] Rejected drag of {} on board {}: {}",
                event.item_id.as_deref().unwrap_or("?"),
                board_id,
                rejection
            );
            (
                StatusCode::CONFLICT,
                Json(serde_json::json!({
                    "error": rejection.to_string(),
                    "rejection": rejection,
                })),
            )
                .into_response()
        }
        DragOutcome::Moved { board: model, plan } => {
            state.persist();
            log::debug!(
                "[taskboard.api.drag] Wrote {} column and {} task patches",
                plan.columns.len(),
                plan.tasks.len()
            );
            let mut body = projection_json(&board_id, &board.title, &model);
            body["changed"] = serde_json::Value::Bool(true);
            Json(body).into_response()
        }
    };
    Ok(response)
}
