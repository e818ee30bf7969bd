use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Json,
};
use serde::Deserialize;

use taskboard_core::board::build_board;
use taskboard_core::filter::{FilterContext, FilterCriteria};
use taskboard_core::storage::{ColumnStore, DirectoryStore, TaskStore};
use taskboard_core::swimlane::{visible_board, SwimlaneMode};

use super::ApiError;
use crate::auth::authorize;
use crate::state::AppState;

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ViewBody {
    filters: FilterCriteria,
    swimlane: SwimlaneMode,
}

/// Filtered, grouped view of a board. Read-only; nothing is persisted.
pub async fn board_view(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<ViewBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(state.identity.as_ref(), &state.store, &headers, &board_id, false)?;

    let model = build_board(
        &state.store.list_columns(&board_id)?,
        &state.store.list_tasks(&board_id)?,
    );
    let members = state.store.list_members(&board_id)?;
    let sprints = state.store.list_sprints(&board_id)?;
    let ctx = FilterContext::now(&sprints);

    let columns = visible_board(&model, &body.filters, body.swimlane, &members, &ctx);
    let visible: usize = columns
        .iter()
        .flat_map(|c| c.groups.iter())
        .map(|g| g.tasks.len())
        .sum();

    Ok(Json(serde_json::json!({
        "boardId": board_id,
        "filtered": !body.filters.is_default(),
        "visible": visible,
        "total": model.task_count(),
        "columns": columns,
    })))
}
