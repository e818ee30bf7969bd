use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use serde::Deserialize;

use taskboard_core::board::build_board;
use taskboard_core::storage::{ColumnStore, Identity, StoreError, TaskStore};
use taskboard_core::types::{Column, Priority, Stage, Tag, Task};

use super::{projection_json, ApiError};
use crate::auth::{authenticate, authorize};
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateColumnBody {
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(default)]
    wip_limit: Option<u32>,
    #[serde(default)]
    stage: Option<Stage>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskBody {
    #[serde(default)]
    id: Option<String>,
    title: String,
    #[serde(default)]
    description: String,
    /// Target column; the first column when omitted.
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    priority: Option<Priority>,
    #[serde(default)]
    assignee: Option<String>,
    #[serde(default)]
    due_date: Option<String>,
    #[serde(default)]
    sprint_id: Option<String>,
    #[serde(default)]
    estimate_minutes: u64,
    #[serde(default)]
    tags: Vec<String>,
}

fn new_id(requested: Option<String>) -> String {
    requested
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

pub async fn list_boards(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user_id = authenticate(state.identity.as_ref(), &headers)?;
    let boards: Vec<serde_json::Value> = state
        .store
        .board_ids()
        .into_iter()
        .filter_map(|id| state.store.board(&id))
        .filter_map(|board| {
            let member = board.members.iter().find(|m| m.user_id == user_id)?;
            Some(serde_json::json!({
                "id": board.id,
                "title": board.title,
                "role": member.role,
            }))
        })
        .collect();
    Ok(Json(serde_json::json!({ "boards": boards })))
}

pub async fn get_board(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(state.identity.as_ref(), &state.store, &headers, &board_id, false)?;
    let board = state
        .store
        .board(&board_id)
        .ok_or_else(|| StoreError::BoardNotFound(board_id.clone()))?;
    let model = build_board(
        &state.store.list_columns(&board_id)?,
        &state.store.list_tasks(&board_id)?,
    );
    Ok(Json(projection_json(&board_id, &board.title, &model)))
}

pub async fn create_column(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<CreateColumnBody>,
) -> Result<(StatusCode, Json<Column>), ApiError> {
    authorize(state.identity.as_ref(), &state.store, &headers, &board_id, true)?;
    if body.name.trim().is_empty() {
        return Err(ApiError::BadRequest("column name is empty".into()));
    }

    let mut column = Column::new(new_id(body.id), body.name.trim());
    column.board_id = board_id;
    column.wip_limit = body.wip_limit;
    column.stage = body.stage;
    let column = state.store.create_column(column)?;
    state.persist();

    log::info!(
        "[taskboard.api.board] Created column {} on board {}",
        column.id,
        column.board_id
    );
    Ok((StatusCode::CREATED, Json(column)))
}

pub async fn delete_column(
    State(state): State<AppState>,
    Path((board_id, column_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(state.identity.as_ref(), &state.store, &headers, &board_id, true)?;
    let on_board = state
        .store
        .list_columns(&board_id)?
        .iter()
        .any(|c| c.id == column_id);
    if !on_board {
        return Err(StoreError::ColumnNotFound(column_id).into());
    }

    state.store.delete_column(&column_id)?;
    state.persist();
    Ok(Json(serde_json::json!({ "success": true })))
}

pub async fn create_task(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<CreateTaskBody>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let (caller, _) = authorize(state.identity.as_ref(), &state.store, &headers, &board_id, true)?;
    if body.title.trim().is_empty() {
        return Err(ApiError::BadRequest("task title is empty".into()));
    }

    let model = build_board(
        &state.store.list_columns(&board_id)?,
        &state.store.list_tasks(&board_id)?,
    );
    let target = match body.status {
        Some(status) => model
            .column(&status)
            .ok_or_else(|| ApiError::BadRequest(format!("unknown column {}", status)))?,
        None => model
            .columns
            .values()
            .next()
            .ok_or_else(|| ApiError::BadRequest("board has no columns".into()))?,
    };
    // Append after the current last task of the column.
    let order = target
        .tasks
        .last()
        .map(|t| t.rank() + 1.0)
        .unwrap_or(0.0);

    let mut task = Task::new(new_id(body.id), body.title.trim());
    task.board_id = board_id;
    task.description = body.description;
    task.status = Some(target.column.id.clone());
    task.order = Some(order);
    if body.priority.is_some() {
        task.priority = body.priority;
    }
    task.assignee = body
        .assignee
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty());
    task.due_date = body.due_date;
    task.sprint_id = body.sprint_id;
    task.estimate_minutes = body.estimate_minutes;
    task.created_by = caller.current_user().map(|user| user.id);
    for title in body.tags {
        if !title.trim().is_empty() {
            task.add_tag(Tag::new(title.trim()));
        }
    }

    let task = state.store.create_task(task)?;
    state.persist();

    log::info!(
        "[taskboard.api.board] Created task {} in column {}",
        task.id,
        target.column.id
    );
    Ok((StatusCode::CREATED, Json(task)))
}
