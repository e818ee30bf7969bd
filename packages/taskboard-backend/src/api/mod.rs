use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use serde::Serialize;

mod board;
mod drag;
mod events;
mod view;

use crate::auth::AuthError;
use crate::state::AppState;
use taskboard_core::board::BoardModel;
use taskboard_core::progress::BoardProgress;
use taskboard_core::storage::StoreError;

/// Axum REST API routes.
///
///   GET    /boards                                -> boards the caller belongs to
///   GET    /boards/:boardId                       -> projection + progress
///   POST   /boards/:boardId/columns               -> add column
///   DELETE /boards/:boardId/columns/:columnId     -> delete column and its tasks
///   POST   /boards/:boardId/tasks                 -> add task
///   POST   /boards/:boardId/drag                  -> apply a drag gesture
///   POST   /boards/:boardId/view                  -> filtered, swimlaned view
///   GET    /events                                -> SSE stream of board changes
///   GET    /status                                -> health check
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/boards", get(board::list_boards))
        .route("/boards/{board_id}", get(board::get_board))
        .route("/boards/{board_id}/columns", post(board::create_column))
        .route(
            "/boards/{board_id}/columns/{column_id}",
            delete(board::delete_column),
        )
        .route("/boards/{board_id}/tasks", post(board::create_task))
        .route("/boards/{board_id}/drag", post(drag::drag_board))
        .route("/boards/{board_id}/view", post(view::board_view))
        .route("/events", get(events::sse_events))
        .route("/status", get(events::status))
}

// ── Shared types and helpers used across sub-modules ────────────────────

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Auth(AuthError::MissingCredential | AuthError::InvalidCredential) => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Auth(AuthError::NotMember(_) | AuthError::ReadOnly(_)) => {
                StatusCode::FORBIDDEN
            }
            ApiError::Store(
                StoreError::BoardNotFound(_)
                | StoreError::ColumnNotFound(_)
                | StoreError::TaskNotFound(_),
            ) => StatusCode::NOT_FOUND,
            ApiError::Store(StoreError::InvalidRecord(_)) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Store(StoreError::Io(_) | StoreError::Serde(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = self.to_string();
        log_api_issue(status, "taskboard.api", &error);
        (status, Json(ErrorResponse { error })).into_response()
    }
}

fn log_api_issue(status: StatusCode, target: &'static str, message: impl AsRef<str>) {
    let message = message.as_ref();
    if status.is_server_error() {
        log::error!(target: target, "{}", message);
    } else {
        log::warn!(target: target, "{}", message);
    }
}

/// Columns as an ordered array; JSON objects do not keep key order.
fn projection_json(board_id: &str, title: &str, model: &BoardModel) -> serde_json::Value {
    let columns: Vec<_> = model.columns.values().collect();
    serde_json::json!({
        "boardId": board_id,
        "title": title,
        "columns": columns,
        "orphans": model.orphans,
        "progress": BoardProgress::from_model(model),
    })
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
