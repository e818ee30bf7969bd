use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use taskboard_backend::config::ServerConfig;
use taskboard_backend::server::app;
use taskboard_backend::state::AppState;

const OWNER: &str = "tok-ana";
const VIEWER: &str = "tok-budi";

fn config() -> ServerConfig {
    serde_json::from_value(json!({
        "tokens": { OWNER: "u1", VIEWER: "u2", "tok-cai": "u3" },
        "boards": [{
            "id": "b1",
            "title": "Launch",
            "members": [
                { "userId": "u1", "displayName": "Ana", "role": "owner" },
                { "userId": "u2", "displayName": "Budi", "role": "viewer" }
            ],
            "columns": [
                { "id": "todo", "name": "To Do", "createdAt": 1 },
                { "id": "doing", "name": "In Progress", "createdAt": 2, "wipLimit": 1 },
                { "id": "done", "name": "Done", "createdAt": 3 }
            ]
        }]
    }))
    .unwrap()
}

fn router() -> (Router, AppState) {
    let state = AppState::from_config(config()).unwrap();
    (app(state.clone()), state)
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn add_task(app: &Router, id: &str, status: &str, extra: Value) {
    let mut body = json!({ "id": id, "title": format!("Task {}", id), "status": status });
    if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
        body.extend(extra.clone());
    }
    let (code, _) = send(app, "POST", "/boards/b1/tasks", Some(OWNER), Some(body)).await;
    assert_eq!(code, StatusCode::CREATED);
}

fn column_tasks(board: &Value, index: usize) -> Vec<String> {
    board["columns"][index]["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_status_reports_boards() {
    let (app, _) = router();
    let (code, body) = send(&app, "GET", "/status", None, None).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["status"], "running");
    assert_eq!(body["boards"], 1);
}

#[tokio::test]
async fn test_board_requires_membership() {
    let (app, _) = router();
    let (code, _) = send(&app, "GET", "/boards/b1", None, None).await;
    assert_eq!(code, StatusCode::UNAUTHORIZED);
    let (code, _) = send(&app, "GET", "/boards/b1", Some("bogus"), None).await;
    assert_eq!(code, StatusCode::UNAUTHORIZED);
    let (code, _) = send(&app, "GET", "/boards/b1", Some("tok-cai"), None).await;
    assert_eq!(code, StatusCode::FORBIDDEN);

    let (code, board) = send(&app, "GET", "/boards/b1", Some(VIEWER), None).await;
    assert_eq!(code, StatusCode::OK);
    let names: Vec<&str> = board["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["column"]["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["To Do", "In Progress", "Done"]);
}

#[tokio::test]
async fn test_viewer_cannot_mutate() {
    let (app, _) = router();
    let (code, _) = send(
        &app,
        "POST",
        "/boards/b1/tasks",
        Some(VIEWER),
        Some(json!({ "title": "Nope" })),
    )
    .await;
    assert_eq!(code, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_list_boards_for_caller() {
    let (app, _) = router();
    let (_, body) = send(&app, "GET", "/boards", Some(VIEWER), None).await;
    assert_eq!(body["boards"][0]["id"], "b1");
    assert_eq!(body["boards"][0]["role"], "viewer");
    let (_, body) = send(&app, "GET", "/boards", Some("tok-cai"), None).await;
    assert_eq!(body["boards"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_create_task_defaults_to_first_column() {
    let (app, _) = router();
    let (code, task) = send(
        &app,
        "POST",
        "/boards/b1/tasks",
        Some(OWNER),
        Some(json!({ "title": "Write docs", "tags": ["Docs", "docs"] })),
    )
    .await;
    assert_eq!(code, StatusCode::CREATED);
    assert_eq!(task["status"], "todo");
    assert_eq!(task["createdBy"], "u1");
    assert_eq!(task["tags"].as_array().unwrap().len(), 1);

    let (code, _) = send(
        &app,
        "POST",
        "/boards/b1/tasks",
        Some(OWNER),
        Some(json!({ "title": "Lost", "status": "ghost" })),
    )
    .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_blank_assignee_is_dropped() {
    let (app, _) = router();
    let (code, task) = send(
        &app,
        "POST",
        "/boards/b1/tasks",
        Some(OWNER),
        Some(json!({ "title": "Nobody's", "assignee": "  " })),
    )
    .await;
    assert_eq!(code, StatusCode::CREATED);
    assert!(task["assignee"].is_null());

    let (_, task) = send(
        &app,
        "POST",
        "/boards/b1/tasks",
        Some(OWNER),
        Some(json!({ "title": "Mine", "assignee": " u1 " })),
    )
    .await;
    assert_eq!(task["assignee"], "u1");
}

#[tokio::test]
async fn test_drag_into_done_column() {
    let (app, state) = router();
    add_task(&app, "t1", "todo", json!({})).await;
    add_task(&app, "t2", "todo", json!({})).await;

    let drag = json!({
        "type": "TASK",
        "source": { "droppableId": "todo", "index": 0 },
        "destination": { "droppableId": "done", "index": 0 },
        "draggableId": "t1"
    });
    let (code, board) = send(&app, "POST", "/boards/b1/drag", Some(OWNER), Some(drag)).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(board["changed"], true);
    assert_eq!(column_tasks(&board, 0), vec!["t2"]);
    assert_eq!(column_tasks(&board, 2), vec!["t1"]);
    assert!(board["columns"][2]["tasks"][0]["completedAt"].is_i64());
    assert_eq!(board["progress"]["closed"], 1);
    assert_eq!(board["progress"]["percent"], 50);

    // The store agrees with the returned projection.
    let (_, reloaded) = send(&app, "GET", "/boards/b1", Some(OWNER), None).await;
    assert_eq!(reloaded["columns"], board["columns"]);
    assert_eq!(state.store.board_ids(), vec!["b1".to_string()]);
}

#[tokio::test]
async fn test_drag_respects_wip_limit() {
    let (app, _) = router();
    add_task(&app, "t1", "todo", json!({})).await;
    add_task(&app, "t2", "doing", json!({})).await;

    let drag = json!({
        "type": "TASK",
        "source": { "droppableId": "todo", "index": 0 },
        "destination": { "droppableId": "doing", "index": 1 },
        "draggableId": "t1"
    });
    let (code, body) = send(&app, "POST", "/boards/b1/drag", Some(OWNER), Some(drag)).await;
    assert_eq!(code, StatusCode::CONFLICT);
    assert_eq!(body["rejection"]["reason"], "wipLimitReached");
    assert_eq!(body["rejection"]["columnId"], "doing");

    let (_, board) = send(&app, "GET", "/boards/b1", Some(OWNER), None).await;
    assert_eq!(column_tasks(&board, 0), vec!["t1"]);
}

#[tokio::test]
async fn test_column_drag_and_noop() {
    let (app, _) = router();
    let noop = json!({ "type": "COLUMN", "source": { "index": 1 }, "destination": { "index": 1 } });
    let (code, body) = send(&app, "POST", "/boards/b1/drag", Some(OWNER), Some(noop)).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body, json!({ "changed": false }));

    let cancelled = json!({ "type": "COLUMN", "source": { "index": 1 } });
    let (_, body) = send(&app, "POST", "/boards/b1/drag", Some(OWNER), Some(cancelled)).await;
    assert_eq!(body["changed"], false);

    let drag = json!({ "type": "COLUMN", "source": { "index": 0 }, "destination": { "index": 2 } });
    let (code, board) = send(&app, "POST", "/boards/b1/drag", Some(OWNER), Some(drag)).await;
    assert_eq!(code, StatusCode::OK);
    let ids: Vec<&str> = board["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["column"]["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["doing", "done", "todo"]);
}

#[tokio::test]
async fn test_delete_column_removes_tasks() {
    let (app, _) = router();
    add_task(&app, "t1", "doing", json!({})).await;
    let (code, _) = send(&app, "DELETE", "/boards/b1/columns/doing", Some(OWNER), None).await;
    assert_eq!(code, StatusCode::OK);
    let (code, _) = send(&app, "DELETE", "/boards/b1/columns/doing", Some(OWNER), None).await;
    assert_eq!(code, StatusCode::NOT_FOUND);

    let (_, board) = send(&app, "GET", "/boards/b1", Some(OWNER), None).await;
    assert_eq!(board["columns"].as_array().unwrap().len(), 2);
    assert_eq!(board["progress"]["total"], 0);
}

#[tokio::test]
async fn test_create_column_appends() {
    let (app, _) = router();
    let (code, column) = send(
        &app,
        "POST",
        "/boards/b1/columns",
        Some(OWNER),
        Some(json!({ "name": "Review", "wipLimit": 3 })),
    )
    .await;
    assert_eq!(code, StatusCode::CREATED);
    assert_eq!(column["wipLimit"], 3);
    assert!(!column["id"].as_str().unwrap().is_empty());

    let (_, board) = send(&app, "GET", "/boards/b1", Some(OWNER), None).await;
    assert_eq!(board["columns"][3]["column"]["name"], "Review");
}

#[tokio::test]
async fn test_view_filters_and_groups() {
    let (app, _) = router();
    add_task(&app, "t1", "todo", json!({ "assignee": "u1", "priority": "high" })).await;
    add_task(&app, "t2", "todo", json!({ "priority": "low" })).await;
    add_task(&app, "t3", "todo", json!({ "assignee": "u1", "tags": ["Bug"] })).await;

    let (code, view) = send(
        &app,
        "POST",
        "/boards/b1/view",
        Some(VIEWER),
        Some(json!({ "filters": { "assignee": "u1" }, "swimlane": "priority" })),
    )
    .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(view["filtered"], true);
    assert_eq!(view["visible"], 2);
    assert_eq!(view["total"], 3);

    let groups = view["columns"][0]["groups"].as_array().unwrap();
    let keys: Vec<&str> = groups.iter().map(|g| g["key"].as_str().unwrap()).collect();
    assert_eq!(keys, vec!["high", "low"]);
    assert_eq!(groups[1]["tasks"][0]["id"], "t3");

    let (_, view) = send(&app, "POST", "/boards/b1/view", Some(VIEWER), Some(json!({}))).await;
    assert_eq!(view["filtered"], false);
    assert_eq!(view["visible"], 3);
    assert_eq!(view["columns"][0]["groups"].as_array().unwrap().len(), 1);
}
