/// In-process store backing all record types.
///
/// - Records keyed by id behind `RwLock`s
/// - Every mutation publishes a full per-board snapshot on a broadcast channel
/// - Monotonic version counter shared across boards
/// - Optional JSON persistence with atomic writes (write to .tmp, rename)
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::{ChangeFeed, ColumnStore, DirectoryStore, StoreError, TaskStore};
use crate::events::{BoardChangeEvent, BoardSubscription};
use crate::patch::{ColumnPatch, ColumnUpdate, TaskPatch, TaskUpdate};
use crate::types::{Column, Member, Sprint, Task};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A board with its directory data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub sprints: Vec<Sprint>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreSnapshot {
    #[serde(default)]
    boards: Vec<BoardRecord>,
    #[serde(default)]
    columns: Vec<Column>,
    #[serde(default)]
    tasks: Vec<Task>,
}

pub struct MemoryStore {
    boards: RwLock<HashMap<String, BoardRecord>>,
    columns: RwLock<HashMap<String, Column>>,
    tasks: RwLock<HashMap<String, Task>>,
    event_tx: broadcast::Sender<BoardChangeEvent>,
    next_version: AtomicU64,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            boards: RwLock::new(HashMap::new()),
            columns: RwLock::new(HashMap::new()),
            tasks: RwLock::new(HashMap::new()),
            event_tx,
            next_version: AtomicU64::new(1),
        }
    }

    fn next_version(&self) -> u64 {
        self.next_version.fetch_add(1, Ordering::Relaxed)
    }

    /// Add or replace a board.
    pub fn register_board(&self, board: BoardRecord) {
        log::info!("[taskboard.store] Registered board {} ({})", board.title, board.id);
        write(&self.boards).insert(board.id.clone(), board);
    }

    pub fn board(&self, board_id: &str) -> Option<BoardRecord> {
        read(&self.boards).get(board_id).cloned()
    }

    pub fn board_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = read(&self.boards).keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn member(&self, board_id: &str, user_id: &str) -> Option<Member> {
        read(&self.boards)
            .get(board_id)
            .and_then(|b| b.members.iter().find(|m| m.user_id == user_id).cloned())
    }

    /// Raw event stream across all boards.
    pub fn events(&self) -> broadcast::Receiver<BoardChangeEvent> {
        self.event_tx.subscribe()
    }

    fn ensure_board(&self, board_id: &str) -> Result<(), StoreError> {
        if read(&self.boards).contains_key(board_id) {
            Ok(())
        } else {
            Err(StoreError::BoardNotFound(board_id.to_string()))
        }
    }

    fn columns_of(&self, board_id: &str) -> Vec<Column> {
        let mut columns: Vec<Column> = read(&self.columns)
            .values()
            .filter(|c| c.board_id == board_id)
            .cloned()
            .collect();
        columns.sort_by(|a, b| a.id.cmp(&b.id));
        columns
    }

    fn tasks_of(&self, board_id: &str) -> Vec<Task> {
        let mut tasks: Vec<Task> = read(&self.tasks)
            .values()
            .filter(|t| t.board_id == board_id)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| a.id.cmp(&b.id));
        tasks
    }

    fn publish_columns(&self, board_id: &str) {
        let event = BoardChangeEvent::ColumnsChanged {
            board_id: board_id.to_string(),
            version: self.next_version(),
            columns: self.columns_of(board_id),
        };
        // No receivers is fine.
        let _ = self.event_tx.send(event);
    }

    fn publish_tasks(&self, board_id: &str) {
        let event = BoardChangeEvent::TasksChanged {
            board_id: board_id.to_string(),
            version: self.next_version(),
            tasks: self.tasks_of(board_id),
        };
        let _ = self.event_tx.send(event);
    }

    /// Load a store from a JSON snapshot file.
    pub fn load_from(path: &Path) -> Result<Self, StoreError> {
        let content = fs::read_to_string(path)?;
        let snapshot: StoreSnapshot = serde_json::from_str(&content)?;
        let store = Self::new();
        {
            let mut boards = write(&store.boards);
            for board in snapshot.boards {
                boards.insert(board.id.clone(), board);
            }
            let mut columns = write(&store.columns);
            for column in snapshot.columns {
                columns.insert(column.id.clone(), column);
            }
            let mut tasks = write(&store.tasks);
            for task in snapshot.tasks {
                tasks.insert(task.id.clone(), task);
            }
        }
        log::info!("[taskboard.store] Loaded snapshot from {}", path.display());
        Ok(store)
    }

    /// Write all records to a JSON file atomically.
    pub fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        let mut boards: Vec<BoardRecord> = read(&self.boards).values().cloned().collect();
        boards.sort_by(|a, b| a.id.cmp(&b.id));
        let mut columns: Vec<Column> = read(&self.columns).values().cloned().collect();
        columns.sort_by(|a, b| a.id.cmp(&b.id));
        let mut tasks: Vec<Task> = read(&self.tasks).values().cloned().collect();
        tasks.sort_by(|a, b| a.id.cmp(&b.id));
        let snapshot = StoreSnapshot {
            boards,
            columns,
            tasks,
        };
        let content = serde_json::to_string_pretty(&snapshot)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

impl ColumnStore for MemoryStore {
    fn list_columns(&self, board_id: &str) -> Result<Vec<Column>, StoreError> {
        self.ensure_board(board_id)?;
        Ok(self.columns_of(board_id))
    }

    fn create_column(&self, mut column: Column) -> Result<Column, StoreError> {
        if column.id.trim().is_empty() {
            return Err(StoreError::InvalidRecord("column id is empty".into()));
        }
        self.ensure_board(&column.board_id)?;
        if column.created_at.is_none() {
            column.created_at = Some(now_millis());
        }
        {
            let mut columns = write(&self.columns);
            if columns.contains_key(&column.id) {
                return Err(StoreError::InvalidRecord(format!(
                    "column {} already exists",
                    column.id
                )));
            }
            columns.insert(column.id.clone(), column.clone());
        }
        self.publish_columns(&column.board_id);
        Ok(column)
    }

    fn update_column(&self, column_id: &str, patch: &ColumnPatch) -> Result<(), StoreError> {
        let board_id = {
            let mut columns = write(&self.columns);
            let column = columns
                .get_mut(column_id)
                .ok_or_else(|| StoreError::ColumnNotFound(column_id.to_string()))?;
            patch.apply(column);
            column.board_id.clone()
        };
        self.publish_columns(&board_id);
        Ok(())
    }

    fn delete_column(&self, column_id: &str) -> Result<(), StoreError> {
        let column = write(&self.columns)
            .remove(column_id)
            .ok_or_else(|| StoreError::ColumnNotFound(column_id.to_string()))?;

        let removed = {
            let mut tasks = write(&self.tasks);
            let before = tasks.len();
            tasks.retain(|_, t| {
                !(t.board_id == column.board_id && t.status.as_deref() == Some(column_id))
            });
            before - tasks.len()
        };
        log::info!(
            "[taskboard.store] Deleted column {} with {} tasks",
            column_id,
            removed
        );

        self.publish_columns(&column.board_id);
        if removed > 0 {
            self.publish_tasks(&column.board_id);
        }
        Ok(())
    }

    /// All-or-nothing: an unknown id fails the batch before any write.
    /// Publishes one snapshot per touched board.
    fn update_columns(&self, updates: &[ColumnUpdate]) -> Result<(), StoreError> {
        let boards = {
            let mut columns = write(&self.columns);
            if let Some(missing) = updates.iter().find(|u| !columns.contains_key(&u.id)) {
                return Err(StoreError::ColumnNotFound(missing.id.clone()));
            }
            let mut boards: Vec<String> = Vec::new();
            for update in updates {
                if let Some(column) = columns.get_mut(&update.id) {
                    update.patch.apply(column);
                    if !boards.contains(&column.board_id) {
                        boards.push(column.board_id.clone());
                    }
                }
            }
            boards
        };
        for board_id in &boards {
            self.publish_columns(board_id);
        }
        Ok(())
    }
}

impl TaskStore for MemoryStore {
    fn list_tasks(&self, board_id: &str) -> Result<Vec<Task>, StoreError> {
        self.ensure_board(board_id)?;
        Ok(self.tasks_of(board_id))
    }

    fn create_task(&self, mut task: Task) -> Result<Task, StoreError> {
        if task.id.trim().is_empty() {
            return Err(StoreError::InvalidRecord("task id is empty".into()));
        }
        if task.title.trim().is_empty() {
            return Err(StoreError::InvalidRecord("task title is empty".into()));
        }
        self.ensure_board(&task.board_id)?;
        if task.created_at.is_none() {
            task.created_at = Some(now_millis());
        }
        task.dedupe_tags();
        {
            let mut tasks = write(&self.tasks);
            if tasks.contains_key(&task.id) {
                return Err(StoreError::InvalidRecord(format!(
                    "task {} already exists",
                    task.id
                )));
            }
            tasks.insert(task.id.clone(), task.clone());
        }
        self.publish_tasks(&task.board_id);
        Ok(task)
    }

    fn update_task(&self, task_id: &str, patch: &TaskPatch) -> Result<(), StoreError> {
        let board_id = {
            let mut tasks = write(&self.tasks);
            let task = tasks
                .get_mut(task_id)
                .ok_or_else(|| StoreError::TaskNotFound(task_id.to_string()))?;
            patch.apply(task);
            task.board_id.clone()
        };
        self.publish_tasks(&board_id);
        Ok(())
    }

    fn delete_task(&self, task_id: &str) -> Result<(), StoreError> {
        let task = write(&self.tasks)
            .remove(task_id)
            .ok_or_else(|| StoreError::TaskNotFound(task_id.to_string()))?;
        self.publish_tasks(&task.board_id);
        Ok(())
    }

    /// All-or-nothing, like `update_columns`.
    fn update_tasks(&self, updates: &[TaskUpdate]) -> Result<(), StoreError> {
        let boards = {
            let mut tasks = write(&self.tasks);
            if let Some(missing) = updates.iter().find(|u| !tasks.contains_key(&u.id)) {
                return Err(StoreError::TaskNotFound(missing.id.clone()));
            }
            let mut boards: Vec<String> = Vec::new();
            for update in updates {
                if let Some(task) = tasks.get_mut(&update.id) {
                    update.patch.apply(task);
                    if !boards.contains(&task.board_id) {
                        boards.push(task.board_id.clone());
                    }
                }
            }
            boards
        };
        for board_id in &boards {
            self.publish_tasks(board_id);
        }
        Ok(())
    }
}

impl DirectoryStore for MemoryStore {
    fn list_members(&self, board_id: &str) -> Result<Vec<Member>, StoreError> {
        read(&self.boards)
            .get(board_id)
            .map(|b| b.members.clone())
            .ok_or_else(|| StoreError::BoardNotFound(board_id.to_string()))
    }

    fn list_sprints(&self, board_id: &str) -> Result<Vec<Sprint>, StoreError> {
        read(&self.boards)
            .get(board_id)
            .map(|b| b.sprints.clone())
            .ok_or_else(|| StoreError::BoardNotFound(board_id.to_string()))
    }
}

impl ChangeFeed for MemoryStore {
    fn subscribe(&self, board_id: &str) -> BoardSubscription {
        BoardSubscription::new(board_id, self.event_tx.subscribe())
    }
}
