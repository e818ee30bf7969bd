pub mod memory;

use crate::events::BoardSubscription;
use crate::patch::{ColumnPatch, ColumnUpdate, TaskPatch, TaskUpdate};
use crate::types::{Column, CurrentUser, Member, Sprint, Task};

/// Column records for a board. Deleting a column deletes its tasks.
pub trait ColumnStore: Send + Sync {
    fn list_columns(&self, board_id: &str) -> Result<Vec<Column>, StoreError>;

    fn create_column(&self, column: Column) -> Result<Column, StoreError>;

    fn update_column(&self, column_id: &str, patch: &ColumnPatch) -> Result<(), StoreError>;

    fn delete_column(&self, column_id: &str) -> Result<(), StoreError>;

    /// Apply several patches. The default writes them one at a time and
    /// stops at the first failure; stores that can should apply the batch
    /// atomically and notify once.
    fn update_columns(&self, updates: &[ColumnUpdate]) -> Result<(), StoreError> {
        for update in updates {
            self.update_column(&update.id, &update.patch)?;
        }
        Ok(())
    }
}

pub trait TaskStore: Send + Sync {
    fn list_tasks(&self, board_id: &str) -> Result<Vec<Task>, StoreError>;

    fn create_task(&self, task: Task) -> Result<Task, StoreError>;

    fn update_task(&self, task_id: &str, patch: &TaskPatch) -> Result<(), StoreError>;

    fn delete_task(&self, task_id: &str) -> Result<(), StoreError>;

    /// See [`ColumnStore::update_columns`].
    fn update_tasks(&self, updates: &[TaskUpdate]) -> Result<(), StoreError> {
        for update in updates {
            self.update_task(&update.id, &update.patch)?;
        }
        Ok(())
    }
}

/// Board membership and sprints.
pub trait DirectoryStore: Send + Sync {
    fn list_members(&self, board_id: &str) -> Result<Vec<Member>, StoreError>;

    fn list_sprints(&self, board_id: &str) -> Result<Vec<Sprint>, StoreError>;
}

/// Snapshot notifications, full replace semantics.
pub trait ChangeFeed: Send + Sync {
    fn subscribe(&self, board_id: &str) -> BoardSubscription;
}

/// Identity provider.
pub trait Identity: Send + Sync {
    fn current_user(&self) -> Option<CurrentUser>;

    /// Resolve a bearer credential to a user id.
    fn verify(&self, credential: &str) -> Option<String>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Board not found: {0}")]
    BoardNotFound(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
