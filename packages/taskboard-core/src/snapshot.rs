/// Rebuilds the projection from the latest pair of store snapshots.
///
/// Until both a column snapshot and a task snapshot have arrived the
/// rebuild is deferred; a half-loaded board is never produced.
use crate::board::{build_board, BoardModel};
use crate::events::BoardChangeEvent;
use crate::types::{Column, Task};

#[derive(Debug, Default)]
pub struct SnapshotReconciler {
    board_id: String,
    columns: Option<Vec<Column>>,
    tasks: Option<Vec<Task>>,
    columns_version: u64,
    tasks_version: u64,
}

impl SnapshotReconciler {
    pub fn new(board_id: impl Into<String>) -> Self {
        Self {
            board_id: board_id.into(),
            ..Self::default()
        }
    }

    pub fn board_id(&self) -> &str {
        &self.board_id
    }

    pub fn is_ready(&self) -> bool {
        self.columns.is_some() && self.tasks.is_some()
    }

    pub fn set_columns(&mut self, columns: Vec<Column>) -> Option<BoardModel> {
        self.columns = Some(columns);
        self.current()
    }

    pub fn set_tasks(&mut self, tasks: Vec<Task>) -> Option<BoardModel> {
        self.tasks = Some(tasks);
        self.current()
    }

    /// Feed a store event. Events for other boards and events older than
    /// the last applied snapshot of the same kind are ignored.
    pub fn apply_event(&mut self, event: BoardChangeEvent) -> Option<BoardModel> {
        if event.board_id() != self.board_id {
            return None;
        }
        match event {
            BoardChangeEvent::ColumnsChanged {
                version, columns, ..
            } => {
                if version <= self.columns_version {
                    log::debug!(
                        "[taskboard.snapshot] Stale column snapshot v{} for {}",
                        version,
                        self.board_id
                    );
                    return None;
                }
                self.columns_version = version;
                self.set_columns(columns)
            }
            BoardChangeEvent::TasksChanged { version, tasks, .. } => {
                if version <= self.tasks_version {
                    log::debug!(
                        "[taskboard.snapshot] Stale task snapshot v{} for {}",
                        version,
                        self.board_id
                    );
                    return None;
                }
                self.tasks_version = version;
                self.set_tasks(tasks)
            }
        }
    }

    /// The projection of the latest complete pair, if any.
    pub fn current(&self) -> Option<BoardModel> {
        match (&self.columns, &self.tasks) {
            (Some(columns), Some(tasks)) => Some(build_board(columns, tasks)),
            _ => None,
        }
    }
}
