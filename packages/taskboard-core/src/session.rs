/// A board as held by one view: the reconciled projection plus the
/// optimistic copy shown while write-backs are in flight.
///
/// Store snapshots always supersede the optimistic copy; there is no merge.
use crate::board::BoardModel;
use crate::events::BoardChangeEvent;
use crate::reorder::{drag, DragEvent, DragOutcome};
use crate::snapshot::SnapshotReconciler;
use crate::storage::{ColumnStore, StoreError, TaskStore};
use crate::writeback::commit_plan;

pub struct BoardSession {
    reconciler: SnapshotReconciler,
    model: Option<BoardModel>,
}

impl BoardSession {
    pub fn new(board_id: impl Into<String>) -> Self {
        Self {
            reconciler: SnapshotReconciler::new(board_id),
            model: None,
        }
    }

    /// Start a session from the current store contents.
    pub fn load<S>(store: &S, board_id: &str) -> Result<Self, StoreError>
    where
        S: ColumnStore + TaskStore + ?Sized,
    {
        let mut session = Self::new(board_id);
        session.reconciler.set_columns(store.list_columns(board_id)?);
        session.model = session.reconciler.set_tasks(store.list_tasks(board_id)?);
        Ok(session)
    }

    pub fn board_id(&self) -> &str {
        self.reconciler.board_id()
    }

    /// The model to render, if both snapshots have arrived.
    pub fn model(&self) -> Option<&BoardModel> {
        self.model.as_ref()
    }

    /// Returns whether the visible model was replaced.
    pub fn on_event(&mut self, event: BoardChangeEvent) -> bool {
        match self.reconciler.apply_event(event) {
            Some(model) => {
                self.model = Some(model);
                true
            }
            None => false,
        }
    }

    /// Apply a drag optimistically, then persist it.
    ///
    /// On a write failure the model is re-read from the store, since a
    /// non-atomic store may hold part of the plan. The error is returned.
    pub fn drag<S>(
        &mut self,
        store: &S,
        event: &DragEvent,
        now_ms: i64,
    ) -> Result<DragOutcome, StoreError>
    where
        S: ColumnStore + TaskStore + ?Sized,
    {
        let Some(model) = &self.model else {
            return Ok(DragOutcome::Unchanged);
        };
        let outcome = drag(model, event, now_ms);
        if let DragOutcome::Moved { board, plan } = &outcome {
            self.model = Some(board.clone());
            if let Err(e) = commit_plan(store, plan) {
                log::error!(
                    "[taskboard.session] Write-back failed for board {}: {}",
                    self.board_id(),
                    e
                );
                self.resync(store);
                return Err(e);
            }
        }
        Ok(outcome)
    }

    /// Replace both snapshots with what the store holds now. If the store
    /// cannot be read, nothing is shown until the next snapshot arrives.
    fn resync<S>(&mut self, store: &S)
    where
        S: ColumnStore + TaskStore + ?Sized,
    {
        let board_id = self.board_id().to_string();
        let listed = store
            .list_columns(&board_id)
            .and_then(|columns| Ok((columns, store.list_tasks(&board_id)?)));
        match listed {
            Ok((columns, tasks)) => {
                self.reconciler.set_columns(columns);
                self.model = self.reconciler.set_tasks(tasks);
            }
            Err(e) => {
                log::warn!("[taskboard.session] Resync failed for board {}: {}", board_id, e);
                self.model = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::{ColumnPatch, TaskPatch};
    use crate::reorder::DragLocation;
    use crate::storage::memory::{BoardRecord, MemoryStore};
    use crate::storage::ChangeFeed;
    use crate::types::{Column, Task};

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store.register_board(BoardRecord {
            id: "b1".into(),
            title: "Board".into(),
            members: Vec::new(),
            sprints: Vec::new(),
        });
        for (id, rank) in [("todo", 1), ("doing", 2)] {
            let mut col = Column::new(id, id);
            col.board_id = "b1".into();
            col.created_at = Some(rank);
            store.create_column(col).unwrap();
        }
        for (id, order) in [("t1", 0.0), ("t2", 1.0)] {
            let mut task = Task::new(id, id);
            task.board_id = "b1".into();
            task.status = Some("todo".into());
            task.order = Some(order);
            store.create_task(task).unwrap();
        }
        store
    }

    #[test]
    fn test_drag_persists_through_store() {
        let store = seeded();
        let mut session = BoardSession::load(&store, "b1").unwrap();
        let event = DragEvent::task("t1", DragLocation::task("todo", 0), Some(DragLocation::task("doing", 0)));
        let outcome = session.drag(&store, &event, 1_000).unwrap();
        assert!(matches!(outcome, DragOutcome::Moved { .. }));
        assert_eq!(session.model().unwrap().task_ids("doing"), vec!["t1"]);

        let reloaded = BoardSession::load(&store, "b1").unwrap();
        assert_eq!(reloaded.model(), session.model());
    }

    #[tokio::test]
    async fn test_snapshot_supersedes_optimistic_model() {
        let store = seeded();
        let mut session = BoardSession::load(&store, "b1").unwrap();
        let mut sub = store.subscribe("b1");

        store
            .update_task("t2", &TaskPatch { order: Some(-1.0), ..TaskPatch::default() })
            .unwrap();
        let event = sub.next().await.unwrap();
        assert!(session.on_event(event.clone()));
        assert_eq!(session.model().unwrap().task_ids("todo"), vec!["t2", "t1"]);
        // Columns arrive only via their own snapshot.
        store.update_column("doing", &ColumnPatch::rank(0)).unwrap();
        let event = sub.next().await.unwrap();
        assert!(session.on_event(event));
        assert_eq!(session.model().unwrap().column_ids(), vec!["doing", "todo"]);
    }

    /// Writes tasks one at a time and fails on one id, so a batch can land
    /// partially.
    struct FailingTaskStore {
        inner: MemoryStore,
        fail_on: String,
    }

    impl ColumnStore for FailingTaskStore {
        fn list_columns(&self, board_id: &str) -> Result<Vec<Column>, StoreError> {
            self.inner.list_columns(board_id)
        }

        fn create_column(&self, column: Column) -> Result<Column, StoreError> {
            self.inner.create_column(column)
        }

        fn update_column(&self, column_id: &str, patch: &ColumnPatch) -> Result<(), StoreError> {
            self.inner.update_column(column_id, patch)
        }

        fn delete_column(&self, column_id: &str) -> Result<(), StoreError> {
            self.inner.delete_column(column_id)
        }
    }

    impl TaskStore for FailingTaskStore {
        fn list_tasks(&self, board_id: &str) -> Result<Vec<Task>, StoreError> {
            self.inner.list_tasks(board_id)
        }

        fn create_task(&self, task: Task) -> Result<Task, StoreError> {
            self.inner.create_task(task)
        }

        fn update_task(&self, task_id: &str, patch: &TaskPatch) -> Result<(), StoreError> {
            if task_id == self.fail_on {
                return Err(StoreError::TaskNotFound(task_id.to_string()));
            }
            self.inner.update_task(task_id, patch)
        }

        fn delete_task(&self, task_id: &str) -> Result<(), StoreError> {
            self.inner.delete_task(task_id)
        }
    }

    #[test]
    fn test_failed_write_back_matches_store() {
        let store = seeded();
        let mut session = BoardSession::load(&store, "b1").unwrap();
        store.delete_task("t2").unwrap();

        let event = DragEvent::task("t1", DragLocation::task("todo", 0), Some(DragLocation::task("todo", 1)));
        let result = session.drag(&store, &event, 5);
        assert!(matches!(result, Err(StoreError::TaskNotFound(_))));
        let fresh = BoardSession::load(&store, "b1").unwrap();
        assert_eq!(session.model(), fresh.model());
        assert_eq!(session.model().unwrap().task_ids("todo"), vec!["t1"]);
    }

    #[test]
    fn test_partial_write_back_shows_what_landed() {
        let inner = seeded();
        let mut t3 = Task::new("t3", "t3");
        t3.board_id = "b1".into();
        t3.status = Some("doing".into());
        t3.order = Some(0.0);
        inner.create_task(t3).unwrap();
        let store = FailingTaskStore {
            inner,
            fail_on: "t3".into(),
        };
        let mut session = BoardSession::load(&store, "b1").unwrap();

        // Plan order is t2, t1, t3; only the t3 patch fails.
        let event = DragEvent::task("t1", DragLocation::task("todo", 0), Some(DragLocation::task("doing", 0)));
        let result = session.drag(&store, &event, 5);
        assert!(matches!(result, Err(StoreError::TaskNotFound(id)) if id == "t3"));

        let fresh = BoardSession::load(&store, "b1").unwrap();
        assert_eq!(session.model(), fresh.model());
        let model = session.model().unwrap();
        assert_eq!(model.task_ids("todo"), vec!["t2"]);
        assert_eq!(model.task_ids("doing"), vec!["t1", "t3"]);
    }
}
