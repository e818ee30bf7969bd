/// Write-back: the persistence writes that make storage agree with a
/// model produced by a drag.
///
/// Rank keys are relabelled in full on every reorder: all columns after a
/// column drag, every task of each affected column after a task drag.
use serde::Serialize;

use crate::board::BoardModel;
pub use crate::patch::{ColumnUpdate, TaskUpdate};
use crate::patch::{ColumnPatch, TaskPatch};
use crate::reorder::{DragEvent, DragKind};
use crate::stage::is_closed_column;
use crate::storage::{ColumnStore, StoreError, TaskStore};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteBackPlan {
    pub columns: Vec<ColumnUpdate>,
    pub tasks: Vec<TaskUpdate>,
}

impl WriteBackPlan {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.tasks.is_empty()
    }

    /// Apply the planned patches to the optimistic model.
    pub fn apply_to(&self, model: &mut BoardModel) {
        for update in &self.columns {
            if let Some(board_column) = model.columns.get_mut(&update.id) {
                update.patch.apply(&mut board_column.column);
            }
        }
        for update in &self.tasks {
            let task = model
                .columns
                .values_mut()
                .flat_map(|c| c.tasks.iter_mut())
                .find(|t| t.id == update.id);
            if let Some(task) = task {
                update.patch.apply(task);
            }
            if update.patch.status.is_some() {
                model.orphans.retain(|id| id != &update.id);
            }
        }
    }
}

/// Compute the writes for a drag that turned `before` into `after`.
pub fn plan_write_back(
    before: &BoardModel,
    after: &BoardModel,
    event: &DragEvent,
    now_ms: i64,
) -> WriteBackPlan {
    match event.kind {
        DragKind::Column => plan_column_ranks(after, now_ms),
        DragKind::Task => plan_task_ranks(before, after, event, now_ms),
    }
}

fn plan_column_ranks(after: &BoardModel, now_ms: i64) -> WriteBackPlan {
    let columns = after
        .columns
        .keys()
        .enumerate()
        .map(|(position, id)| ColumnUpdate {
            id: id.clone(),
            patch: ColumnPatch::rank(now_ms + position as i64),
        })
        .collect();
    WriteBackPlan {
        columns,
        tasks: Vec::new(),
    }
}

fn plan_task_ranks(
    before: &BoardModel,
    after: &BoardModel,
    event: &DragEvent,
    now_ms: i64,
) -> WriteBackPlan {
    let Some(destination) = &event.destination else {
        return WriteBackPlan::default();
    };
    let (Some(from_col), Some(to_col)) = (
        event.source.column_id.as_deref(),
        destination.column_id.as_deref(),
    ) else {
        return WriteBackPlan::default();
    };

    let source_closed = before
        .column(from_col)
        .map(|c| is_closed_column(&c.column))
        .unwrap_or(false);
    let destination_closed = after
        .column(to_col)
        .map(|c| is_closed_column(&c.column))
        .unwrap_or(false);

    let moved_id = event.item_id.clone().or_else(|| {
        after
            .column(to_col)
            .and_then(|c| c.tasks.get(destination.index.min(c.tasks.len().saturating_sub(1))))
            .map(|t| t.id.clone())
    });

    let mut affected = vec![from_col];
    if to_col != from_col {
        affected.push(to_col);
    }

    let mut tasks = Vec::new();
    for col_id in affected {
        let Some(board_column) = after.column(col_id) else {
            continue;
        };
        for (position, task) in board_column.tasks.iter().enumerate() {
            let previous_status = before
                .locate_task(&task.id)
                .map(|(col, _)| col.to_string());
            // Orphans carry a repaired status that storage has not seen yet.
            let status_changed = previous_status.as_deref() != Some(col_id)
                || before.orphans.contains(&task.id);
            let mut patch = TaskPatch {
                order: Some(position as f64),
                status: status_changed.then(|| col_id.to_string()),
                completed_at: None,
            };
            if moved_id.as_deref() == Some(task.id.as_str()) {
                patch.completed_at =
                    completion_change(task.completed_at, source_closed, destination_closed, now_ms);
            }
            tasks.push(TaskUpdate {
                id: task.id.clone(),
                patch,
            });
        }
    }

    WriteBackPlan {
        columns: Vec::new(),
        tasks,
    }
}

/// Entering a closed column stamps completion once; leaving one clears it.
fn completion_change(
    current: Option<i64>,
    source_closed: bool,
    destination_closed: bool,
    now_ms: i64,
) -> Option<Option<i64>> {
    if destination_closed {
        return current.is_none().then_some(Some(now_ms));
    }
    if source_closed && current.is_some() {
        return Some(None);
    }
    None
}

/// Persist a plan: columns first, then tasks, each as one batch. Stops at
/// the first failure and returns it. Whether a failed batch left partial
/// writes depends on the store; callers re-read storage either way.
pub fn commit_plan<S>(store: &S, plan: &WriteBackPlan) -> Result<(), StoreError>
where
    S: ColumnStore + TaskStore + ?Sized,
{
    if !plan.columns.is_empty() {
        store.update_columns(&plan.columns)?;
    }
    let tasks: Vec<TaskUpdate> = plan
        .tasks
        .iter()
        .filter(|update| !update.patch.is_empty())
        .cloned()
        .collect();
    if !tasks.is_empty() {
        store.update_tasks(&tasks)?;
    }
    log::debug!(
        "[taskboard.writeback] Committed {} column and {} task updates",
        plan.columns.len(),
        plan.tasks.len()
    );
    Ok(())
}
