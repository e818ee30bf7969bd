/// Drag reorder engine.
///
/// `apply_drag` is the pure "apply locally" transform; `drag` adds the WIP
/// guard and the write-back plan. Index semantics are list-splice: remove
/// at the source index, then insert at the destination index of the
/// shortened list.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::BoardModel;
use crate::writeback::{plan_write_back, WriteBackPlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DragKind {
    Column,
    Task,
}

/// One end of a drag. `column_id` is unused for column drags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragLocation {
    #[serde(default, alias = "droppableId", skip_serializing_if = "Option::is_none")]
    pub column_id: Option<String>,
    pub index: usize,
}

impl DragLocation {
    pub fn column(index: usize) -> Self {
        Self {
            column_id: None,
            index,
        }
    }

    pub fn task(column_id: impl Into<String>, index: usize) -> Self {
        Self {
            column_id: Some(column_id.into()),
            index,
        }
    }
}

/// A completed drag gesture. No destination means it was dropped outside
/// any target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragEvent {
    #[serde(rename = "type")]
    pub kind: DragKind,
    pub source: DragLocation,
    #[serde(default)]
    pub destination: Option<DragLocation>,
    #[serde(default, alias = "draggableId", skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
}

impl DragEvent {
    pub fn column(from: usize, to: usize) -> Self {
        Self {
            kind: DragKind::Column,
            source: DragLocation::column(from),
            destination: Some(DragLocation::column(to)),
            item_id: None,
        }
    }

    pub fn task(
        task_id: impl Into<String>,
        source: DragLocation,
        destination: Option<DragLocation>,
    ) -> Self {
        Self {
            kind: DragKind::Task,
            source,
            destination,
            item_id: Some(task_id.into()),
        }
    }

    /// Source and destination column ids of a task drag across columns.
    fn cross_column(&self) -> Option<(&str, &str)> {
        if self.kind != DragKind::Task {
            return None;
        }
        let from = self.source.column_id.as_deref()?;
        let to = self.destination.as_ref()?.column_id.as_deref()?;
        (from != to).then_some((from, to))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum DragRejection {
    #[error("WIP limit reached for column {column_id} ({count}/{limit})")]
    #[serde(rename_all = "camelCase")]
    WipLimitReached {
        column_id: String,
        limit: u32,
        count: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// Cancelled or a no-op; nothing to persist.
    Unchanged,
    Rejected(DragRejection),
    Moved {
        board: BoardModel,
        plan: WriteBackPlan,
    },
}

/// Guard for cross-column task moves into a column at its WIP limit.
pub fn check_wip(model: &BoardModel, event: &DragEvent) -> Result<(), DragRejection> {
    let Some((_, to)) = event.cross_column() else {
        return Ok(());
    };
    let Some(target) = model.column(to) else {
        return Ok(());
    };
    if let Some(limit) = target.column.effective_wip_limit() {
        let count = target.tasks.len();
        if count >= limit as usize {
            return Err(DragRejection::WipLimitReached {
                column_id: to.to_string(),
                limit,
                count,
            });
        }
    }
    Ok(())
}

/// Apply a drag to a copy of the model. Malformed or cancelled drags
/// return the model unchanged.
pub fn apply_drag(model: &BoardModel, event: &DragEvent) -> BoardModel {
    let mut next = model.clone();
    apply_drag_in_place(&mut next, event);
    next
}

/// Returns whether the model changed.
pub fn apply_drag_in_place(model: &mut BoardModel, event: &DragEvent) -> bool {
    let Some(destination) = &event.destination else {
        return false;
    };
    match event.kind {
        DragKind::Column => move_column(model, event.source.index, destination.index),
        DragKind::Task => move_task(model, event, destination),
    }
}

fn move_column(model: &mut BoardModel, from: usize, to: usize) -> bool {
    let len = model.columns.len();
    if from == to || from >= len {
        return false;
    }
    let to = to.min(len - 1);
    if from == to {
        return false;
    }
    model.columns.move_index(from, to);
    true
}

fn move_task(model: &mut BoardModel, event: &DragEvent, destination: &DragLocation) -> bool {
    let (Some(from_col), Some(to_col)) = (
        event.source.column_id.as_deref(),
        destination.column_id.as_deref(),
    ) else {
        return false;
    };
    if !model.columns.contains_key(to_col) {
        return false;
    }
    let Some(source) = model.columns.get_mut(from_col) else {
        return false;
    };

    let from = event.source.index;
    let Some(dragged) = source.tasks.get(from) else {
        return false;
    };
    if let Some(item_id) = &event.item_id {
        if &dragged.id != item_id {
            log::debug!(
                "[taskboard.reorder] Drag of {} does not match task {} at {}[{}]",
                item_id,
                dragged.id,
                from_col,
                from
            );
            return false;
        }
    }

    if from_col == to_col {
        let to = destination.index.min(source.tasks.len() - 1);
        if from == to {
            return false;
        }
        let task = source.tasks.remove(from);
        source.tasks.insert(to, task);
        return true;
    }

    let mut task = source.tasks.remove(from);
    task.status = Some(to_col.to_string());
    let Some(target) = model.columns.get_mut(to_col) else {
        return false;
    };
    let to = destination.index.min(target.tasks.len());
    target.tasks.insert(to, task);
    true
}

/// Apply, guard, and plan the write-back for one gesture.
///
/// Malformed and no-op gestures are `Unchanged` even when they target a
/// full column; only a real move is checked against the WIP limit.
pub fn drag(model: &BoardModel, event: &DragEvent, now_ms: i64) -> DragOutcome {
    let mut next = model.clone();
    if !apply_drag_in_place(&mut next, event) {
        return DragOutcome::Unchanged;
    }
    if let Err(rejection) = check_wip(model, event) {
        log::info!("[taskboard.reorder] Drag rejected: {}", rejection);
        return DragOutcome::Rejected(rejection);
    }
    let plan = plan_write_back(model, &next, event, now_ms);
    plan.apply_to(&mut next);
    DragOutcome::Moved { board: next, plan }
}
