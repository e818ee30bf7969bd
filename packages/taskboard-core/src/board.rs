/// Board projection: rebuilds the ordered column → tasks view from
/// unordered column and task records.
///
/// The projection is never the source of truth. It is rebuilt from scratch
/// on every storage snapshot and mutated optimistically during a drag.
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::types::{Column, Task};

/// A column together with its tasks in ascending rank order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardColumn {
    pub column: Column,
    pub tasks: Vec<Task>,
}

/// Column id → column, in display order. Map order is meaningful.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardModel {
    pub columns: IndexMap<String, BoardColumn>,
    /// Tasks whose `status` pointed at no live column and were placed into
    /// the first column while building.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub orphans: Vec<String>,
}

// IndexMap equality ignores order; column order matters here.
impl PartialEq for BoardModel {
    fn eq(&self, other: &Self) -> bool {
        self.columns.len() == other.columns.len()
            && self.columns.iter().eq(other.columns.iter())
            && self.orphans == other.orphans
    }
}

impl BoardModel {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_ids(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }

    pub fn column(&self, column_id: &str) -> Option<&BoardColumn> {
        self.columns.get(column_id)
    }

    pub fn task_ids(&self, column_id: &str) -> Vec<&str> {
        self.columns
            .get(column_id)
            .map(|c| c.tasks.iter().map(|t| t.id.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.columns
            .values()
            .flat_map(|c| c.tasks.iter())
            .find(|t| t.id == task_id)
    }

    /// Column id and index of a task.
    pub fn locate_task(&self, task_id: &str) -> Option<(&str, usize)> {
        self.columns.iter().find_map(|(col_id, col)| {
            col.tasks
                .iter()
                .position(|t| t.id == task_id)
                .map(|idx| (col_id.as_str(), idx))
        })
    }

    pub fn task_count(&self) -> usize {
        self.columns.values().map(|c| c.tasks.len()).sum()
    }

    /// Flatten back into storage records, in board order.
    pub fn into_records(self) -> (Vec<Column>, Vec<Task>) {
        let mut columns = Vec::with_capacity(self.columns.len());
        let mut tasks = Vec::new();
        for (_, board_column) in self.columns {
            columns.push(board_column.column);
            tasks.extend(board_column.tasks);
        }
        (columns, tasks)
    }
}

fn compare_columns(a: &Column, b: &Column) -> Ordering {
    a.rank().cmp(&b.rank()).then_with(|| a.id.cmp(&b.id))
}

fn compare_tasks(a: &Task, b: &Task) -> Ordering {
    a.rank().total_cmp(&b.rank()).then_with(|| a.id.cmp(&b.id))
}

/// Build the projection from unordered records.
///
/// Never fails: tasks with a missing or dangling `status` are moved into
/// the first column (and listed in `orphans`); with no columns at all the
/// result is empty.
pub fn build_board(columns: &[Column], tasks: &[Task]) -> BoardModel {
    let mut sorted: Vec<&Column> = columns.iter().collect();
    sorted.sort_by(|a, b| compare_columns(a, b));

    let mut model = BoardModel::default();
    for column in sorted {
        if model.columns.contains_key(&column.id) {
            log::warn!(
                "[taskboard.board] Duplicate column record {} ignored",
                column.id
            );
            continue;
        }
        model.columns.insert(
            column.id.clone(),
            BoardColumn {
                column: column.clone(),
                tasks: Vec::new(),
            },
        );
    }

    let first_id = match model.columns.keys().next() {
        Some(id) => id.clone(),
        None => {
            if !tasks.is_empty() {
                log::debug!(
                    "[taskboard.board] {} tasks dropped from projection: board has no columns",
                    tasks.len()
                );
            }
            return model;
        }
    };

    for task in tasks {
        let mut task = task.clone();
        task.dedupe_tags();

        let target = match task.status.as_deref() {
            Some(status) if model.columns.contains_key(status) => status.to_string(),
            dangling => {
                log::warn!(
                    "[taskboard.board] Task {} references missing column {:?}, placing in {}",
                    task.id,
                    dangling,
                    first_id
                );
                model.orphans.push(task.id.clone());
                task.status = Some(first_id.clone());
                first_id.clone()
            }
        };

        if let Some(board_column) = model.columns.get_mut(&target) {
            board_column.tasks.push(task);
        }
    }

    for board_column in model.columns.values_mut() {
        board_column.tasks.sort_by(compare_tasks);
    }
    model.orphans.sort();

    model
}
