/// Swimlane projection: filters a column's tasks and partitions them into
/// labelled groups. Grouping is a stable partition of the column order.
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::board::{BoardColumn, BoardModel};
use crate::filter::{matches, FilterContext, FilterCriteria};
use crate::types::{Column, Member, Task};

pub const UNASSIGNED_LABEL: &str = "Unassigned";

const PRIORITY_ORDER: [&str; 4] = ["high", "medium", "low", "none"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwimlaneMode {
    #[default]
    None,
    Assignee,
    Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwimlaneGroup<'a> {
    /// Assignee id or priority value; `None` for the single ungrouped lane
    /// and for unassigned tasks.
    pub key: Option<String>,
    pub label: Option<String>,
    pub tasks: Vec<&'a Task>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnView<'a> {
    pub column: &'a Column,
    /// Task count before filtering.
    pub total: usize,
    pub groups: Vec<SwimlaneGroup<'a>>,
}

/// Matching tasks of one column, grouped per `mode`.
pub fn visible_groups<'a>(
    column: &'a BoardColumn,
    criteria: &FilterCriteria,
    mode: SwimlaneMode,
    members: &[Member],
    ctx: &FilterContext,
) -> Vec<SwimlaneGroup<'a>> {
    let visible: Vec<&Task> = column
        .tasks
        .iter()
        .filter(|t| matches(t, criteria, ctx))
        .collect();

    match mode {
        SwimlaneMode::None => vec![SwimlaneGroup {
            key: None,
            label: None,
            tasks: visible,
        }],
        SwimlaneMode::Assignee => group_by_assignee(visible, members),
        SwimlaneMode::Priority => group_by_priority(visible),
    }
}

/// `visible_groups` for every column, in board order.
pub fn visible_board<'a>(
    model: &'a BoardModel,
    criteria: &FilterCriteria,
    mode: SwimlaneMode,
    members: &[Member],
    ctx: &FilterContext,
) -> Vec<ColumnView<'a>> {
    model
        .columns
        .values()
        .map(|board_column| ColumnView {
            column: &board_column.column,
            total: board_column.tasks.len(),
            groups: visible_groups(board_column, criteria, mode, members, ctx),
        })
        .collect()
}

fn group_by_assignee<'a>(tasks: Vec<&'a Task>, members: &[Member]) -> Vec<SwimlaneGroup<'a>> {
    let mut buckets: IndexMap<Option<String>, Vec<&'a Task>> = IndexMap::new();
    for task in tasks {
        // A blank assignee is unassigned.
        let key = task
            .assignee
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string);
        buckets.entry(key).or_default().push(task);
    }

    let mut groups = Vec::with_capacity(buckets.len());
    for member in members {
        if let Some(tasks) = buckets.shift_remove(&Some(member.user_id.clone())) {
            groups.push(SwimlaneGroup {
                key: Some(member.user_id.clone()),
                label: Some(member.display_name.clone()),
                tasks,
            });
        }
    }
    if let Some(tasks) = buckets.shift_remove(&None::<String>) {
        groups.push(SwimlaneGroup {
            key: None,
            label: Some(UNASSIGNED_LABEL.to_string()),
            tasks,
        });
    }
    // Assignees no longer on the board, in order of first appearance.
    for (assignee, tasks) in buckets {
        let id = assignee.unwrap_or_default();
        groups.push(SwimlaneGroup {
            key: Some(id.clone()),
            label: Some(id),
            tasks,
        });
    }
    groups
}

fn priority_label(key: &str) -> String {
    match key {
        "high" => "High".to_string(),
        "medium" => "Medium".to_string(),
        "low" => "Low".to_string(),
        "none" => "None".to_string(),
        other => other.to_string(),
    }
}

fn group_by_priority(tasks: Vec<&Task>) -> Vec<SwimlaneGroup<'_>> {
    let mut buckets: IndexMap<&str, Vec<&Task>> = IndexMap::new();
    for task in tasks {
        let key = task.priority.as_ref().map(|p| p.as_str()).unwrap_or("none");
        buckets.entry(key).or_default().push(task);
    }

    let mut groups = Vec::with_capacity(buckets.len());
    for key in PRIORITY_ORDER {
        if let Some(tasks) = buckets.shift_remove(key) {
            groups.push(SwimlaneGroup {
                key: Some(key.to_string()),
                label: Some(priority_label(key)),
                tasks,
            });
        }
    }
    for (key, tasks) in buckets {
        groups.push(SwimlaneGroup {
            key: Some(key.to_string()),
            label: Some(priority_label(key)),
            tasks,
        });
    }
    groups
}
