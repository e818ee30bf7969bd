use serde::Serialize;

use crate::board::BoardModel;
use crate::stage::is_closed_column;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnLoad {
    pub column_id: String,
    pub name: String,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wip_limit: Option<u32>,
    pub closed: bool,
}

impl ColumnLoad {
    pub fn at_limit(&self) -> bool {
        self.wip_limit.is_some_and(|limit| self.count >= limit as usize)
    }
}

/// Completion summary of a board: closed tasks are those sitting in a
/// closed column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardProgress {
    pub total: usize,
    pub closed: usize,
    pub percent: u8,
    pub columns: Vec<ColumnLoad>,
}

impl BoardProgress {
    pub fn from_model(model: &BoardModel) -> Self {
        let columns: Vec<ColumnLoad> = model
            .columns
            .values()
            .map(|c| ColumnLoad {
                column_id: c.column.id.clone(),
                name: c.column.name.clone(),
                count: c.tasks.len(),
                wip_limit: c.column.effective_wip_limit(),
                closed: is_closed_column(&c.column),
            })
            .collect();
        let total: usize = columns.iter().map(|c| c.count).sum();
        let closed: usize = columns.iter().filter(|c| c.closed).map(|c| c.count).sum();
        let percent = if total == 0 {
            0
        } else {
            ((closed * 100) / total) as u8
        };
        Self {
            total,
            closed,
            percent,
            columns,
        }
    }
}
