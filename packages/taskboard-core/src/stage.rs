/// Closed-column detection.
///
/// A column is closed when its stage is `done`. Columns without a stage
/// fall back to their display name.
use regex::Regex;
use std::sync::OnceLock;

use crate::types::{Column, Stage};

fn closed_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(done|closed|complete|completed|finish|selesai)\s*$")
            .expect("valid closed column regex")
    })
}

/// Whether a display name alone marks a column as closed.
pub fn is_closed_name(name: &str) -> bool {
    closed_name_regex().is_match(name)
}

pub fn is_closed_column(column: &Column) -> bool {
    match column.stage {
        Some(stage) => stage == Stage::Done,
        None => is_closed_name(&column.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_name_without_stage_is_closed() {
        assert!(is_closed_column(&Column::new("c1", "Completed")));
        assert!(is_closed_column(&Column::new("c1", "completed")));
        assert!(is_closed_column(&Column::new("c1", "SELESAI")));
    }

    #[test]
    fn test_todo_name_is_open() {
        assert!(!is_closed_column(&Column::new("c1", "To Do")));
        assert!(!is_closed_column(&Column::new("c1", "Done soon")));
    }

    #[test]
    fn test_stage_overrides_name() {
        let mut col = Column::new("c1", "Done");
        col.stage = Some(Stage::InProgress);
        assert!(!is_closed_column(&col));

        let mut col = Column::new("c2", "Shipped");
        col.stage = Some(Stage::Done);
        assert!(is_closed_column(&col));
    }
}
