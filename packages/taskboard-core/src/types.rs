use serde::{Deserialize, Serialize};
use std::fmt;

/// Task priority. Records written by older clients may carry values outside
/// the three known levels; those are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
    Other(String),
}

impl Priority {
    pub fn as_str(&self) -> &str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Other(value) => value,
        }
    }
}

impl From<String> for Priority {
    fn from(value: String) -> Self {
        match value.as_str() {
            "low" => Priority::Low,
            "medium" => Priority::Medium,
            "high" => Priority::High,
            _ => Priority::Other(value),
        }
    }
}

impl From<Priority> for String {
    fn from(value: Priority) -> Self {
        match value {
            Priority::Other(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic classification of a column, independent of its display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Backlog,
    Todo,
    InProgress,
    Done,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub title: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub text_color: String,
}

impl Tag {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            color: String::new(),
            text_color: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "type")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: i64,
}

/// A unit of work as stored. Timestamps are milliseconds since the epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub board_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub estimate_minutes: u64,
    /// Calendar date as entered (`YYYY-MM-DD`); may be unparseable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mentions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checklist: Vec<ChecklistItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub logged_minutes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprint_id: Option<String>,
    /// Rank key within the column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    /// Id of the owning column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            board_id: String::new(),
            title: title.into(),
            description: String::new(),
            priority: Some(Priority::Low),
            estimate_minutes: 0,
            due_date: None,
            assignee: None,
            mentions: Vec::new(),
            tags: Vec::new(),
            checklist: Vec::new(),
            attachments: Vec::new(),
            logged_minutes: 0,
            sprint_id: None,
            order: None,
            created_at: None,
            created_by: None,
            completed_at: None,
            status: None,
        }
    }

    /// Effective rank: `order`, then creation time, then zero.
    pub fn rank(&self) -> f64 {
        self.order
            .or_else(|| self.created_at.map(|ts| ts as f64))
            .unwrap_or(0.0)
    }

    pub fn has_tag(&self, title: &str) -> bool {
        let wanted = title.to_lowercase();
        self.tags.iter().any(|t| t.title.to_lowercase() == wanted)
    }

    /// Add a tag unless one with the same title (ignoring case) exists.
    /// Returns whether the tag was added.
    pub fn add_tag(&mut self, tag: Tag) -> bool {
        if self.has_tag(&tag.title) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    /// Drop tags whose titles repeat an earlier one, ignoring case.
    pub fn dedupe_tags(&mut self) {
        let mut seen: Vec<String> = Vec::with_capacity(self.tags.len());
        self.tags.retain(|tag| {
            let key = tag.title.to_lowercase();
            if seen.contains(&key) {
                false
            } else {
                seen.push(key);
                true
            }
        });
    }
}

/// An ordered bucket of tasks as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: String,
    #[serde(default)]
    pub board_id: String,
    pub name: String,
    /// Zero means unlimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wip_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    /// Doubles as the column rank key; reordering rewrites it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

impl Column {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            board_id: String::new(),
            name: name.into(),
            wip_limit: None,
            stage: None,
            created_at: None,
        }
    }

    pub fn rank(&self) -> i64 {
        self.created_at.unwrap_or(0)
    }

    /// The effective WIP limit, if any. Zero counts as unlimited.
    pub fn effective_wip_limit(&self) -> Option<u32> {
        self.wip_limit.filter(|limit| *limit > 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Owner,
    Editor,
    Viewer,
}

impl MemberRole {
    pub fn can_write(&self) -> bool {
        matches!(self, MemberRole::Owner | MemberRole::Editor)
    }
}

/// A board member, in board member order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub user_id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: MemberRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SprintStatus {
    Planned,
    Active,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sprint {
    pub id: String,
    pub name: String,
    pub status: SprintStatus,
}

/// The sprint currently marked active. A board has at most one; if stored
/// data holds several, the first wins.
pub fn active_sprint_id(sprints: &[Sprint]) -> Option<&str> {
    sprints
        .iter()
        .find(|s| s.status == SprintStatus::Active)
        .map(|s| s.id.as_str())
}

/// The signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_round_trips_unknown_values() {
        let task: Task = serde_json::from_str(r#"{"id":"t1","title":"A","priority":"urgent"}"#).unwrap();
        assert_eq!(task.priority, Some(Priority::Other("urgent".into())));
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["priority"], "urgent");
    }

    #[test]
    fn test_task_rank_fallbacks() {
        let mut task = Task::new("t1", "A");
        assert_eq!(task.rank(), 0.0);
        task.created_at = Some(1_700);
        assert_eq!(task.rank(), 1_700.0);
        task.order = Some(3.0);
        assert_eq!(task.rank(), 3.0);
    }

    #[test]
    fn test_add_tag_is_case_insensitive() {
        let mut task = Task::new("t1", "A");
        assert!(task.add_tag(Tag::new("Bug")));
        assert!(!task.add_tag(Tag::new("bug")));
        assert!(task.add_tag(Tag::new("UI")));
        assert_eq!(task.tags.len(), 2);
    }

    #[test]
    fn test_dedupe_tags_keeps_first() {
        let mut task = Task::new("t1", "A");
        task.tags = vec![Tag::new("Bug"), Tag::new("ui"), Tag::new("BUG")];
        task.dedupe_tags();
        let titles: Vec<_> = task.tags.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Bug", "ui"]);
    }

    #[test]
    fn test_zero_wip_limit_is_unlimited() {
        let mut col = Column::new("c1", "Doing");
        col.wip_limit = Some(0);
        assert_eq!(col.effective_wip_limit(), None);
        col.wip_limit = Some(3);
        assert_eq!(col.effective_wip_limit(), Some(3));
    }

    #[test]
    fn test_active_sprint() {
        let sprints = vec![
            Sprint { id: "s1".into(), name: "One".into(), status: SprintStatus::Completed },
            Sprint { id: "s2".into(), name: "Two".into(), status: SprintStatus::Active },
        ];
        assert_eq!(active_sprint_id(&sprints), Some("s2"));
        assert_eq!(active_sprint_id(&[]), None);
    }
}
