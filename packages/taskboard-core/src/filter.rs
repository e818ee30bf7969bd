/// Task filters. Pure view state; nothing here is written to a task.
use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::types::{active_sprint_id, Sprint, Task};

/// `all`, or one exact value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Selector {
    #[default]
    All,
    Only(String),
}

impl Selector {
    pub fn only(value: impl Into<String>) -> Self {
        Selector::Only(value.into())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selector::All)
    }

    fn accepts(&self, value: Option<&str>) -> bool {
        match self {
            Selector::All => true,
            Selector::Only(wanted) => value == Some(wanted.as_str()),
        }
    }
}

impl From<String> for Selector {
    fn from(value: String) -> Self {
        if value == "all" {
            Selector::All
        } else {
            Selector::Only(value)
        }
    }
}

impl From<Selector> for String {
    fn from(value: Selector) -> Self {
        match value {
            Selector::All => "all".to_string(),
            Selector::Only(value) => value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DueFilter {
    #[default]
    All,
    Today,
    Week,
    Overdue,
    /// Tasks without a due date.
    #[serde(rename = "none")]
    NoDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SprintFilter {
    #[default]
    All,
    /// Whichever sprint is currently active.
    Active,
    /// Tasks not in any sprint.
    Backlog,
    Sprint(String),
}

impl From<String> for SprintFilter {
    fn from(value: String) -> Self {
        match value.as_str() {
            "all" => SprintFilter::All,
            "active" => SprintFilter::Active,
            "backlog" => SprintFilter::Backlog,
            _ => SprintFilter::Sprint(value),
        }
    }
}

impl From<SprintFilter> for String {
    fn from(value: SprintFilter) -> Self {
        match value {
            SprintFilter::All => "all".to_string(),
            SprintFilter::Active => "active".to_string(),
            SprintFilter::Backlog => "backlog".to_string(),
            SprintFilter::Sprint(id) => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterCriteria {
    pub assignee: Selector,
    pub priority: Selector,
    pub tag: Selector,
    pub due: DueFilter,
    pub sprint: SprintFilter,
    pub search: String,
}

impl FilterCriteria {
    pub fn is_default(&self) -> bool {
        self == &FilterCriteria::default()
    }
}

/// Clock and board state the filters are evaluated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterContext {
    pub today: NaiveDate,
    pub active_sprint: Option<String>,
}

impl FilterContext {
    pub fn new(today: NaiveDate, sprints: &[Sprint]) -> Self {
        Self {
            today,
            active_sprint: active_sprint_id(sprints).map(str::to_string),
        }
    }

    /// Context for the current local day.
    pub fn now(sprints: &[Sprint]) -> Self {
        Self::new(Local::now().date_naive(), sprints)
    }
}

/// Parse a stored due date. Accepts `YYYY-MM-DD`, optionally followed by a
/// time part (`2024-05-01T09:00`), of which only the date counts.
pub fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    let (date, rest) = raw.split_at_checked(10)?;
    if rest.starts_with('T') || rest.starts_with(' ') {
        NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
    } else {
        None
    }
}

fn has_due_date(task: &Task) -> bool {
    task.due_date
        .as_deref()
        .map(|d| !d.trim().is_empty())
        .unwrap_or(false)
}

fn matches_search(task: &Task, query: &str) -> bool {
    let query = query.trim();
    if query.is_empty() {
        return true;
    }
    let mut haystack = format!("{} {}", task.title, task.description);
    for tag in &task.tags {
        haystack.push(' ');
        haystack.push_str(&tag.title);
    }
    haystack.to_lowercase().contains(&query.to_lowercase())
}

fn matches_due(task: &Task, filter: DueFilter, today: NaiveDate) -> bool {
    if filter == DueFilter::All {
        return true;
    }
    if filter == DueFilter::NoDate {
        return !has_due_date(task);
    }
    let Some(due) = task.due_date.as_deref().and_then(parse_due_date) else {
        return false;
    };
    match filter {
        DueFilter::Today => due == today,
        DueFilter::Week => due >= today && due <= today + Duration::days(7),
        DueFilter::Overdue => due < today,
        DueFilter::All | DueFilter::NoDate => true,
    }
}

fn matches_sprint(task: &Task, filter: &SprintFilter, active: Option<&str>) -> bool {
    let sprint = task.sprint_id.as_deref();
    match filter {
        SprintFilter::All => true,
        SprintFilter::Backlog => sprint.is_none(),
        SprintFilter::Active => active.is_some() && sprint == active,
        SprintFilter::Sprint(id) => sprint == Some(id.as_str()),
    }
}

/// A task is visible when it passes every criterion.
pub fn matches(task: &Task, criteria: &FilterCriteria, ctx: &FilterContext) -> bool {
    matches_search(task, &criteria.search)
        && criteria
            .priority
            .accepts(task.priority.as_ref().map(|p| p.as_str()))
        && criteria.assignee.accepts(task.assignee.as_deref())
        && match &criteria.tag {
            Selector::All => true,
            Selector::Only(title) => task.tags.iter().any(|t| &t.title == title),
        }
        && matches_due(task, criteria.due, ctx.today)
        && matches_sprint(task, &criteria.sprint, ctx.active_sprint.as_deref())
}
