use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::InputError;
use crate::task::{DEFAULT_LIST_ID, Task};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    DueDate,
    Priority,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::DueDate => f.write_str("due"),
            SortKey::Priority => f.write_str("priority"),
        }
    }
}

impl FromStr for SortKey {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "due" | "duedate" | "due_date" => Ok(SortKey::DueDate),
            "priority" | "pri" => Ok(SortKey::Priority),
            _ => Err(InputError::InvalidSortKey(s.to_string())),
        }
    }
}

/// Transient display parameters the view is derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewContext {
    pub active_list: String,
    pub search: String,
    pub show_completed: bool,
    pub sort_by: SortKey,
}

impl Default for ViewContext {
    fn default() -> Self {
        Self {
            active_list: DEFAULT_LIST_ID.to_string(),
            search: String::new(),
            show_completed: true,
            sort_by: SortKey::DueDate,
        }
    }
}

pub fn in_list(task: &Task, list_id: &str) -> bool {
    task.list_id == list_id
}

pub fn passes_completion(task: &Task, show_completed: bool) -> bool {
    show_completed || !task.completed
}

/// Case-insensitive substring match on title or description. An empty
/// term matches every task.
pub fn matches_search(task: &Task, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }

    let needle = term.to_lowercase();
    task.title.to_lowercase().contains(&needle)
        || task
            .description
            .as_deref()
            .is_some_and(|description| description.to_lowercase().contains(&needle))
}

/// Filters `tasks` down to what `ctx` selects and sorts the result.
///
/// Both sort keys use a stable sort, so tasks that compare equal keep the
/// order they have in the collection.
#[tracing::instrument(skip(tasks), fields(total = tasks.len()))]
pub fn derive_view<'a>(tasks: &'a [Task], ctx: &ViewContext) -> Vec<&'a Task> {
    let mut visible: Vec<&Task> = tasks
        .iter()
        .filter(|task| in_list(task, &ctx.active_list))
        .filter(|task| passes_completion(task, ctx.show_completed))
        .filter(|task| matches_search(task, &ctx.search))
        .collect();

    match ctx.sort_by {
        SortKey::DueDate => visible.sort_by_key(|task| task.due_date),
        SortKey::Priority => visible.sort_by_key(|task| task.priority.rank()),
    }

    trace!(visible = visible.len(), "derived view");
    visible
}
