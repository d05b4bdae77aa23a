use chrono::{DateTime, Utc};
use tracing::debug;

use crate::datetime::parse_due;
use crate::error::InputError;
use crate::task::{Priority, Task, TaskDraft, TaskList};

/// Trims a list name and rejects it when nothing is left.
pub fn validate_list_name(raw: &str) -> Result<String, InputError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(InputError::EmptyListName);
    }
    Ok(name.to_string())
}

pub fn parse_on_off(raw: &str) -> Result<bool, InputError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "y" | "yes" | "on" | "true" => Ok(true),
        "0" | "n" | "no" | "off" | "false" => Ok(false),
        _ => Err(InputError::InvalidToggle(raw.to_string())),
    }
}

/// Resolves a list by exact id, falling back to a case-insensitive name.
pub fn find_list<'a>(lists: &'a [TaskList], id_or_name: &str) -> Option<&'a TaskList> {
    let needle = id_or_name.trim();
    lists.iter().find(|list| list.id == needle).or_else(|| {
        let needle = needle.to_lowercase();
        lists.iter().find(|list| list.name.to_lowercase() == needle)
    })
}

fn resolve_list(lists: &[TaskList], raw: &str) -> Result<String, InputError> {
    find_list(lists, raw)
        .map(|list| list.id.clone())
        .ok_or_else(|| InputError::UnknownList(raw.to_string()))
}

fn normalize_description(raw: Option<String>) -> Option<String> {
    raw.map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Raw fields of a new task as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskInput {
    pub title: String,
    pub description: Option<String>,
    pub due: Option<String>,
    pub priority: Option<String>,
    pub list: Option<String>,
}

impl TaskInput {
    /// Validates every field and fills in form defaults: due now, the given
    /// default priority, the first list.
    #[tracing::instrument(skip(self, lists, now))]
    pub fn into_draft(
        self,
        lists: &[TaskList],
        now: DateTime<Utc>,
        default_priority: Priority,
    ) -> Result<TaskDraft, InputError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(InputError::EmptyTitle);
        }

        let due_date = match self.due.as_deref() {
            Some(raw) => parse_due(raw, now)?,
            None => now,
        };

        let priority = match self.priority.as_deref() {
            Some(raw) => raw.parse()?,
            None => default_priority,
        };

        let list_id = match self.list.as_deref() {
            Some(raw) => resolve_list(lists, raw)?,
            None => lists
                .first()
                .map(|list| list.id.clone())
                .ok_or_else(|| InputError::UnknownList(String::new()))?,
        };

        debug!(%list_id, %priority, "validated task input");
        Ok(TaskDraft {
            title,
            description: normalize_description(self.description),
            due_date,
            priority,
            completed: false,
            list_id,
        })
    }
}

/// Edits to an existing task; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due: Option<String>,
    pub priority: Option<String>,
    pub list: Option<String>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self == &TaskPatch::default()
    }

    /// Builds the replacement record. An empty description clears it.
    pub fn apply(
        self,
        task: &Task,
        lists: &[TaskList],
        now: DateTime<Utc>,
    ) -> Result<Task, InputError> {
        let mut next = task.clone();

        if let Some(title) = self.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(InputError::EmptyTitle);
            }
            next.title = title.to_string();
        }
        if let Some(description) = self.description {
            next.description = normalize_description(Some(description));
        }
        if let Some(raw) = self.due.as_deref() {
            next.due_date = parse_due(raw, now)?;
        }
        if let Some(raw) = self.priority.as_deref() {
            next.priority = raw.parse()?;
        }
        if let Some(raw) = self.list.as_deref() {
            next.list_id = resolve_list(lists, raw)?;
        }

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::task::DEFAULT_LIST_ID;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0)
            .single()
            .expect("valid now")
    }

    fn lists() -> Vec<TaskList> {
        vec![
            TaskList::default_list(),
            TaskList {
                id: "42".to_string(),
                name: "Work".to_string(),
            },
        ]
    }

    #[test]
    fn blank_list_names_are_rejected() {
        assert_eq!(validate_list_name("   "), Err(InputError::EmptyListName));
        assert_eq!(validate_list_name(""), Err(InputError::EmptyListName));
        assert_eq!(validate_list_name("  Errands "), Ok("Errands".to_string()));
    }

    #[test]
    fn lists_resolve_by_id_before_name() {
        let mut lists = lists();
        lists.push(TaskList {
            id: "work".to_string(),
            name: "42".to_string(),
        });

        assert_eq!(find_list(&lists, " WORK ").map(|l| l.id.as_str()), Some("42"));
        assert_eq!(find_list(&lists, "42").map(|l| l.name.as_str()), Some("Work"));
        assert_eq!(find_list(&lists, "work").map(|l| l.id.as_str()), Some("work"));
        assert!(find_list(&lists, "Home").is_none());
        assert_eq!(
            resolve_list(&lists, "Home"),
            Err(InputError::UnknownList("Home".to_string()))
        );
    }

    #[test]
    fn draft_uses_form_defaults() {
        let draft = TaskInput {
            title: "  Call mom ".to_string(),
            description: Some("   ".to_string()),
            ..TaskInput::default()
        }
        .into_draft(&lists(), now(), Priority::Medium)
        .expect("valid input");

        assert_eq!(draft.title, "Call mom");
        assert_eq!(draft.description, None);
        assert_eq!(draft.due_date, now());
        assert_eq!(draft.priority, Priority::Medium);
        assert_eq!(draft.list_id, DEFAULT_LIST_ID);
        assert!(!draft.completed);
    }

    #[test]
    fn draft_resolves_explicit_fields() {
        let draft = TaskInput {
            title: "Ship release".to_string(),
            description: Some("tag and publish".to_string()),
            due: Some("2024-05-03".to_string()),
            priority: Some("H".to_string()),
            list: Some("work".to_string()),
        }
        .into_draft(&lists(), now(), Priority::Low)
        .expect("valid input");

        assert_eq!(draft.priority, Priority::High);
        assert_eq!(draft.list_id, "42");
        assert_eq!(draft.description.as_deref(), Some("tag and publish"));
        assert_eq!(draft.due_date.to_rfc3339(), "2024-05-03T00:00:00+00:00");
    }

    #[test]
    fn draft_rejects_bad_fields() {
        let base = TaskInput {
            title: "ok".to_string(),
            ..TaskInput::default()
        };

        let empty = TaskInput {
            title: " ".to_string(),
            ..base.clone()
        };
        assert_eq!(
            empty.into_draft(&lists(), now(), Priority::Medium),
            Err(InputError::EmptyTitle)
        );

        let bad_date = TaskInput {
            due: Some("soonish".to_string()),
            ..base.clone()
        };
        assert_eq!(
            bad_date.into_draft(&lists(), now(), Priority::Medium),
            Err(InputError::InvalidDate("soonish".to_string()))
        );

        let bad_list = TaskInput {
            list: Some("home".to_string()),
            ..base.clone()
        };
        assert_eq!(
            bad_list.into_draft(&lists(), now(), Priority::Medium),
            Err(InputError::UnknownList("home".to_string()))
        );

        let bad_priority = TaskInput {
            priority: Some("urgent".to_string()),
            ..base
        };
        assert_eq!(
            bad_priority.into_draft(&lists(), now(), Priority::Medium),
            Err(InputError::InvalidPriority("urgent".to_string()))
        );
    }

    #[test]
    fn patch_replaces_only_given_fields() {
        let task = Task {
            id: "7".to_string(),
            title: "Draft".to_string(),
            description: Some("notes".to_string()),
            due_date: now(),
            priority: Priority::Low,
            completed: true,
            list_id: DEFAULT_LIST_ID.to_string(),
        };

        let patched = TaskPatch {
            title: Some("Final".to_string()),
            description: Some(String::new()),
            list: Some("42".to_string()),
            ..TaskPatch::default()
        }
        .apply(&task, &lists(), now())
        .expect("valid patch");

        assert_eq!(patched.id, "7");
        assert_eq!(patched.title, "Final");
        assert_eq!(patched.description, None);
        assert_eq!(patched.priority, Priority::Low);
        assert_eq!(patched.list_id, "42");
        assert!(patched.completed);
    }

    #[test]
    fn parses_on_off() {
        assert_eq!(parse_on_off("ON"), Ok(true));
        assert_eq!(parse_on_off("no"), Ok(false));
        assert!(parse_on_off("maybe").is_err());
    }
}
