use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
}

impl StoreError {
    pub fn task_not_found(id: &str) -> Self {
        StoreError::NotFound {
            kind: "task",
            id: id.to_string(),
        }
    }
}

/// Rejected boundary input. Nothing that fails here reaches the store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("task title cannot be empty")]
    EmptyTitle,

    #[error("list name cannot be empty")]
    EmptyListName,

    #[error("invalid due date: {0:?}")]
    InvalidDate(String),

    #[error("invalid priority: {0:?} (expected high, medium or low)")]
    InvalidPriority(String),

    #[error("invalid sort key: {0:?} (expected due or priority)")]
    InvalidSortKey(String),

    #[error("unknown list: {0:?}")]
    UnknownList(String),

    #[error("invalid on/off value: {0:?}")]
    InvalidToggle(String),
}
