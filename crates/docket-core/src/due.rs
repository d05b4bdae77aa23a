use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::task::Task;

/// Every incomplete task due at or before `now`, in collection order.
pub fn evaluate_due_tasks(tasks: &[Task], now: DateTime<Utc>) -> Vec<&Task> {
    tasks.iter().filter(|task| task.is_due(now)).collect()
}

/// The single alert raised for one due check. Carries the count only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DueNotice {
    pub count: usize,
    pub checked_at: DateTime<Utc>,
}

impl DueNotice {
    pub fn evaluate(tasks: &[Task], now: DateTime<Utc>) -> Option<Self> {
        let count = evaluate_due_tasks(tasks, now).len();
        (count > 0).then_some(Self {
            count,
            checked_at: now,
        })
    }

    pub fn message(&self) -> String {
        format!("You have {} task(s) due!", self.count)
    }
}
