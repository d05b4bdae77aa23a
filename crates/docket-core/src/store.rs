use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::ids::{IdSource, TimestampIds};
use crate::input;
use crate::task::{Task, TaskDraft, TaskList};

pub type TaskSnapshot = Arc<Vec<Task>>;

/// In-memory owner of all tasks and lists.
///
/// Every mutation builds a fresh collection and swaps it in, so a snapshot
/// handed out earlier never changes underneath its holder. The current task
/// snapshot is also published on a watch channel for background readers.
pub struct TaskStore {
    tasks: watch::Sender<TaskSnapshot>,
    lists: Arc<Vec<TaskList>>,
    ids: Box<dyn IdSource>,
}

impl std::fmt::Debug for TaskStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskStore")
            .field("tasks", &self.tasks.borrow().len())
            .field("lists", &self.lists.len())
            .finish()
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new(Box::new(TimestampIds::default()))
    }
}

impl TaskStore {
    pub fn new(ids: Box<dyn IdSource>) -> Self {
        let (tasks, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            tasks,
            lists: Arc::new(vec![TaskList::default_list()]),
            ids,
        }
    }

    pub fn tasks(&self) -> TaskSnapshot {
        self.tasks.borrow().clone()
    }

    pub fn lists(&self) -> Arc<Vec<TaskList>> {
        Arc::clone(&self.lists)
    }

    /// Receiver that always yields the latest task snapshot.
    pub fn subscribe(&self) -> watch::Receiver<TaskSnapshot> {
        self.tasks.subscribe()
    }

    pub fn find_task(&self, id: &str) -> Option<Task> {
        self.tasks.borrow().iter().find(|task| task.id == id).cloned()
    }

    /// Resolves a list by exact id, falling back to a case-insensitive name.
    pub fn find_list(&self, id_or_name: &str) -> Option<TaskList> {
        input::find_list(&self.lists, id_or_name).cloned()
    }

    #[tracing::instrument(skip(self, draft), fields(list = %draft.list_id))]
    pub fn add_task(&mut self, draft: TaskDraft) -> Task {
        let task = Task::from_draft(self.ids.next_id(), draft);
        let current = self.tasks();
        let mut next = Vec::with_capacity(current.len() + 1);
        next.extend(current.iter().cloned());
        next.push(task.clone());
        self.publish(next);
        info!(id = %task.id, title = %task.title, "added task");
        task
    }

    #[tracing::instrument(skip(self, task), fields(id = %task.id))]
    pub fn update_task(&mut self, task: Task) -> Result<(), StoreError> {
        let current = self.tasks();
        if !current.iter().any(|existing| existing.id == task.id) {
            return Err(StoreError::task_not_found(&task.id));
        }

        let next = current
            .iter()
            .map(|existing| {
                if existing.id == task.id {
                    task.clone()
                } else {
                    existing.clone()
                }
            })
            .collect();
        self.publish(next);
        info!("updated task");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub fn delete_task(&mut self, id: &str) -> Result<Task, StoreError> {
        let current = self.tasks();
        let removed = current
            .iter()
            .find(|task| task.id == id)
            .cloned()
            .ok_or_else(|| StoreError::task_not_found(id))?;

        let next = current.iter().filter(|task| task.id != id).cloned().collect();
        self.publish(next);
        info!(title = %removed.title, "deleted task");
        Ok(removed)
    }

    /// Flips completion on the task and returns the new value.
    #[tracing::instrument(skip(self))]
    pub fn toggle_complete(&mut self, id: &str) -> Result<bool, StoreError> {
        let mut toggled = self
            .find_task(id)
            .ok_or_else(|| StoreError::task_not_found(id))?;
        toggled.completed = !toggled.completed;
        let completed = toggled.completed;
        self.update_task(toggled)?;
        debug!(completed, "toggled completion");
        Ok(completed)
    }

    /// Appends a list. The name must already be validated and trimmed.
    #[tracing::instrument(skip(self))]
    pub fn add_list(&mut self, name: &str) -> TaskList {
        let list = TaskList {
            id: self.ids.next_id(),
            name: name.to_string(),
        };
        let mut next = Vec::with_capacity(self.lists.len() + 1);
        next.extend(self.lists.iter().cloned());
        next.push(list.clone());
        self.lists = Arc::new(next);
        info!(id = %list.id, "added list");
        list
    }

    fn publish(&self, next: Vec<Task>) {
        debug!(count = next.len(), "publishing task snapshot");
        self.tasks.send_replace(Arc::new(next));
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::ids::SequentialIds;
    use crate::task::{DEFAULT_LIST_ID, Priority};

    fn store() -> TaskStore {
        TaskStore::new(Box::new(SequentialIds::default()))
    }

    fn draft(title: &str) -> TaskDraft {
        let due = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .expect("valid due");
        TaskDraft::new(title, due, DEFAULT_LIST_ID)
    }

    #[test]
    fn starts_with_default_list() {
        let store = store();
        let lists = store.lists();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].id, DEFAULT_LIST_ID);
        assert!(store.tasks().is_empty());
    }

    #[test]
    fn add_then_delete_restores_collection() {
        let mut store = store();
        store.add_task(draft("keep"));
        let before = store.tasks();

        let added = store.add_task(draft("temporary"));
        assert_eq!(store.tasks().len(), 2);

        let removed = store.delete_task(&added.id).expect("delete added task");
        assert_eq!(removed, added);
        assert_eq!(*store.tasks(), *before);
    }

    #[test]
    fn toggle_twice_restores_completion() {
        let mut store = store();
        let task = store.add_task(draft("flip"));

        assert!(store.toggle_complete(&task.id).expect("first toggle"));
        assert!(!store.toggle_complete(&task.id).expect("second toggle"));
        assert_eq!(store.find_task(&task.id).expect("task exists"), task);
    }

    #[test]
    fn old_snapshots_are_unaffected_by_mutation() {
        let mut store = store();
        let task = store.add_task(draft("original"));
        let snapshot = store.tasks();

        let mut edited = task.clone();
        edited.title = "edited".to_string();
        edited.priority = Priority::High;
        store.update_task(edited).expect("update existing");

        assert_eq!(snapshot[0].title, "original");
        assert_eq!(store.tasks()[0].title, "edited");
    }

    #[test]
    fn unknown_ids_report_not_found_and_leave_state() {
        let mut store = store();
        let task = store.add_task(draft("only"));
        let before = store.tasks();

        let mut ghost = task.clone();
        ghost.id = "missing".to_string();
        assert_eq!(
            store.update_task(ghost),
            Err(StoreError::task_not_found("missing"))
        );
        assert!(store.delete_task("missing").is_err());
        assert!(store.toggle_complete("missing").is_err());
        assert_eq!(*store.tasks(), *before);
    }

    #[test]
    fn subscribers_see_latest_snapshot() {
        let mut store = store();
        let rx = store.subscribe();
        store.add_task(draft("one"));
        store.add_task(draft("two"));
        assert_eq!(rx.borrow().len(), 2);
    }

    #[test]
    fn find_list_by_id_or_name() {
        let mut store = store();
        let work = store.add_list("Work");
        assert_eq!(store.find_list(&work.id), Some(work.clone()));
        assert_eq!(store.find_list("work"), Some(work));
        assert_eq!(store.find_list("nope"), None);
    }
}
