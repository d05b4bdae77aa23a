use chrono::{DateTime, TimeZone, Utc};
use docket_core::due::{DueNotice, evaluate_due_tasks};
use docket_core::ids::SequentialIds;
use docket_core::input::validate_list_name;
use docket_core::store::TaskStore;
use docket_core::task::{DEFAULT_LIST_ID, Priority, TaskDraft};
use docket_core::view::{SortKey, ViewContext, derive_view};

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0)
        .single()
        .expect("valid date")
}

#[test]
fn store_view_and_due_check_work_together() {
    let mut store = TaskStore::new(Box::new(SequentialIds::default()));
    let work = store.add_list("Work");

    let report = store.add_task(
        TaskDraft::new("Quarterly report", at(2024, 1, 10), &work.id)
            .with_priority(Priority::High)
            .with_description("numbers from finance"),
    );
    store.add_task(TaskDraft::new("Standup notes", at(2024, 1, 3), &work.id));
    let groceries = store.add_task(TaskDraft::new("Groceries", at(2024, 1, 1), DEFAULT_LIST_ID));

    let ctx = ViewContext {
        active_list: work.id.clone(),
        ..ViewContext::default()
    };
    let tasks = store.tasks();
    let titles: Vec<&str> = derive_view(&tasks, &ctx)
        .iter()
        .map(|task| task.title.as_str())
        .collect();
    assert_eq!(titles, ["Standup notes", "Quarterly report"]);

    let ctx = ViewContext {
        search: "FINANCE".to_string(),
        ..ctx
    };
    let found: Vec<&str> = derive_view(&tasks, &ctx)
        .iter()
        .map(|task| task.id.as_str())
        .collect();
    assert_eq!(found, [report.id.as_str()]);

    store.toggle_complete(&groceries.id).expect("toggle groceries");
    let now = at(2024, 1, 5);
    let tasks = store.tasks();
    let due: Vec<&str> = evaluate_due_tasks(&tasks, now)
        .iter()
        .map(|task| task.title.as_str())
        .collect();
    assert_eq!(due, ["Standup notes"]);
    assert_eq!(DueNotice::evaluate(&tasks, now).map(|n| n.count), Some(1));
}

#[test]
fn priority_sort_puts_high_before_medium_on_equal_due() {
    let mut store = TaskStore::new(Box::new(SequentialIds::default()));
    let due = at(2024, 2, 1);
    store.add_task(TaskDraft::new("medium one", due, DEFAULT_LIST_ID).with_priority(Priority::Medium));
    store.add_task(TaskDraft::new("high one", due, DEFAULT_LIST_ID).with_priority(Priority::High));

    let ctx = ViewContext {
        sort_by: SortKey::Priority,
        ..ViewContext::default()
    };
    let tasks = store.tasks();
    let order: Vec<Priority> = derive_view(&tasks, &ctx)
        .iter()
        .map(|task| task.priority)
        .collect();
    assert_eq!(order, [Priority::High, Priority::Medium]);
}

#[test]
fn blank_list_name_never_reaches_store() {
    let mut store = TaskStore::new(Box::new(SequentialIds::default()));
    let before = store.lists();

    if let Ok(name) = validate_list_name("   ") {
        store.add_list(&name);
    }

    assert_eq!(*store.lists(), *before);
}

#[test]
fn tasks_serialize_with_camel_case_keys() {
    let mut store = TaskStore::new(Box::new(SequentialIds::default()));
    let task = store.add_task(TaskDraft::new("Export me", at(2024, 1, 1), DEFAULT_LIST_ID));

    let value = serde_json::to_value(&task).expect("serialize task");
    assert_eq!(value["id"], "1");
    assert_eq!(value["dueDate"], "2024-01-01T00:00:00Z");
    assert_eq!(value["listId"], DEFAULT_LIST_ID);
    assert_eq!(value["priority"], "medium");
    assert_eq!(value["completed"], false);
    assert!(value.get("description").is_none());
}
