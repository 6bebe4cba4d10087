use taskdeck_core::{
    project, project_view, ListDirectory, MemoryKeyValueStore, Priority, SortBy, SortDirection,
    StoreConfig, Task, ViewQuery,
};

fn task(id: i64, text: &str, priority: Priority) -> Task {
    Task::new(id, text, priority).unwrap()
}

fn texts<'a>(tasks: &[&'a Task]) -> Vec<&'a str> {
    tasks.iter().map(|task| task.text.as_str()).collect()
}

fn ids(tasks: &[&Task]) -> Vec<i64> {
    tasks.iter().map(|task| task.id).collect()
}

fn sample() -> Vec<Task> {
    vec![
        task(1, "Pay rent", Priority::Low),
        task(2, "buy milk", Priority::High),
        task(3, "Call mom", Priority::Medium),
        task(4, "Buy bread", Priority::High),
    ]
}

#[test]
fn manual_order_with_empty_query_returns_input_order() {
    let tasks = sample();
    let view = project(&tasks, "", SortBy::Manual, SortDirection::Ascending);
    assert_eq!(ids(&view), vec![1, 2, 3, 4]);

    // Direction does not apply to manual order.
    let view = project(&tasks, "", SortBy::Manual, SortDirection::Descending);
    assert_eq!(ids(&view), vec![1, 2, 3, 4]);
}

#[test]
fn priority_descending_puts_high_first() {
    let tasks = sample();
    let view = project(&tasks, "", SortBy::Priority, SortDirection::Descending);
    let priorities: Vec<Priority> = view.iter().map(|task| task.priority).collect();
    assert_eq!(
        priorities,
        vec![Priority::High, Priority::High, Priority::Medium, Priority::Low]
    );
}

#[test]
fn priority_ascending_puts_low_first() {
    let tasks = sample();
    let view = project(&tasks, "", SortBy::Priority, SortDirection::Ascending);
    assert_eq!(ids(&view), vec![1, 3, 2, 4]);
}

#[test]
fn equal_keys_keep_input_order_in_both_directions() {
    let tasks = sample();
    let descending = project(&tasks, "", SortBy::Priority, SortDirection::Descending);
    assert_eq!(ids(&descending), vec![2, 4, 3, 1]);

    let tasks = vec![
        task(10, "same", Priority::Medium),
        task(11, "Same", Priority::Medium),
        task(12, "SAME", Priority::Medium),
    ];
    let ascending = project(&tasks, "", SortBy::Alphabetical, SortDirection::Ascending);
    assert_eq!(ids(&ascending), vec![10, 11, 12]);
    let descending = project(&tasks, "", SortBy::Alphabetical, SortDirection::Descending);
    assert_eq!(ids(&descending), vec![10, 11, 12]);
}

#[test]
fn filter_then_alphabetical_sort() {
    let tasks = sample();
    let view = project(&tasks, "BUY", SortBy::Alphabetical, SortDirection::Ascending);
    assert_eq!(texts(&view), vec!["Buy bread", "buy milk"]);

    let view = project(&tasks, "buy", SortBy::Alphabetical, SortDirection::Descending);
    assert_eq!(texts(&view), vec!["buy milk", "Buy bread"]);
}

#[test]
fn query_without_matches_yields_empty_view() {
    let tasks = sample();
    let view = project(&tasks, "dentist", SortBy::Priority, SortDirection::Ascending);
    assert!(view.is_empty());
}

#[test]
fn directory_view_projects_current_list_without_mutating_it() {
    let kv = MemoryKeyValueStore::new();
    let mut directory = ListDirectory::open(&kv, &StoreConfig::default()).unwrap();
    let current = directory.require_current().unwrap().to_string();
    for (text, priority) in [
        ("Water plants", Priority::Low),
        ("File taxes", Priority::High),
        ("Book flights", Priority::Medium),
    ] {
        directory
            .tasks_mut()
            .add_task(&current, text, priority)
            .unwrap();
    }
    let before = directory.current_tasks().to_vec();

    let query = ViewQuery::new("", SortBy::Alphabetical, SortDirection::Ascending);
    let view = directory.view(&query);
    assert_eq!(texts(&view), vec!["Book flights", "File taxes", "Water plants"]);

    let same = project_view(directory.current_tasks(), &query);
    assert_eq!(ids(&same), ids(&view));
    assert_eq!(directory.current_tasks(), before.as_slice());
}

#[test]
fn sort_options_parse_from_wire_strings() {
    assert_eq!("priority".parse::<SortBy>().unwrap(), SortBy::Priority);
    assert_eq!("none".parse::<SortBy>().unwrap(), SortBy::Manual);
    assert_eq!("desc".parse::<SortDirection>().unwrap(), SortDirection::Descending);
    assert_eq!(SortDirection::Ascending.toggle(), SortDirection::Descending);
    assert!("sideways".parse::<SortDirection>().is_err());
}
