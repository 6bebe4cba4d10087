//! Persistence adapter for task lists.
//!
//! # Responsibility
//! - Encode/decode typed values to JSON strings under partition keys.
//! - Persist the whole list directory under one key so create/rename/delete
//!   are single writes.
//!
//! # Invariants
//! - A missing key loads as `None`; undecodable data loads as `CorruptState`.
//! - Loaded snapshots hold trimmed, non-blank, distinct list names and unique
//!   task ids per list.
//! - The repository owns no state beyond its key-value handle.

use crate::model::task::{normalize_list_name, Task, TaskId};
use crate::repo::kv_repo::{KeyValueStore, RepoError, RepoResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Key holding the mapping of list name to task array.
pub const TASK_LISTS_KEY: &str = "task-lists";
/// Key holding the selected list name (JSON string or `null`).
pub const CURRENT_LIST_KEY: &str = "current-list";
/// Single-list key written by the first generation of the app.
pub const LEGACY_TASKS_KEY: &str = "tasks";

/// In-memory shape of the persisted directory: list name → ordered tasks.
///
/// Iteration order is the lexicographic order of list names.
pub type ListsSnapshot = BTreeMap<String, Vec<Task>>;

/// Typed persistence facade over a [`KeyValueStore`].
pub struct TaskListsRepository<K: KeyValueStore> {
    kv: K,
}

impl<K: KeyValueStore> TaskListsRepository<K> {
    pub fn new(kv: K) -> Self {
        Self { kv }
    }

    /// Serializes `value` as JSON under `key`.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> RepoResult<()> {
        let encoded = encode(value)?;
        self.kv.set(key, encoded.as_str())
    }

    /// Deserializes the value under `key`.
    ///
    /// Returns `Ok(None)` when the key was never written.
    ///
    /// # Errors
    /// - `RepoError::CorruptState` when the stored text is not valid for `T`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> RepoResult<Option<T>> {
        let Some(raw) = self.kv.get(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|err| RepoError::CorruptState {
                key: key.to_string(),
                message: err.to_string(),
            })
    }

    /// Writes the list mapping only.
    pub fn save_lists(&self, lists: &ListsSnapshot) -> RepoResult<()> {
        self.save(TASK_LISTS_KEY, lists)
    }

    /// Writes the list mapping and current selection as one unit.
    pub fn save_directory(&self, lists: &ListsSnapshot, current: Option<&str>) -> RepoResult<()> {
        let lists_json = encode(lists)?;
        let current_json = encode(&current)?;
        self.kv.set_many(&[
            (TASK_LISTS_KEY, lists_json.as_str()),
            (CURRENT_LIST_KEY, current_json.as_str()),
        ])
    }

    /// Loads and validates the list mapping.
    ///
    /// Names are trimmed the same way user input is; two stored names that
    /// trim to the same list are corrupt.
    pub fn load_lists(&self) -> RepoResult<Option<ListsSnapshot>> {
        let Some(stored) = self.load::<ListsSnapshot>(TASK_LISTS_KEY)? else {
            return Ok(None);
        };
        let mut lists = ListsSnapshot::new();
        for (raw_name, tasks) in stored {
            let name = normalize_list_name(&raw_name)
                .map_err(|_| corrupt(TASK_LISTS_KEY, "blank list name".to_string()))?;
            if let Some(id) = first_duplicate_id(&tasks) {
                return Err(corrupt(
                    TASK_LISTS_KEY,
                    format!("duplicate task id {id} in one list"),
                ));
            }
            if lists.contains_key(&name) {
                return Err(corrupt(
                    TASK_LISTS_KEY,
                    format!("list names collide after trimming: `{name}`"),
                ));
            }
            lists.insert(name, tasks);
        }
        Ok(Some(lists))
    }

    /// Loads the persisted current selection.
    ///
    /// A missing key, a stored `null` and a blank name all load as `None`.
    pub fn load_current(&self) -> RepoResult<Option<String>> {
        Ok(self
            .load::<Option<String>>(CURRENT_LIST_KEY)?
            .flatten()
            .and_then(|name| normalize_list_name(&name).ok()))
    }

    /// Loads the single-list array written before named lists existed.
    pub fn load_legacy_tasks(&self) -> RepoResult<Option<Vec<Task>>> {
        let Some(tasks) = self.load::<Vec<Task>>(LEGACY_TASKS_KEY)? else {
            return Ok(None);
        };
        if let Some(id) = first_duplicate_id(&tasks) {
            return Err(corrupt(
                LEGACY_TASKS_KEY,
                format!("duplicate task id {id} in one list"),
            ));
        }
        Ok(Some(tasks))
    }
}

fn encode<T: Serialize + ?Sized>(value: &T) -> RepoResult<String> {
    serde_json::to_string(value).map_err(|err| RepoError::Encode(err.to_string()))
}

fn corrupt(key: &str, message: String) -> RepoError {
    RepoError::CorruptState {
        key: key.to_string(),
        message,
    }
}

fn first_duplicate_id(tasks: &[Task]) -> Option<TaskId> {
    let mut seen = HashSet::with_capacity(tasks.len());
    tasks.iter().map(|task| task.id).find(|id| !seen.insert(*id))
}

#[cfg(test)]
mod tests {
    use super::{ListsSnapshot, TaskListsRepository, CURRENT_LIST_KEY, TASK_LISTS_KEY};
    use crate::model::task::{Priority, Task};
    use crate::repo::kv_repo::{KeyValueStore, MemoryKeyValueStore, RepoError};

    #[test]
    fn load_missing_key_is_absent_not_error() {
        let repo = TaskListsRepository::new(MemoryKeyValueStore::new());
        assert_eq!(repo.load_lists().unwrap(), None);
        assert_eq!(repo.load_current().unwrap(), None);
    }

    #[test]
    fn save_directory_writes_both_keys() {
        let kv = MemoryKeyValueStore::new();
        let repo = TaskListsRepository::new(&kv);
        let mut lists = ListsSnapshot::new();
        lists.insert(
            "Work".to_string(),
            vec![Task::new(3, "ship", Priority::High).unwrap()],
        );

        repo.save_directory(&lists, Some("Work")).unwrap();

        assert_eq!(repo.load_lists().unwrap(), Some(lists));
        assert_eq!(repo.load_current().unwrap().as_deref(), Some("Work"));
        assert_eq!(kv.get(CURRENT_LIST_KEY).unwrap().as_deref(), Some("\"Work\""));
    }

    #[test]
    fn garbage_reports_corrupt_state() {
        let kv = MemoryKeyValueStore::new();
        kv.set(TASK_LISTS_KEY, "not json").unwrap();
        let repo = TaskListsRepository::new(&kv);

        let err = repo.load_lists().unwrap_err();
        assert!(matches!(err, RepoError::CorruptState { ref key, .. } if key == TASK_LISTS_KEY));
    }

    #[test]
    fn duplicate_ids_in_one_list_report_corrupt_state() {
        let kv = MemoryKeyValueStore::new();
        kv.set(
            TASK_LISTS_KEY,
            r#"{"A":[{"id":1,"text":"x","completed":false,"priority":"low"},
                     {"id":1,"text":"y","completed":false,"priority":"low"}]}"#,
        )
        .unwrap();
        let repo = TaskListsRepository::new(&kv);

        let err = repo.load_lists().unwrap_err();
        assert!(err.to_string().contains("duplicate task id 1"));
    }

    #[test]
    fn same_id_in_different_lists_is_allowed() {
        let kv = MemoryKeyValueStore::new();
        kv.set(
            TASK_LISTS_KEY,
            r#"{"A":[{"id":1,"text":"x","completed":false,"priority":"low"}],
                "B":[{"id":1,"text":"y","completed":true,"priority":"high"}]}"#,
        )
        .unwrap();
        let repo = TaskListsRepository::new(&kv);

        let lists = repo.load_lists().unwrap().unwrap();
        assert_eq!(lists.len(), 2);
    }

    #[test]
    fn stored_names_are_trimmed_on_load() {
        let kv = MemoryKeyValueStore::new();
        kv.set(TASK_LISTS_KEY, r#"{" Work ":[]}"#).unwrap();
        kv.set(CURRENT_LIST_KEY, r#"" Work ""#).unwrap();
        let repo = TaskListsRepository::new(&kv);

        let lists = repo.load_lists().unwrap().unwrap();
        assert_eq!(lists.keys().collect::<Vec<_>>(), vec!["Work"]);
        assert_eq!(repo.load_current().unwrap().as_deref(), Some("Work"));
    }

    #[test]
    fn names_colliding_after_trim_report_corrupt_state() {
        let kv = MemoryKeyValueStore::new();
        kv.set(TASK_LISTS_KEY, r#"{"Work":[]," Work":[]}"#).unwrap();
        let repo = TaskListsRepository::new(&kv);

        let err = repo.load_lists().unwrap_err();
        assert!(err.to_string().contains("collide"));
    }
}
