//! Task store: the state machine of record for tasks inside named lists.
//!
//! # Responsibility
//! - Own every list's ordered task sequence.
//! - Apply task CRUD and reorder mutations, then persist the list mapping.
//!
//! # Invariants
//! - A mutation is either fully applied and persisted, or not applied at all.
//! - Task ids are unique within a list and strictly increasing on creation.
//! - List keys are only added, renamed or removed through `ListDirectory`.

use crate::model::task::{normalize_task_text, Priority, Task, TaskId, ValidationError};
use crate::repo::kv_repo::{KeyValueStore, RepoError};
use crate::repo::lists_repo::{ListsSnapshot, TaskListsRepository};
use log::{debug, error};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

pub type StoreResult<T> = Result<T, StoreError>;

/// Coarse error category surfaced to presentation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    InvalidInput,
    NotFound,
    AlreadyExists,
    CorruptState,
    InvalidState,
    Storage,
}

impl StoreErrorKind {
    /// Stable snake_case code for logs and UI mapping.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::CorruptState => "corrupt_state",
            Self::InvalidState => "invalid_state",
            Self::Storage => "storage",
        }
    }
}

/// Errors from task store and list directory operations.
#[derive(Debug)]
pub enum StoreError {
    /// Blank text/name or unrecognized enumerated value.
    InvalidInput(ValidationError),
    /// Target list does not exist.
    ListNotFound(String),
    /// Target task does not exist in the given list.
    TaskNotFound { list_name: String, task_id: TaskId },
    /// List name is already taken.
    ListAlreadyExists(String),
    /// Persisted data could not be decoded.
    CorruptState { key: String, message: String },
    /// Operation needs a current list but none is selected.
    NoCurrentList,
    /// No id above the largest issued one is left.
    IdsExhausted { last_id: TaskId },
    /// Storage medium failure.
    Repo(RepoError),
}

impl StoreError {
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            Self::InvalidInput(_) => StoreErrorKind::InvalidInput,
            Self::ListNotFound(_) | Self::TaskNotFound { .. } => StoreErrorKind::NotFound,
            Self::ListAlreadyExists(_) => StoreErrorKind::AlreadyExists,
            Self::CorruptState { .. } => StoreErrorKind::CorruptState,
            Self::NoCurrentList | Self::IdsExhausted { .. } => StoreErrorKind::InvalidState,
            Self::Repo(_) => StoreErrorKind::Storage,
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(err) => write!(f, "{err}"),
            Self::ListNotFound(name) => write!(f, "list not found: `{name}`"),
            Self::TaskNotFound { list_name, task_id } => {
                write!(f, "task {task_id} not found in list `{list_name}`")
            }
            Self::ListAlreadyExists(name) => write!(f, "list already exists: `{name}`"),
            Self::CorruptState { key, message } => {
                write!(f, "corrupt persisted state under `{key}`: {message}")
            }
            Self::NoCurrentList => write!(f, "no current list is selected"),
            Self::IdsExhausted { last_id } => {
                write!(f, "task id space exhausted after {last_id}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidInput(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::InvalidInput(value)
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::CorruptState { key, message } => Self::CorruptState { key, message },
            other => Self::Repo(other),
        }
    }
}

/// Per-list counters for list menus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSummary {
    pub name: String,
    pub total: usize,
    pub completed: usize,
}

/// Issues time-derived ids that never repeat or go backwards.
#[derive(Debug, Clone)]
struct TaskIdAllocator {
    last: TaskId,
}

impl TaskIdAllocator {
    fn seeded_from(lists: &ListsSnapshot) -> Self {
        let last = lists
            .values()
            .flatten()
            .map(|task| task.id)
            .max()
            .unwrap_or(0);
        Self { last }
    }

    /// `None` once `last` is `TaskId::MAX`; never repeats an id.
    fn next(&mut self) -> Option<TaskId> {
        let next = now_epoch_ms().max(self.last.checked_add(1)?);
        self.last = next;
        Some(next)
    }
}

fn now_epoch_ms() -> TaskId {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| TaskId::try_from(elapsed.as_millis()).unwrap_or(TaskId::MAX))
        .unwrap_or(0)
}

/// In-memory task lists with write-through persistence.
pub struct TaskStore<K: KeyValueStore> {
    lists: ListsSnapshot,
    repo: TaskListsRepository<K>,
    ids: TaskIdAllocator,
}

impl<K: KeyValueStore> TaskStore<K> {
    /// Creates a store over already-loaded lists.
    ///
    /// Nothing is written until the first mutation.
    pub fn new(repo: TaskListsRepository<K>, lists: ListsSnapshot) -> Self {
        let ids = TaskIdAllocator::seeded_from(&lists);
        Self { lists, repo, ids }
    }

    /// Appends a new incomplete task to `list_name`.
    ///
    /// # Errors
    /// - `InvalidInput` when `text` trims to empty.
    /// - `ListNotFound` when the list does not exist.
    pub fn add_task(
        &mut self,
        list_name: &str,
        text: &str,
        priority: Priority,
    ) -> StoreResult<Task> {
        let text = normalize_task_text(text)?;
        if !self.lists.contains_key(list_name) {
            return Err(StoreError::ListNotFound(list_name.to_string()));
        }
        let id = self.ids.next().ok_or(StoreError::IdsExhausted {
            last_id: self.ids.last,
        })?;
        let task = Task::new(id, &text, priority)?;
        let created = task.clone();
        self.apply_to_list("task_add", list_name, move |tasks| {
            tasks.push(task);
            Ok(())
        })?;
        Ok(created)
    }

    /// Flips `completed` on one task and returns the new value.
    pub fn toggle_complete(&mut self, list_name: &str, task_id: TaskId) -> StoreResult<bool> {
        self.apply_to_list("task_toggle", list_name, |tasks| {
            let task = find_task_mut(tasks, list_name, task_id)?;
            task.completed = !task.completed;
            Ok(task.completed)
        })
    }

    /// Replaces task text in place, keeping id, completion and priority.
    pub fn update_text(
        &mut self,
        list_name: &str,
        task_id: TaskId,
        new_text: &str,
    ) -> StoreResult<()> {
        let text = normalize_task_text(new_text)?;
        self.apply_to_list("task_update_text", list_name, |tasks| {
            find_task_mut(tasks, list_name, task_id)?.text = text;
            Ok(())
        })
    }

    /// Sets task priority.
    pub fn update_priority(
        &mut self,
        list_name: &str,
        task_id: TaskId,
        priority: Priority,
    ) -> StoreResult<()> {
        self.apply_to_list("task_update_priority", list_name, |tasks| {
            find_task_mut(tasks, list_name, task_id)?.priority = priority;
            Ok(())
        })
    }

    /// Parses `priority` from its wire string, then sets it.
    ///
    /// # Errors
    /// - `InvalidInput` for anything other than `high|medium|low`.
    pub fn update_priority_str(
        &mut self,
        list_name: &str,
        task_id: TaskId,
        priority: &str,
    ) -> StoreResult<()> {
        let priority = priority.parse::<Priority>()?;
        self.update_priority(list_name, task_id, priority)
    }

    /// Removes one task. Unknown list or id is a no-op.
    pub fn delete_task(&mut self, list_name: &str, task_id: TaskId) -> StoreResult<()> {
        let present = self
            .lists
            .get(list_name)
            .is_some_and(|tasks| tasks.iter().any(|task| task.id == task_id));
        if !present {
            debug!("event=task_delete module=task_store status=noop task_id={task_id}");
            return Ok(());
        }
        self.apply_to_list("task_delete", list_name, |tasks| {
            tasks.retain(|task| task.id != task_id);
            Ok(())
        })
    }

    /// Moves one task to `target_index`, clamped to the list bounds.
    pub fn move_task(
        &mut self,
        list_name: &str,
        task_id: TaskId,
        target_index: usize,
    ) -> StoreResult<()> {
        self.apply_to_list("task_move", list_name, |tasks| {
            let from = tasks
                .iter()
                .position(|task| task.id == task_id)
                .ok_or_else(|| task_not_found(list_name, task_id))?;
            let task = tasks.remove(from);
            let to = target_index.min(tasks.len());
            tasks.insert(to, task);
            Ok(())
        })
    }

    /// Deletes all completed tasks and returns how many were removed.
    pub fn clear_completed(&mut self, list_name: &str) -> StoreResult<usize> {
        self.apply_to_list("task_clear_completed", list_name, |tasks| {
            let before = tasks.len();
            tasks.retain(|task| !task.completed);
            Ok(before - tasks.len())
        })
    }

    /// Returns the ordered tasks of a list; empty for unknown lists.
    pub fn get_tasks(&self, list_name: &str) -> &[Task] {
        self.lists
            .get(list_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Looks up one task.
    pub fn get_task(&self, list_name: &str, task_id: TaskId) -> Option<&Task> {
        self.get_tasks(list_name)
            .iter()
            .find(|task| task.id == task_id)
    }

    pub fn contains_list(&self, list_name: &str) -> bool {
        self.lists.contains_key(list_name)
    }

    /// List names in iteration order.
    pub fn list_names(&self) -> impl Iterator<Item = &str> {
        self.lists.keys().map(String::as_str)
    }

    /// Total/completed counters per list, in iteration order.
    pub fn summaries(&self) -> Vec<ListSummary> {
        self.lists
            .iter()
            .map(|(name, tasks)| ListSummary {
                name: name.clone(),
                total: tasks.len(),
                completed: tasks.iter().filter(|task| task.completed).count(),
            })
            .collect()
    }

    pub(crate) fn snapshot(&self) -> &ListsSnapshot {
        &self.lists
    }

    pub(crate) fn lists_mut(&mut self) -> &mut ListsSnapshot {
        &mut self.lists
    }

    pub(crate) fn restore(&mut self, lists: ListsSnapshot) {
        self.lists = lists;
    }

    pub(crate) fn repo(&self) -> &TaskListsRepository<K> {
        &self.repo
    }

    /// Runs `mutate` on one list, persists, and undoes the change on failure.
    fn apply_to_list<T>(
        &mut self,
        event: &'static str,
        list_name: &str,
        mutate: impl FnOnce(&mut Vec<Task>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let tasks = self
            .lists
            .get_mut(list_name)
            .ok_or_else(|| StoreError::ListNotFound(list_name.to_string()))?;
        let previous = tasks.clone();
        let value = match mutate(&mut *tasks) {
            Ok(value) => value,
            Err(err) => {
                *tasks = previous;
                return Err(err);
            }
        };

        if let Err(err) = self.repo.save_lists(&self.lists) {
            error!(
                "event={} module=task_store status=error error_code=persist_failed error={}",
                event, err
            );
            self.lists.insert(list_name.to_string(), previous);
            return Err(err.into());
        }

        debug!(
            "event={} module=task_store status=ok list_len={}",
            event,
            self.get_tasks(list_name).len()
        );
        Ok(value)
    }
}

fn find_task_mut<'a>(
    tasks: &'a mut [Task],
    list_name: &str,
    task_id: TaskId,
) -> StoreResult<&'a mut Task> {
    tasks
        .iter_mut()
        .find(|task| task.id == task_id)
        .ok_or_else(|| task_not_found(list_name, task_id))
}

fn task_not_found(list_name: &str, task_id: TaskId) -> StoreError {
    StoreError::TaskNotFound {
        list_name: list_name.to_string(),
        task_id,
    }
}
