//! List directory: the set of named lists and the current selection.
//!
//! # Responsibility
//! - Load persisted lists at startup, recovering from absent or corrupt data.
//! - Create, rename, delete and select lists while keeping the task store
//!   and persisted directory consistent.
//!
//! # Invariants
//! - When the directory is non-empty, `current` names a member of it.
//! - When the directory is empty, `current` is `None`.
//! - Every successful directory mutation writes lists and selection together;
//!   a failed write leaves memory unchanged.

use crate::config::StoreConfig;
use crate::model::task::{normalize_list_name, Task};
use crate::repo::kv_repo::{KeyValueStore, RepoError};
use crate::repo::lists_repo::{ListsSnapshot, TaskListsRepository, LEGACY_TASKS_KEY};
use crate::service::task_store::{StoreError, StoreResult, TaskStore};
use crate::view::projector::{project_view, ViewQuery};
use log::{error, info, warn};

/// Named lists plus the current-list pointer, backed by a [`TaskStore`].
pub struct ListDirectory<K: KeyValueStore> {
    store: TaskStore<K>,
    current: Option<String>,
}

struct Checkpoint {
    lists: ListsSnapshot,
    current: Option<String>,
}

impl<K: KeyValueStore> ListDirectory<K> {
    /// Loads lists and selection from `kv`.
    ///
    /// Absent data starts from the default structure; corrupt data is logged
    /// and replaced by the default structure in memory. Nothing is written
    /// until the first mutation.
    ///
    /// # Errors
    /// - `StoreError::Repo` when the medium itself cannot be read.
    pub fn open(kv: K, config: &StoreConfig) -> StoreResult<Self> {
        let repo = TaskListsRepository::new(kv);

        // Legacy data is only consulted when no directory was ever written.
        let mut lists = match repo.load_lists() {
            Ok(Some(lists)) => lists,
            Ok(None) if config.import_legacy_tasks => import_legacy(&repo, config)?,
            Ok(None) => ListsSnapshot::new(),
            Err(RepoError::CorruptState { key, message }) => {
                log_corrupt(&key, &message);
                ListsSnapshot::new()
            }
            Err(other) => return Err(other.into()),
        };

        if lists.is_empty() && config.seed_default_list {
            if let Ok(name) = normalize_list_name(&config.default_list_name) {
                lists.insert(name, Vec::new());
            }
        }

        let persisted_current = recover_corrupt(repo.load_current())?;
        let current = match persisted_current {
            Some(name) if lists.contains_key(&name) => Some(name),
            _ => lists.keys().next().cloned(),
        };

        info!(
            "event=directory_open module=list_directory status=ok list_count={} task_count={} has_current={}",
            lists.len(),
            lists.values().map(Vec::len).sum::<usize>(),
            current.is_some()
        );

        Ok(Self {
            store: TaskStore::new(repo, lists),
            current,
        })
    }

    /// Registers an empty list and makes it current.
    ///
    /// # Errors
    /// - `InvalidInput` when `name` trims to empty.
    /// - `ListAlreadyExists` on an exact (case-sensitive) match.
    pub fn create_list(&mut self, name: &str) -> StoreResult<String> {
        let name = normalize_list_name(name)?;
        if self.store.contains_list(&name) {
            return Err(StoreError::ListAlreadyExists(name));
        }

        let checkpoint = self.checkpoint();
        self.store.lists_mut().insert(name.clone(), Vec::new());
        self.current = Some(name.clone());
        self.commit("list_create", checkpoint)?;
        Ok(name)
    }

    /// Moves a list's tasks to `new_name`.
    ///
    /// Renaming to the same name is a successful no-op.
    ///
    /// # Errors
    /// - `ListNotFound` when `old_name` is absent.
    /// - `InvalidInput` when `new_name` trims to empty.
    /// - `ListAlreadyExists` when `new_name` is taken by another list.
    pub fn rename_list(&mut self, old_name: &str, new_name: &str) -> StoreResult<String> {
        if !self.store.contains_list(old_name) {
            return Err(StoreError::ListNotFound(old_name.to_string()));
        }
        let new_name = normalize_list_name(new_name)?;
        if new_name == old_name {
            return Ok(new_name);
        }
        if self.store.contains_list(&new_name) {
            return Err(StoreError::ListAlreadyExists(new_name));
        }

        let checkpoint = self.checkpoint();
        let tasks = self
            .store
            .lists_mut()
            .remove(old_name)
            .unwrap_or_default();
        self.store.lists_mut().insert(new_name.clone(), tasks);
        if self.current.as_deref() == Some(old_name) {
            self.current = Some(new_name.clone());
        }
        self.commit("list_rename", checkpoint)?;
        Ok(new_name)
    }

    /// Removes a list and its tasks.
    ///
    /// If it was current, the first remaining list becomes current, or none.
    pub fn delete_list(&mut self, name: &str) -> StoreResult<()> {
        if !self.store.contains_list(name) {
            return Err(StoreError::ListNotFound(name.to_string()));
        }

        let checkpoint = self.checkpoint();
        self.store.lists_mut().remove(name);
        if self.current.as_deref() == Some(name) {
            self.current = self.store.list_names().next().map(str::to_string);
        }
        self.commit("list_delete", checkpoint)
    }

    /// Selects `name` as the current list.
    pub fn set_current_list(&mut self, name: &str) -> StoreResult<()> {
        if !self.store.contains_list(name) {
            return Err(StoreError::ListNotFound(name.to_string()));
        }
        if self.current.as_deref() == Some(name) {
            return Ok(());
        }

        let checkpoint = self.checkpoint();
        self.current = Some(name.to_string());
        self.commit("list_select", checkpoint)
    }

    pub fn current_list(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Returns the current list name or `NoCurrentList`.
    pub fn require_current(&self) -> StoreResult<&str> {
        self.current_list().ok_or(StoreError::NoCurrentList)
    }

    /// Tasks of the current list; empty when nothing is selected.
    pub fn current_tasks(&self) -> &[Task] {
        match self.current_list() {
            Some(name) => self.store.get_tasks(name),
            None => &[],
        }
    }

    /// Projection of the current list.
    pub fn view(&self, query: &ViewQuery) -> Vec<&Task> {
        project_view(self.current_tasks(), query)
    }

    /// List names in iteration order.
    pub fn list_names(&self) -> Vec<String> {
        self.store.list_names().map(str::to_string).collect()
    }

    pub fn contains_list(&self, name: &str) -> bool {
        self.store.contains_list(name)
    }

    pub fn is_empty(&self) -> bool {
        self.store.snapshot().is_empty()
    }

    /// Read access to task sequences.
    pub fn tasks(&self) -> &TaskStore<K> {
        &self.store
    }

    /// Task mutations, scoped by list name.
    pub fn tasks_mut(&mut self) -> &mut TaskStore<K> {
        &mut self.store
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            lists: self.store.snapshot().clone(),
            current: self.current.clone(),
        }
    }

    fn commit(&mut self, event: &'static str, checkpoint: Checkpoint) -> StoreResult<()> {
        let saved = self
            .store
            .repo()
            .save_directory(self.store.snapshot(), self.current.as_deref());
        if let Err(err) = saved {
            error!(
                "event={} module=list_directory status=error error_code=persist_failed error={}",
                event, err
            );
            self.store.restore(checkpoint.lists);
            self.current = checkpoint.current;
            return Err(err.into());
        }

        info!(
            "event={} module=list_directory status=ok list_count={} has_current={}",
            event,
            self.store.snapshot().len(),
            self.current.is_some()
        );
        Ok(())
    }
}

fn recover_corrupt<T>(loaded: Result<Option<T>, RepoError>) -> StoreResult<Option<T>> {
    match loaded {
        Ok(value) => Ok(value),
        Err(RepoError::CorruptState { key, message }) => {
            log_corrupt(&key, &message);
            Ok(None)
        }
        Err(other) => Err(other.into()),
    }
}

fn log_corrupt(key: &str, message: &str) {
    warn!(
        "event=directory_open module=list_directory status=recovered error_code=corrupt_state key={} error={}",
        key, message
    );
}

fn import_legacy<K: KeyValueStore>(
    repo: &TaskListsRepository<K>,
    config: &StoreConfig,
) -> StoreResult<ListsSnapshot> {
    let mut lists = ListsSnapshot::new();
    let Some(tasks) = recover_corrupt(repo.load_legacy_tasks())? else {
        return Ok(lists);
    };
    let Ok(name) = normalize_list_name(&config.default_list_name) else {
        return Ok(lists);
    };

    info!(
        "event=legacy_import module=list_directory status=ok key={} task_count={}",
        LEGACY_TASKS_KEY,
        tasks.len()
    );
    lists.insert(name, tasks);
    Ok(lists)
}
