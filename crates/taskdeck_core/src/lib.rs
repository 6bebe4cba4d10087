//! Task-and-list state engine for TaskDeck.
//! This crate is the single source of truth for list and task invariants;
//! presentation layers hold a `ListDirectory` and call into it.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod view;

pub use config::{StoreConfig, DEFAULT_LIST_NAME};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::task::{Priority, Task, TaskId, ValidationError};
pub use repo::kv_repo::{
    KeyValueStore, MemoryKeyValueStore, RepoError, RepoResult, SqliteKeyValueStore,
};
pub use repo::lists_repo::{
    ListsSnapshot, TaskListsRepository, CURRENT_LIST_KEY, LEGACY_TASKS_KEY, TASK_LISTS_KEY,
};
pub use service::list_directory::ListDirectory;
pub use service::task_store::{ListSummary, StoreError, StoreErrorKind, StoreResult, TaskStore};
pub use view::projector::{project, project_view, SortBy, SortDirection, ViewQuery};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
