//! Engine defaults applied when opening persisted lists.

use serde::Deserialize;

/// Name given to the list seeded into an empty directory.
pub const DEFAULT_LIST_NAME: &str = "My Tasks";

/// Options for [`crate::ListDirectory::open`].
///
/// Deserializable so hosts can embed it in their own settings file; missing
/// fields fall back to [`StoreConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// List created when nothing usable was loaded.
    pub default_list_name: String,
    /// Whether an empty directory gets `default_list_name` on open.
    pub seed_default_list: bool,
    /// Whether the pre-multi-list `tasks` key is imported when present.
    pub import_legacy_tasks: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_list_name: DEFAULT_LIST_NAME.to_string(),
            seed_default_list: true,
            import_legacy_tasks: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{StoreConfig, DEFAULT_LIST_NAME};

    #[test]
    fn partial_settings_keep_defaults() {
        let config: StoreConfig =
            serde_json::from_str(r#"{"seed_default_list":false}"#).unwrap();
        assert!(!config.seed_default_list);
        assert!(config.import_legacy_tasks);
        assert_eq!(config.default_list_name, DEFAULT_LIST_NAME);
    }
}
