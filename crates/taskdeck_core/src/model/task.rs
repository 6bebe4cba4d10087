//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record stored inside named lists.
//! - Own the persisted wire shape (`id`, `text`, `completed`, `priority`).
//!
//! # Invariants
//! - `text` is trimmed and never empty once a `Task` exists.
//! - `id` is positive and stable for the task lifetime.
//! - Deserialization runs the same validation as construction.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Opaque task identifier, unique within its owning list.
///
/// Kept as an integer to match the persisted wire format.
pub type TaskId = i64;

/// Urgency level attached to every task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// All levels, most urgent first.
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    /// Wire/display name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Numeric urgency where a larger value is more urgent.
    pub fn urgency(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_str() == wanted)
            .ok_or_else(|| ValidationError::InvalidPriority(value.to_string()))
    }
}

/// Input validation failures shared by tasks and list names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Task text is blank after trim.
    EmptyText,
    /// List name is blank after trim.
    EmptyListName,
    /// Priority string is not one of `high|medium|low`.
    InvalidPriority(String),
    /// Sort key or direction string is not recognized.
    InvalidSortOption(String),
    /// Task id must be positive.
    InvalidId(TaskId),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyText => write!(f, "task text must not be blank"),
            Self::EmptyListName => write!(f, "list name must not be blank"),
            Self::InvalidPriority(value) => {
                write!(f, "invalid priority `{value}`; expected high|medium|low")
            }
            Self::InvalidSortOption(value) => write!(f, "invalid sort option `{value}`"),
            Self::InvalidId(id) => write!(f, "task id must be positive, got {id}"),
        }
    }
}

impl Error for ValidationError {}

/// One to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TaskRecord")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
    pub priority: Priority,
}

impl Task {
    /// Creates an incomplete task with trimmed text.
    ///
    /// # Errors
    /// - `ValidationError::InvalidId` when `id <= 0`.
    /// - `ValidationError::EmptyText` when `text` trims to empty.
    pub fn new(id: TaskId, text: &str, priority: Priority) -> Result<Self, ValidationError> {
        let task = Self {
            id,
            text: normalize_task_text(text)?,
            completed: false,
            priority,
        };
        task.validate()?;
        Ok(task)
    }

    /// Checks invariants that must hold before persistence.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id <= 0 {
            return Err(ValidationError::InvalidId(self.id));
        }
        if self.text.trim().is_empty() {
            return Err(ValidationError::EmptyText);
        }
        Ok(())
    }
}

/// Trims task text and rejects blank input.
pub fn normalize_task_text(text: &str) -> Result<String, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyText);
    }
    Ok(trimmed.to_string())
}

/// Trims a list name and rejects blank input.
pub fn normalize_list_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyListName);
    }
    Ok(trimmed.to_string())
}

// Early persisted tasks carry no priority, so both flags default.
#[derive(Deserialize)]
struct TaskRecord {
    id: TaskId,
    text: String,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    priority: Priority,
}

impl TryFrom<TaskRecord> for Task {
    type Error = ValidationError;

    fn try_from(record: TaskRecord) -> Result<Self, Self::Error> {
        let task = Self {
            id: record.id,
            text: record.text,
            completed: record.completed,
            priority: record.priority,
        };
        task.validate()?;
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_list_name, Priority, Task, ValidationError};

    #[test]
    fn new_trims_text_and_sets_defaults() {
        let task = Task::new(7, "  Buy milk \n", Priority::default()).unwrap();
        assert_eq!(task.text, "Buy milk");
        assert!(!task.completed);
        assert_eq!(task.priority, Priority::Medium);
    }

    #[test]
    fn new_rejects_blank_text() {
        let err = Task::new(1, "   ", Priority::Low).unwrap_err();
        assert_eq!(err, ValidationError::EmptyText);
    }

    #[test]
    fn priority_parses_case_insensitively() {
        assert_eq!(" HIGH ".parse::<Priority>().unwrap(), Priority::High);
        let err = "urgent".parse::<Priority>().unwrap_err();
        assert_eq!(err, ValidationError::InvalidPriority("urgent".to_string()));
    }

    #[test]
    fn every_priority_parses_from_its_display_name() {
        for priority in Priority::ALL {
            assert_eq!(priority.to_string().parse::<Priority>().unwrap(), priority);
        }
    }

    #[test]
    fn urgency_orders_low_below_high() {
        assert!(Priority::Low.urgency() < Priority::Medium.urgency());
        assert!(Priority::Medium.urgency() < Priority::High.urgency());
    }

    #[test]
    fn list_name_is_trimmed() {
        assert_eq!(normalize_list_name("  Work ").unwrap(), "Work");
        assert_eq!(
            normalize_list_name("\t").unwrap_err(),
            ValidationError::EmptyListName
        );
    }
}
