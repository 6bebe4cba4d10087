//! Read-only filtered/sorted projection of a task sequence.
//!
//! # Responsibility
//! - Filter tasks by case-insensitive substring match on `text`.
//! - Order the filtered tasks by a chosen key and direction.
//!
//! # Invariants
//! - Projection never mutates or caches store state.
//! - Sorting is stable in both directions: equal keys keep input order.
//! - Direction is applied as a reversal of the base comparator only.

use crate::model::task::{Task, ValidationError};
use icu_collator::{Collator, CollatorOptions, Strength};
use log::warn;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::cmp::Ordering;
use std::str::FromStr;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Sort key for a projection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    /// Insertion order.
    #[default]
    Manual,
    /// Locale collation order, ignoring case.
    Alphabetical,
    /// Urgency order, `low < medium < high`.
    Priority,
}

impl FromStr for SortBy {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "manual" | "none" => Ok(Self::Manual),
            "alphabetical" => Ok(Self::Alphabetical),
            "priority" => Ok(Self::Priority),
            _ => Err(ValidationError::InvalidSortOption(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggle(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }
}

impl FromStr for SortDirection {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            _ => Err(ValidationError::InvalidSortOption(value.to_string())),
        }
    }
}

/// Search text plus ordering for one projection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewQuery {
    pub search: String,
    pub sort_by: SortBy,
    pub direction: SortDirection,
}

impl ViewQuery {
    pub fn new(search: impl Into<String>, sort_by: SortBy, direction: SortDirection) -> Self {
        Self {
            search: search.into(),
            sort_by,
            direction,
        }
    }
}

/// Filters `tasks` by `query` and sorts the survivors.
///
/// An empty `query` keeps every task.
pub fn project<'a>(
    tasks: &'a [Task],
    query: &str,
    sort_by: SortBy,
    direction: SortDirection,
) -> Vec<&'a Task> {
    let matcher = TextMatcher::new(query);
    let filtered = tasks.iter().filter(|task| matcher.matches(&task.text));

    match sort_by {
        SortBy::Manual => filtered.collect(),
        SortBy::Priority => {
            let mut items: Vec<&Task> = filtered.collect();
            items.sort_by(|a, b| {
                direction.apply(a.priority.urgency().cmp(&b.priority.urgency()))
            });
            items
        }
        SortBy::Alphabetical => {
            let collator = text_collator();
            let mut keyed: Vec<(String, &Task)> = filtered
                .map(|task| (collation_key(&task.text), task))
                .collect();
            keyed.sort_by(|(a, _), (b, _)| {
                direction.apply(compare_text(collator.as_ref(), a, b))
            });
            keyed.into_iter().map(|(_, task)| task).collect()
        }
    }
}

/// Same as [`project`] with the options bundled.
pub fn project_view<'a>(tasks: &'a [Task], query: &ViewQuery) -> Vec<&'a Task> {
    project(tasks, &query.search, query.sort_by, query.direction)
}

fn collation_key(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").into_owned()
}

// Secondary strength: accents count, case does not.
fn text_collator() -> Option<Collator> {
    let mut options = CollatorOptions::new();
    options.strength = Some(Strength::Secondary);
    match Collator::try_new(&Default::default(), options) {
        Ok(collator) => Some(collator),
        Err(err) => {
            warn!(
                "event=view_project module=view status=degraded error_code=collator_unavailable error={}",
                err
            );
            None
        }
    }
}

fn compare_text(collator: Option<&Collator>, a: &str, b: &str) -> Ordering {
    match collator {
        Some(collator) => collator.compare(a, b),
        None => a.to_lowercase().cmp(&b.to_lowercase()),
    }
}

enum TextMatcher {
    All,
    Pattern(Regex),
    Folded(String),
}

impl TextMatcher {
    fn new(query: &str) -> Self {
        if query.is_empty() {
            return Self::All;
        }
        match RegexBuilder::new(&regex::escape(query))
            .case_insensitive(true)
            .build()
        {
            Ok(pattern) => Self::Pattern(pattern),
            // Only oversized queries fail to compile.
            Err(_) => Self::Folded(query.to_lowercase()),
        }
    }

    fn matches(&self, text: &str) -> bool {
        match self {
            Self::All => true,
            Self::Pattern(pattern) => pattern.is_match(text),
            Self::Folded(needle) => text.to_lowercase().contains(needle.as_str()),
        }
    }
}
