//! Domain model for tasks and named lists.
//!
//! # Responsibility
//! - Define canonical data structures used by the store and directory.
//! - Keep validation next to the types it protects.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`.
//! - A `Task` value never holds blank text.

pub mod task;
