//! Core use-case services.
//!
//! # Responsibility
//! - Apply task and list mutations against in-memory state of record.
//! - Drive persistence through the repository layer after each mutation.
//!
//! # Invariants
//! - Services never expose partially applied state.
//! - Service layer stays storage-agnostic behind `KeyValueStore`.

pub mod list_directory;
pub mod task_store;
