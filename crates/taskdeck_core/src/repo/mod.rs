//! Repository layer: the persistence port and its adapters.
//!
//! # Responsibility
//! - Define the durable key-value contract the engine writes through.
//! - Isolate SQL and JSON encoding from store/directory orchestration.
//!
//! # Invariants
//! - Repository reads report undecodable data as `CorruptState`, never panic.
//! - Missing keys are an explicit absent signal, not an error.

pub mod kv_repo;
pub mod lists_repo;
