//! Derived, never-persisted views over store state.
//!
//! # Responsibility
//! - Recompute display sequences from current tasks on every call.

pub mod projector;
