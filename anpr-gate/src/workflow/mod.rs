//! Gate workflows
//!
//! Entry and exit recording plus dashboard aggregation. Each workflow
//! runs its read-check and write inside a single transaction so a
//! decision is never based on state another request already changed.

pub mod dashboard;
pub mod entry;
pub mod exit;
