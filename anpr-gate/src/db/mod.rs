//! Database operations for anpr-gate

pub mod entries;
pub mod exits;
