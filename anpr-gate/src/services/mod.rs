//! Service layer for anpr-gate

pub mod recognition;
