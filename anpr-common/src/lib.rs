//! # ANPR Common Library
//!
//! Shared code for the ANPR gate logger:
//! - Plate key normalization
//! - Entry/exit event types
//! - Facility-local timestamps (IST)
//! - Configuration loading
//! - Database initialization

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod plate;
pub mod time;

pub use error::{Error, Result};
pub use plate::PlateKey;
