//! Entry/exit event types
//!
//! Immutable, append-only records of a vehicle crossing the facility
//! boundary. Events relate to each other only through the shared plate key;
//! counts per key drive the workflow rules and the dashboard.

use crate::plate::PlateKey;
use crate::time;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A recorded vehicle entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryEvent {
    pub guid: Uuid,
    /// Facility-local (IST) timestamp, ISO-8601 with offset
    pub timestamp: DateTime<FixedOffset>,
    pub plate_key: PlateKey,
    /// Plate text exactly as the recognition backend returned it
    pub raw_plate: String,
}

impl EntryEvent {
    /// Create a new entry event stamped with the current IST time
    pub fn new(plate_key: PlateKey, raw_plate: String) -> Self {
        Self {
            guid: Uuid::new_v4(),
            timestamp: time::now_ist(),
            plate_key,
            raw_plate,
        }
    }
}

/// A recorded vehicle exit
///
/// Exits are recorded whether or not they are authorized; the flag captures
/// whether a prior entry existed for the plate at the time of exit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitEvent {
    pub guid: Uuid,
    /// Facility-local (IST) timestamp, ISO-8601 with offset
    pub timestamp: DateTime<FixedOffset>,
    pub plate_key: PlateKey,
    /// Plate text exactly as the recognition backend returned it
    pub raw_plate: String,
    /// True iff at least one entry event existed for this plate
    pub authorized: bool,
}

impl ExitEvent {
    /// Create a new exit event stamped with the current IST time
    pub fn new(plate_key: PlateKey, raw_plate: String, authorized: bool) -> Self {
        Self {
            guid: Uuid::new_v4(),
            timestamp: time::now_ist(),
            plate_key,
            raw_plate,
            authorized,
        }
    }
}
