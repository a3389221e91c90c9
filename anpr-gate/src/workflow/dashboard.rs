//! Dashboard aggregation
//!
//! Rows are derived from the raw event log on every request. Nothing
//! here is persisted.

use std::collections::{BTreeMap, BTreeSet};

use anpr_common::events::{EntryEvent, ExitEvent};
use anpr_common::{PlateKey, Result};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db;

/// Whether a plate has any recorded entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntryStatus {
    #[serde(rename = "Recorded")]
    Recorded,
    #[serde(rename = "Not Recorded")]
    NotRecorded,
}

/// State of a plate's winning exit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitStatus {
    #[serde(rename = "Not Exited")]
    NotExited,
    #[serde(rename = "Exited")]
    Exited,
    /// Exited without any matching entry on record
    #[serde(rename = "Flagged")]
    Flagged,
}

/// One dashboard row per plate
#[derive(Debug, Clone, Serialize)]
pub struct DashboardRow {
    pub plate_number: PlateKey,
    pub entry_status: EntryStatus,
    pub exit_status: ExitStatus,
    pub exit_time: Option<DateTime<FixedOffset>>,
    /// Shown only for authorized exits. Flagged rows leave it blank and
    /// carry the flag in `exit_status` instead.
    pub authorized_exit: Option<bool>,
}

/// Build dashboard rows from event logs
///
/// One row per plate appearing in either log, sorted ascending by plate
/// key. The winning exit per plate is the latest by timestamp; on equal
/// timestamps the later-loaded event wins.
pub fn build_rows(entries: &[EntryEvent], exits: &[ExitEvent]) -> Vec<DashboardRow> {
    let entry_keys: BTreeSet<&PlateKey> = entries.iter().map(|e| &e.plate_key).collect();

    let mut winning_exits: BTreeMap<&PlateKey, &ExitEvent> = BTreeMap::new();
    for exit in exits {
        match winning_exits.get(&exit.plate_key) {
            Some(current) if exit.timestamp < current.timestamp => {}
            _ => {
                winning_exits.insert(&exit.plate_key, exit);
            }
        }
    }

    let mut all_keys: BTreeSet<&PlateKey> = entry_keys.clone();
    all_keys.extend(winning_exits.keys());

    all_keys
        .into_iter()
        .map(|plate| {
            let entry_status = if entry_keys.contains(plate) {
                EntryStatus::Recorded
            } else {
                EntryStatus::NotRecorded
            };

            let (exit_status, exit_time, authorized_exit) = match winning_exits.get(plate) {
                Some(exit) if exit.authorized => {
                    (ExitStatus::Exited, Some(exit.timestamp), Some(true))
                }
                Some(exit) => (ExitStatus::Flagged, Some(exit.timestamp), None),
                None => (ExitStatus::NotExited, None, None),
            };

            DashboardRow {
                plate_number: plate.clone(),
                entry_status,
                exit_status,
                exit_time,
                authorized_exit,
            }
        })
        .collect()
}

/// Load both event logs and build the dashboard
pub async fn load_dashboard(db: &SqlitePool) -> Result<Vec<DashboardRow>> {
    let entries = db::entries::load_all(db).await?;
    let exits = db::exits::load_all(db).await?;
    Ok(build_rows(&entries, &exits))
}
