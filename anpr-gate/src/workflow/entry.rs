//! Entry recording workflow

use anpr_common::events::EntryEvent;
use anpr_common::{PlateKey, Result};
use sqlx::SqlitePool;

use crate::db;

/// Outcome of an entry attempt
#[derive(Debug, Clone)]
pub enum EntryOutcome {
    /// Entry admitted and recorded
    Logged { event: EntryEvent },
    /// Vehicle is already inside (more entries than exits on record)
    StillInside {
        plate_key: PlateKey,
        entry_count: i64,
        exit_count: i64,
    },
}

/// Record an entry attempt for a recognized plate
///
/// A vehicle is admitted unless it has more recorded entries than exits.
/// Equal counts (including a vehicle never seen before) always admit.
/// The count check and the insert share one transaction.
pub async fn record_entry(
    db: &SqlitePool,
    plate_key: PlateKey,
    raw_plate: String,
) -> Result<EntryOutcome> {
    let mut tx = db.begin().await?;

    let entry_count = db::entries::count_for_plate(&mut *tx, &plate_key).await?;
    let exit_count = db::exits::count_for_plate(&mut *tx, &plate_key).await?;

    if entry_count > exit_count {
        // Dropping the transaction rolls it back; nothing was written.
        tracing::info!(
            plate = %plate_key,
            entry_count,
            exit_count,
            "Entry rejected, vehicle has not exited yet"
        );
        return Ok(EntryOutcome::StillInside {
            plate_key,
            entry_count,
            exit_count,
        });
    }

    let event = EntryEvent::new(plate_key, raw_plate);
    db::entries::insert_entry(&mut *tx, &event).await?;
    tx.commit().await?;

    tracing::info!(
        plate = %event.plate_key,
        guid = %event.guid,
        timestamp = %event.timestamp,
        "Entry logged"
    );

    Ok(EntryOutcome::Logged { event })
}
