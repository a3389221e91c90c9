//! Exit recording workflow

use anpr_common::events::ExitEvent;
use anpr_common::{PlateKey, Result};
use sqlx::SqlitePool;

use crate::db;

/// Record an exit for a recognized plate
///
/// The exit is authorized when any entry event exists for the plate.
/// Unauthorized exits are recorded as well, flagged for review; an exit
/// is never blocked. The existence check and the insert share one
/// transaction.
pub async fn record_exit(
    db: &SqlitePool,
    plate_key: PlateKey,
    raw_plate: String,
) -> Result<ExitEvent> {
    let mut tx = db.begin().await?;

    let authorized = db::entries::exists_for_plate(&mut *tx, &plate_key).await?;
    let event = ExitEvent::new(plate_key, raw_plate, authorized);
    db::exits::insert_exit(&mut *tx, &event).await?;
    tx.commit().await?;

    if authorized {
        tracing::info!(plate = %event.plate_key, guid = %event.guid, "Authorized exit logged");
    } else {
        tracing::warn!(plate = %event.plate_key, guid = %event.guid, "Unauthorized exit logged");
    }

    Ok(event)
}
