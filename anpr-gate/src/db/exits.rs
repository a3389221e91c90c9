//! Exit event persistence

use anpr_common::events::ExitEvent;
use anpr_common::{Error, PlateKey, Result};
use chrono::DateTime;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite};
use uuid::Uuid;

/// Save an exit event
///
/// Unauthorized exits are stored too, with `authorized` cleared.
pub async fn insert_exit(
    executor: impl sqlx::Executor<'_, Database = Sqlite>,
    event: &ExitEvent,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO exit_events (guid, timestamp, plate_key, raw_plate, authorized)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(event.guid.to_string())
    .bind(event.timestamp.to_rfc3339())
    .bind(event.plate_key.as_str())
    .bind(&event.raw_plate)
    .bind(event.authorized)
    .execute(executor)
    .await?;

    Ok(())
}

/// Count exit events recorded for a plate
pub async fn count_for_plate(
    executor: impl sqlx::Executor<'_, Database = Sqlite>,
    plate: &PlateKey,
) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM exit_events WHERE plate_key = ?")
        .bind(plate.as_str())
        .fetch_one(executor)
        .await?;
    Ok(count)
}

/// Load all exit events in insertion order
pub async fn load_all(
    executor: impl sqlx::Executor<'_, Database = Sqlite>,
) -> Result<Vec<ExitEvent>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, timestamp, plate_key, raw_plate, authorized
        FROM exit_events
        ORDER BY rowid
        "#,
    )
    .fetch_all(executor)
    .await?;

    rows.into_iter().map(row_to_event).collect()
}

fn row_to_event(row: SqliteRow) -> Result<ExitEvent> {
    let guid_str: String = row.get("guid");
    let guid = Uuid::parse_str(&guid_str)
        .map_err(|e| Error::Internal(format!("Invalid exit GUID: {}", e)))?;

    let timestamp_str: String = row.get("timestamp");
    let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
        .map_err(|e| Error::Internal(format!("Invalid exit timestamp: {}", e)))?;

    let key_str: String = row.get("plate_key");
    let plate_key = PlateKey::normalize(&key_str)
        .ok_or_else(|| Error::Internal(format!("Invalid plate key in store: {:?}", key_str)))?;

    Ok(ExitEvent {
        guid,
        timestamp,
        plate_key,
        raw_plate: row.get("raw_plate"),
        authorized: row.get("authorized"),
    })
}
