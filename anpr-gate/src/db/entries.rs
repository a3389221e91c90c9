//! Entry event persistence
//!
//! All functions take any SQLite executor so callers can run them
//! against the pool directly or inside a transaction.

use anpr_common::events::EntryEvent;
use anpr_common::{Error, PlateKey, Result};
use chrono::DateTime;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite};
use uuid::Uuid;

/// Save an entry event
pub async fn insert_entry(
    executor: impl sqlx::Executor<'_, Database = Sqlite>,
    event: &EntryEvent,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO entry_events (guid, timestamp, plate_key, raw_plate)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(event.guid.to_string())
    .bind(event.timestamp.to_rfc3339())
    .bind(event.plate_key.as_str())
    .bind(&event.raw_plate)
    .execute(executor)
    .await?;

    Ok(())
}

/// Count entry events recorded for a plate
pub async fn count_for_plate(
    executor: impl sqlx::Executor<'_, Database = Sqlite>,
    plate: &PlateKey,
) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entry_events WHERE plate_key = ?")
        .bind(plate.as_str())
        .fetch_one(executor)
        .await?;
    Ok(count)
}

/// Check whether any entry event exists for a plate
pub async fn exists_for_plate(
    executor: impl sqlx::Executor<'_, Database = Sqlite>,
    plate: &PlateKey,
) -> Result<bool> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM entry_events WHERE plate_key = ?)")
            .bind(plate.as_str())
            .fetch_one(executor)
            .await?;
    Ok(exists)
}

/// Load all entry events in insertion order
pub async fn load_all(
    executor: impl sqlx::Executor<'_, Database = Sqlite>,
) -> Result<Vec<EntryEvent>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, timestamp, plate_key, raw_plate
        FROM entry_events
        ORDER BY rowid
        "#,
    )
    .fetch_all(executor)
    .await?;

    rows.into_iter().map(row_to_event).collect()
}

fn row_to_event(row: SqliteRow) -> Result<EntryEvent> {
    let guid_str: String = row.get("guid");
    let guid = Uuid::parse_str(&guid_str)
        .map_err(|e| Error::Internal(format!("Invalid entry GUID: {}", e)))?;

    let timestamp_str: String = row.get("timestamp");
    let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
        .map_err(|e| Error::Internal(format!("Invalid entry timestamp: {}", e)))?;

    let key_str: String = row.get("plate_key");
    let plate_key = PlateKey::normalize(&key_str)
        .ok_or_else(|| Error::Internal(format!("Invalid plate key in store: {:?}", key_str)))?;

    Ok(EntryEvent {
        guid,
        timestamp,
        plate_key,
        raw_plate: row.get("raw_plate"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;

    async fn setup_test_db() -> SqlitePool {
        // Single connection so every query sees the same in-memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");

        anpr_common::db::init::create_entry_events_table(&pool)
            .await
            .unwrap();

        pool
    }

    fn entry(raw: &str) -> EntryEvent {
        let plate_key = PlateKey::normalize(raw).unwrap();
        EntryEvent::new(plate_key, raw.to_string())
    }

    #[tokio::test]
    async fn test_insert_and_load() {
        let pool = setup_test_db().await;

        let event = entry("od 02 ab 1234");
        insert_entry(&pool, &event).await.unwrap();

        let loaded = load_all(&pool).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].guid, event.guid);
        assert_eq!(loaded[0].plate_key.as_str(), "OD02AB1234");
        assert_eq!(loaded[0].raw_plate, "od 02 ab 1234");
        assert_eq!(loaded[0].timestamp, event.timestamp);
    }

    #[tokio::test]
    async fn test_count_for_plate() {
        let pool = setup_test_db().await;

        let plate = PlateKey::normalize("KA01AB1234").unwrap();
        assert_eq!(count_for_plate(&pool, &plate).await.unwrap(), 0);

        insert_entry(&pool, &entry("KA01AB1234")).await.unwrap();
        insert_entry(&pool, &entry("ka 01 ab 1234")).await.unwrap();
        insert_entry(&pool, &entry("DL8CX4850")).await.unwrap();

        assert_eq!(count_for_plate(&pool, &plate).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_exists_for_plate() {
        let pool = setup_test_db().await;

        let plate = PlateKey::normalize("MH12DE1433").unwrap();
        assert!(!exists_for_plate(&pool, &plate).await.unwrap());

        insert_entry(&pool, &entry("MH 12 DE 1433")).await.unwrap();
        assert!(exists_for_plate(&pool, &plate).await.unwrap());
    }

    #[tokio::test]
    async fn test_load_all_preserves_insertion_order() {
        let pool = setup_test_db().await;

        insert_entry(&pool, &entry("AA00AA0001")).await.unwrap();
        insert_entry(&pool, &entry("BB00BB0002")).await.unwrap();
        insert_entry(&pool, &entry("CC00CC0003")).await.unwrap();

        let loaded = load_all(&pool).await.unwrap();
        let keys: Vec<&str> = loaded.iter().map(|e| e.plate_key.as_str()).collect();
        assert_eq!(keys, vec!["AA00AA0001", "BB00BB0002", "CC00CC0003"]);
    }
}
