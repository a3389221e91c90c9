//! Database initialization
//!
//! Opens (or creates) the SQLite event store and brings the schema up
//! idempotently. Both event tables are append-only: workflows insert,
//! nothing updates or deletes.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Single-operator tool: a small pool is plenty
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL keeps dashboard reads from blocking event writes
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    // Set busy timeout
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    // Idempotent schema creation - safe to call multiple times
    create_entry_events_table(&pool).await?;
    create_exit_events_table(&pool).await?;

    Ok(pool)
}

/// Create the entry_events table
pub async fn create_entry_events_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS entry_events (
            guid TEXT PRIMARY KEY,
            timestamp TEXT NOT NULL,
            plate_key TEXT NOT NULL,
            raw_plate TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_entry_events_plate_key ON entry_events(plate_key)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the exit_events table
pub async fn create_exit_events_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS exit_events (
            guid TEXT PRIMARY KEY,
            timestamp TEXT NOT NULL,
            plate_key TEXT NOT NULL,
            raw_plate TEXT NOT NULL,
            authorized INTEGER NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_exit_events_plate_key ON exit_events(plate_key)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_database_creates_file_and_schema() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("anpr.db");

        let pool = init_database(&db_path).await.expect("init should succeed");
        assert!(db_path.exists());

        // Both tables exist and are queryable
        let entries: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entry_events")
            .fetch_one(&pool)
            .await
            .unwrap();
        let exits: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM exit_events")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(entries, 0);
        assert_eq!(exits, 0);
    }

    #[tokio::test]
    async fn test_init_database_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("anpr.db");

        let pool = init_database(&db_path).await.unwrap();
        sqlx::query("INSERT INTO entry_events (guid, timestamp, plate_key, raw_plate) VALUES ('g', 't', 'OD02AB1234', 'raw')")
            .execute(&pool)
            .await
            .unwrap();
        drop(pool);

        // Re-opening must not clobber existing rows
        let pool = init_database(&db_path).await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entry_events")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
