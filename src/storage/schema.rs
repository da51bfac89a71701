use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn apply(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS scheduled_notifications (
            id TEXT PRIMARY KEY,
            fire_at INTEGER NOT NULL,
            title TEXT NOT NULL,
            body TEXT NOT NULL,
            sound INTEGER NOT NULL DEFAULT 1,
            created_at INTEGER NOT NULL,
            delivered_at INTEGER
        );

        CREATE INDEX IF NOT EXISTS scheduled_notifications_pending
            ON scheduled_notifications (fire_at)
            WHERE delivered_at IS NULL;
        "#,
    )
    .context("applying schema migrations")?;
    Ok(())
}
