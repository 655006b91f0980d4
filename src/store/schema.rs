//! Database schema definitions and migrations.

use rusqlite::Connection;

use super::error::StoreError;

pub const SCHEMA_VERSION: i32 = 1;

const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS folders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id TEXT NOT NULL,
    display_name TEXT NOT NULL,
    thumbnail_url TEXT,
    total_items INTEGER NOT NULL DEFAULT 0,
    location TEXT NOT NULL,
    owner TEXT NOT NULL,
    randomize INTEGER NOT NULL DEFAULT 1
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_folders_identity ON folders(external_id, owner, location);
CREATE INDEX IF NOT EXISTS idx_folders_display_name ON folders(display_name);
"#;

pub(crate) fn get_schema_version(conn: &Connection) -> Result<i32, StoreError> {
    let version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<(), StoreError> {
    conn.pragma_update(None, "user_version", version)?;
    Ok(())
}

/// Initialize or migrate the database schema. Idempotent.
pub(crate) fn migrate(conn: &Connection) -> Result<(), StoreError> {
    let current_version = get_schema_version(conn)?;

    if current_version > SCHEMA_VERSION {
        return Err(StoreError::UnsupportedSchemaVersion {
            found: current_version,
            expected: SCHEMA_VERSION,
        });
    }

    if current_version < SCHEMA_VERSION {
        conn.execute_batch(SCHEMA_V1)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
        tracing::debug!("Initialized folder schema at version {}", SCHEMA_VERSION);
    }

    Ok(())
}
