//! Error types for the folder store.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open or create the database file.
    #[error("Failed to open database at {path}: {source}")]
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },

    #[error("Database migration failed: {0}")]
    Migration(#[from] rusqlite::Error),

    #[error("Database query failed: {0}")]
    Query(String),

    #[error("No saved folder with id {0}")]
    NotFound(i64),

    /// Update or delete of a record that was never inserted.
    #[error("Folder '{0}' has not been saved yet")]
    Unsaved(String),

    #[error("Failed to spawn blocking task: {0}")]
    Spawn(#[from] tokio::task::JoinError),

    #[error("Database schema version {found} is newer than supported version {expected}")]
    UnsupportedSchemaVersion { found: i32, expected: i32 },
}

impl StoreError {
    pub fn query(source: rusqlite::Error) -> Self {
        Self::Query(source.to_string())
    }
}
