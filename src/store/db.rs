//! Folder store trait and SQLite implementation.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension};

use super::error::StoreError;
use super::schema;
use super::types::{FolderRecord, FolderScope};
use crate::types::StorageLocation;

/// Persistent storage for saved folders.
///
/// Object-safe so it can be shared as `Arc<dyn FolderStore>`.
#[async_trait]
pub trait FolderStore: Send + Sync {
    /// Insert a new record and return it with its assigned id.
    async fn insert(&self, folder: &FolderRecord) -> Result<FolderRecord, StoreError>;

    /// Overwrite the mutable fields (name, thumbnail, count, randomize) of a saved record.
    async fn update(&self, folder: &FolderRecord) -> Result<(), StoreError>;

    /// Delete by id. Returns false if nothing was deleted.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;

    async fn get_by_id(&self, id: i64) -> Result<FolderRecord, StoreError>;

    /// All saved folders, ordered by display name.
    async fn list_all(&self) -> Result<Vec<FolderRecord>, StoreError>;

    /// The saved record that represents the same upstream folder, if any.
    async fn find_matching(&self, folder: &FolderRecord)
        -> Result<Option<FolderRecord>, StoreError>;
}

const SELECT_COLUMNS: &str =
    "SELECT id, external_id, display_name, thumbnail_url, total_items, location, owner, randomize FROM folders";

pub struct SqliteFolderStore {
    /// rusqlite::Connection is not Sync.
    conn: Mutex<Connection>,
    path: PathBuf,
}

impl std::fmt::Debug for SqliteFolderStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteFolderStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteFolderStore {
    /// Open or create a database at the given path.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let path = path.to_path_buf();
        let path_clone = path.clone();

        let conn = tokio::task::spawn_blocking(move || {
            if let Some(parent) = path_clone.parent() {
                // Open reports the real failure if this does not work.
                let _ = std::fs::create_dir_all(parent);
            }
            let conn = Connection::open(&path_clone).map_err(|e| StoreError::Open {
                path: path_clone.clone(),
                source: e,
            })?;
            conn.pragma_update(None, "journal_mode", "WAL")
                .map_err(StoreError::Migration)?;
            schema::migrate(&conn)?;
            Ok::<_, StoreError>(conn)
        })
        .await??;

        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Open {
            path: PathBuf::from(":memory:"),
            source: e,
        })?;
        schema::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: PathBuf::from(":memory:"),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Query(e.to_string()))
    }
}

fn require_id(folder: &FolderRecord) -> Result<i64, StoreError> {
    folder
        .id
        .ok_or_else(|| StoreError::Unsaved(folder.display_name.clone()))
}

#[async_trait]
impl FolderStore for SqliteFolderStore {
    async fn insert(&self, folder: &FolderRecord) -> Result<FolderRecord, StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO folders (external_id, display_name, thumbnail_url, total_items, location, owner, randomize)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                folder.scope.as_str(),
                &folder.display_name,
                &folder.thumbnail_url,
                folder.total_items,
                folder.location.as_str(),
                &folder.owner,
                folder.randomize,
            ],
        )
        .map_err(StoreError::query)?;

        let mut saved = folder.clone();
        saved.id = Some(conn.last_insert_rowid());
        tracing::debug!(id = ?saved.id, name = %saved.display_name, "Inserted folder");
        Ok(saved)
    }

    async fn update(&self, folder: &FolderRecord) -> Result<(), StoreError> {
        let id = require_id(folder)?;
        let conn = self.lock()?;
        let rows = conn
            .execute(
                "UPDATE folders SET display_name = ?1, thumbnail_url = ?2, total_items = ?3, randomize = ?4 WHERE id = ?5",
                rusqlite::params![
                    &folder.display_name,
                    &folder.thumbnail_url,
                    folder.total_items,
                    folder.randomize,
                    id,
                ],
            )
            .map_err(StoreError::query)?;
        if rows == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let rows = conn
            .execute("DELETE FROM folders WHERE id = ?1", [id])
            .map_err(StoreError::query)?;
        Ok(rows > 0)
    }

    async fn get_by_id(&self, id: i64) -> Result<FolderRecord, StoreError> {
        let conn = self.lock()?;
        conn.query_row(&format!("{SELECT_COLUMNS} WHERE id = ?1"), [id], row_to_folder)
            .optional()
            .map_err(StoreError::query)?
            .ok_or(StoreError::NotFound(id))
    }

    async fn list_all(&self) -> Result<Vec<FolderRecord>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "{SELECT_COLUMNS} ORDER BY display_name COLLATE NOCASE, id"
            ))
            .map_err(StoreError::query)?;
        let folders = stmt
            .query_map([], row_to_folder)
            .map_err(StoreError::query)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::query)?;
        Ok(folders)
    }

    async fn find_matching(
        &self,
        folder: &FolderRecord,
    ) -> Result<Option<FolderRecord>, StoreError> {
        // For the aggregate the external id is always "all", so the same
        // query reduces to matching on owner and location.
        let conn = self.lock()?;
        conn.query_row(
            &format!("{SELECT_COLUMNS} WHERE external_id = ?1 AND owner = ?2 AND location = ?3"),
            rusqlite::params![folder.scope.as_str(), &folder.owner, folder.location.as_str()],
            row_to_folder,
        )
        .optional()
        .map_err(StoreError::query)
    }
}

fn row_to_folder(row: &rusqlite::Row<'_>) -> rusqlite::Result<FolderRecord> {
    let external_id: String = row.get(1)?;
    let location_str: String = row.get(5)?;
    let location = StorageLocation::from_str(&location_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            format!("unknown storage location '{location_str}'").into(),
        )
    })?;

    Ok(FolderRecord {
        id: Some(row.get(0)?),
        scope: FolderScope::from_external_id(&external_id),
        display_name: row.get(2)?,
        thumbnail_url: row.get(3)?,
        total_items: row.get(4)?,
        location,
        owner: row.get(6)?,
        randomize: row.get(7)?,
    })
}
