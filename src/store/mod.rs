//! Local storage for saved folders.
//!
//! The API layer never writes here; callers persist the records and change
//! lists it returns through these helpers.

pub mod db;
pub mod error;
pub mod schema;
pub mod types;

pub use db::{FolderStore, SqliteFolderStore};
pub use error::StoreError;
pub use types::{ChangeKind, ChangeRecord, FolderRecord, FolderScope};

/// Counts of what `apply_changes` did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ApplySummary {
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
}

/// Save a folder, merging into an existing record for the same upstream folder.
///
/// - Records with an id are updated as-is.
/// - Otherwise a matching saved record takes the new display name (if one was
///   given), item count, thumbnail and randomize flag.
/// - Otherwise the record is inserted.
pub async fn create_or_update(
    store: &dyn FolderStore,
    folder: &FolderRecord,
) -> Result<FolderRecord, StoreError> {
    if folder.id.is_some() {
        store.update(folder).await?;
        return Ok(folder.clone());
    }

    match store.find_matching(folder).await? {
        Some(mut existing) => {
            if !folder.display_name.trim().is_empty() {
                existing.display_name = folder.display_name.clone();
            }
            existing.total_items = folder.total_items;
            existing.thumbnail_url = folder.thumbnail_url.clone();
            existing.randomize = folder.randomize;
            store.update(&existing).await?;
            tracing::debug!(id = ?existing.id, "Merged into existing saved folder");
            Ok(existing)
        }
        None => store.insert(folder).await,
    }
}

/// Apply a reconcile result to the store.
pub async fn apply_changes(
    store: &dyn FolderStore,
    changes: &[ChangeRecord],
) -> Result<ApplySummary, StoreError> {
    let mut summary = ApplySummary::default();
    for change in changes {
        match change.kind {
            ChangeKind::NoChange => summary.unchanged += 1,
            ChangeKind::Update => {
                store.update(&change.folder).await?;
                summary.updated += 1;
            }
            ChangeKind::Delete => {
                if let Some(id) = change.folder.id {
                    store.delete(id).await?;
                }
                summary.deleted += 1;
            }
        }
    }
    Ok(summary)
}
