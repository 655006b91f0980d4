//! Compare saved folders against the upstream listing.
//!
//! Saved folders are grouped by (owner, location) so each group costs one
//! full listing, whatever its size. Groups are looked up concurrently and
//! fail independently of each other.

use std::collections::HashMap;

use futures_util::future::join_all;
use tracing::{debug, warn};

use super::discovery::FolderDiscovery;
use super::{aggregate_all, FolderSummary};
use crate::deviantart::error::ApiError;
use crate::store::{ChangeKind, ChangeRecord, FolderRecord, FolderScope};
use crate::types::StorageLocation;

/// A group whose listing could not be fetched. Its folders are reported
/// as `NoChange`.
#[derive(Debug)]
pub struct BatchFailure {
    pub owner: String,
    pub location: StorageLocation,
    pub folders: usize,
    pub error: ApiError,
}

#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Exactly one entry per input folder.
    pub changes: Vec<ChangeRecord>,
    pub failures: Vec<BatchFailure>,
}

impl ReconcileReport {
    #[cfg(test)]
    pub fn count(&self, kind: ChangeKind) -> usize {
        self.changes.iter().filter(|c| c.kind == kind).count()
    }
}

/// Group folders by owner key, keeping first-seen order of the keys.
pub fn group_by_owner(
    local: Vec<FolderRecord>,
) -> Vec<((String, StorageLocation), Vec<FolderRecord>)> {
    let mut slots: HashMap<(String, StorageLocation), usize> = HashMap::new();
    let mut groups: Vec<((String, StorageLocation), Vec<FolderRecord>)> = Vec::new();
    for folder in local {
        let key = folder.owner_key();
        match slots.get(&key) {
            Some(&slot) => groups[slot].1.push(folder),
            None => {
                slots.insert(key.clone(), groups.len());
                groups.push((key, vec![folder]));
            }
        }
    }
    groups
}

/// Decide the change for each saved folder of one owner, given that owner's
/// full upstream listing.
pub fn reconcile_batch(local: Vec<FolderRecord>, upstream: &[FolderSummary]) -> Vec<ChangeRecord> {
    let by_id: HashMap<&str, &FolderSummary> =
        upstream.iter().map(|f| (f.scope.as_str(), f)).collect();

    local
        .into_iter()
        .map(|mut folder| {
            let fresh = match &folder.scope {
                FolderScope::All => Some(aggregate_all(upstream, folder.location, &folder.owner)),
                FolderScope::Folder(id) => by_id.get(id.as_str()).map(|f| (*f).clone()),
            };
            let kind = match fresh {
                None => ChangeKind::Delete,
                Some(fresh) => copy_upstream_fields(&mut folder, &fresh),
            };
            ChangeRecord { folder, kind }
        })
        .collect()
}

/// Copy count and thumbnail from upstream if either differs.
fn copy_upstream_fields(folder: &mut FolderRecord, fresh: &FolderSummary) -> ChangeKind {
    if folder.total_items == fresh.total_items && folder.thumbnail_url == fresh.thumbnail_url {
        return ChangeKind::NoChange;
    }
    folder.total_items = fresh.total_items;
    folder.thumbnail_url = fresh.thumbnail_url.clone();
    ChangeKind::Update
}

/// Reconcile every saved folder against upstream.
///
/// A group whose owner no longer exists has all its folders deleted. A group
/// whose listing fails for any other reason is left unchanged and reported
/// in `failures`.
pub async fn reconcile(discovery: &FolderDiscovery<'_>, local: Vec<FolderRecord>) -> ReconcileReport {
    let groups = group_by_owner(local);
    debug!(groups = groups.len(), "Reconciling saved folders");

    let lookups = groups.into_iter().map(|((owner, location), folders)| async move {
        let listing = discovery.fetch_all(location, &owner).await;
        (owner, location, folders, listing)
    });

    let mut report = ReconcileReport::default();
    for (owner, location, folders, listing) in join_all(lookups).await {
        match listing {
            Ok(upstream) => report.changes.extend(reconcile_batch(folders, &upstream)),
            Err(ApiError::UserNotFound { .. }) => {
                warn!(owner = %owner, %location, folders = folders.len(), "Owner no longer exists, removing folders");
                report.changes.extend(folders.into_iter().map(|folder| ChangeRecord {
                    folder,
                    kind: ChangeKind::Delete,
                }));
            }
            Err(error) => {
                warn!(owner = %owner, %location, error = %error, "Could not refresh folders, leaving them unchanged");
                report.failures.push(BatchFailure {
                    owner,
                    location,
                    folders: folders.len(),
                    error,
                });
                report.changes.extend(folders.into_iter().map(|folder| ChangeRecord {
                    folder,
                    kind: ChangeKind::NoChange,
                }));
            }
        }
    }
    report
}
