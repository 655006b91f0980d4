//! Listing an owner's folders and keeping saved folders in line with them.

pub mod discovery;
pub mod reconcile;

use crate::store::{FolderRecord, FolderScope};
use crate::types::StorageLocation;

pub use discovery::FolderDiscovery;
pub use reconcile::{reconcile, ReconcileReport};

/// A folder as the upstream listing reports it right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderSummary {
    pub scope: FolderScope,
    pub name: String,
    pub thumbnail_url: Option<String>,
    pub total_items: u32,
    pub location: StorageLocation,
    pub owner: String,
}

impl FolderSummary {
    /// An unsaved record for this folder, using its upstream name unless
    /// `display_name` is given.
    pub fn into_record(self, display_name: Option<String>, randomize: bool) -> FolderRecord {
        let mut record = FolderRecord::new_unsaved(
            self.scope,
            display_name.unwrap_or(self.name),
            self.location,
            self.owner,
        );
        record.thumbnail_url = self.thumbnail_url;
        record.total_items = self.total_items;
        record.randomize = randomize;
        record
    }
}

/// One page of an owner's folder listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderPage {
    pub folders: Vec<FolderSummary>,
    pub has_more: bool,
}

/// Default name of the aggregate folder, e.g. "painter's gallery".
pub fn aggregate_name(owner: &str, location: StorageLocation) -> String {
    format!("{owner}'s {location}")
}

/// Fold an owner's folders into the synthetic "all" folder.
///
/// The count is the sum of every folder's count and the thumbnail is the
/// first one available.
pub fn aggregate_all(
    folders: &[FolderSummary],
    location: StorageLocation,
    owner: &str,
) -> FolderSummary {
    FolderSummary {
        scope: FolderScope::All,
        name: aggregate_name(owner, location),
        thumbnail_url: folders.iter().find_map(|f| f.thumbnail_url.clone()),
        total_items: folders.iter().map(|f| f.total_items).sum(),
        location,
        owner: owner.to_string(),
    }
}
