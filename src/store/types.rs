//! Saved folder records.

use crate::types::StorageLocation;

/// Upstream id meaning "every item the owner has at this location".
pub const ALL_FOLDERS_ID: &str = "all";

/// Minimum length of a user-chosen display name, after trimming.
pub const MIN_DISPLAY_NAME_LEN: usize = 4;

/// Which upstream folder a record points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FolderScope {
    /// The synthetic aggregate of every folder the owner has.
    All,
    /// One upstream folder, by its upstream id.
    Folder(String),
}

impl FolderScope {
    pub fn as_str(&self) -> &str {
        match self {
            Self::All => ALL_FOLDERS_ID,
            Self::Folder(id) => id,
        }
    }

    pub fn from_external_id(id: &str) -> Self {
        if id == ALL_FOLDERS_ID {
            Self::All
        } else {
            Self::Folder(id.to_string())
        }
    }
}

/// A gallery/collection folder tracked locally.
///
/// `id` is assigned by the store on insert and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRecord {
    pub id: Option<i64>,
    pub scope: FolderScope,
    pub display_name: String,
    pub thumbnail_url: Option<String>,
    pub total_items: u32,
    pub location: StorageLocation,
    pub owner: String,
    pub randomize: bool,
}

impl FolderRecord {
    /// A record that has not been saved yet.
    pub fn new_unsaved(
        scope: FolderScope,
        display_name: impl Into<String>,
        location: StorageLocation,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            scope,
            display_name: display_name.into(),
            thumbnail_url: None,
            total_items: 0,
            location,
            owner: owner.into(),
            randomize: true,
        }
    }

    /// Key used to batch upstream listing calls.
    pub fn owner_key(&self) -> (String, StorageLocation) {
        (self.owner.clone(), self.location)
    }
}

/// What reconciliation decided for one saved folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    NoChange,
    Update,
    Delete,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::NoChange => "no change",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

/// A saved folder paired with the action the store should take for it.
/// For `Update` the record already carries the new upstream values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub folder: FolderRecord,
    pub kind: ChangeKind,
}

/// Check a user-supplied display name and return it trimmed.
pub fn validate_display_name(name: &str) -> Result<String, String> {
    let trimmed = name.trim();
    if trimmed.chars().count() < MIN_DISPLAY_NAME_LEN {
        return Err(format!(
            "Folder name must be at least {MIN_DISPLAY_NAME_LEN} characters long"
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_from_external_id() {
        assert_eq!(FolderScope::from_external_id("all"), FolderScope::All);
        assert_eq!(
            FolderScope::from_external_id("ABC-123"),
            FolderScope::Folder("ABC-123".into())
        );
        assert_eq!(FolderScope::All.as_str(), "all");
    }

    #[test]
    fn test_validate_display_name() {
        assert_eq!(validate_display_name("  Landscapes ").unwrap(), "Landscapes");
        assert!(validate_display_name("abc").is_err());
        assert!(validate_display_name("  ab   ").is_err());
        assert_eq!(validate_display_name("abcd").unwrap(), "abcd");
    }

    #[test]
    fn test_new_unsaved_defaults() {
        let f = FolderRecord::new_unsaved(FolderScope::All, "x's gallery", StorageLocation::Gallery, "x");
        assert_eq!(f.id, None);
        assert!(f.randomize);
        assert_eq!(f.owner_key(), ("x".to_string(), StorageLocation::Gallery));
    }
}
