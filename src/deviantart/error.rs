use thiserror::Error;

use crate::auth::error::AuthError;
use crate::types::StorageLocation;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport failure or an error reported by the upstream API.
    #[error("Connection failure: {0}")]
    Connection(String),

    #[error("User '{username}' does not exist")]
    UserNotFound { username: String },

    #[error("No folder named '{name}' in {username}'s {location}")]
    FolderNotFound {
        name: String,
        username: String,
        location: StorageLocation,
    },

    /// An internal invariant was broken. Indicates a bug, not a network condition.
    #[error("Contract violation: {0}")]
    ContractViolation(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Unexpected response shape: {0}")]
    Json(#[from] serde_json::Error),
}
