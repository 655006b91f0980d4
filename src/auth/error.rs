use thiserror::Error;

/// Failures obtaining an API access token.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("App registration failed: {0}")]
    Registration(String),

    #[error("Token request rejected: {0}")]
    TokenRejected(String),

    #[error("No token source configured: {0}")]
    NotConfigured(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
