//! Access tokens for the upstream API.
//!
//! One `TokenCache` is built at startup and shared by every request. Token
//! fetches are single-flight: the first caller fetches while everyone else
//! waits on the same lock and then reads the cached value.

pub mod error;
pub mod responses;
pub mod source;

use std::sync::Arc;

use tokio::sync::Mutex;

use self::error::AuthError;
use self::source::TokenSource;
use crate::http::HttpJsonClient;

#[async_trait::async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn get_token(&self) -> Result<String, AuthError>;
}

pub struct TokenCache {
    source: Box<dyn TokenSource>,
    http: Arc<dyn HttpJsonClient>,
    token: Mutex<Option<String>>,
}

impl std::fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCache")
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl TokenCache {
    pub fn new(source: Box<dyn TokenSource>, http: Arc<dyn HttpJsonClient>) -> Self {
        Self {
            source,
            http,
            token: Mutex::new(None),
        }
    }
}

#[async_trait::async_trait]
impl AccessTokenProvider for TokenCache {
    async fn get_token(&self) -> Result<String, AuthError> {
        // The guard is held across the fetch; that is what makes it single-flight.
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }

        tracing::debug!("Fetching a new access token");
        let token = self.source.fetch_token(self.http.as_ref()).await?;
        *cached = Some(token.clone());
        Ok(token)
    }
}
