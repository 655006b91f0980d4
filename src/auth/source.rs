//! Ways of obtaining a fresh access token. The cache in `auth` decides when.

use std::path::PathBuf;

use tokio::fs;

use super::error::AuthError;
use super::responses::{RegisterResponse, TokenResponse};
use crate::http::HttpJsonClient;

/// Error text the token server returns for an app id it no longer knows.
const ACCESS_DENIED: &str = "Access Denied";

#[async_trait::async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch_token(&self, http: &dyn HttpJsonClient) -> Result<String, AuthError>;
}

/// A token supplied up front. Never refreshed.
pub struct StaticToken(pub String);

#[async_trait::async_trait]
impl TokenSource for StaticToken {
    async fn fetch_token(&self, _http: &dyn HttpJsonClient) -> Result<String, AuthError> {
        Ok(self.0.clone())
    }
}

/// OAuth2 client-credentials grant against the platform's token endpoint.
pub struct ClientCredentials {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[async_trait::async_trait]
impl TokenSource for ClientCredentials {
    async fn fetch_token(&self, http: &dyn HttpJsonClient) -> Result<String, AuthError> {
        let body = http
            .post_json(
                &self.token_url,
                &[
                    ("grant_type", "client_credentials"),
                    ("client_id", &self.client_id),
                    ("client_secret", &self.client_secret),
                ],
            )
            .await;
        let resp: TokenResponse = serde_json::from_value(body)
            .map_err(|e| AuthError::TokenRejected(e.to_string()))?;
        match resp.access_token {
            Some(token) => Ok(token),
            None => Err(AuthError::TokenRejected(resp.failure_reason())),
        }
    }
}

/// Token server flow: register once to get an app id (persisted on disk),
/// then trade the app id for an access token.
#[derive(Debug)]
pub struct RegisteredApp {
    server: String,
    app_id_path: PathBuf,
}

impl RegisteredApp {
    pub fn new(server: impl Into<String>, data_dir: &std::path::Path) -> Self {
        Self {
            server: server.into().trim_end_matches('/').to_string(),
            app_id_path: data_dir.join("app_id"),
        }
    }

    async fn stored_app_id(&self) -> Option<String> {
        let contents = fs::read_to_string(&self.app_id_path).await.ok()?;
        let trimmed = contents.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    async fn register(&self, http: &dyn HttpJsonClient) -> Result<String, AuthError> {
        let body = http.get_json(&format!("{}/register", self.server)).await;
        let resp: RegisterResponse = serde_json::from_value(body.clone())
            .map_err(|e| AuthError::Registration(e.to_string()))?;
        let Some(app_id) = resp.app_id else {
            let reason = body["error_description"]
                .as_str()
                .or_else(|| body["error"].as_str())
                .unwrap_or("response carried no appID");
            return Err(AuthError::Registration(reason.to_string()));
        };

        if let Some(parent) = self.app_id_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.app_id_path, &app_id).await?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.app_id_path, perms)?;
        }
        tracing::debug!("Registered with token server, app id saved");
        Ok(app_id)
    }

    async fn request_token(
        &self,
        http: &dyn HttpJsonClient,
        app_id: &str,
    ) -> Result<TokenResponse, AuthError> {
        let mut url = url::Url::parse(&format!("{}/accessToken", self.server))
            .map_err(|e| AuthError::NotConfigured(format!("bad token server url: {e}")))?;
        url.query_pairs_mut().append_pair("appID", app_id);
        let body = http.get_json(url.as_str()).await;
        serde_json::from_value(body).map_err(|e| AuthError::TokenRejected(e.to_string()))
    }
}

#[async_trait::async_trait]
impl TokenSource for RegisteredApp {
    async fn fetch_token(&self, http: &dyn HttpJsonClient) -> Result<String, AuthError> {
        let mut retried = false;
        loop {
            let app_id = match self.stored_app_id().await {
                Some(id) => id,
                None => self.register(http).await?,
            };

            let resp = self.request_token(http, &app_id).await?;
            if let Some(token) = resp.access_token {
                return Ok(token);
            }

            // A stale app id is rejected once; forget it and register again.
            if !retried && resp.error.as_deref() == Some(ACCESS_DENIED) {
                tracing::info!("Stored app id was rejected, registering again");
                if let Err(e) = fs::remove_file(&self.app_id_path).await {
                    tracing::debug!(error = %e, "Could not remove stored app id");
                }
                retried = true;
                continue;
            }
            return Err(AuthError::TokenRejected(resp.failure_reason()));
        }
    }
}
