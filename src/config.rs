use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use crate::auth::error::AuthError;
use crate::auth::source::{ClientCredentials, RegisteredApp, StaticToken, TokenSource};
use crate::cli::{CredentialArgs, GlobalArgs};
use crate::deviantart::endpoints::{Endpoints, DEFAULT_TOKEN_URL};
use crate::deviantart::media::planner::MAX_PER_REQUEST_LIMIT;
use crate::deviantart::media::{FetchSettings, PlanLimits};
use crate::http::HttpJsonClient;
use crate::types::LogLevel;

/// How access tokens are obtained.
#[derive(Clone)]
pub enum TokenConfig {
    Static(String),
    ClientCredentials {
        client_id: String,
        client_secret: String,
    },
    TokenServer(String),
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static(_) => f.write_str("Static(<redacted>)"),
            Self::ClientCredentials { client_id, .. } => f
                .debug_struct("ClientCredentials")
                .field("client_id", client_id)
                .field("client_secret", &"<redacted>")
                .finish(),
            Self::TokenServer(url) => f.debug_tuple("TokenServer").field(url).finish(),
        }
    }
}

/// Validated runtime configuration shared by every command.
#[derive(Debug)]
pub struct Config {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub endpoints: Endpoints,
    pub token: Option<TokenConfig>,
    pub fetch: FetchSettings,
    pub log_level: LogLevel,
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Config {
    pub fn from_cli(args: GlobalArgs) -> anyhow::Result<Self> {
        if args.display_cap == 0 {
            anyhow::bail!("--display-cap must be greater than 0");
        }
        if args.per_request_limit == 0 || args.per_request_limit > MAX_PER_REQUEST_LIMIT {
            anyhow::bail!(
                "--per-request-limit must be between 1 and {}, got {}",
                MAX_PER_REQUEST_LIMIT,
                args.per_request_limit
            );
        }
        if args.window_timeout == 0 || args.fetch_deadline == 0 {
            anyhow::bail!("--window-timeout and --fetch-deadline must be greater than 0");
        }
        if args.concurrency == 0 {
            anyhow::bail!("--concurrency must be greater than 0");
        }

        let endpoints = Endpoints::new(&args.api_root)
            .with_context(|| format!("Invalid --api-root '{}'", args.api_root))?;
        let data_dir = expand_tilde(&args.data_dir);
        let db_path = data_dir.join("folders.db");

        Ok(Self {
            data_dir,
            db_path,
            endpoints,
            token: token_config(args.credentials)?,
            fetch: FetchSettings {
                limits: PlanLimits {
                    display_cap: args.display_cap,
                    per_request_limit: args.per_request_limit,
                },
                window_timeout: Duration::from_secs(args.window_timeout),
                deadline: Duration::from_secs(args.fetch_deadline),
                concurrency: args.concurrency,
            },
            log_level: args.log_level,
        })
    }

    /// Build the token source for the configured credentials.
    pub fn token_source(&self) -> anyhow::Result<Box<dyn TokenSource>> {
        let source: Box<dyn TokenSource> = match &self.token {
            Some(TokenConfig::Static(token)) => Box::new(StaticToken(token.clone())),
            Some(TokenConfig::ClientCredentials {
                client_id,
                client_secret,
            }) => Box::new(ClientCredentials {
                token_url: DEFAULT_TOKEN_URL.to_string(),
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
            }),
            Some(TokenConfig::TokenServer(server)) => {
                Box::new(RegisteredApp::new(server.clone(), &self.data_dir))
            }
            None => {
                return Err(AuthError::NotConfigured(
                    "set ARTFEED_ACCESS_TOKEN, ARTFEED_CLIENT_ID and ARTFEED_CLIENT_SECRET, \
                     or ARTFEED_TOKEN_SERVER"
                        .to_string(),
                )
                .into())
            }
        };
        Ok(source)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn http_client(&self) -> anyhow::Result<Arc<dyn HttpJsonClient>> {
        let client = crate::http::build_client(self.fetch.window_timeout)
            .context("Failed to build HTTP client")?;
        Ok(Arc::new(client))
    }
}

fn token_config(creds: CredentialArgs) -> anyhow::Result<Option<TokenConfig>> {
    if let Some(token) = creds.access_token.filter(|t| !t.trim().is_empty()) {
        return Ok(Some(TokenConfig::Static(token)));
    }
    match (creds.client_id, creds.client_secret) {
        (Some(client_id), Some(client_secret)) => {
            return Ok(Some(TokenConfig::ClientCredentials {
                client_id,
                client_secret,
            }))
        }
        (Some(_), None) | (None, Some(_)) => {
            anyhow::bail!("--client-id and --client-secret must be given together")
        }
        (None, None) => {}
    }
    Ok(creds.token_server.map(TokenConfig::TokenServer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn global(args: &[&str]) -> GlobalArgs {
        let mut argv = vec!["artfeed"];
        argv.extend_from_slice(args);
        argv.push("list");
        Cli::try_parse_from(argv).unwrap().global
    }

    fn no_credentials(mut args: GlobalArgs) -> GlobalArgs {
        args.credentials = CredentialArgs {
            access_token: None,
            client_id: None,
            client_secret: None,
            token_server: None,
        };
        args
    }

    #[test]
    fn test_expand_tilde_with_home() {
        let result = expand_tilde("~/Documents");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(result, home.join("Documents"));
        }
    }

    #[test]
    fn test_expand_tilde_no_prefix() {
        assert_eq!(expand_tilde("/tmp/artfeed"), PathBuf::from("/tmp/artfeed"));
    }

    #[test]
    fn test_from_cli_defaults() {
        let config = Config::from_cli(global(&["--data-dir", "/tmp/af"])).unwrap();
        assert_eq!(config.db_path(), Path::new("/tmp/af/folders.db"));
        assert_eq!(config.fetch.limits.display_cap, 250);
        assert_eq!(config.fetch.limits.per_request_limit, 24);
        assert_eq!(config.fetch.window_timeout, Duration::from_secs(20));
        assert_eq!(config.fetch.deadline, Duration::from_secs(60));
        assert_eq!(config.fetch.concurrency, 11);
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        assert!(Config::from_cli(global(&["--per-request-limit", "25"])).is_err());
        assert!(Config::from_cli(global(&["--per-request-limit", "0"])).is_err());
        assert!(Config::from_cli(global(&["--display-cap", "0"])).is_err());
        assert!(Config::from_cli(global(&["--concurrency", "0"])).is_err());
        assert!(Config::from_cli(global(&["--window-timeout", "0"])).is_err());
        assert!(Config::from_cli(global(&["--api-root", "nope"])).is_err());
    }

    #[test]
    fn test_static_token_wins() {
        let mut args = no_credentials(global(&[]));
        args.credentials.access_token = Some("tok".into());
        args.credentials.token_server = Some("https://tokens.example".into());
        let config = Config::from_cli(args).unwrap();
        assert!(matches!(config.token, Some(TokenConfig::Static(ref t)) if t == "tok"));
    }

    #[test]
    fn test_client_credentials_need_both_halves() {
        let mut args = no_credentials(global(&[]));
        args.credentials.client_id = Some("id".into());
        assert!(Config::from_cli(args).is_err());
    }

    #[test]
    fn test_token_server_fallback() {
        let mut args = no_credentials(global(&[]));
        args.credentials.token_server = Some("https://tokens.example".into());
        let config = Config::from_cli(args).unwrap();
        assert!(matches!(config.token, Some(TokenConfig::TokenServer(_))));
        assert!(config.token_source().is_ok());
    }

    #[test]
    fn test_missing_credentials_only_fail_when_used() {
        let config = Config::from_cli(no_credentials(global(&[]))).unwrap();
        assert!(config.token.is_none());
        assert!(config.token_source().is_err());
    }
}
