use clap::{Args, Parser, Subcommand};

use crate::types::{LogLevel, StorageLocation};

#[derive(Parser, Debug)]
#[command(
    name = "artfeed",
    version,
    about = "Browse, save and display DeviantArt galleries and collections"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Directory for the folder database and token-server app id
    #[arg(long, global = true, default_value = "~/.artfeed")]
    pub data_dir: String,

    /// Log level (RUST_LOG overrides)
    #[arg(long, global = true, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Maximum items shown for one folder
    #[arg(long, global = true, default_value_t = 250)]
    pub display_cap: usize,

    /// Items requested per upstream page (1-24)
    #[arg(long, global = true, default_value_t = 24)]
    pub per_request_limit: usize,

    /// Timeout for a single page request, in seconds
    #[arg(long, global = true, default_value_t = 20)]
    pub window_timeout: u64,

    /// Deadline for fetching one folder's media, in seconds
    #[arg(long, global = true, default_value_t = 60)]
    pub fetch_deadline: u64,

    /// Maximum page requests in flight at once
    #[arg(long, global = true, default_value_t = 11)]
    pub concurrency: usize,

    /// Base URL of the REST API
    #[arg(
        long,
        global = true,
        env = "ARTFEED_API_ROOT",
        default_value = crate::deviantart::endpoints::DEFAULT_API_ROOT
    )]
    pub api_root: String,

    #[command(flatten)]
    pub credentials: CredentialArgs,
}

/// Where access tokens come from. The first one configured wins, in
/// declaration order.
#[derive(Args, Clone)]
pub struct CredentialArgs {
    /// Pre-issued access token.
    /// WARNING: passing via --access-token is visible in process listings.
    /// Prefer the ARTFEED_ACCESS_TOKEN environment variable instead.
    #[arg(long, global = true, env = "ARTFEED_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// OAuth client id for the client-credentials grant
    #[arg(long, global = true, env = "ARTFEED_CLIENT_ID")]
    pub client_id: Option<String>,

    /// OAuth client secret for the client-credentials grant
    #[arg(long, global = true, env = "ARTFEED_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Token server that registers this install and hands out tokens
    #[arg(long, global = true, env = "ARTFEED_TOKEN_SERVER")]
    pub token_server: Option<String>,
}

impl std::fmt::Debug for CredentialArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialArgs")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("token_server", &self.token_server)
            .finish()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List an owner's non-empty folders
    Discover(DiscoverArgs),

    /// Save an owner's whole gallery/collections, or one named folder
    Save(SaveArgs),

    /// List saved folders
    List,

    /// Print the media of a saved folder
    Feed(FeedArgs),

    /// Re-check saved folders against upstream and apply the changes
    Refresh(RefreshArgs),

    /// Rename a saved folder or change its ordering
    Edit(EditArgs),

    /// Remove a saved folder
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
pub struct DiscoverArgs {
    #[arg(long, value_enum)]
    pub location: StorageLocation,

    /// Owner whose folders to list
    #[arg(short = 'u', long)]
    pub username: String,

    /// Show only this page (0-based, 50 folders each) instead of everything
    #[arg(long)]
    pub page: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SaveArgs {
    #[arg(long, value_enum)]
    pub location: StorageLocation,

    #[arg(short = 'u', long)]
    pub username: String,

    /// Upstream folder name; omit to save everything at the location
    #[arg(long)]
    pub folder: Option<String>,

    /// Display name for the saved folder (at least 4 characters)
    #[arg(long)]
    pub name: Option<String>,

    /// Show items in upstream order instead of a random sample
    #[arg(long)]
    pub ordered: bool,
}

#[derive(Args, Debug)]
pub struct FeedArgs {
    #[arg(long)]
    pub id: i64,

    /// Print the feed as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct RefreshArgs {
    /// Refresh only these saved folders (default: all)
    #[arg(long = "id")]
    pub ids: Vec<i64>,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    #[arg(long)]
    pub id: i64,

    /// New display name (at least 4 characters)
    #[arg(long)]
    pub name: Option<String>,

    /// Random sample (true) or upstream order (false)
    #[arg(long)]
    pub randomize: Option<bool>,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    #[arg(long)]
    pub id: i64,
}
