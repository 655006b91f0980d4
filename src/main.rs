//! artfeed: browse, save and display DeviantArt galleries and collections.
//!
//! Saved folders live in a local SQLite database. Showing a folder plans a
//! set of page requests (a uniform random sample or the first items in
//! order), runs them in parallel under a deadline and prints what arrived.
//! `refresh` reconciles saved folders against the upstream folder listings.

#![warn(clippy::all)]

mod auth;
mod cli;
mod config;
mod deviantart;
mod http;
mod store;
#[cfg(test)]
mod test_support;
mod types;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use auth::TokenCache;
use cli::{Command, DeleteArgs, DiscoverArgs, EditArgs, FeedArgs, RefreshArgs, SaveArgs};
use config::Config;
use deviantart::folders::{aggregate_all, FolderSummary};
use deviantart::ArtService;
use store::{FolderRecord, FolderStore, SqliteFolderStore};

fn build_service(config: &Config) -> anyhow::Result<ArtService> {
    let http = config.http_client()?;
    let tokens = Arc::new(TokenCache::new(config.token_source()?, http.clone()));
    Ok(ArtService::new(
        http,
        tokens,
        config.endpoints.clone(),
        config.fetch,
    ))
}

async fn open_store(config: &Config) -> anyhow::Result<SqliteFolderStore> {
    SqliteFolderStore::open(config.db_path())
        .await
        .with_context(|| format!("Failed to open {}", config.db_path().display()))
}

fn print_folder_summary(folder: &FolderSummary) {
    println!(
        "  {:<40} {:>6} items  [{}]",
        folder.name,
        folder.total_items,
        folder.scope.as_str()
    );
}

fn print_saved(folder: &FolderRecord) {
    println!(
        "{:>5}  {:<40} {:>6} items  {}/{}{}",
        folder.id.unwrap_or_default(),
        folder.display_name,
        folder.total_items,
        folder.owner,
        folder.location,
        if folder.randomize { "" } else { "  (ordered)" }
    );
}

async fn run_discover(config: &Config, args: DiscoverArgs) -> anyhow::Result<()> {
    let service = build_service(config)?;

    if let Some(page) = args.page {
        let result = service
            .discover_folders_page(args.location, &args.username, page)
            .await?;
        println!("{}'s {} (page {}):", args.username, args.location, page);
        for folder in &result.folders {
            print_folder_summary(folder);
        }
        if result.has_more {
            println!("More folders on page {}.", page + 1);
        }
        return Ok(());
    }

    let folders = service
        .discover_folders(args.location, &args.username)
        .await?;
    let all = aggregate_all(&folders, args.location, &args.username);
    println!("{}'s {}:", args.username, args.location);
    print_folder_summary(&all);
    for folder in &folders {
        print_folder_summary(folder);
    }
    tracing::info!(folders = folders.len(), total = all.total_items, "Discovered folders");
    Ok(())
}

async fn run_save(config: &Config, args: SaveArgs) -> anyhow::Result<()> {
    let display_name = args
        .name
        .as_deref()
        .map(store::types::validate_display_name)
        .transpose()
        .map_err(anyhow::Error::msg)?;
    let randomize = !args.ordered;

    let service = build_service(config)?;
    let record = match &args.folder {
        Some(folder_name) => {
            service
                .named_folder_record(args.location, &args.username, folder_name, display_name, randomize)
                .await?
        }
        None => {
            service
                .full_location_record(args.location, &args.username, display_name, randomize)
                .await?
        }
    };

    let store = open_store(config).await?;
    let saved = store::create_or_update(&store, &record).await?;
    println!(
        "Saved '{}' as folder {} ({} items).",
        saved.display_name,
        saved.id.unwrap_or_default(),
        saved.total_items
    );
    Ok(())
}

async fn run_list(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let folders = store.list_all().await?;
    if folders.is_empty() {
        println!("No saved folders. Use `artfeed save` to add one.");
        return Ok(());
    }
    for folder in &folders {
        print_saved(folder);
    }
    Ok(())
}

async fn run_feed(config: &Config, args: FeedArgs) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let folder = store.get_by_id(args.id).await?;
    let service = build_service(config)?;
    let media = service.plan_and_fetch_media(&folder).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&media)?);
        return Ok(());
    }
    println!("{} ({} of {} items):", folder.display_name, media.len(), folder.total_items);
    for item in &media {
        println!("  {}  {}", item.url, item.title);
    }
    Ok(())
}

async fn run_refresh(config: &Config, args: RefreshArgs) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let mut folders = store.list_all().await?;
    if !args.ids.is_empty() {
        if let Some(missing) = args
            .ids
            .iter()
            .find(|id| !folders.iter().any(|f| f.id == Some(**id)))
        {
            anyhow::bail!("No saved folder with id {}", missing);
        }
        folders.retain(|f| f.id.is_some_and(|id| args.ids.contains(&id)));
    }
    if folders.is_empty() {
        println!("Nothing to refresh.");
        return Ok(());
    }

    let service = build_service(config)?;
    let report = service.reconcile(folders).await?;
    for change in &report.changes {
        tracing::debug!(
            id = ?change.folder.id,
            name = %change.folder.display_name,
            change = %change.kind,
            "Reconciled folder"
        );
    }
    let summary = store::apply_changes(&store, &report.changes).await?;

    println!(
        "Updated {}, removed {}, unchanged {}.",
        summary.updated, summary.deleted, summary.unchanged
    );
    for failure in &report.failures {
        println!(
            "Could not check {} folder(s) of {}/{}: {}",
            failure.folders, failure.owner, failure.location, failure.error
        );
    }
    Ok(())
}

async fn run_edit(config: &Config, args: EditArgs) -> anyhow::Result<()> {
    if args.name.is_none() && args.randomize.is_none() {
        anyhow::bail!("Nothing to change: pass --name and/or --randomize");
    }
    let store = open_store(config).await?;
    let mut folder = store.get_by_id(args.id).await?;
    if let Some(name) = args.name.as_deref() {
        folder.display_name = store::types::validate_display_name(name).map_err(anyhow::Error::msg)?;
    }
    if let Some(randomize) = args.randomize {
        folder.randomize = randomize;
    }
    store::create_or_update(&store, &folder).await?;
    print_saved(&folder);
    Ok(())
}

async fn run_delete(config: &Config, args: DeleteArgs) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    if !store.delete(args.id).await? {
        anyhow::bail!("No saved folder with id {}", args.id);
    }
    println!("Deleted folder {}.", args.id);
    Ok(())
}

async fn run(config: Config, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Discover(args) => run_discover(&config, args).await,
        Command::Save(args) => run_save(&config, args).await,
        Command::List => run_list(&config).await,
        Command::Feed(args) => run_feed(&config, args).await,
        Command::Refresh(args) => run_refresh(&config, args).await,
        Command::Edit(args) => run_edit(&config, args).await,
        Command::Delete(args) => run_delete(&config, args).await,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let config = Config::from_cli(cli.global)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_filter())),
        )
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(?config, "Starting artfeed");

    if let Err(e) = run(config, cli.command).await {
        tracing::error!(error = %format!("{e:#}"), "Command failed");
        std::process::exit(1);
    }
    Ok(())
}
