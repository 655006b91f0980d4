//! Client for the upstream art API: media feeds and folder discovery.
//!
//! Nothing in here writes to the local store. Callers persist the records
//! and change lists returned.

pub mod endpoints;
pub mod error;
pub mod folders;
pub mod media;
pub mod responses;

use std::sync::Arc;

use tracing::debug;

use self::endpoints::Endpoints;
use self::error::ApiError;
use self::folders::{FolderDiscovery, FolderPage, FolderSummary, ReconcileReport};
use self::media::{FetchSettings, MediaFetcher, MediaItem};
use crate::auth::AccessTokenProvider;
use crate::http::HttpJsonClient;
use crate::store::FolderRecord;
use crate::types::StorageLocation;

pub struct ArtService {
    http: Arc<dyn HttpJsonClient>,
    tokens: Arc<dyn AccessTokenProvider>,
    endpoints: Endpoints,
    settings: FetchSettings,
}

impl ArtService {
    pub fn new(
        http: Arc<dyn HttpJsonClient>,
        tokens: Arc<dyn AccessTokenProvider>,
        endpoints: Endpoints,
        settings: FetchSettings,
    ) -> Self {
        Self {
            http,
            tokens,
            endpoints,
            settings,
        }
    }

    fn discovery(&self) -> FolderDiscovery<'_> {
        FolderDiscovery::new(self.http.as_ref(), self.tokens.as_ref(), &self.endpoints)
    }

    /// The feed for a saved folder: up to the display cap of items, in
    /// upstream order or shuffled per the folder's randomize flag.
    ///
    /// Windows that fail are skipped; only auth failures and broken
    /// invariants are errors.
    pub async fn plan_and_fetch_media(&self, folder: &FolderRecord) -> Result<Vec<MediaItem>, ApiError> {
        let windows = media::plan_queries(
            folder.total_items as usize,
            self.settings.limits,
            folder.randomize,
            &mut rand::thread_rng(),
        );
        debug!(
            folder = %folder.display_name,
            total = folder.total_items,
            randomize = folder.randomize,
            windows = windows.len(),
            "Planned media queries"
        );
        if windows.is_empty() {
            return Ok(Vec::new());
        }

        let token = self.tokens.get_token().await?;
        let outcome = MediaFetcher::new(self.http.as_ref(), &self.endpoints, &self.settings)
            .fetch_all(folder, &token, windows)
            .await?;
        if outcome.failed == outcome.windows {
            tracing::warn!(folder = %folder.display_name, "Every window failed, feed is empty");
        }
        Ok(outcome.collector.into_media())
    }

    /// Every non-empty folder of an owner.
    pub async fn discover_folders(
        &self,
        location: StorageLocation,
        username: &str,
    ) -> Result<Vec<FolderSummary>, ApiError> {
        self.discovery().fetch_all(location, username).await
    }

    /// One page of an owner's folders, for browsing.
    pub async fn discover_folders_page(
        &self,
        location: StorageLocation,
        username: &str,
        page: usize,
    ) -> Result<FolderPage, ApiError> {
        self.discovery().fetch_page(location, username, page).await
    }

    /// An unsaved record for an owner's whole gallery or collections.
    pub async fn full_location_record(
        &self,
        location: StorageLocation,
        username: &str,
        display_name: Option<String>,
        randomize: bool,
    ) -> Result<FolderRecord, ApiError> {
        let aggregate = self.discovery().fetch_aggregate(location, username).await?;
        Ok(aggregate.into_record(display_name, randomize))
    }

    /// An unsaved record for one of an owner's folders, looked up by name.
    pub async fn named_folder_record(
        &self,
        location: StorageLocation,
        username: &str,
        folder_name: &str,
        display_name: Option<String>,
        randomize: bool,
    ) -> Result<FolderRecord, ApiError> {
        let folder = self
            .discovery()
            .find_by_name(location, username, folder_name)
            .await?;
        Ok(folder.into_record(display_name, randomize))
    }

    /// Compare saved folders with upstream. Fails only if no token can be had.
    pub async fn reconcile(&self, local: Vec<FolderRecord>) -> Result<ReconcileReport, ApiError> {
        self.tokens.get_token().await?;
        Ok(folders::reconcile(&self.discovery(), local).await)
    }
}
