//! Paged folder listing for one owner and location.

use tracing::debug;

use super::{aggregate_all, FolderPage, FolderSummary};
use crate::auth::AccessTokenProvider;
use crate::deviantart::endpoints::{Endpoints, FOLDER_PAGE_SIZE};
use crate::deviantart::error::ApiError;
use crate::deviantart::responses::{check_for_errors, FolderEntry, FolderListResponse};
use crate::http::{redact, HttpJsonClient};
use crate::store::FolderScope;
use crate::types::StorageLocation;

/// For an unknown owner the listing answers with this single empty folder
/// instead of an error.
pub const MISSING_USER_SENTINEL: &str = "Featured";

/// Safety stop for listings that keep reporting `has_more`.
const MAX_PAGES: usize = 200;

pub struct FolderDiscovery<'a> {
    http: &'a dyn HttpJsonClient,
    tokens: &'a dyn AccessTokenProvider,
    endpoints: &'a Endpoints,
}

impl<'a> FolderDiscovery<'a> {
    pub fn new(
        http: &'a dyn HttpJsonClient,
        tokens: &'a dyn AccessTokenProvider,
        endpoints: &'a Endpoints,
    ) -> Self {
        Self {
            http,
            tokens,
            endpoints,
        }
    }

    /// One page (0-based) of the owner's non-empty folders.
    pub async fn fetch_page(
        &self,
        location: StorageLocation,
        username: &str,
        page: usize,
    ) -> Result<FolderPage, ApiError> {
        let token = self.tokens.get_token().await?;
        let url = self
            .endpoints
            .folder_list(location, username, &token, page * FOLDER_PAGE_SIZE);
        debug!(url = %redact(&url), page, "Listing folders");

        let body = self.http.get_json(&url).await;
        check_for_errors(&body)?;
        let response: FolderListResponse = serde_json::from_value(body)?;

        if page == 0 && is_missing_user(&response.results) {
            return Err(ApiError::UserNotFound {
                username: username.to_string(),
            });
        }

        let folders = response
            .results
            .into_iter()
            .filter(|entry| entry.size() > 0)
            .map(|entry| summarize(entry, location, username))
            .collect();
        Ok(FolderPage {
            folders,
            has_more: response.has_more,
        })
    }

    /// Every non-empty folder the owner has, in upstream order.
    ///
    /// Fails on the first failing page.
    pub async fn fetch_all(
        &self,
        location: StorageLocation,
        username: &str,
    ) -> Result<Vec<FolderSummary>, ApiError> {
        let mut folders = Vec::new();
        for page in 0..MAX_PAGES {
            let FolderPage {
                folders: batch,
                has_more,
            } = self.fetch_page(location, username, page).await?;
            folders.extend(batch);
            if !has_more {
                return Ok(folders);
            }
        }
        tracing::warn!(username, %location, pages = MAX_PAGES, "Folder listing did not end, truncating");
        Ok(folders)
    }

    /// The owner's aggregate folder, built from the full listing.
    pub async fn fetch_aggregate(
        &self,
        location: StorageLocation,
        username: &str,
    ) -> Result<FolderSummary, ApiError> {
        let folders = self.fetch_all(location, username).await?;
        Ok(aggregate_all(&folders, location, username))
    }

    /// A folder looked up by its upstream name, ignoring ASCII case.
    pub async fn find_by_name(
        &self,
        location: StorageLocation,
        username: &str,
        name: &str,
    ) -> Result<FolderSummary, ApiError> {
        let folders = self.fetch_all(location, username).await?;
        folders
            .into_iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ApiError::FolderNotFound {
                name: name.to_string(),
                username: username.to_string(),
                location,
            })
    }
}

fn is_missing_user(results: &[FolderEntry]) -> bool {
    matches!(results, [only] if only.name == MISSING_USER_SENTINEL && only.size() == 0)
}

fn summarize(entry: FolderEntry, location: StorageLocation, owner: &str) -> FolderSummary {
    FolderSummary {
        thumbnail_url: entry.thumbnail_url(),
        scope: FolderScope::from_external_id(&entry.folderid),
        total_items: entry.size(),
        name: entry.name,
        location,
        owner: owner.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::source::StaticToken;
    use crate::auth::TokenCache;
    use crate::test_support::FakeHttp;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn entry(id: &str, name: &str, size: u32) -> Value {
        json!({
            "folderid": id,
            "name": name,
            "size": size,
            "thumb": {"thumbs": [{"src": format!("https://img.example/{id}.jpg")}]}
        })
    }

    fn tokens() -> TokenCache {
        TokenCache::new(
            Box::new(StaticToken("tok".into())),
            Arc::new(FakeHttp::new()),
        )
    }

    #[tokio::test]
    async fn test_fetch_page_skips_empty_folders() {
        let http = FakeHttp::new().route(
            &["folders?", "offset=0&"],
            json!({"results": [entry("A", "Sketches", 3), entry("B", "Drafts", 0)], "has_more": false}),
        );
        let tokens = tokens();
        let endpoints = Endpoints::default();
        let discovery = FolderDiscovery::new(&http, &tokens, &endpoints);
        let page = discovery
            .fetch_page(StorageLocation::Gallery, "painter", 0)
            .await
            .unwrap();

        assert!(!page.has_more);
        assert_eq!(page.folders.len(), 1);
        let folder = &page.folders[0];
        assert_eq!(folder.scope, FolderScope::Folder("A".into()));
        assert_eq!(folder.total_items, 3);
        assert_eq!(folder.thumbnail_url.as_deref(), Some("https://img.example/A.jpg"));
        assert_eq!(folder.owner, "painter");
    }

    #[tokio::test]
    async fn test_missing_user_detected_on_first_page() {
        let http = FakeHttp::new().route(
            &["folders?"],
            json!({"results": [entry("X", "Featured", 0)], "has_more": false}),
        );
        let tokens = tokens();
        let endpoints = Endpoints::default();
        let discovery = FolderDiscovery::new(&http, &tokens, &endpoints);
        let result = discovery.fetch_page(StorageLocation::Gallery, "nobody", 0).await;
        assert!(matches!(result, Err(ApiError::UserNotFound { username }) if username == "nobody"));
    }

    #[tokio::test]
    async fn test_sentinel_on_later_page_is_just_empty() {
        let http = FakeHttp::new().route(
            &["folders?"],
            json!({"results": [entry("X", "Featured", 0)], "has_more": false}),
        );
        let tokens = tokens();
        let endpoints = Endpoints::default();
        let discovery = FolderDiscovery::new(&http, &tokens, &endpoints);
        let page = discovery
            .fetch_page(StorageLocation::Gallery, "painter", 2)
            .await
            .unwrap();
        assert!(page.folders.is_empty());
        assert!(http.requested_urls()[0].contains("offset=100&"));
    }

    #[tokio::test]
    async fn test_nonempty_featured_is_a_real_folder() {
        let http = FakeHttp::new().route(
            &["folders?"],
            json!({"results": [entry("X", "Featured", 4)], "has_more": false}),
        );
        let tokens = tokens();
        let endpoints = Endpoints::default();
        let discovery = FolderDiscovery::new(&http, &tokens, &endpoints);
        let folders = discovery
            .fetch_all(StorageLocation::Gallery, "painter")
            .await
            .unwrap();
        assert_eq!(folders.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_all_follows_pages() {
        let http = FakeHttp::new()
            .route(
                &["folders?", "offset=0&"],
                json!({"results": [entry("A", "One", 1)], "has_more": true}),
            )
            .route(
                &["folders?", "offset=50&"],
                json!({"results": [entry("B", "Two", 2)], "has_more": false}),
            );
        let tokens = tokens();
        let endpoints = Endpoints::default();
        let discovery = FolderDiscovery::new(&http, &tokens, &endpoints);
        let all = discovery
            .fetch_aggregate(StorageLocation::Gallery, "painter")
            .await
            .unwrap();
        assert_eq!(all.total_items, 3);
        assert_eq!(all.scope, FolderScope::All);
        assert_eq!(http.calls_matching("folders?"), 2);
    }

    #[tokio::test]
    async fn test_fetch_all_fails_fast() {
        let http = FakeHttp::new()
            .route(
                &["folders?", "offset=0&"],
                json!({"results": [entry("A", "One", 1)], "has_more": true}),
            )
            .route(&["folders?", "offset=50&"], json!({"error": "server_error"}));
        let tokens = tokens();
        let endpoints = Endpoints::default();
        let discovery = FolderDiscovery::new(&http, &tokens, &endpoints);
        let result = discovery.fetch_all(StorageLocation::Gallery, "painter").await;
        assert!(matches!(result, Err(ApiError::Connection(_))));
    }

    #[tokio::test]
    async fn test_find_by_name() {
        let http = FakeHttp::new().route(
            &["folders?"],
            json!({"results": [entry("A", "Sketches", 3), entry("B", "Paintings", 9)], "has_more": false}),
        );
        let tokens = tokens();
        let endpoints = Endpoints::default();
        let discovery = FolderDiscovery::new(&http, &tokens, &endpoints);

        let found = discovery
            .find_by_name(StorageLocation::Gallery, "painter", "paintings")
            .await
            .unwrap();
        assert_eq!(found.scope, FolderScope::Folder("B".into()));

        let missing = discovery
            .find_by_name(StorageLocation::Gallery, "painter", "Photos")
            .await;
        assert!(matches!(missing, Err(ApiError::FolderNotFound { .. })));
    }

    #[tokio::test]
    async fn test_malformed_listing_is_an_error() {
        let http = FakeHttp::new().route(&["folders?"], json!({"has_more": false}));
        let tokens = tokens();
        let endpoints = Endpoints::default();
        let discovery = FolderDiscovery::new(&http, &tokens, &endpoints);
        let result = discovery.fetch_page(StorageLocation::Gallery, "painter", 0).await;
        assert!(matches!(result, Err(ApiError::Json(_))));
    }
}
