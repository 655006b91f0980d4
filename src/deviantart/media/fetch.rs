//! Runs a plan's windows with bounded parallelism.
//!
//! Each window has its own timeout and the whole fetch has a deadline. A
//! failed or abandoned window only costs the items it would have produced;
//! everything that did arrive is still shown.

use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use super::collector::MediaCollector;
use super::planner::{PlanLimits, QueryWindow};
use super::Collected;
use crate::deviantart::endpoints::Endpoints;
use crate::deviantart::error::ApiError;
use crate::deviantart::responses::{check_for_errors, Deviation, MediaPage};
use crate::http::{redact, HttpJsonClient};
use crate::store::FolderRecord;

pub const DEFAULT_WINDOW_TIMEOUT: Duration = Duration::from_secs(20);
pub const DEFAULT_FETCH_DEADLINE: Duration = Duration::from_secs(60);
pub const DEFAULT_CONCURRENCY: usize = 11;

#[derive(Debug, Clone, Copy)]
pub struct FetchSettings {
    pub limits: PlanLimits,
    pub window_timeout: Duration,
    pub deadline: Duration,
    pub concurrency: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            limits: PlanLimits::default(),
            window_timeout: DEFAULT_WINDOW_TIMEOUT,
            deadline: DEFAULT_FETCH_DEADLINE,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

#[derive(Debug)]
pub struct FetchOutcome {
    pub collector: MediaCollector,
    pub windows: usize,
    /// Windows that errored, timed out or were abandoned at the deadline.
    pub failed: usize,
}

pub struct MediaFetcher<'a> {
    http: &'a dyn HttpJsonClient,
    endpoints: &'a Endpoints,
    settings: &'a FetchSettings,
}

impl<'a> MediaFetcher<'a> {
    pub fn new(
        http: &'a dyn HttpJsonClient,
        endpoints: &'a Endpoints,
        settings: &'a FetchSettings,
    ) -> Self {
        Self {
            http,
            endpoints,
            settings,
        }
    }

    /// Fetch every window and collect the kept items.
    ///
    /// Only a broken collector invariant is returned as an error.
    pub async fn fetch_all(
        &self,
        folder: &FolderRecord,
        access_token: &str,
        windows: Vec<QueryWindow>,
    ) -> Result<FetchOutcome, ApiError> {
        let collector = MediaCollector::new(folder.randomize, self.settings.limits.display_cap);
        let total = windows.len();
        let deadline = tokio::time::Instant::now() + self.settings.deadline;
        let window_timeout = self.settings.window_timeout;

        let results = stream::iter(windows)
            .map(|window| async move {
                let result =
                    match tokio::time::timeout(window_timeout, self.fetch_window(folder, access_token, &window))
                        .await
                    {
                        Ok(result) => result,
                        Err(_) => Err(ApiError::Connection(format!(
                            "timed out after {}s",
                            window_timeout.as_secs()
                        ))),
                    };
                (window, result)
            })
            .buffer_unordered(self.settings.concurrency.max(1));
        tokio::pin!(results);

        let mut finished = 0;
        let mut failed = 0;
        loop {
            match tokio::time::timeout_at(deadline, results.next()).await {
                Ok(Some((_, Ok(items)))) => {
                    finished += 1;
                    for item in items {
                        collector.add(item)?;
                    }
                }
                Ok(Some((window, Err(e)))) => {
                    finished += 1;
                    failed += 1;
                    warn!(
                        offset = window.offset,
                        limit = window.limit,
                        error = %e,
                        "Skipping window"
                    );
                }
                Ok(None) => break,
                Err(_) => {
                    let outstanding = total - finished;
                    warn!(
                        outstanding,
                        deadline_secs = self.settings.deadline.as_secs(),
                        "Fetch deadline reached, abandoning outstanding windows"
                    );
                    failed += outstanding;
                    break;
                }
            }
        }

        info!(
            folder = %folder.display_name,
            windows = total,
            failed,
            items = collector.len(),
            "Fetched media"
        );
        Ok(FetchOutcome {
            collector,
            windows: total,
            failed,
        })
    }

    async fn fetch_window(
        &self,
        folder: &FolderRecord,
        access_token: &str,
        window: &QueryWindow,
    ) -> Result<Vec<Collected>, ApiError> {
        let url = self
            .endpoints
            .folder_items(folder, access_token, window.limit, window.offset);
        debug!(url = %redact(&url), offset = window.offset, limit = window.limit, "Fetching window");

        let body = self.http.get_json(&url).await;
        check_for_errors(&body)?;
        let page: MediaPage = serde_json::from_value(body)?;
        Ok(extract_kept(page.results, window, folder.randomize))
    }
}

/// Pick the kept positions out of one page of results.
///
/// Paywalled items and items without media are dropped. Malformed entries
/// are dropped with a debug log.
pub fn extract_kept(
    results: Vec<serde_json::Value>,
    window: &QueryWindow,
    randomize: bool,
) -> Vec<Collected> {
    let positions = window.kept_positions(results.len());
    let mut results: Vec<Option<serde_json::Value>> = results.into_iter().map(Some).collect();
    let mut collected = Vec::with_capacity(positions.len());

    for position in positions {
        let Some(raw) = results.get_mut(position).and_then(Option::take) else {
            continue;
        };
        let deviation: Deviation = match serde_json::from_value(raw) {
            Ok(d) => d,
            Err(e) => {
                debug!(position, error = %e, "Unreadable item, skipping");
                continue;
            }
        };
        let Some(item) = deviation.into_media() else {
            continue;
        };
        collected.push(if randomize {
            Collected::Unordered(item)
        } else {
            Collected::Ordered {
                index: window.offset + position,
                item,
            }
        });
    }
    collected
}
