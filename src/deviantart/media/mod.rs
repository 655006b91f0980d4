//! Fetching the displayable media of a saved folder.
//!
//! `planner` decides which windows to request, `fetch` runs them with bounded
//! parallelism and a deadline, `collector` gathers the results.

pub mod collector;
pub mod fetch;
pub mod planner;

use serde::Serialize;

pub use fetch::{FetchSettings, MediaFetcher};
pub use planner::{plan_queries, PlanLimits};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaItem {
    pub url: String,
    pub title: String,
    pub kind: MediaKind,
}

/// An item on its way into a [`collector::MediaCollector`].
///
/// Ordered feeds carry the absolute upstream position so the collector can
/// restore upstream order; randomized feeds do not need one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collected {
    Ordered { index: usize, item: MediaItem },
    Unordered(MediaItem),
}

impl Collected {
    pub fn into_item(self) -> MediaItem {
        match self {
            Self::Ordered { item, .. } | Self::Unordered(item) => item,
        }
    }
}
