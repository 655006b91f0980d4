//! Serde types for upstream API responses.

use serde::Deserialize;
use serde_json::Value;

use super::error::ApiError;
use super::media::{MediaItem, MediaKind};

/// Tier value marking a paywalled item.
pub const LOCKED_TIER: &str = "locked";

/// Reject bodies that carry an upstream or transport error.
///
/// Both `{"status": "error", ...}` and a bare `"error"` field count.
pub fn check_for_errors(body: &Value) -> Result<(), ApiError> {
    let description = body
        .get("error_description")
        .and_then(Value::as_str)
        .map(str::to_string);

    if body.get("status").and_then(Value::as_str) == Some("error") {
        return Err(ApiError::Connection(
            description.unwrap_or_else(|| "upstream reported an error".to_string()),
        ));
    }
    if let Some(err) = body.get("error") {
        let message = description.unwrap_or_else(|| match err {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });
        return Err(ApiError::Connection(message));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct FolderListResponse {
    pub results: Vec<FolderEntry>,
    pub has_more: bool,
}

#[derive(Debug, Deserialize)]
pub struct FolderEntry {
    pub folderid: String,
    pub name: String,
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub thumb: Option<Thumb>,
}

impl FolderEntry {
    /// Item count; missing or null means empty.
    pub fn size(&self) -> u32 {
        self.size.unwrap_or(0)
    }

    pub fn thumbnail_url(&self) -> Option<String> {
        self.thumb
            .as_ref()
            .and_then(|t| t.thumbs.as_ref())
            .and_then(|thumbs| thumbs.first())
            .and_then(|t| t.src.clone())
    }
}

#[derive(Debug, Deserialize)]
pub struct Thumb {
    #[serde(default)]
    pub thumbs: Option<Vec<Rendition>>,
}

/// One rendition (image size or video quality) of an item.
#[derive(Debug, Deserialize)]
pub struct Rendition {
    #[serde(default)]
    pub src: Option<String>,
}

/// One page of a folder's items. Entries stay raw until the caller knows
/// which positions it wants.
#[derive(Debug, Deserialize)]
pub struct MediaPage {
    pub results: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct Deviation {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub tier_access: Option<String>,
    #[serde(default)]
    pub content: Option<Rendition>,
    #[serde(default)]
    pub videos: Option<Vec<Rendition>>,
}

impl Deviation {
    pub fn is_locked(&self) -> bool {
        self.tier_access.as_deref() == Some(LOCKED_TIER)
    }

    /// The displayable media of this item, or `None` for paywalled items and
    /// items with neither an image nor a video rendition.
    pub fn into_media(self) -> Option<MediaItem> {
        if self.is_locked() {
            return None;
        }
        let title = self.title.unwrap_or_default();
        if let Some(url) = self.content.and_then(|c| c.src) {
            return Some(MediaItem {
                url,
                title,
                kind: MediaKind::Image,
            });
        }
        let url = self
            .videos
            .and_then(|v| v.into_iter().next())
            .and_then(|v| v.src)?;
        Some(MediaItem {
            url,
            title,
            kind: MediaKind::Video,
        })
    }
}
