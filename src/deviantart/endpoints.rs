//! URL builders for the upstream REST API.

use url::Url;

use crate::store::FolderRecord;
use crate::types::StorageLocation;

pub const DEFAULT_API_ROOT: &str = "https://www.deviantart.com/api/v1/oauth2";
pub const DEFAULT_TOKEN_URL: &str = "https://www.deviantart.com/oauth2/token";

/// Page size of the folder listing endpoint.
pub const FOLDER_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone)]
pub struct Endpoints {
    api_root: Url,
}

impl Endpoints {
    pub fn new(api_root: &str) -> anyhow::Result<Self> {
        let api_root = Url::parse(api_root)?;
        if api_root.cannot_be_a_base() {
            anyhow::bail!("API root '{}' cannot be used as a base URL", api_root);
        }
        Ok(Self { api_root })
    }

    fn url_for(&self, segments: &[&str]) -> Url {
        let mut url = self.api_root.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// One page of a folder's items: `/{location}/{folderid}`.
    pub fn folder_items(
        &self,
        folder: &FolderRecord,
        access_token: &str,
        limit: usize,
        offset: usize,
    ) -> String {
        let mut url = self.url_for(&[folder.location.as_str(), folder.scope.as_str()]);
        url.query_pairs_mut()
            .append_pair("username", &folder.owner)
            .append_pair("offset", &offset.to_string())
            .append_pair("limit", &limit.to_string())
            .append_pair("mature_content", "true")
            .append_pair("access_token", access_token);
        url.into()
    }

    /// One page of an owner's folder listing: `/{location}/folders`.
    pub fn folder_list(
        &self,
        location: StorageLocation,
        username: &str,
        access_token: &str,
        offset: usize,
    ) -> String {
        let mut url = self.url_for(&[location.as_str(), "folders"]);
        url.query_pairs_mut()
            .append_pair("username", username)
            .append_pair("offset", &offset.to_string())
            .append_pair("limit", &FOLDER_PAGE_SIZE.to_string())
            .append_pair("calculate_size", "true")
            .append_pair("ext_preload", "false")
            .append_pair("filter_empty_folder", "true")
            .append_pair("mature_content", "true")
            .append_pair("access_token", access_token);
        url.into()
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_root: Url::parse(DEFAULT_API_ROOT)
                .unwrap_or_else(|_| unreachable!("default API root is a valid URL")),
        }
    }
}
