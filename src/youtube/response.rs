use crate::youtube::playlist_item::null_as_default;
use crate::youtube::PlaylistItem;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub total_results: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub results_per_page: u32,
}

/// One page of `playlistItems.list` results.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlaylistItemListResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub etag: String,
    pub next_page_token: Option<String>,
    pub prev_page_token: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub page_info: PageInfo,
    #[serde(deserialize_with = "null_as_default")]
    pub items: Vec<PlaylistItem>,
}

impl PlaylistItemListResponse {
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    /// `None` on the last page.
    pub fn next_page_token(&self) -> Option<&str> {
        self.next_page_token
            .as_deref()
            .filter(|token| !token.is_empty())
    }
}
