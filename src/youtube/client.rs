use crate::youtube::{FetchError, PlaylistItemListResponse};
use reqwest::{Client, Url};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

pub const YOUTUBE_API_URL: &str = "https://www.googleapis.com/youtube/v3";
pub const MAX_RESULTS: u32 = 10;

pub trait PlaylistApi: Send + Sync + 'static {
    fn fetch_playlist_items(
        &self,
        playlist_id: &str,
        page_token: &str,
        api_key: &str,
    ) -> impl Future<Output = Result<PlaylistItemListResponse, FetchError>> + Send;
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub system_proxy: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: YOUTUBE_API_URL.to_owned(),
            timeout: Duration::from_secs(10),
            system_proxy: true,
        }
    }
}

pub struct YouTube {
    client: Client,
    endpoint: Url,
}

impl YouTube {
    pub fn new(config: &ClientConfig) -> Result<Self, FetchError> {
        let endpoint = Url::parse(&format!(
            "{}/playlistItems",
            config.base_url.trim_end_matches('/')
        ))
        .map_err(|_| FetchError::InvalidBaseUrl(config.base_url.clone()))?;

        let mut builder = Client::builder().timeout(config.timeout);
        if !config.system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl PlaylistApi for YouTube {
    async fn fetch_playlist_items(
        &self,
        playlist_id: &str,
        page_token: &str,
        api_key: &str,
    ) -> Result<PlaylistItemListResponse, FetchError> {
        debug!(playlist_id, page_token, "requesting playlist items");

        let max_results = MAX_RESULTS.to_string();
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[
                ("part", "snippet"),
                ("maxResults", max_results.as_str()),
                ("playlistId", playlist_id),
                ("nextPageToken", page_token),
                ("key", api_key),
            ])
            .send()
            .await;

        match response {
            Ok(response) => match response.status().is_success() {
                true => {
                    let body = response.text().await?;
                    Ok(PlaylistItemListResponse::from_json(&body)?)
                }
                false => Err(FetchError::Status {
                    status: response.status(),
                    body: response.text().await.unwrap_or_default(),
                }),
            },
            Err(e) => Err(e.into()),
        }
    }
}
