pub mod client;
pub mod error;
pub mod playlist_item;
pub mod response;

pub use client::{ClientConfig, PlaylistApi, YouTube};
pub use error::FetchError;
pub use playlist_item::{PlaylistItem, ResourceId, Snippet, ThumbnailImage, Thumbnails};
pub use response::{PageInfo, PlaylistItemListResponse};
