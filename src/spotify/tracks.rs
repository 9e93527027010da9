use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    spotify::{CatalogError, SpotifyCatalog},
    types::{Paging, RawPage, TimeRange, TopKind},
};

impl SpotifyCatalog {
    /// Retrieves the user's top tracks or artists for a listening period.
    ///
    /// `limit` is capped at 50 by the API; no pagination is done.
    pub async fn top<T: DeserializeOwned>(
        &self,
        kind: TopKind,
        range: TimeRange,
        limit: u32,
    ) -> Result<Vec<T>, CatalogError> {
        let url = self.url(&format!(
            "/me/top/{kind}?time_range={range}&limit={limit}"
        ));
        let page: Paging<T> = self.get_json(&url).await?;
        Ok(page.items)
    }

    /// Top tracks as raw items, ready for the sanitizer.
    pub async fn top_tracks(&self, range: TimeRange, limit: u32) -> Result<Vec<Value>, CatalogError> {
        self.top(TopKind::Tracks, range, limit).await
    }

    /// Recently played items, each wrapped as `{"track": {...}, "played_at": ...}`.
    pub async fn recently_played(&self, limit: u32) -> Result<Vec<Value>, CatalogError> {
        let url = self.url(&format!("/me/player/recently-played?limit={limit}"));
        let page: RawPage = self.get_json(&url).await?;
        Ok(page.items)
    }

    /// Number of tracks in the user's saved library, fetched with a single
    /// one-item page.
    pub async fn saved_tracks_total(&self) -> Result<u64, CatalogError> {
        let page: RawPage = self.get_json(&self.url("/me/tracks?limit=1")).await?;
        Ok(page.total.unwrap_or(0))
    }

    /// Every item of the saved library.
    pub async fn saved_tracks(&self) -> Result<Vec<Value>, CatalogError> {
        self.paged_items(
            self.url("/me/tracks?limit=50"),
            "Fetching saved tracks...",
        )
        .await
    }

    /// Every item of a playlist.
    pub async fn playlist_items(&self, playlist_id: &str) -> Result<Vec<Value>, CatalogError> {
        self.paged_items(
            self.url(&format!("/playlists/{playlist_id}/tracks?limit=100")),
            "Fetching playlist tracks...",
        )
        .await
    }
}
