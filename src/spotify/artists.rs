use crate::{
    catalog::{ArtistGenres, LookupOutcome},
    spotify::{CatalogError, SpotifyCatalog},
    types::{Artist, TimeRange, TopKind},
};

impl SpotifyCatalog {
    /// Retrieves a single artist including its genres.
    pub async fn artist(&self, artist_id: &str) -> Result<Artist, CatalogError> {
        self.get_json(&self.url(&format!("/artists/{artist_id}")))
            .await
    }

    pub async fn top_artists(&self, range: TimeRange, limit: u32) -> Result<Vec<Artist>, CatalogError> {
        self.top(TopKind::Artists, range, limit).await
    }
}

impl ArtistGenres for SpotifyCatalog {
    async fn artist_genres(&self, artist_id: &str) -> LookupOutcome<Vec<String>> {
        self.artist(artist_id).await.map(|a| a.genres).into()
    }
}
