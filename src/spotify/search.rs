use crate::{
    catalog::{LookupOutcome, TrackSearch},
    spotify::{CatalogError, SpotifyCatalog},
    types::{SearchHit, SearchResponse},
};

impl SpotifyCatalog {
    /// Searches the catalog for tracks.
    ///
    /// `query` may use field filters such as `track:"…" artist:"…"`; it is
    /// URL-encoded by the request builder.
    pub async fn search_track_hits(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<SearchHit>, CatalogError> {
        let url = self.url("/search");
        let limit = limit.to_string();
        let response = self
            .send(|client| {
                client
                    .get(&url)
                    .query(&[("q", query), ("type", "track"), ("limit", limit.as_str())])
            })
            .await?;

        let json = response.json::<SearchResponse>().await?;
        Ok(json.tracks.items)
    }
}

impl TrackSearch for SpotifyCatalog {
    async fn search_tracks(&self, query: &str, limit: u32) -> LookupOutcome<Vec<SearchHit>> {
        LookupOutcome::from(self.search_track_hits(query, limit).await).non_empty()
    }
}
