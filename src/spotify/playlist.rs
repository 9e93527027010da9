use tracing::info;

use crate::{
    spotify::{CatalogError, SpotifyCatalog},
    types::{
        AddTrackToPlaylistRequest, AddTrackToPlaylistResponse, CreatePlaylistRequest,
        CreatePlaylistResponse, Playlist, PlaylistSummary,
    },
};

/// The API accepts at most this many URIs per add-items request.
const ADD_ITEMS_CHUNK: usize = 100;

impl SpotifyCatalog {
    /// Lists the playlists the user owns or collaborates on.
    pub async fn user_playlists(&self, user_id: &str) -> Result<Vec<Playlist>, CatalogError> {
        let items = self
            .paged_items(self.url("/me/playlists?limit=50"), "Fetching playlists...")
            .await?;

        let playlists: Vec<Playlist> = items
            .into_iter()
            .filter_map(|item| serde_json::from_value::<Playlist>(item).ok())
            .filter(|p| p.owner.id == user_id || p.collaborative)
            .collect();

        info!(playlists = playlists.len(), "Fetched user playlists");
        Ok(playlists)
    }

    pub async fn playlist_name(&self, playlist_id: &str) -> Result<String, CatalogError> {
        let url = self.url(&format!("/playlists/{playlist_id}?fields=name"));
        let summary: PlaylistSummary = self.get_json(&url).await?;
        Ok(summary.name)
    }

    pub async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        public: bool,
        description: &str,
    ) -> Result<CreatePlaylistResponse, CatalogError> {
        let url = self.url(&format!("/users/{user_id}/playlists"));
        let body = CreatePlaylistRequest {
            name: name.to_string(),
            description: description.to_string(),
            public,
            collaborative: false,
        };

        let response = self.send(|client| client.post(&url).json(&body)).await?;
        Ok(response.json::<CreatePlaylistResponse>().await?)
    }

    /// Appends tracks to a playlist in chunks, returning the last snapshot id.
    pub async fn add_items(
        &self,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<Option<String>, CatalogError> {
        let url = self.url(&format!("/playlists/{playlist_id}/tracks"));
        let mut snapshot_id = None;

        for chunk in uris.chunks(ADD_ITEMS_CHUNK) {
            let body = AddTrackToPlaylistRequest {
                uris: chunk.to_vec(),
            };
            let response = self.send(|client| client.post(&url).json(&body)).await?;
            let json = response.json::<AddTrackToPlaylistResponse>().await?;
            snapshot_id = Some(json.snapshot_id);
        }

        Ok(snapshot_id)
    }
}
