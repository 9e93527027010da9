use tabled::Table;

use crate::{error, info, spotify::SpotifyCatalog, success, types::PlaylistTableRow};

/// Lists playlists usable as an `analyze --source playlist` input.
pub async fn playlists() {
    let catalog = match SpotifyCatalog::load().await {
        Ok(c) => c,
        Err(e) => error!("{}", e),
    };

    let user = match catalog.current_user().await {
        Ok(u) => u,
        Err(e) => error!("Failed to fetch user profile: {}", e),
    };

    let playlists = match catalog.user_playlists(&user.id).await {
        Ok(p) => p,
        Err(e) => error!("Failed to fetch playlists: {}", e),
    };

    if playlists.is_empty() {
        info!("No owned or collaborative playlists found.");
        return;
    }

    let rows: Vec<PlaylistTableRow> = playlists
        .into_iter()
        .map(|p| PlaylistTableRow {
            id: p.id,
            name: p.name,
            tracks: p.tracks.map_or(0, |t| t.total),
            collaborative: p.collaborative,
        })
        .collect();

    success!("{} playlists", rows.len());
    println!("{}", Table::new(rows));
}
