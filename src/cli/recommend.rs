use std::path::Path;

use chrono::Local;
use tabled::Table;

use crate::{
    analysis::Report,
    config, error,
    gemini::{self, GeminiClient, RecommendationError},
    info,
    management::ReportManager,
    recommend::{self, ReconcileProgress, Reconciliation, SuggestedSong},
    spotify::SpotifyCatalog,
    success,
    types::{SuggestionTableRow, UserProfile},
    utils, warning,
};

/// Builds a playlist from a previously saved report.
pub async fn recommend(report_path: &Path, playlist_name: Option<&str>) {
    let report = match ReportManager::load(report_path).await {
        Ok(r) => r,
        Err(e) => error!("Failed to load report: {}", e),
    };

    let catalog = match SpotifyCatalog::load().await {
        Ok(c) => c,
        Err(e) => error!("{}", e),
    };

    let user = match catalog.current_user().await {
        Ok(u) => u,
        Err(e) => error!("Failed to fetch user profile: {}", e),
    };

    let gemini = match GeminiClient::from_env() {
        Ok(g) => g,
        Err(e) => error!("{}", e),
    };

    recommend_playlist(&catalog, &gemini, &report, &user, playlist_name).await;
}

/// Asks the model for songs, resolves them in the catalog and creates a
/// public playlist from the matches.
pub(super) async fn recommend_playlist(
    catalog: &SpotifyCatalog,
    gemini: &GeminiClient,
    report: &Report,
    user: &UserProfile,
    playlist_name: Option<&str>,
) {
    let (target, request) = match (config::playlist_target_size(), config::playlist_request_size()) {
        (Ok(t), Ok(r)) => (t, r.max(t)),
        (Err(e), _) | (_, Err(e)) => {
            warning!("Skipping playlist: {}", e);
            return;
        }
    };

    let name = playlist_name
        .map(str::to_string)
        .unwrap_or_else(|| default_playlist_name(report));

    let pb = utils::spinner(&format!("Asking {} for {} songs...", gemini.model(), request));
    let result = gemini::generate_suggestions(gemini, report, &name, request, target).await;
    pb.finish_and_clear();

    let recommendations = match result {
        Ok(r) => r,
        Err(RecommendationError::Suggestions(e)) => {
            warning!("{}", e);
            println!("{}", e.raw());
            return;
        }
        Err(e) => {
            warning!("Failed to get song suggestions: {}", e);
            return;
        }
    };

    success!("Received {} song suggestions", recommendations.songs.len());
    println!("{}", Table::new(suggestion_rows(&recommendations.songs)));
    if let Some(usage) = recommendations.usage {
        info!(
            "Tokens: {} prompt, {} response, {} total",
            usage.prompt_tokens, usage.response_tokens, usage.total_tokens
        );
    }

    let pb = utils::spinner("Searching suggested songs...");
    let total = recommendations.songs.len();
    let result = recommend::reconcile_with_progress(
        &recommendations.songs,
        target,
        catalog,
        |progress| match progress {
            ReconcileProgress::Found {
                position, resolved, ..
            } => pb.set_message(format!(
                "Searching suggested songs... {}/{} ({} found)",
                position + 1,
                total,
                resolved
            )),
            ReconcileProgress::NotFound { position, song } => pb.set_message(format!(
                "Searching suggested songs... {}/{} (not found: {})",
                position + 1,
                total,
                song
            )),
        },
    )
    .await;
    pb.finish_and_clear();

    let reconciliation = match result {
        Ok(r) => r,
        Err(e) => error!("{}", e),
    };

    print_not_found(&reconciliation);

    if reconciliation.resolved.is_empty() {
        warning!("None of the suggested songs could be found. No playlist created.");
        return;
    }

    success!(
        "Found {} of {} tried suggestions",
        reconciliation.resolved.len(),
        reconciliation.attempted
    );

    let description = utils::playlist_description(env!("CARGO_PKG_NAME"), Local::now().date_naive());
    let playlist = match catalog.create_playlist(&user.id, &name, true, &description).await {
        Ok(p) => p,
        Err(e) => {
            warning!("Failed to create playlist: {}", e);
            return;
        }
    };

    match catalog.add_items(&playlist.id, &reconciliation.uris()).await {
        Ok(_) => {
            success!(
                "Playlist {} created with {} tracks",
                playlist.name,
                reconciliation.resolved.len()
            );
            if let Some(url) = playlist.external_urls.spotify {
                info!("{}", url);
            }
        }
        Err(e) => warning!("Failed to add tracks to playlist: {}", e),
    }
}

/// Numbered table rows for the songs suggested by the model.
pub fn suggestion_rows(songs: &[SuggestedSong]) -> Vec<SuggestionTableRow> {
    songs
        .iter()
        .enumerate()
        .map(|(i, song)| SuggestionTableRow {
            rank: i + 1,
            artist: song.artist.clone(),
            track: song.track.clone(),
        })
        .collect()
}

fn print_not_found(reconciliation: &Reconciliation) {
    if reconciliation.not_found.is_empty() {
        return;
    }

    warning!("{} suggestions not found:", reconciliation.not_found.len());
    for song in &reconciliation.not_found {
        println!("  - {}", song);
    }
}

/// `AI Mix: <dominant genre>` or a dated fallback when the report has no genres.
pub fn default_playlist_name(report: &Report) -> String {
    match report.dominant_genre() {
        Some(genre) => format!("AI Mix: {}", genre.genre),
        None => format!("AI Mix {}", Local::now().format("%d.%m.%Y")),
    }
}
