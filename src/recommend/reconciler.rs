use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    catalog::{LookupOutcome, TrackSearch},
    recommend::SuggestedSong,
    types::SearchHit,
};

/// Which search phase produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchPhase {
    /// `track:"…" artist:"…"` field search
    Exact,
    /// plain `artist title` keyword search
    FreeText,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedTrack {
    pub uri: String,
    pub id: String,
    pub name: String,
    pub matched_by: MatchPhase,
    pub suggestion: SuggestedSong,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Reconciliation {
    pub resolved: Vec<ResolvedTrack>,
    pub not_found: Vec<SuggestedSong>,
    /// Number of suggestions a search was issued for
    pub attempted: usize,
}

impl Reconciliation {
    pub fn uris(&self) -> Vec<String> {
        self.resolved.iter().map(|t| t.uri.clone()).collect()
    }
}

/// Progress of a reconciliation, reported once per attempted suggestion.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileProgress<'a> {
    Found {
        position: usize,
        resolved: usize,
        track: &'a ResolvedTrack,
    },
    NotFound {
        position: usize,
        song: &'a SuggestedSong,
    },
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("catalog rejected the search: {0}")]
    Catalog(String),
}

pub fn exact_query(song: &SuggestedSong) -> String {
    format!(
        "track:\"{}\" artist:\"{}\"",
        song.track.replace('"', ""),
        song.artist.replace('"', "")
    )
}

pub fn free_text_query(song: &SuggestedSong) -> String {
    format!("{} {}", song.artist, song.track)
}

/// Resolves suggestions to catalog tracks, stopping once `target` are found.
pub async fn reconcile<S: TrackSearch>(
    suggestions: &[SuggestedSong],
    target: usize,
    catalog: &S,
) -> Result<Reconciliation, ReconcileError> {
    reconcile_with_progress(suggestions, target, catalog, |_| {}).await
}

/// Resolves suggestions in order with a two-phase search.
///
/// Each suggestion is first searched with exact field qualifiers, then with
/// plain keywords. Suggestions after the point where `target` tracks were
/// resolved are never searched. Soft search failures count as a miss for that
/// phase; a hard failure aborts the reconciliation.
pub async fn reconcile_with_progress<S, F>(
    suggestions: &[SuggestedSong],
    target: usize,
    catalog: &S,
    mut on_progress: F,
) -> Result<Reconciliation, ReconcileError>
where
    S: TrackSearch,
    F: FnMut(ReconcileProgress<'_>),
{
    let mut result = Reconciliation::default();

    for (position, song) in suggestions.iter().enumerate() {
        if result.resolved.len() >= target {
            info!(target_count = target, "Reconciliation target reached");
            break;
        }

        result.attempted += 1;

        let mut matched = search_phase(catalog, &exact_query(song))
            .await?
            .map(|hit| (hit, MatchPhase::Exact));

        if matched.is_none() {
            matched = search_phase(catalog, &free_text_query(song))
                .await?
                .map(|hit| (hit, MatchPhase::FreeText));
        }

        match matched {
            Some((hit, matched_by)) => {
                debug!(song = %song, phase = ?matched_by, "Suggestion resolved");
                result.resolved.push(ResolvedTrack {
                    uri: hit.uri,
                    id: hit.id,
                    name: hit.name,
                    matched_by,
                    suggestion: song.clone(),
                });
                if let Some(track) = result.resolved.last() {
                    on_progress(ReconcileProgress::Found {
                        position,
                        resolved: result.resolved.len(),
                        track,
                    });
                }
            }
            None => {
                debug!(song = %song, "Suggestion not found");
                result.not_found.push(song.clone());
                on_progress(ReconcileProgress::NotFound { position, song });
            }
        }
    }

    info!(
        resolved = result.resolved.len(),
        not_found = result.not_found.len(),
        attempted = result.attempted,
        "Reconciled suggestions"
    );
    Ok(result)
}

async fn search_phase<S: TrackSearch>(
    catalog: &S,
    query: &str,
) -> Result<Option<SearchHit>, ReconcileError> {
    match catalog.search_tracks(query, 1).await {
        LookupOutcome::Found(hits) => Ok(hits.into_iter().next()),
        LookupOutcome::Missing => Ok(None),
        LookupOutcome::SoftFailure(reason) => {
            debug!(%query, %reason, "Search failed");
            Ok(None)
        }
        LookupOutcome::HardFailure(reason) => Err(ReconcileError::Catalog(reason)),
    }
}
