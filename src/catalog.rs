//! Narrow catalog interfaces consumed by the analysis and recommendation core.
//!
//! The aggregator only needs to know an artist's genres and the reconciler only
//! needs to run a track search. Both are expressed as traits so the core can be
//! driven by the Spotify client in production and by in-memory catalogs in tests.

use crate::types::SearchHit;

/// Typed result of a single external lookup.
///
/// Soft failures are per-item problems (a timeout, a server error, a malformed body)
/// that callers treat as "no data for this item". Hard failures invalidate the
/// whole run, such as a rejected access token.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome<T> {
    Found(T),
    Missing,
    SoftFailure(String),
    HardFailure(String),
}

impl<T> LookupOutcome<Vec<T>> {
    /// Reports an empty result list as [`LookupOutcome::Missing`].
    pub fn non_empty(self) -> Self {
        match self {
            LookupOutcome::Found(items) if items.is_empty() => LookupOutcome::Missing,
            outcome => outcome,
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait ArtistGenres {
    /// Looks up the genres the catalog associates with an artist.
    async fn artist_genres(&self, artist_id: &str) -> LookupOutcome<Vec<String>>;
}

#[allow(async_fn_in_trait)]
pub trait TrackSearch {
    /// Runs a catalog track search and returns at most `limit` hits.
    ///
    /// An empty result set is reported as [`LookupOutcome::Missing`].
    async fn search_tracks(&self, query: &str, limit: u32) -> LookupOutcome<Vec<SearchHit>>;
}
