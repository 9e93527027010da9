//! # Analysis Module
//!
//! Turns raw track items from any of the track-bearing endpoints into a
//! [`Report`]:
//!
//! ```text
//! raw items ─▶ sanitizer ─▶ clean tracks ─┬─▶ genres/artists (catalog lookups)
//!                                         ├─▶ popularity
//!                                         └─▶ decades
//!                                                  │
//!                                                  ▼
//!                                               Report
//! ```
//!
//! The sanitizer never fails; it drops items without an id and patches
//! everything else. An empty clean set or a hard catalog failure aborts the
//! run so no partial report is ever produced.

pub mod aggregate;
pub mod report;
pub mod sanitizer;

use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::catalog::ArtistGenres;

pub use aggregate::{
    ArtistLookupCache, GenreAnalysis, GenreStats, PopularityStats, Tally, analyze_genres,
    analyze_popularity, decade_distribution, release_decade,
};
pub use report::{
    GenreCount, Report, ReportContext, ReportParts, ReportStatistics, TopArtistEntry,
    TopTrackEntry,
};
pub use sanitizer::{RawShape, Sanitized, merge_by_id, sanitize_track, sanitize_tracks};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no valid tracks left after sanitization")]
    NoValidTracks,

    #[error("catalog rejected the request: {0}")]
    Catalog(String),
}

/// Runs the full analysis over a list of raw track items.
pub async fn run_analysis<C: ArtistGenres>(
    items: &[Value],
    context: ReportContext,
    catalog: &C,
) -> Result<Report, AnalysisError> {
    let sanitized = sanitize_tracks(items);
    analyze_tracks(sanitized, context, catalog).await
}

/// Runs the analysis over an already sanitized track set.
///
/// Used when tracks from several sources were merged before analysis.
pub async fn analyze_tracks<C: ArtistGenres>(
    sanitized: Sanitized,
    context: ReportContext,
    catalog: &C,
) -> Result<Report, AnalysisError> {
    let Sanitized {
        tracks,
        invalid,
        patched,
    } = sanitized;

    if tracks.is_empty() {
        return Err(AnalysisError::NoValidTracks);
    }

    info!(tracks = tracks.len(), source = %context.source, "Analyzing clean tracks");

    let mut cache = ArtistLookupCache::new();
    let genre_analysis = analyze_genres(&tracks, catalog, &mut cache).await?;
    let popularity = analyze_popularity(&tracks);
    let decades = decade_distribution(&tracks);

    Ok(Report::new(
        ReportParts {
            tracks: &tracks,
            genre_analysis,
            popularity,
            decades,
            invalid,
            patched,
        },
        context,
    ))
}
