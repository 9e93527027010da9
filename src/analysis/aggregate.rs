use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    analysis::AnalysisError,
    catalog::{ArtistGenres, LookupOutcome},
    types::Track,
};

/// Insertion-ordered occurrence counter.
///
/// Ties in [`Tally::most_common`] keep the order in which keys were first
/// counted, so results are deterministic for identical input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tally {
    entries: Vec<(String, u32)>,
    index: HashMap<String, usize>,
}

impl Tally {
    pub fn add(&mut self, key: &str) {
        match self.index.get(key) {
            Some(&position) => self.entries[position].1 += 1,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), 1));
            }
        }
    }

    pub fn get(&self, key: &str) -> u32 {
        self.index
            .get(key)
            .map(|&position| self.entries[position].1)
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn most_common(&self, n: usize) -> Vec<(String, u32)> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted.truncate(n);
        sorted
    }
}

/// Artist ids whose genres were already requested during one aggregation run.
///
/// Owned by the caller and passed into [`analyze_genres`], so two runs never
/// share lookups unless the caller hands them the same cache.
#[derive(Debug, Clone, Default)]
pub struct ArtistLookupCache {
    processed: HashSet<String>,
}

impl ArtistLookupCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, artist_id: &str) -> bool {
        self.processed.contains(artist_id)
    }

    /// Marks an id as processed; returns `false` if it already was.
    pub fn insert(&mut self, artist_id: &str) -> bool {
        self.processed.insert(artist_id.to_string())
    }

    pub fn len(&self) -> usize {
        self.processed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processed.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenreStats {
    pub counts: Tally,
    pub artists_by_genre: BTreeMap<String, BTreeSet<String>>,
}

impl GenreStats {
    fn record(&mut self, genre: &str, artist_name: &str) {
        self.counts.add(genre);
        self.artists_by_genre
            .entry(genre.to_string())
            .or_default()
            .insert(artist_name.to_string());
    }

    pub fn contributors(&self, genre: &str) -> Vec<String> {
        self.artists_by_genre
            .get(genre)
            .map(|artists| artists.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenreAnalysis {
    pub genres: GenreStats,
    pub artists: Tally,
    /// Number of external genre lookups issued
    pub lookups: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopularityStats {
    pub avg: f64,
    pub max: u8,
    pub min: u8,
    pub median: f64,
}

/// Counts artists and genres over a sanitized track set.
///
/// Every artist reference with an id is counted, but the catalog is asked for
/// an artist's genres at most once per cache. Missing data and soft failures
/// skip the artist; a hard failure aborts the analysis.
pub async fn analyze_genres<C: ArtistGenres>(
    tracks: &[Track],
    catalog: &C,
    cache: &mut ArtistLookupCache,
) -> Result<GenreAnalysis, AnalysisError> {
    let mut analysis = GenreAnalysis::default();

    for track in tracks {
        for artist in &track.artists {
            let Some(artist_id) = artist.id.as_deref().filter(|id| !id.is_empty()) else {
                continue;
            };

            analysis.artists.add(&artist.name);

            if !cache.insert(artist_id) {
                continue;
            }

            analysis.lookups += 1;
            match catalog.artist_genres(artist_id).await {
                LookupOutcome::Found(genres) => {
                    for genre in genres {
                        analysis.genres.record(&genre, &artist.name);
                    }
                }
                LookupOutcome::Missing => {
                    debug!(artist = %artist.name, "No genre data for artist");
                }
                LookupOutcome::SoftFailure(reason) => {
                    debug!(artist = %artist.name, %reason, "Could not fetch artist info");
                }
                LookupOutcome::HardFailure(reason) => {
                    return Err(AnalysisError::Catalog(reason));
                }
            }
        }
    }

    info!(
        genres = analysis.genres.counts.len(),
        artists = analysis.artists.len(),
        lookups = analysis.lookups,
        "Analyzed genres"
    );
    Ok(analysis)
}

/// Computes popularity statistics over tracks with a nonzero popularity.
///
/// Returns `None` when no track carries popularity data, which is distinct
/// from data that averages out low.
pub fn analyze_popularity(tracks: &[Track]) -> Option<PopularityStats> {
    let mut values: Vec<u8> = tracks
        .iter()
        .map(|t| t.popularity)
        .filter(|p| *p > 0)
        .collect();

    if values.is_empty() {
        warn!("No popularity data available");
        return None;
    }

    values.sort_unstable();
    let len = values.len();
    let sum: u32 = values.iter().map(|v| *v as u32).sum();
    let median = if len % 2 == 1 {
        values[len / 2] as f64
    } else {
        (values[len / 2 - 1] as f64 + values[len / 2] as f64) / 2.0
    };

    let stats = PopularityStats {
        avg: sum as f64 / len as f64,
        max: values[len - 1],
        min: values[0],
        median,
    };

    info!(
        avg = stats.avg,
        min = stats.min,
        max = stats.max,
        "Computed popularity stats"
    );
    Some(stats)
}

/// Buckets tracks by the decade of their album release year.
///
/// Release dates shorter than four characters or with a non-numeric year are
/// skipped rather than defaulted.
pub fn decade_distribution(tracks: &[Track]) -> BTreeMap<String, u32> {
    let mut decades: BTreeMap<String, u32> = BTreeMap::new();

    for track in tracks {
        if let Some(decade) = release_decade(&track.album.release_date) {
            *decades.entry(decade_label(decade)).or_insert(0) += 1;
        }
    }

    info!(decades = decades.len(), "Computed decade distribution");
    decades
}

/// Extracts the decade from a release date such as `1994-03-01` or `1994`.
pub fn release_decade(release_date: &str) -> Option<i32> {
    if release_date.chars().count() < 4 {
        return None;
    }

    let year_part: String = release_date.chars().take(4).collect();
    let year = year_part.trim().parse::<i32>().ok()?;
    Some(year.div_euclid(10) * 10)
}

pub fn decade_label(decade: i32) -> String {
    format!("{decade}'s")
}
