use std::collections::BTreeMap;

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::{
    analysis::aggregate::{GenreAnalysis, PopularityStats},
    types::{Artist, Track},
};

/// Number of entries kept in each top-N projection of the report.
pub const REPORT_TOP_N: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreCount {
    pub genre: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopArtistEntry {
    pub name: String,
    pub popularity: u8,
    pub followers: u64,
    pub genres: Vec<String>,
}

impl From<&Artist> for TopArtistEntry {
    fn from(artist: &Artist) -> Self {
        Self {
            name: artist.name.clone(),
            popularity: artist.popularity.unwrap_or(0),
            followers: artist
                .followers
                .as_ref()
                .and_then(|f| f.total)
                .unwrap_or(0),
            genres: artist.genres.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopTrackEntry {
    pub name: String,
    pub artists: Vec<String>,
    pub album: String,
}

impl From<&Track> for TopTrackEntry {
    fn from(track: &Track) -> Self {
        Self {
            name: track.name.clone(),
            artists: track.artist_names(),
            album: track.album.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportStatistics {
    pub total_library_saved_tracks: u64,
    pub unique_genres: usize,
    pub unique_artists: usize,
    pub analyzed_tracks: usize,
    pub recent_tracks: usize,
    pub invalid_items: usize,
    pub patched_tracks: usize,
}

/// Context of an analysis run that does not come from the track set itself.
#[derive(Debug, Clone, Default)]
pub struct ReportContext {
    /// Where the tracks came from, e.g. `short_term` or `saved_library`
    pub source: String,
    pub user: String,
    pub saved_tracks_total: u64,
    pub recent_tracks: usize,
    /// Replaces the artist-counter projection, used for the top-items source
    pub top_artists: Option<Vec<TopArtistEntry>>,
}

/// Aggregate snapshot of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub timestamp: String,
    pub source: String,
    pub user: String,
    pub genres: Vec<GenreCount>,
    pub genre_by_artist: BTreeMap<String, Vec<String>>,
    pub top_artists: Vec<TopArtistEntry>,
    pub top_tracks: Vec<TopTrackEntry>,
    pub popularity_stats: Option<PopularityStats>,
    pub decade_distribution: BTreeMap<String, u32>,
    pub statistics: ReportStatistics,
}

pub struct ReportParts<'a> {
    pub tracks: &'a [Track],
    pub genre_analysis: GenreAnalysis,
    pub popularity: Option<PopularityStats>,
    pub decades: BTreeMap<String, u32>,
    pub invalid: usize,
    pub patched: usize,
}

impl Report {
    pub fn new(parts: ReportParts<'_>, context: ReportContext) -> Self {
        let GenreAnalysis {
            genres, artists, ..
        } = parts.genre_analysis;

        let top_artists = context.top_artists.unwrap_or_else(|| {
            artists
                .most_common(REPORT_TOP_N)
                .into_iter()
                .map(|(name, count)| TopArtistEntry {
                    name: format!("{name} ({count} tracks)"),
                    popularity: 0,
                    followers: 0,
                    genres: Vec::new(),
                })
                .collect()
        });

        let genre_by_artist = genres
            .artists_by_genre
            .iter()
            .map(|(genre, names)| (genre.clone(), names.iter().cloned().collect()))
            .collect();

        Self {
            timestamp: Local::now().to_rfc3339(),
            source: context.source,
            user: context.user,
            genres: genres
                .counts
                .most_common(REPORT_TOP_N)
                .into_iter()
                .map(|(genre, count)| GenreCount { genre, count })
                .collect(),
            genre_by_artist,
            top_artists,
            top_tracks: parts
                .tracks
                .iter()
                .take(REPORT_TOP_N)
                .map(TopTrackEntry::from)
                .collect(),
            popularity_stats: parts.popularity,
            decade_distribution: parts.decades,
            statistics: ReportStatistics {
                total_library_saved_tracks: context.saved_tracks_total,
                unique_genres: genres.counts.len(),
                unique_artists: artists.len(),
                analyzed_tracks: parts.tracks.len(),
                recent_tracks: context.recent_tracks,
                invalid_items: parts.invalid,
                patched_tracks: parts.patched,
            },
        }
    }

    pub fn top_genres(&self, n: usize) -> Vec<String> {
        self.genres.iter().take(n).map(|g| g.genre.clone()).collect()
    }

    pub fn dominant_genre(&self) -> Option<&GenreCount> {
        self.genres.first()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
