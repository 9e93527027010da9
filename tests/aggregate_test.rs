use std::{cell::RefCell, collections::HashMap};

use serde_json::json;
use sporlyze::{
    analysis::{
        AnalysisError, ArtistLookupCache, ReportContext, analyze_genres, analyze_popularity,
        decade_distribution, release_decade, run_analysis, sanitize_tracks,
    },
    catalog::{ArtistGenres, LookupOutcome},
    types::{Track, TrackAlbum, TrackArtist},
};

/// In-memory genre catalog recording every lookup.
#[derive(Default)]
struct MockCatalog {
    genres: HashMap<String, LookupOutcome<Vec<String>>>,
    calls: RefCell<Vec<String>>,
}

impl MockCatalog {
    fn with(mut self, artist_id: &str, outcome: LookupOutcome<Vec<String>>) -> Self {
        self.genres.insert(artist_id.to_string(), outcome);
        self
    }

    fn found(self, artist_id: &str, genres: &[&str]) -> Self {
        let genres = genres.iter().map(|g| g.to_string()).collect();
        self.with(artist_id, LookupOutcome::Found(genres))
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl ArtistGenres for MockCatalog {
    async fn artist_genres(&self, artist_id: &str) -> LookupOutcome<Vec<String>> {
        self.calls.borrow_mut().push(artist_id.to_string());
        self.genres
            .get(artist_id)
            .cloned()
            .unwrap_or(LookupOutcome::Missing)
    }
}

fn track(id: &str, artists: &[(&str, &str)], popularity: u8, release_date: &str) -> Track {
    Track {
        id: id.to_string(),
        name: format!("Song {id}"),
        artists: artists
            .iter()
            .map(|(id, name)| TrackArtist {
                id: Some(id.to_string()),
                name: name.to_string(),
            })
            .collect(),
        album: TrackAlbum {
            name: "Album".to_string(),
            release_date: release_date.to_string(),
        },
        popularity,
        uri: None,
        duration_ms: None,
    }
}

#[tokio::test]
async fn test_genre_lookup_once_per_artist() {
    let catalog = MockCatalog::default()
        .found("a1", &["rock", "indie"])
        .found("a2", &["rock"]);
    let tracks = vec![
        track("t1", &[("a1", "Alpha")], 50, "2001"),
        track("t2", &[("a1", "Alpha"), ("a2", "Beta")], 50, "2001"),
        track("t3", &[("a1", "Alpha")], 50, "2001"),
    ];

    let mut cache = ArtistLookupCache::new();
    let analysis = analyze_genres(&tracks, &catalog, &mut cache)
        .await
        .expect("analysis succeeds");

    assert_eq!(catalog.calls(), vec!["a1", "a2"]);
    assert_eq!(analysis.lookups, 2);
    assert_eq!(cache.len(), 2);
    assert!(cache.contains("a1") && cache.contains("a2"));

    assert_eq!(analysis.artists.get("Alpha"), 3);
    assert_eq!(analysis.artists.get("Beta"), 1);
    assert_eq!(analysis.genres.counts.get("rock"), 2);
    assert_eq!(analysis.genres.counts.get("indie"), 1);
    assert_eq!(analysis.genres.contributors("rock"), vec!["Alpha", "Beta"]);
}

#[tokio::test]
async fn test_cache_is_owned_by_the_caller() {
    let catalog = MockCatalog::default().found("a1", &["jazz"]);
    let tracks = vec![track("t1", &[("a1", "Alpha")], 10, "1960")];

    let mut shared = ArtistLookupCache::new();
    analyze_genres(&tracks, &catalog, &mut shared).await.expect("first run");
    let second = analyze_genres(&tracks, &catalog, &mut shared)
        .await
        .expect("second run");
    assert_eq!(second.lookups, 0);

    let mut fresh = ArtistLookupCache::new();
    let third = analyze_genres(&tracks, &catalog, &mut fresh)
        .await
        .expect("third run");
    assert_eq!(third.lookups, 1);
    assert_eq!(catalog.calls().len(), 2);
}

#[tokio::test]
async fn test_soft_failures_are_skipped() {
    let catalog = MockCatalog::default()
        .with("a1", LookupOutcome::SoftFailure("timeout".to_string()))
        .found("a2", &["pop"]);
    let tracks = vec![
        track("t1", &[("a1", "Alpha")], 10, "1990"),
        track("t2", &[("a2", "Beta"), ("a3", "Gamma")], 10, "1990"),
    ];

    let mut cache = ArtistLookupCache::new();
    let analysis = analyze_genres(&tracks, &catalog, &mut cache)
        .await
        .expect("soft failures do not abort");

    assert_eq!(analysis.genres.counts.len(), 1);
    assert_eq!(analysis.genres.counts.get("pop"), 1);
    assert_eq!(analysis.artists.len(), 3);
}

#[tokio::test]
async fn test_hard_failure_aborts() {
    let catalog = MockCatalog::default()
        .with("a1", LookupOutcome::HardFailure("401".to_string()))
        .found("a2", &["pop"]);
    let tracks = vec![
        track("t1", &[("a1", "Alpha")], 10, "1990"),
        track("t2", &[("a2", "Beta")], 10, "1990"),
    ];

    let mut cache = ArtistLookupCache::new();
    let result = analyze_genres(&tracks, &catalog, &mut cache).await;

    assert!(matches!(result, Err(AnalysisError::Catalog(_))));
    assert_eq!(catalog.calls(), vec!["a1"]);
}

#[tokio::test]
async fn test_artists_without_id_are_not_looked_up() {
    let catalog = MockCatalog::default();
    let tracks = sanitize_tracks(&[json!({"id": "t1"})]).tracks;

    let mut cache = ArtistLookupCache::new();
    let analysis = analyze_genres(&tracks, &catalog, &mut cache)
        .await
        .expect("analysis succeeds");

    assert!(catalog.calls().is_empty());
    assert!(analysis.artists.is_empty());
}

#[test]
fn test_popularity_stats() {
    let tracks = vec![
        track("t1", &[], 10, ""),
        track("t2", &[], 0, ""),
        track("t3", &[], 30, ""),
        track("t4", &[], 20, ""),
        track("t5", &[], 60, ""),
    ];

    let stats = analyze_popularity(&tracks).expect("has popularity data");

    assert_eq!(stats.min, 10);
    assert_eq!(stats.max, 60);
    assert!((stats.avg - 30.0).abs() < f64::EPSILON);
    assert!((stats.median - 25.0).abs() < f64::EPSILON);
}

#[test]
fn test_popularity_absent_without_nonzero_values() {
    let tracks = vec![track("t1", &[], 0, ""), track("t2", &[], 0, "")];
    assert!(analyze_popularity(&tracks).is_none());
    assert!(analyze_popularity(&[]).is_none());
}

#[test]
fn test_release_decade() {
    assert_eq!(release_decade("1994-03-01"), Some(1990));
    assert_eq!(release_decade("2000"), Some(2000));
    assert_eq!(release_decade("2019-12"), Some(2010));
    assert_eq!(release_decade("199"), None);
    assert_eq!(release_decade(""), None);
    assert_eq!(release_decade("abcd-01-01"), None);
}

#[test]
fn test_decade_distribution_skips_bad_dates() {
    let tracks = vec![
        track("t1", &[], 1, "1994-03-01"),
        track("t2", &[], 1, "1999"),
        track("t3", &[], 1, "2005-01-01"),
        track("t4", &[], 1, "19"),
        track("t5", &[], 1, "unknown"),
        track("t6", &[], 1, ""),
    ];

    let decades = decade_distribution(&tracks);

    assert_eq!(decades.len(), 2);
    assert_eq!(decades.get("1990's"), Some(&2));
    assert_eq!(decades.get("2000's"), Some(&1));
}

#[tokio::test]
async fn test_report_from_wrapped_item() {
    let items = vec![json!({
        "track": {"id": "t1", "popularity": 80, "album": {"release_date": "1994-03-01"}}
    })];

    let report = run_analysis(&items, ReportContext::default(), &MockCatalog::default())
        .await
        .expect("report is built");

    assert_eq!(report.decade_distribution.len(), 1);
    assert_eq!(report.decade_distribution.get("1990's"), Some(&1));
    assert_eq!(report.statistics.analyzed_tracks, 1);
    assert_eq!(report.statistics.patched_tracks, 1);
    assert!(report.genres.is_empty());
}

#[tokio::test]
async fn test_no_valid_tracks_is_an_error() {
    let result = run_analysis(&[json!(true)], ReportContext::default(), &MockCatalog::default()).await;
    assert!(matches!(result, Err(AnalysisError::NoValidTracks)));
}

#[tokio::test]
async fn test_report_contents() {
    let catalog = MockCatalog::default()
        .found("a1", &["rock", "grunge"])
        .found("a2", &["rock"]);
    let items = vec![
        json!({"id": "t1", "name": "One", "popularity": 40,
               "artists": [{"id": "a1", "name": "Alpha"}],
               "album": {"name": "A", "release_date": "1991-09-24"}}),
        json!({"track": {"id": "t2", "name": "Two", "popularity": 0,
               "artists": [{"id": "a2", "name": "Beta"}],
               "album": {"name": "B", "release_date": "2010"}}}),
        json!("garbage"),
    ];
    let context = ReportContext {
        source: "saved_library".to_string(),
        user: "listener".to_string(),
        saved_tracks_total: 120,
        recent_tracks: 50,
        top_artists: None,
    };

    let report = run_analysis(&items, context, &catalog).await.expect("report");

    assert_eq!(report.source, "saved_library");
    assert_eq!(report.user, "listener");
    assert_eq!(report.genres[0].genre, "rock");
    assert_eq!(report.genres[0].count, 2);
    assert_eq!(report.top_genres(5), vec!["rock", "grunge"]);
    assert_eq!(report.genre_by_artist["rock"], vec!["Alpha", "Beta"]);
    assert_eq!(report.top_artists[0].name, "Alpha (1 tracks)");
    assert_eq!(report.top_tracks.len(), 2);
    assert_eq!(report.top_tracks[0].artists, vec!["Alpha"]);

    let popularity = report.popularity_stats.expect("one nonzero value");
    assert_eq!(popularity.max, 40);
    assert_eq!(popularity.min, 40);

    assert_eq!(report.statistics.total_library_saved_tracks, 120);
    assert_eq!(report.statistics.recent_tracks, 50);
    assert_eq!(report.statistics.invalid_items, 1);
    assert_eq!(report.statistics.unique_genres, 2);
    assert_eq!(report.statistics.unique_artists, 2);
}
