use std::{path::PathBuf, time::Duration};

use clap::ValueEnum;
use serde_json::Value;
use tabled::Table;

use crate::{
    analysis::{self, AnalysisError, Report, ReportContext, Sanitized, TopArtistEntry},
    error,
    gemini::{self, GeminiClient, NarrativeError},
    info,
    management::ReportManager,
    spotify::{CatalogError, SpotifyCatalog},
    success,
    types::{
        ArtistTableRow, DecadeTableRow, GenreTableRow, TimeRange, TrackTableRow, UserProfile,
    },
    utils, warning,
};

/// Page size of the top-items and recently-played endpoints.
const TOP_LIMIT: u32 = 50;

/// Rows shown per table; the report file keeps the full top lists.
const TABLE_ROWS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// Top tracks of the chosen period
    Top,
    /// Recently played tracks
    Recent,
    /// Saved library
    Library,
    /// A single playlist (requires --playlist)
    Playlist,
    /// Saved library merged with every owned or collaborative playlist
    Everything,
}

#[derive(Debug, Clone)]
pub enum Source {
    Top(TimeRange),
    Recent,
    Library,
    Playlist(String),
    Everything,
}

impl Source {
    pub fn label(&self) -> String {
        self.titled(None)
    }

    /// Like [`Source::label`], but names a playlist source by `playlist_name`
    /// when one is known.
    pub fn titled(&self, playlist_name: Option<&str>) -> String {
        match self {
            Source::Top(range) => range.as_str().to_string(),
            Source::Recent => "recently_played".to_string(),
            Source::Library => "saved_library".to_string(),
            Source::Playlist(id) => match playlist_name.map(str::trim) {
                Some(name) if !name.is_empty() => format!("playlist:{name}"),
                _ => format!("playlist:{id}"),
            },
            Source::Everything => "library_and_playlists".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub source: Source,
    pub output: Option<PathBuf>,
    pub insights: bool,
    pub recommend: bool,
    pub playlist_name: Option<String>,
}

pub async fn analyze(opts: AnalyzeOptions) {
    let catalog = match SpotifyCatalog::load().await {
        Ok(c) => c,
        Err(e) => error!("{}", e),
    };

    let user = match catalog.current_user().await {
        Ok(u) => u,
        Err(e) => error!("Failed to fetch user profile: {}", e),
    };

    info!("Analyzing {} for {}", opts.source.label(), user.name());

    let (sanitized, context) = match collect(&catalog, &opts.source, &user).await {
        Ok(collected) => collected,
        Err(e) => error!("Failed to fetch tracks: {}", e),
    };

    let pb = utils::spinner("Looking up artist genres...");
    let result = analysis::analyze_tracks(sanitized, context, &catalog).await;
    pb.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(AnalysisError::NoValidTracks) => {
            error!("No valid tracks found. Nothing to analyze.")
        }
        Err(e) => error!("Analysis failed: {}", e),
    };

    print_report(&report);

    let manager = match &opts.output {
        Some(dir) => ReportManager::with_dir(dir),
        None => ReportManager::new(),
    };
    match manager.save(&report).await {
        Ok(path) => success!("Report saved to {}", path.display()),
        Err(e) => warning!("Failed to save report: {}", e),
    }

    if !opts.insights && !opts.recommend {
        return;
    }

    let gemini = match GeminiClient::from_env() {
        Ok(g) => g,
        Err(e) => {
            warning!("Skipping AI features: {}", e);
            return;
        }
    };

    if opts.insights {
        print_insights(&gemini, &report).await;
    }

    if opts.recommend {
        super::recommend::recommend_playlist(
            &catalog,
            &gemini,
            &report,
            &user,
            opts.playlist_name.as_deref(),
        )
        .await;
    }
}

/// Fetches the raw items of a source, sanitizes them and gathers the report
/// context (library size, recent plays, top artists).
///
/// Failures of the analyzed source itself are returned. The extra context is
/// fetched softly and only fatal errors of it are returned.
pub async fn collect(
    catalog: &SpotifyCatalog,
    source: &Source,
    user: &UserProfile,
) -> Result<(Sanitized, ReportContext), CatalogError> {
    let mut context = ReportContext {
        source: source.label(),
        user: user.name().to_string(),
        ..Default::default()
    };

    if !matches!(source, Source::Recent) {
        if let Some(recent) = soft(catalog.recently_played(TOP_LIMIT).await, "recently played")? {
            context.recent_tracks = recent.len();
        }
    }
    context.saved_tracks_total = soft(catalog.saved_tracks_total().await, "library size")?
        .unwrap_or(0);

    let sanitized = match source {
        Source::Top(range) => {
            let items = catalog.top_tracks(*range, TOP_LIMIT).await?;
            if let Some(artists) = soft(catalog.top_artists(*range, TOP_LIMIT).await, "top artists")? {
                context.top_artists = Some(artists.iter().map(TopArtistEntry::from).collect());
            }
            analysis::sanitize_tracks(&items)
        }
        Source::Recent => {
            let items = catalog.recently_played(TOP_LIMIT).await?;
            context.recent_tracks = items.len();
            analysis::sanitize_tracks(&items)
        }
        Source::Library => analysis::sanitize_tracks(&fetch_library(catalog).await?),
        Source::Playlist(id) => {
            let name = soft(catalog.playlist_name(id).await, "playlist name")?;
            context.source = source.titled(name.as_deref());
            analysis::sanitize_tracks(&catalog.playlist_items(id).await?)
        }
        Source::Everything => {
            let mut sources = vec![analysis::sanitize_tracks(&fetch_library(catalog).await?)];
            for playlist in catalog.user_playlists(&user.id).await? {
                match catalog.playlist_items(&playlist.id).await {
                    Ok(items) => sources.push(analysis::sanitize_tracks(&items)),
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => warning!("Skipping playlist {}: {}", playlist.name, e),
                }
            }
            merge_sources(sources)
        }
    };

    success!(
        "Fetched {} tracks ({} invalid, {} patched)",
        sanitized.tracks.len(),
        sanitized.invalid,
        sanitized.patched
    );
    Ok((sanitized, context))
}

async fn fetch_library(catalog: &SpotifyCatalog) -> Result<Vec<Value>, CatalogError> {
    utils::retry_on_error(3, Duration::from_secs(2), || catalog.saved_tracks()).await
}

/// Merges the sanitized sources by track id and sums their counters.
fn merge_sources(sources: Vec<Sanitized>) -> Sanitized {
    let invalid = sources.iter().map(|s| s.invalid).sum();
    let patched = sources.iter().map(|s| s.patched).sum();
    let tracks = analysis::merge_by_id(sources.into_iter().map(|s| s.tracks));

    Sanitized {
        tracks,
        invalid,
        patched,
    }
}

/// Turns a non-fatal catalog failure into a warning and `None`.
fn soft<T>(result: Result<T, CatalogError>, what: &str) -> Result<Option<T>, CatalogError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            warning!("Could not fetch {}: {}", what, e);
            Ok(None)
        }
    }
}

fn print_report(report: &Report) {
    let genre_total: u32 = report.genres.iter().map(|g| g.count).sum();
    if report.genres.is_empty() {
        warning!("No genre information available.");
    } else {
        let rows: Vec<GenreTableRow> = report
            .genres
            .iter()
            .take(TABLE_ROWS)
            .enumerate()
            .map(|(i, g)| GenreTableRow {
                rank: i + 1,
                genre: g.genre.clone(),
                count: g.count,
                share: utils::share(g.count, genre_total),
                artists: report
                    .genre_by_artist
                    .get(&g.genre)
                    .map(|names| utils::truncate(&names.join(", "), 60))
                    .unwrap_or_default(),
            })
            .collect();
        info!("Top genres");
        println!("{}", Table::new(rows));
    }

    let artist_rows: Vec<ArtistTableRow> = report
        .top_artists
        .iter()
        .take(TABLE_ROWS)
        .enumerate()
        .map(|(i, a)| ArtistTableRow {
            rank: i + 1,
            name: a.name.clone(),
            popularity: if a.popularity > 0 {
                a.popularity.to_string()
            } else {
                "-".to_string()
            },
            genres: utils::truncate(&a.genres.join(", "), 40),
        })
        .collect();
    info!("Top artists");
    println!("{}", Table::new(artist_rows));

    let track_rows: Vec<TrackTableRow> = report
        .top_tracks
        .iter()
        .take(TABLE_ROWS)
        .enumerate()
        .map(|(i, t)| TrackTableRow {
            rank: i + 1,
            name: t.name.clone(),
            artists: t.artists.join(", "),
            album: t.album.clone(),
        })
        .collect();
    info!("Top tracks");
    println!("{}", Table::new(track_rows));

    if !report.decade_distribution.is_empty() {
        let total: u32 = report.decade_distribution.values().sum();
        let rows: Vec<DecadeTableRow> = report
            .decade_distribution
            .iter()
            .map(|(decade, tracks)| DecadeTableRow {
                decade: decade.clone(),
                tracks: *tracks,
                share: utils::share(*tracks, total),
            })
            .collect();
        info!("Decades");
        println!("{}", Table::new(rows));
    }

    match &report.popularity_stats {
        Some(p) => info!(
            "Popularity: avg {:.1}, median {:.1}, min {}, max {}",
            p.avg, p.median, p.min, p.max
        ),
        None => info!("Popularity: no data"),
    }

    let s = &report.statistics;
    info!(
        "{} tracks analyzed, {} unique artists, {} unique genres, {} saved in library, {} recently played",
        s.analyzed_tracks, s.unique_artists, s.unique_genres, s.total_library_saved_tracks, s.recent_tracks
    );
    if s.invalid_items > 0 || s.patched_tracks > 0 {
        info!(
            "{} invalid items dropped, {} tracks patched",
            s.invalid_items, s.patched_tracks
        );
    }
}

async fn print_insights(gemini: &GeminiClient, report: &Report) {
    let pb = utils::spinner(&format!("Asking {} for insights...", gemini.model()));
    let result = gemini::generate_insights(gemini, report).await;
    pb.finish_and_clear();

    match result {
        Ok(narrative) => {
            success!("Insights");
            println!("\n{}\n", narrative.text.trim());
            if let Some(usage) = narrative.usage {
                info!(
                    "Tokens: {} prompt, {} response, {} total",
                    usage.prompt_tokens, usage.response_tokens, usage.total_tokens
                );
            }
        }
        Err(NarrativeError::Blocked { reason }) => {
            warning!("The model declined to comment on this report ({})", reason)
        }
        Err(e) => warning!("Failed to generate insights: {}", e),
    }
}
