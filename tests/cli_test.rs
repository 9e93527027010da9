use axum::{Json, Router, http::StatusCode, routing::get};
use chrono::Utc;
use serde_json::{Value, json};
use sporlyze::{
    cli::{Source, collect, suggestion_rows},
    management::TokenManager,
    recommend::SuggestedSong,
    spotify::{CatalogError, SpotifyCatalog},
    types::{TimeRange, Token, UserProfile},
};

fn full_track(id: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Song {id}"),
        "uri": format!("spotify:track:{id}"),
        "popularity": 40,
        "duration_ms": 200000,
        "artists": [{"id": "a1", "name": "Artist One"}],
        "album": {"name": "Album", "release_date": "1995-05-01"}
    })
}

fn page(items: Vec<Value>) -> Json<Value> {
    let total = items.len();
    Json(json!({"items": items, "next": null, "total": total}))
}

fn user() -> UserProfile {
    UserProfile {
        id: "user1".to_string(),
        display_name: Some("Listener".to_string()),
    }
}

/// Serves `app` on a local port and returns a catalog pointed at it.
async fn catalog_for(app: Router) -> SpotifyCatalog {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let token = Token {
        access_token: "access".to_string(),
        refresh_token: "refresh".to_string(),
        scope: String::new(),
        expires_in: 3600,
        obtained_at: Utc::now().timestamp() as u64,
    };
    SpotifyCatalog::with_api_url(TokenManager::new(token), format!("http://{addr}"))
}

#[test]
fn test_source_labels() {
    assert_eq!(Source::Top(TimeRange::ShortTerm).label(), "short_term");
    assert_eq!(Source::Recent.label(), "recently_played");
    assert_eq!(Source::Library.label(), "saved_library");
    assert_eq!(Source::Everything.label(), "library_and_playlists");
    assert_eq!(Source::Playlist("p1".to_string()).label(), "playlist:p1");
}

#[test]
fn test_playlist_label_prefers_name() {
    let source = Source::Playlist("p1".to_string());

    assert_eq!(source.titled(Some("Road Trip")), "playlist:Road Trip");
    assert_eq!(source.titled(Some("  ")), "playlist:p1");
    assert_eq!(source.titled(None), "playlist:p1");
    assert_eq!(Source::Library.titled(Some("Road Trip")), "saved_library");
}

#[test]
fn test_suggestion_rows_are_numbered() {
    let songs = vec![
        SuggestedSong::new("Slowdive", "Alison"),
        SuggestedSong::new("Ride", "Vapour Trail"),
    ];

    let rows = suggestion_rows(&songs);

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].rank, 1);
    assert_eq!(rows[0].artist, "Slowdive");
    assert_eq!(rows[1].rank, 2);
    assert_eq!(rows[1].track, "Vapour Trail");
}

#[tokio::test]
async fn test_collect_recent_propagates_fetch_error() {
    let app = Router::new()
        .route(
            "/me/player/recently-played",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        )
        .route("/me/tracks", get(|| async { page(Vec::new()) }));
    let catalog = catalog_for(app).await;

    let result = collect(&catalog, &Source::Recent, &user()).await;

    match result {
        Err(CatalogError::Status { status, .. }) => assert_eq!(status, 500),
        Err(e) => panic!("unexpected error: {e}"),
        Ok(_) => panic!("recent source should fail"),
    }
}

#[tokio::test]
async fn test_collect_recent_counts_fetched_items() {
    let app = Router::new()
        .route(
            "/me/player/recently-played",
            get(|| async {
                page(vec![
                    json!({"track": full_track("t1"), "played_at": "2024-01-01T10:00:00Z"}),
                    json!({"track": full_track("t2"), "played_at": "2024-01-01T10:05:00Z"}),
                ])
            }),
        )
        .route("/me/tracks", get(|| async { page(Vec::new()) }));
    let catalog = catalog_for(app).await;

    let (sanitized, context) = collect(&catalog, &Source::Recent, &user()).await.unwrap();

    assert_eq!(sanitized.tracks.len(), 2);
    assert_eq!(context.recent_tracks, 2);
    assert_eq!(context.source, "recently_played");
}

#[tokio::test]
async fn test_collect_top_tolerates_failing_context() {
    let app = Router::new()
        .route(
            "/me/player/recently-played",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        )
        .route("/me/tracks", get(|| async { StatusCode::SERVICE_UNAVAILABLE }))
        .route("/me/top/tracks", get(|| async { page(vec![full_track("t1")]) }))
        .route("/me/top/artists", get(|| async { StatusCode::NOT_FOUND }));
    let catalog = catalog_for(app).await;

    let (sanitized, context) = collect(&catalog, &Source::Top(TimeRange::MediumTerm), &user())
        .await
        .unwrap();

    assert_eq!(sanitized.tracks.len(), 1);
    assert_eq!(context.recent_tracks, 0);
    assert_eq!(context.saved_tracks_total, 0);
    assert!(context.top_artists.is_none());
    assert_eq!(context.user, "Listener");
}

#[tokio::test]
async fn test_collect_playlist_uses_playlist_name() {
    let app = Router::new()
        .route("/me/player/recently-played", get(|| async { page(Vec::new()) }))
        .route("/me/tracks", get(|| async { page(Vec::new()) }))
        .route(
            "/playlists/{id}",
            get(|| async { Json(json!({"name": "Road Trip"})) }),
        )
        .route(
            "/playlists/{id}/tracks",
            get(|| async { page(vec![json!({"track": full_track("t1")})]) }),
        );
    let catalog = catalog_for(app).await;

    let (sanitized, context) = collect(&catalog, &Source::Playlist("p1".to_string()), &user())
        .await
        .unwrap();

    assert_eq!(sanitized.tracks.len(), 1);
    assert_eq!(context.source, "playlist:Road Trip");
}

#[tokio::test]
async fn test_collect_playlist_falls_back_to_id() {
    let app = Router::new()
        .route("/me/player/recently-played", get(|| async { page(Vec::new()) }))
        .route("/me/tracks", get(|| async { page(Vec::new()) }))
        .route(
            "/playlists/{id}/tracks",
            get(|| async { page(vec![json!({"track": full_track("t1")})]) }),
        );
    let catalog = catalog_for(app).await;

    let (_, context) = collect(&catalog, &Source::Playlist("p1".to_string()), &user())
        .await
        .unwrap();

    assert_eq!(context.source, "playlist:p1");
}
