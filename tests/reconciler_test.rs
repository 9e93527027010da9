use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
};

use sporlyze::{
    catalog::{LookupOutcome, TrackSearch},
    recommend::{
        MatchPhase, ReconcileError, ReconcileProgress, SuggestedSong, exact_query,
        free_text_query, reconcile, reconcile_with_progress,
    },
    types::SearchHit,
};

/// Search catalog answering from fixed query results and recording every query.
#[derive(Default)]
struct MockSearch {
    hits: HashMap<String, LookupOutcome<Vec<SearchHit>>>,
    queries: RefCell<Vec<String>>,
}

impl MockSearch {
    fn hit(mut self, query: String, id: &str) -> Self {
        let hit = SearchHit {
            id: id.to_string(),
            name: format!("Track {id}"),
            uri: format!("spotify:track:{id}"),
            artists: Vec::new(),
        };
        self.hits.insert(query, LookupOutcome::Found(vec![hit]));
        self
    }

    fn outcome(mut self, query: String, outcome: LookupOutcome<Vec<SearchHit>>) -> Self {
        self.hits.insert(query, outcome);
        self
    }

    fn queries(&self) -> Vec<String> {
        self.queries.borrow().clone()
    }
}

impl TrackSearch for MockSearch {
    async fn search_tracks(&self, query: &str, limit: u32) -> LookupOutcome<Vec<SearchHit>> {
        assert_eq!(limit, 1);
        self.queries.borrow_mut().push(query.to_string());
        self.hits
            .get(query)
            .cloned()
            .unwrap_or(LookupOutcome::Missing)
    }
}

fn songs(count: usize) -> Vec<SuggestedSong> {
    (1..=count)
        .map(|i| SuggestedSong::new(format!("Artist {i}"), format!("Title {i}")))
        .collect()
}

#[test]
fn test_queries() {
    let song = SuggestedSong::new("Nirvana", "Come As You Are");
    assert_eq!(
        exact_query(&song),
        "track:\"Come As You Are\" artist:\"Nirvana\""
    );
    assert_eq!(free_text_query(&song), "Nirvana Come As You Are");

    let quoted = SuggestedSong::new("The \"Band\"", "Song");
    assert_eq!(exact_query(&quoted), "track:\"Song\" artist:\"The Band\"");
}

#[tokio::test]
async fn test_stops_at_target() {
    let suggestions = songs(15);
    let catalog = suggestions
        .iter()
        .enumerate()
        .fold(MockSearch::default(), |catalog, (i, song)| {
            catalog.hit(exact_query(song), &format!("id{}", i + 1))
        });

    let result = reconcile(&suggestions, 10, &catalog).await.expect("reconciled");

    assert_eq!(result.resolved.len(), 10);
    assert_eq!(result.attempted, 10);
    assert!(result.not_found.is_empty());
    assert_eq!(catalog.queries().len(), 10);

    let searched: HashSet<String> = catalog.queries().into_iter().collect();
    for song in &suggestions[10..] {
        assert!(!searched.contains(&exact_query(song)));
        assert!(!searched.contains(&free_text_query(song)));
    }
    assert!(result.resolved.iter().all(|t| t.matched_by == MatchPhase::Exact));
    assert_eq!(result.uris()[0], "spotify:track:id1");
}

#[tokio::test]
async fn test_free_text_fallback() {
    let suggestions = songs(4);
    let catalog = MockSearch::default()
        .hit(exact_query(&suggestions[0]), "id1")
        .hit(exact_query(&suggestions[1]), "id2")
        .hit(free_text_query(&suggestions[2]), "id3")
        .hit(exact_query(&suggestions[3]), "id4");

    let result = reconcile(&suggestions, 10, &catalog).await.expect("reconciled");

    assert_eq!(result.resolved.len(), 4);
    assert_eq!(result.resolved[2].matched_by, MatchPhase::FreeText);
    assert_eq!(result.resolved[2].id, "id3");
    assert_eq!(result.resolved[2].suggestion, suggestions[2]);

    let song_three: Vec<String> = catalog
        .queries()
        .into_iter()
        .filter(|q| q.contains("Title 3"))
        .collect();
    assert_eq!(
        song_three,
        vec![exact_query(&suggestions[2]), free_text_query(&suggestions[2])]
    );
    assert_eq!(catalog.queries().len(), 5);
}

#[tokio::test]
async fn test_not_found_continues() {
    let suggestions = songs(3);
    let catalog = MockSearch::default()
        .hit(exact_query(&suggestions[0]), "id1")
        .hit(exact_query(&suggestions[2]), "id3");

    let result = reconcile(&suggestions, 10, &catalog).await.expect("reconciled");

    assert_eq!(result.resolved.len(), 2);
    assert_eq!(result.not_found, vec![suggestions[1].clone()]);
    assert_eq!(result.attempted, 3);
}

#[tokio::test]
async fn test_soft_failure_counts_as_miss() {
    let suggestions = songs(1);
    let catalog = MockSearch::default()
        .outcome(
            exact_query(&suggestions[0]),
            LookupOutcome::SoftFailure("timeout".to_string()),
        )
        .hit(free_text_query(&suggestions[0]), "id1");

    let result = reconcile(&suggestions, 10, &catalog).await.expect("reconciled");

    assert_eq!(result.resolved.len(), 1);
    assert_eq!(result.resolved[0].matched_by, MatchPhase::FreeText);
}

#[tokio::test]
async fn test_hard_failure_aborts() {
    let suggestions = songs(3);
    let catalog = MockSearch::default()
        .hit(exact_query(&suggestions[0]), "id1")
        .outcome(
            exact_query(&suggestions[1]),
            LookupOutcome::HardFailure("unauthorized".to_string()),
        );

    let result = reconcile(&suggestions, 10, &catalog).await;

    assert!(matches!(result, Err(ReconcileError::Catalog(_))));
    assert_eq!(catalog.queries().len(), 2);
}

#[tokio::test]
async fn test_zero_target_searches_nothing() {
    let suggestions = songs(3);
    let catalog = MockSearch::default();

    let result = reconcile(&suggestions, 0, &catalog).await.expect("reconciled");

    assert!(result.resolved.is_empty());
    assert_eq!(result.attempted, 0);
    assert!(catalog.queries().is_empty());
}

#[tokio::test]
async fn test_progress_is_reported_per_suggestion() {
    let suggestions = songs(3);
    let catalog = MockSearch::default()
        .hit(exact_query(&suggestions[0]), "id1")
        .hit(free_text_query(&suggestions[2]), "id3");

    let mut events = Vec::new();
    reconcile_with_progress(&suggestions, 10, &catalog, |progress| match progress {
        ReconcileProgress::Found {
            position, resolved, ..
        } => events.push(format!("found {position} {resolved}")),
        ReconcileProgress::NotFound { position, .. } => events.push(format!("missing {position}")),
    })
    .await
    .expect("reconciled");

    assert_eq!(events, vec!["found 0 1", "missing 1", "found 2 2"]);
}
