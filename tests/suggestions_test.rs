use sporlyze::recommend::{SuggestedSong, SuggestionError, parse_suggestions};

#[test]
fn test_parse_valid_list() {
    let raw = r#"{"songs": [
        {"artist": "Radiohead", "track": "Reckoner"},
        {"artist": "  Portishead ", "track": "Roads\n"}
    ]}"#;

    let songs = parse_suggestions(raw).expect("valid list");

    assert_eq!(
        songs,
        vec![
            SuggestedSong::new("Radiohead", "Reckoner"),
            SuggestedSong::new("Portishead", "Roads"),
        ]
    );
}

#[test]
fn test_parse_fenced_answer() {
    let raw = "```json\n{\"songs\": [{\"artist\": \"Bjork\", \"track\": \"Joga\"}]}\n```";
    let songs = parse_suggestions(raw).expect("fence is stripped");
    assert_eq!(songs[0].to_string(), "Joga - Bjork");
}

#[test]
fn test_rejects_empty_list() {
    let raw = r#"{"songs": []}"#;
    let err = parse_suggestions(raw).unwrap_err();
    assert_eq!(err.raw(), raw);
}

#[test]
fn test_rejects_too_many_songs() {
    let songs: Vec<String> = (0..51)
        .map(|i| format!(r#"{{"artist": "A{i}", "track": "T{i}"}}"#))
        .collect();
    let raw = format!(r#"{{"songs": [{}]}}"#, songs.join(","));

    assert!(parse_suggestions(&raw).is_err());
}

#[test]
fn test_rejects_blank_or_long_fields() {
    let blank = r#"{"songs": [{"artist": "   ", "track": "Song"}]}"#;
    assert!(parse_suggestions(blank).is_err());

    let long = format!(
        r#"{{"songs": [{{"artist": "A", "track": "{}"}}]}}"#,
        "x".repeat(201)
    );
    assert!(parse_suggestions(&long).is_err());

    let max = format!(
        r#"{{"songs": [{{"artist": "A", "track": "{}"}}]}}"#,
        "x".repeat(200)
    );
    assert!(parse_suggestions(&max).is_ok());
}

#[test]
fn test_rejects_wrong_shape() {
    for raw in [
        "Sorry, I can't help with that.",
        r#"{"tracks": [{"artist": "A", "track": "B"}]}"#,
        r#"{"songs": [{"artist": "A"}]}"#,
        r#"[{"artist": "A", "track": "B"}]"#,
    ] {
        let err = parse_suggestions(raw).unwrap_err();
        let SuggestionError::Invalid { raw: kept, .. } = err;
        assert_eq!(kept, raw);
    }
}
