use std::{cell::Cell, time::Duration};

use chrono::{NaiveDate, NaiveDateTime};
use sporlyze::utils::*;

#[test]
fn test_generate_code_verifier() {
    let verifier = generate_code_verifier();

    // Should be exactly 128 characters
    assert_eq!(verifier.len(), 128);

    // Should contain only alphanumeric characters
    assert!(verifier.chars().all(|c| c.is_ascii_alphanumeric()));

    // Two generated verifiers should be different
    let verifier2 = generate_code_verifier();
    assert_ne!(verifier, verifier2);
}

#[test]
fn test_generate_code_challenge() {
    let verifier = "test_verifier_123";
    let challenge = generate_code_challenge(verifier);

    assert!(!challenge.is_empty());

    // Same verifier should produce same challenge
    assert_eq!(challenge, generate_code_challenge(verifier));

    // Different verifier should produce different challenge
    assert_ne!(challenge, generate_code_challenge("different_verifier"));

    // URL-safe base64 without padding
    assert!(
        challenge
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    );
}

#[test]
fn test_report_file_name() {
    let at = NaiveDateTime::parse_from_str("2024-03-07 09:05:01", "%Y-%m-%d %H:%M:%S")
        .expect("valid timestamp");
    assert_eq!(report_file_name(at), "report_20240307_090501.json");
}

#[test]
fn test_share() {
    assert_eq!(share(1, 4), "25.0%");
    assert_eq!(share(1, 3), "33.3%");
    assert_eq!(share(0, 0), "0.0%");
}

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("exactly", 7), "exactly");
    assert_eq!(truncate("Ünïcödé text", 5), "Ünïc…");
}

#[test]
fn test_playlist_description() {
    let date = NaiveDate::from_ymd_opt(2024, 1, 5).expect("valid date");
    assert_eq!(
        playlist_description("sporlyze", date),
        "Created by sporlyze on 05.01.2024"
    );
}

#[tokio::test]
async fn test_retry_on_error_succeeds_after_failures() {
    let calls = Cell::new(0);

    let result: Result<u32, String> = retry_on_error(3, Duration::ZERO, || {
        calls.set(calls.get() + 1);
        let attempt = calls.get();
        async move {
            if attempt < 3 {
                Err(format!("attempt {attempt} failed"))
            } else {
                Ok(attempt)
            }
        }
    })
    .await;

    assert_eq!(result, Ok(3));
    assert_eq!(calls.get(), 3);
}

#[tokio::test]
async fn test_retry_on_error_returns_last_error() {
    let calls = Cell::new(0);

    let result: Result<(), String> = retry_on_error(3, Duration::ZERO, || {
        calls.set(calls.get() + 1);
        let attempt = calls.get();
        async move { Err(format!("attempt {attempt} failed")) }
    })
    .await;

    assert_eq!(result, Err("attempt 3 failed".to_string()));
    assert_eq!(calls.get(), 3);
}
