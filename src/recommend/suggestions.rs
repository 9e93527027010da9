use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_SUGGESTIONS: usize = 50;
pub const MAX_FIELD_CHARS: usize = 200;

/// A song suggested by the generative model. Free text, no catalog guarantee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedSong {
    pub artist: String,
    pub track: String,
}

impl SuggestedSong {
    pub fn new(artist: impl Into<String>, track: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            track: track.into(),
        }
    }
}

impl fmt::Display for SuggestedSong {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.track, self.artist)
    }
}

#[derive(Debug, Deserialize)]
struct SuggestionList {
    songs: Vec<SuggestedSong>,
}

#[derive(Debug, Error)]
pub enum SuggestionError {
    #[error("model returned an invalid song list ({reason})")]
    Invalid { raw: String, reason: String },
}

impl SuggestionError {
    /// The unmodified model output, shown to the user on failure.
    pub fn raw(&self) -> &str {
        match self {
            SuggestionError::Invalid { raw, .. } => raw,
        }
    }
}

/// Parses and validates the model's `{"songs": [{"artist", "track"}]}` answer.
///
/// Field values are trimmed. The list must hold between 1 and
/// [`MAX_SUGGESTIONS`] songs and every field between 1 and
/// [`MAX_FIELD_CHARS`] characters.
pub fn parse_suggestions(raw: &str) -> Result<Vec<SuggestedSong>, SuggestionError> {
    let invalid = |reason: String| SuggestionError::Invalid {
        raw: raw.to_string(),
        reason,
    };

    let list: SuggestionList =
        serde_json::from_str(strip_code_fence(raw)).map_err(|e| invalid(e.to_string()))?;

    if list.songs.is_empty() || list.songs.len() > MAX_SUGGESTIONS {
        return Err(invalid(format!(
            "expected 1 to {MAX_SUGGESTIONS} songs, got {}",
            list.songs.len()
        )));
    }

    list.songs
        .into_iter()
        .enumerate()
        .map(|(i, song)| {
            let artist = song.artist.trim();
            let track = song.track.trim();
            for (field, value) in [("artist", artist), ("track", track)] {
                let len = value.chars().count();
                if len == 0 || len > MAX_FIELD_CHARS {
                    return Err(invalid(format!(
                        "song {} has a {field} of {len} characters",
                        i + 1
                    )));
                }
            }
            Ok(SuggestedSong::new(artist, track))
        })
        .collect()
}

// ```json ... ``` wrappers around an otherwise valid answer
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = body.strip_prefix("json").unwrap_or(body);
    body.strip_suffix("```").unwrap_or(body).trim()
}
