use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::types::{Track, TrackAlbum, TrackArtist};

pub const PLACEHOLDER_TRACK_NAME: &str = "Untitled Track";
pub const PLACEHOLDER_ARTIST_NAME: &str = "Unknown Artist";
pub const PLACEHOLDER_ALBUM_NAME: &str = "Unknown Album";
pub const PLACEHOLDER_RELEASE_DATE: &str = "1900";

type Object = Map<String, Value>;

/// Shape of a raw item coming out of one of the track-bearing endpoints.
///
/// Saved-library, playlist and recently-played pages wrap the track in a
/// `{"track": {...}}` object, top-items pages return the track directly, and
/// playlists may contain anything from `null` to removed local files.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawShape<'a> {
    Wrapped(&'a Object),
    Direct(&'a Object),
    Unrecognized,
}

impl<'a> RawShape<'a> {
    pub fn parse(item: &'a Value) -> Self {
        let Some(object) = item.as_object() else {
            return RawShape::Unrecognized;
        };

        if let Some(Value::Object(track)) = object.get("track") {
            return RawShape::Wrapped(track);
        }

        if object.contains_key("id") {
            return RawShape::Direct(object);
        }

        RawShape::Unrecognized
    }

    fn candidate(self) -> Option<&'a Object> {
        match self {
            RawShape::Wrapped(track) | RawShape::Direct(track) => Some(track),
            RawShape::Unrecognized => None,
        }
    }
}

/// Result of a sanitation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sanitized {
    pub tracks: Vec<Track>,
    /// Items dropped because they were not track-shaped or had no id
    pub invalid: usize,
    /// Tracks that needed at least one field filled in
    pub patched: usize,
}

/// Cleans and patches a list of raw track items.
///
/// Only a missing identity is fatal to a record. Every other missing or
/// malformed field is replaced with a placeholder so downstream analysis never
/// has to skip a track because of it.
pub fn sanitize_tracks(items: &[Value]) -> Sanitized {
    let mut result = Sanitized::default();

    if items.is_empty() {
        warn!("Sanitization called with an empty track list");
        return result;
    }

    for item in items {
        let Some(candidate) = RawShape::parse(item).candidate() else {
            result.invalid += 1;
            continue;
        };

        match sanitize_track(candidate) {
            Some((track, patched)) => {
                if patched {
                    result.patched += 1;
                }
                result.tracks.push(track);
            }
            None => result.invalid += 1,
        }
    }

    if result.invalid > 0 {
        info!(invalid = result.invalid, "Dropped unrecoverable track items");
    }
    if result.patched > 0 {
        info!(patched = result.patched, "Patched tracks with missing fields");
    }
    info!(
        input = items.len(),
        output = result.tracks.len(),
        "Sanitized track list"
    );

    result
}

/// Validates and patches a single track object.
///
/// Returns `None` if the object has no usable id, otherwise the track and
/// whether any field had to be filled in.
pub fn sanitize_track(object: &Object) -> Option<(Track, bool)> {
    let id = non_empty_str(object.get("id"))?.to_string();
    let mut patched = false;

    let name = match non_empty_str(object.get("name")) {
        Some(name) => name.to_string(),
        None => {
            patched = true;
            PLACEHOLDER_TRACK_NAME.to_string()
        }
    };

    let artists = match object.get("artists").and_then(Value::as_array) {
        Some(list) if !list.is_empty() => list
            .iter()
            .map(|entry| {
                let (artist, artist_patched) = sanitize_artist(entry);
                patched |= artist_patched;
                artist
            })
            .collect(),
        _ => {
            patched = true;
            vec![placeholder_artist()]
        }
    };

    let album = match object.get("album").and_then(Value::as_object) {
        Some(album) => {
            let (album, album_patched) = sanitize_album(album);
            patched |= album_patched;
            album
        }
        None => {
            patched = true;
            TrackAlbum {
                name: PLACEHOLDER_ALBUM_NAME.to_string(),
                release_date: PLACEHOLDER_RELEASE_DATE.to_string(),
            }
        }
    };

    let popularity = match object.get("popularity") {
        None | Some(Value::Null) => {
            patched = true;
            0
        }
        Some(value) => {
            let (popularity, popularity_patched) = clamp_popularity(value);
            patched |= popularity_patched;
            popularity
        }
    };

    let uri = non_empty_str(object.get("uri")).map(str::to_string);
    let duration_ms = object.get("duration_ms").and_then(Value::as_u64);

    if patched {
        debug!(track_id = %id, "Patched track");
    }

    Some((
        Track {
            id,
            name,
            artists,
            album,
            popularity,
            uri,
            duration_ms,
        },
        patched,
    ))
}

/// Collapses tracks from several sources into one entry per id.
///
/// Later sources overwrite earlier ones, while an id keeps the position where
/// it was first seen.
pub fn merge_by_id<I>(sources: I) -> Vec<Track>
where
    I: IntoIterator<Item = Vec<Track>>,
{
    let mut merged: Vec<Track> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for source in sources {
        for track in source {
            match positions.get(&track.id) {
                Some(&position) => merged[position] = track,
                None => {
                    positions.insert(track.id.clone(), merged.len());
                    merged.push(track);
                }
            }
        }
    }

    merged
}

fn sanitize_artist(entry: &Value) -> (TrackArtist, bool) {
    let Some(object) = entry.as_object() else {
        return (placeholder_artist(), true);
    };

    let id = non_empty_str(object.get("id")).map(str::to_string);
    match non_empty_str(object.get("name")) {
        Some(name) => (
            TrackArtist {
                id,
                name: name.to_string(),
            },
            false,
        ),
        None => (
            TrackArtist {
                id,
                name: PLACEHOLDER_ARTIST_NAME.to_string(),
            },
            true,
        ),
    }
}

fn sanitize_album(object: &Object) -> (TrackAlbum, bool) {
    let mut patched = false;

    let name = match non_empty_str(object.get("name")) {
        Some(name) => name.to_string(),
        None => {
            patched = true;
            PLACEHOLDER_ALBUM_NAME.to_string()
        }
    };

    // an unknown release date stays empty so the decade analysis skips it
    let release_date = match object.get("release_date").and_then(Value::as_str) {
        Some(date) => date.to_string(),
        None => {
            patched = true;
            String::new()
        }
    };

    (TrackAlbum { name, release_date }, patched)
}

fn clamp_popularity(value: &Value) -> (u8, bool) {
    if let Some(popularity) = value.as_u64() {
        return if popularity <= 100 {
            (popularity as u8, false)
        } else {
            (100, true)
        };
    }

    match value.as_f64() {
        Some(popularity) if popularity.is_finite() => {
            (popularity.round().clamp(0.0, 100.0) as u8, true)
        }
        _ => (0, true),
    }
}

fn placeholder_artist() -> TrackArtist {
    TrackArtist {
        id: None,
        name: PLACEHOLDER_ARTIST_NAME.to_string(),
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}
