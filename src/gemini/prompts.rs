use crate::{analysis::Report, gemini::NarrativeError};

fn report_json(report: &Report) -> Result<String, NarrativeError> {
    report
        .to_json()
        .map_err(|e| NarrativeError::Serialization(e.to_string()))
}

/// Prompt asking for a written music profile of the listener.
pub fn insights_prompt(report: &Report) -> Result<String, NarrativeError> {
    let json_data = report_json(report)?;

    Ok(format!(
        r#"You are a music psychologist and an experienced data analyst. You get the Spotify listening statistics of a user as JSON. Write a warm, fluent and insightful "music profile" of this listener. Interpret the data, do not just list it.

Structure the analysis roughly like this:

1. **Introduction (overall profile):** Summarize the listener's taste from their genres and artists.
2. **Genres:** Look at the most played genres. What might they say about the listener's personality?
3. **Artists and popularity:** Look at the top artists and the popularity statistics. Does the listener prefer mainstream artists or discover niche and underground ones?
4. **Time travel (decade distribution):** Do the decades the music comes from make the listener nostalgic or forward-looking?
5. **Closing and recommendation:** Give a short summary and maybe a music recommendation.

Data to analyze:

```json
{json_data}
```

Now write your analysis as flowing text:
"#
    ))
}

/// Prompt asking for `request_size` new songs as a `{"songs": [...]}` document.
///
/// More songs than `target_size` are requested because some suggestions will
/// not be found in the catalog.
pub fn playlist_prompt(
    report: &Report,
    playlist_name: &str,
    request_size: usize,
    target_size: usize,
) -> Result<String, NarrativeError> {
    let json_data = report_json(report)?;
    let top_genres = report.top_genres(3);
    let genre_hint = if top_genres.is_empty() {
        "the listener's genres".to_string()
    } else {
        top_genres.join(", ")
    };

    Ok(format!(
        r#"You are a music data scientist and curator who designs "Discover Weekly" style playlists. Analyze the listening data (JSON) of a user and find songs they have *not discovered yet* but will like based on their taste (genres, artists, popularity, decades).

**TASK:**
Based on the data below, suggest **{request_size}** songs for the playlist '{playlist_name}'. (Some may not be found, so suggest more than {target_size}.)

**RULES:**
1. **BE NEW:** The suggested songs must NOT be in the user's top_artists or top_tracks lists.
2. **BE BALANCED:** Stay close to the user's main genres (e.g. {genre_hint}) and suggest surprising artists that fit them.
3. **NO COMMENTARY:** Return ONLY the requested JSON.

**OUTPUT FORMAT (return only this JSON):**
```json
{{
  "songs": [
    {{"artist": "Artist Name 1", "track": "Track Name 1"}},
    {{"artist": "Artist Name 2", "track": "Track Name 2"}},
    ...
    {{"artist": "Artist Name {request_size}", "track": "Track Name {request_size}"}}
  ]
}}
```

**Data to analyze:**
```json
{json_data}
```
"#
    ))
}
