//! # Spotify Integration Module
//!
//! Thin client over the Spotify Web API covering what the analyzer and the
//! playlist builder need.
//!
//! ```text
//! CLI commands
//!      ↓
//! SpotifyCatalog ── ArtistGenres / TrackSearch (used by analysis and reconciliation)
//!      ├── tracks    top items, recently played, saved library, playlist items
//!      ├── artists   single artist lookups, top artists
//!      ├── search    track search
//!      └── playlist  listing, creation, adding tracks
//!      ↓
//! reqwest + bearer token (refreshed through TokenManager)
//! ```
//!
//! Authentication (OAuth 2.0 with PKCE) lives in [`auth`]; it starts the local
//! callback server, opens the browser and waits for the exchanged token.
//!
//! Every request goes through one send loop that retries `502 Bad Gateway`
//! after a short pause and honors `Retry-After` on `429 Too Many Requests`
//! for waits of up to two minutes. A `401` surfaces as
//! [`CatalogError::Unauthorized`], which callers treat as fatal for the run.

mod artists;
pub mod auth;
mod client;
mod playlist;
mod search;
mod tracks;

pub use client::{CatalogError, SpotifyCatalog};
