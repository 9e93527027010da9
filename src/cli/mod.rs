//! # CLI Module
//!
//! User-facing commands of sporlyze. Each command loads what it needs (token,
//! configuration, report files), drives the analysis or recommendation core
//! and renders the results with colored status lines, spinners and tables.
//!
//! ## Commands
//!
//! - [`auth`] - OAuth 2.0 PKCE login, stores the token for later commands
//! - [`analyze`] - Fetches tracks from a source, builds and saves the report,
//!   optionally asks the model for insights and a playlist
//! - [`playlists`] - Lists playlists the user owns or collaborates on
//! - [`recommend`] - Builds a playlist from a saved report
//!
//! ## Error Handling
//!
//! Fatal problems (no token, 401, nothing to analyze) end the process through
//! `error!`. Optional steps such as saving the report, insights or playlist
//! creation only warn and let the command finish.

mod analyze;
mod auth;
mod playlists;
mod recommend;

pub use analyze::{AnalyzeOptions, Source, SourceKind, analyze, collect};
pub use auth::auth;
pub use playlists::playlists;
pub use recommend::{default_playlist_name, recommend, suggestion_rows};
