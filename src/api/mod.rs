//! HTTP endpoints served by the local callback server during `sporlyze auth`.
//!
//! - [`callback`] completes the PKCE flow by exchanging the authorization code
//!   for a token.

mod callback;

pub use callback::callback;
