//! # Generative Model Module
//!
//! The analyzer consumes the model as a black box: a prompt goes in, text (or
//! a JSON document) comes out. [`NarrativeService`] is that seam;
//! [`GeminiClient`] implements it against the Gemini `generateContent` REST
//! endpoint.
//!
//! A response the model refuses to produce is reported as
//! [`NarrativeError::Blocked`], never as empty content and never with token
//! usage attached.

mod client;
pub mod prompts;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::{
    analysis::Report,
    recommend::{SuggestedSong, SuggestionError, parse_suggestions},
};

pub use client::GeminiClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub response_tokens: u64,
    pub total_tokens: u64,
}

/// Model output together with its token usage.
#[derive(Debug, Clone, PartialEq)]
pub struct Narrative {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("response blocked by the model: {reason}")]
    Blocked { reason: String },

    #[error("connection error: {0}")]
    Transport(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("invalid response: {0}")]
    Malformed(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

#[derive(Debug, Error)]
pub enum RecommendationError {
    #[error(transparent)]
    Narrative(#[from] NarrativeError),

    #[error(transparent)]
    Suggestions(#[from] SuggestionError),
}

#[allow(async_fn_in_trait)]
pub trait NarrativeService {
    /// Sends a free-text prompt.
    async fn send(&self, prompt: &str) -> Result<Narrative, NarrativeError>;

    /// Sends a prompt whose answer must be a single JSON document.
    async fn send_json(&self, prompt: &str) -> Result<Narrative, NarrativeError>;
}

/// Song suggestions parsed from a model answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendations {
    pub songs: Vec<SuggestedSong>,
    pub usage: Option<TokenUsage>,
}

/// Asks the model for a written interpretation of the report.
pub async fn generate_insights<N: NarrativeService>(
    service: &N,
    report: &Report,
) -> Result<Narrative, NarrativeError> {
    let prompt = prompts::insights_prompt(report)?;
    let narrative = service.send(&prompt).await?;

    if let Some(usage) = narrative.usage {
        info!(total_tokens = usage.total_tokens, "Generated insights");
    }
    Ok(narrative)
}

/// Asks the model for song suggestions and validates their shape.
pub async fn generate_suggestions<N: NarrativeService>(
    service: &N,
    report: &Report,
    playlist_name: &str,
    request_size: usize,
    target_size: usize,
) -> Result<Recommendations, RecommendationError> {
    let prompt = prompts::playlist_prompt(report, playlist_name, request_size, target_size)?;
    let narrative = service.send_json(&prompt).await?;
    let songs = parse_suggestions(&narrative.text)?;

    info!(songs = songs.len(), "Generated song suggestions");
    Ok(Recommendations {
        songs,
        usage: narrative.usage,
    })
}
