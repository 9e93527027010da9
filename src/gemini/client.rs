use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::{
    config::{self, ConfigError},
    gemini::{Narrative, NarrativeError, NarrativeService, TokenUsage},
};

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Attempts per request while the model answers 502 or 503.
const MAX_ATTEMPTS: u32 = 3;

/// Gemini `generateContent` client.
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    /// Builds a client from `GEMINI_API_KEY`, `GEMINI_API_URL` and `GEMINI_MODEL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(
            config::gemini_api_url(),
            config::gemini_model(),
            config::gemini_api_key()?,
        ))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        prompt: &str,
        generation_config: GenerationConfig,
    ) -> Result<Narrative, NarrativeError> {
        let url = format!(
            "{base}/models/{model}:generateContent",
            base = self.base_url.trim_end_matches('/'),
            model = self.model
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config,
            safety_settings: SAFETY_CATEGORIES
                .iter()
                .map(|category| SafetySetting {
                    category: category.to_string(),
                    threshold: "BLOCK_NONE".to_string(),
                })
                .collect(),
        };

        debug!(model = %self.model, prompt_chars = prompt.len(), "Sending generateContent request");

        let mut attempt = 0;

        loop {
            attempt += 1;
            let response = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&request)
                .send()
                .await
                .map_err(|e| NarrativeError::Transport(e.to_string()))?;

            let status = response.status();
            let unavailable =
                status == StatusCode::BAD_GATEWAY || status == StatusCode::SERVICE_UNAVAILABLE;
            if unavailable && attempt < MAX_ATTEMPTS {
                warn!(%status, "Model temporarily unavailable, retrying");
                sleep(Duration::from_secs(10)).await;
                continue; // retry
            }

            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(NarrativeError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let body = response
                .json::<GenerateContentResponse>()
                .await
                .map_err(|e| NarrativeError::Malformed(e.to_string()))?;

            return body.into_narrative();
        }
    }
}

impl NarrativeService for GeminiClient {
    async fn send(&self, prompt: &str) -> Result<Narrative, NarrativeError> {
        self.generate(
            prompt,
            GenerationConfig {
                temperature: 0.1,
                top_p: Some(0.95),
                top_k: Some(30),
                response_mime_type: None,
            },
        )
        .await
    }

    async fn send_json(&self, prompt: &str) -> Result<Narrative, NarrativeError> {
        self.generate(
            prompt,
            GenerationConfig {
                temperature: 0.5,
                top_p: None,
                top_k: None,
                response_mime_type: Some("application/json".to_string()),
            },
        )
        .await
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: String,
    threshold: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
    #[serde(default)]
    total_token_count: u64,
}

impl GenerateContentResponse {
    fn into_narrative(self) -> Result<Narrative, NarrativeError> {
        let block_reason = self.prompt_feedback.and_then(|f| f.block_reason);
        let finish_reason = self
            .candidates
            .first()
            .and_then(|c| c.finish_reason.clone());

        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        // no parts at all means the answer was withheld
        if text.is_empty() {
            let reason = block_reason
                .or(finish_reason)
                .unwrap_or_else(|| "no content returned".to_string());
            warn!(%reason, "Model response blocked");
            return Err(NarrativeError::Blocked { reason });
        }

        let usage = self.usage_metadata.map(|u| TokenUsage {
            prompt_tokens: u.prompt_token_count,
            response_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        });

        Ok(Narrative { text, usage })
    }
}
