use std::path::PathBuf;

use chrono::Utc;
use reqwest::Client;
use tracing::{debug, warn};

use crate::{config, types::Token};

/// Seconds before expiry at which a token is already treated as expired.
const EXPIRY_MARGIN: u64 = 240;

pub struct TokenManager {
    token: Token,
}

impl TokenManager {
    pub fn new(token: Token) -> Self {
        TokenManager { token }
    }

    pub async fn load() -> Result<Self, String> {
        let path = Self::token_path();
        let content = async_fs::read_to_string(&path)
            .await
            .map_err(|e| format!("{}: {e}", path.display()))?;
        let token: Token = serde_json::from_str(&content).map_err(|e| e.to_string())?;
        Ok(Self { token })
    }

    pub async fn persist(&self) -> Result<(), String> {
        let path = Self::token_path();
        if let Some(parent) = path.parent() {
            async_fs::create_dir_all(parent)
                .await
                .map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(&self.token).map_err(|e| e.to_string())?;
        async_fs::write(&path, json)
            .await
            .map_err(|e| e.to_string())
    }

    /// Returns the access token, refreshing and persisting it first when it
    /// is about to expire. A failed refresh falls back to the stale token and
    /// lets the API answer with 401.
    pub async fn get_valid_token(&mut self) -> String {
        if self.is_expired() {
            match self.refresh_token().await {
                Ok(new_token) => {
                    debug!("Access token refreshed");
                    self.token = new_token;
                    if let Err(e) = self.persist().await {
                        warn!(error = %e, "Failed to persist refreshed token");
                    }
                }
                Err(e) => warn!(error = %e, "Token refresh failed"),
            }
        }

        self.token.access_token.clone()
    }

    fn is_expired(&self) -> bool {
        let now = Utc::now().timestamp() as u64;
        now + EXPIRY_MARGIN >= self.token.obtained_at + self.token.expires_in
    }

    async fn refresh_token(&self) -> Result<Token, String> {
        let token_url = config::spotify_apitoken_url().map_err(|e| e.to_string())?;
        let client_id = config::spotify_client_id().map_err(|e| e.to_string())?;

        let res = Client::new()
            .post(token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", self.token.refresh_token.as_str()),
                ("client_id", client_id.as_str()),
            ])
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !res.status().is_success() {
            return Err(format!("token endpoint answered {}", res.status()));
        }

        let json: serde_json::Value = res.json().await.map_err(|e| e.to_string())?;

        // Spotify may omit the refresh token on refresh; keep the current one then.
        let refresh_token = json["refresh_token"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| self.token.refresh_token.clone());

        Ok(Token {
            access_token: json["access_token"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
            refresh_token,
            scope: json["scope"].as_str().unwrap_or_default().to_string(),
            expires_in: json["expires_in"].as_u64().unwrap_or(3600),
            obtained_at: Utc::now().timestamp() as u64,
        })
    }

    fn token_path() -> PathBuf {
        let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("sporlyze/cache/token.json");
        path
    }
}
