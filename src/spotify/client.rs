use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tokio::{sync::Mutex, time::sleep};
use tracing::debug;

use crate::{
    catalog::LookupOutcome,
    config::{self, ConfigError},
    management::TokenManager,
    types::{RawPage, UserProfile},
    utils, warning,
};

/// Attempts per request before a 502 or short 429 is given up on.
const MAX_ATTEMPTS: u32 = 3;

/// Longest `Retry-After` the client is willing to wait, in seconds.
const MAX_RETRY_AFTER: u64 = 120;

/// Wait applied when a 429 carries no usable `Retry-After`, in seconds.
const DEFAULT_RETRY_AFTER: u64 = 5;

/// What to do with a `429 Too Many Requests` answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RateLimit {
    Wait(u64),
    TooLong(u64),
    Exhausted(u64),
}

fn rate_limit(retry_after: Option<u64>, attempt: u32) -> RateLimit {
    let secs = retry_after.unwrap_or(DEFAULT_RETRY_AFTER);
    if secs > MAX_RETRY_AFTER {
        RateLimit::TooLong(secs)
    } else if attempt >= MAX_ATTEMPTS {
        RateLimit::Exhausted(secs)
    } else {
        RateLimit::Wait(secs)
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("not authorized, please run sporlyze auth: {0}")]
    Unauthorized(String),

    #[error("failed to load token, please run sporlyze auth: {0}")]
    Token(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Status { status: u16, message: String },

    #[error("rate limited, retry after {retry_after} seconds")]
    RateLimited { retry_after: u64 },
}

impl CatalogError {
    /// Whether the error invalidates every further request of this run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CatalogError::Unauthorized(_) | CatalogError::Token(_) | CatalogError::Config(_)
        )
    }
}

impl<T> From<Result<T, CatalogError>> for LookupOutcome<T> {
    fn from(result: Result<T, CatalogError>) -> Self {
        match result {
            Ok(value) => LookupOutcome::Found(value),
            Err(CatalogError::Status { status: 404, .. }) => LookupOutcome::Missing,
            Err(e) if e.is_fatal() => LookupOutcome::HardFailure(e.to_string()),
            Err(e) => LookupOutcome::SoftFailure(e.to_string()),
        }
    }
}

/// Spotify Web API client used by every command.
///
/// Holds the token manager behind a mutex so a valid (refreshed if needed)
/// access token can be obtained from `&self` before each request.
pub struct SpotifyCatalog {
    client: Client,
    api_url: String,
    token_mgr: Mutex<TokenManager>,
}

impl SpotifyCatalog {
    pub fn new(token_mgr: TokenManager) -> Result<Self, ConfigError> {
        Ok(Self::with_api_url(token_mgr, config::spotify_apiurl()?))
    }

    /// Builds a client against an explicit API base URL.
    pub fn with_api_url(token_mgr: TokenManager, api_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into(),
            token_mgr: Mutex::new(token_mgr),
        }
    }

    /// Builds a client from the cached token.
    pub async fn load() -> Result<Self, CatalogError> {
        let token_mgr = TokenManager::load().await.map_err(CatalogError::Token)?;
        Ok(Self::new(token_mgr)?)
    }

    pub(super) fn url(&self, path: &str) -> String {
        format!("{uri}{path}", uri = self.api_url.trim_end_matches('/'))
    }

    async fn access_token(&self) -> String {
        self.token_mgr.lock().await.get_valid_token().await
    }

    /// Sends a request with a fresh access token.
    ///
    /// `502 Bad Gateway` is retried after 10 seconds. `429 Too Many Requests`
    /// waits for `Retry-After` (five seconds when absent) when it is at most
    /// two minutes. Both give up after [`MAX_ATTEMPTS`].
    pub(super) async fn send<F>(&self, build: F) -> Result<Response, CatalogError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;
            let token = self.access_token().await;
            let response = build(&self.client).bearer_auth(token).send().await?;
            let status = response.status();

            if status == StatusCode::BAD_GATEWAY && attempt < MAX_ATTEMPTS {
                sleep(Duration::from_secs(10)).await;
                continue; // retry
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok());

                match rate_limit(retry_after, attempt) {
                    RateLimit::Wait(secs) => {
                        debug!(retry_after = secs, attempt, "Rate limited, waiting");
                        sleep(Duration::from_secs(secs)).await;
                        continue; // retry
                    }
                    RateLimit::TooLong(secs) => {
                        warning!(
                            "Retry after has reached an abnormal high of {} seconds. Try again later.",
                            secs
                        );
                        return Err(CatalogError::RateLimited { retry_after: secs });
                    }
                    RateLimit::Exhausted(secs) => {
                        warning!(
                            "Still rate limited after {} attempts. Try again later.",
                            MAX_ATTEMPTS
                        );
                        return Err(CatalogError::RateLimited { retry_after: secs });
                    }
                }
            }

            if status == StatusCode::UNAUTHORIZED {
                let message = response.text().await.unwrap_or_default();
                return Err(CatalogError::Unauthorized(message));
            }

            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(CatalogError::Status {
                    status: status.as_u16(),
                    message,
                });
            }

            return Ok(response);
        }
    }

    pub(super) async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, CatalogError> {
        let response = self.send(|client| client.get(url)).await?;
        Ok(response.json::<T>().await?)
    }

    /// Follows a paging object from `first_url` until the API reports no
    /// further page, collecting every raw item.
    pub(super) async fn paged_items(
        &self,
        first_url: String,
        message: &str,
    ) -> Result<Vec<Value>, CatalogError> {
        let pb = utils::spinner(message);
        let mut items: Vec<Value> = Vec::new();
        let mut next = Some(first_url);

        while let Some(url) = next {
            let page: RawPage = match self.get_json(&url).await {
                Ok(page) => page,
                Err(e) => {
                    pb.finish_and_clear();
                    return Err(e);
                }
            };

            items.extend(page.items);
            match page.total {
                Some(total) => pb.set_message(format!("{message} ({}/{total})", items.len())),
                None => pb.set_message(format!("{message} ({})", items.len())),
            }
            next = page.next;
        }

        pb.finish_and_clear();
        Ok(items)
    }

    pub async fn current_user(&self) -> Result<UserProfile, CatalogError> {
        self.get_json(&self.url("/me")).await
    }
}
