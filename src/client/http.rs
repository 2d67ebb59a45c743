//! HTTP implementation of [`CharacterSource`] for the public character API

use super::{CharacterQuery, CharacterSource};
use crate::config::ApiConfig;
use crate::core::character::{Character, CharacterId, CharactersPage};
use crate::core::error::RemoteError;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use std::time::Duration;

/// Character API client
///
/// `GET {base}/character?page=&name=&status=&gender=` for listings and
/// `GET {base}/character/{id}` for details. Transport errors, 5xx and 429
/// responses are retried up to `retry` extra times.
#[derive(Debug, Clone)]
pub struct HttpCharacterSource {
    client: Client,
    base_url: Url,
    retry: u32,
    retry_delay: Duration,
}

impl HttpCharacterSource {
    /// Build a client from configuration
    pub fn new(config: &ApiConfig) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RemoteError::Transport {
                url: config.base_url.clone(),
                message: e.to_string(),
            })?;

        Self::with_client(client, &config.base_url)
            .map(|source| {
                source
                    .retry(config.retry)
                    .retry_delay(Duration::from_millis(config.retry_delay_ms))
            })
    }

    /// Use an existing reqwest client; one retry, one second apart
    pub fn with_client(client: Client, base_url: &str) -> Result<Self, RemoteError> {
        // Url::join drops the last path segment unless it ends with '/'.
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized).map_err(|e| RemoteError::InvalidUrl {
            url: base_url.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            retry: 1,
            retry_delay: Duration::from_secs(1),
        })
    }

    pub fn retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, RemoteError> {
        self.base_url
            .join(path)
            .map_err(|e| RemoteError::InvalidUrl {
                url: format!("{}{}", self.base_url, path),
                message: e.to_string(),
            })
    }

    /// GET with retries on transient failures
    async fn fetch(&self, url: &Url) -> Result<Response, RemoteError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let outcome = self.client.get(url.clone()).send().await;

            let retryable = match &outcome {
                Ok(response) => {
                    let status = response.status();
                    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
                }
                Err(e) => !e.is_builder(),
            };

            if retryable && attempt <= self.retry {
                tracing::debug!(%url, attempt, "request failed, retrying");
                tokio::time::sleep(self.retry_delay).await;
                continue;
            }

            return outcome.map_err(RemoteError::from);
        }
    }
}

async fn error_body(response: Response) -> String {
    response.text().await.unwrap_or_default()
}

#[async_trait]
impl CharacterSource for HttpCharacterSource {
    async fn list(&self, query: &CharacterQuery) -> Result<CharactersPage, RemoteError> {
        let mut url = self.endpoint("character")?;
        url.query_pairs_mut().extend_pairs(query.to_pairs());

        tracing::debug!(%url, "fetching characters");
        let response = self.fetch(&url).await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            tracing::debug!(%url, "no characters match");
            return Ok(CharactersPage::empty());
        }
        if !status.is_success() {
            return Err(RemoteError::status(status.as_u16(), error_body(response).await));
        }

        let page: CharactersPage = response.json().await?;
        tracing::debug!(count = page.info.count, pages = page.info.pages, "characters fetched");
        Ok(page)
    }

    async fn get(&self, id: CharacterId) -> Result<Character, RemoteError> {
        let url = self.endpoint(&format!("character/{}", id))?;

        tracing::debug!(%url, "fetching character");
        let response = self.fetch(&url).await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(RemoteError::NotFound { id });
        }
        if !status.is_success() {
            return Err(RemoteError::status(status.as_u16(), error_body(response).await));
        }

        Ok(response.json().await?)
    }
}
