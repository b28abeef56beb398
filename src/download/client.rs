//! HTTP collaborator for tile fetches.
//!
//! The fetcher only needs "GET this URL and give me the body". That seam is
//! the [`TileSource`] trait; [`HttpTileSource`] implements it with `reqwest`,
//! sending a fixed User-Agent, any extra static headers, and a per-request
//! timeout on every call.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use thiserror::Error;
use tracing::{debug, instrument};

use super::constants::DEFAULT_REQUEST_TIMEOUT;
use super::error::FetchError;
use crate::user_agent;

/// Source of raw tile bytes.
///
/// Implementations return the body of a 2xx response, and map every other
/// outcome to a [`FetchError`]: non-2xx responses to
/// [`FetchError::HttpStatus`], timeouts to [`FetchError::Timeout`].
#[async_trait]
pub trait TileSource: Send + Sync {
    /// Fetches `url`.
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError>;
}

/// Errors building an [`HttpTileSource`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid header {name:?}")]
    InvalidHeader { name: String },

    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}

/// Settings applied to every tile request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    /// Value of the `User-Agent` header.
    pub user_agent: String,
    /// Extra static headers as `(name, value)` pairs.
    pub headers: Vec<(String, String)>,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: user_agent::default_tile_user_agent(),
            headers: Vec::new(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// `reqwest`-backed [`TileSource`].
///
/// Create once and share; the underlying client pools connections.
#[derive(Debug, Clone)]
pub struct HttpTileSource {
    client: Client,
}

impl HttpTileSource {
    /// Builds a client from `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidHeader`] if a header name or value is not
    /// valid HTTP, or [`ClientError::Build`] if the client cannot be created.
    pub fn new(settings: &HttpSettings) -> Result<Self, ClientError> {
        let headers = build_header_map(&settings.headers)?;
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .default_headers(headers)
            .timeout(settings.timeout)
            .gzip(true)
            .build()
            .map_err(ClientError::Build)?;

        debug!(
            user_agent = %settings.user_agent,
            extra_headers = settings.headers.len(),
            timeout_ms = settings.timeout.as_millis(),
            "built tile HTTP client"
        );
        Ok(Self { client })
    }
}

#[async_trait]
impl TileSource for HttpTileSource {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| map_transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url, status.as_u16()));
        }

        response
            .bytes()
            .await
            .map_err(|e| map_transport_error(url, e))
    }
}

fn map_transport_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::timeout(url)
    } else if error.is_builder() {
        FetchError::invalid_url(url)
    } else {
        FetchError::network(url, error)
    }
}

fn build_header_map(headers: &[(String, String)]) -> Result<HeaderMap, ClientError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let invalid = || ClientError::InvalidHeader { name: name.clone() };
        let header_name = HeaderName::from_bytes(name.trim().as_bytes()).map_err(|_| invalid())?;
        let header_value = HeaderValue::from_str(value.trim()).map_err(|_| invalid())?;
        map.append(header_name, header_value);
    }
    Ok(map)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn settings() -> HttpSettings {
        HttpSettings {
            user_agent: "TileTest/1.0 (+ops@example.com)".to_string(),
            headers: Vec::new(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_invalid_header_name_rejected() {
        let mut settings = settings();
        settings.headers.push(("Bad Header".to_string(), "x".to_string()));
        let err = HttpTileSource::new(&settings).unwrap_err();
        assert!(matches!(err, ClientError::InvalidHeader { name } if name == "Bad Header"));
    }

    #[test]
    fn test_default_settings_identify_the_tool() {
        let defaults = HttpSettings::default();
        assert!(defaults.user_agent.starts_with("tile-downloader/"));
        assert_eq!(defaults.timeout, DEFAULT_REQUEST_TIMEOUT);
    }
}
