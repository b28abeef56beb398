//! Run configuration.
//!
//! A [`DownloadConfig`] is plain data: built-in defaults, optionally replaced
//! field by field from a JSON file, then overridden by command-line flags.
//! [`DownloadConfig::validate`] turns it into [`DownloadSettings`], the typed
//! values the planner and engine consume. All configuration errors surface
//! there, before any network activity.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::coord::{BoundingBox, CoordError, ZoomRange};
use crate::download::{
    DEFAULT_CONCURRENCY, DEFAULT_MAX_RETRIES, DEFAULT_TILE_URL_TEMPLATE, HttpSettings,
    RetryPolicy, TemplateError, TileUrlTemplate,
};
use crate::plan::{DEFAULT_TILE_EXTENSION, StorageLayout};
use crate::user_agent;

const DEFAULT_MIN_ZOOM: u8 = 6;
const DEFAULT_MAX_ZOOM: u8 = 8;
const DEFAULT_OUTPUT_DIR: &str = "tiles";
const DEFAULT_SUCCESS_PACE_MS: u64 = 200;
const DEFAULT_RETRY_BACKOFF_MS: u64 = 1000;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
const MAX_CONCURRENCY: usize = 64;

/// Errors loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid bounding box or zoom range: {source}")]
    Region {
        #[source]
        source: CoordError,
    },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("concurrency must be between 1 and {MAX_CONCURRENCY}, got {value}")]
    Concurrency { value: usize },

    #[error("max_retries must be at least 1")]
    MaxRetries,

    #[error("request timeout must be greater than zero")]
    ZeroTimeout,

    #[error("user agent must not be empty")]
    EmptyUserAgent,

    #[error("invalid header {header:?}: expected NAME:VALUE with a valid HTTP name and value")]
    InvalidHeader { header: String },

    #[error("invalid tile extension {extension:?}")]
    InvalidExtension { extension: String },
}

impl ConfigError {
    fn region(source: CoordError) -> Self {
        Self::Region { source }
    }

    fn invalid_header(header: impl Into<String>) -> Self {
        Self::InvalidHeader {
            header: header.into(),
        }
    }
}

/// Everything a run can be configured with.
///
/// Deserializes from JSON; missing fields keep their defaults and unknown
/// fields are rejected.
///
/// ```
/// use tile_downloader::config::DownloadConfig;
///
/// let config = DownloadConfig::from_json_str(r#"{ "min_zoom": 3, "max_zoom": 4 }"#).unwrap();
/// let settings = config.validate().unwrap();
/// assert_eq!(settings.zooms.levels().count(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DownloadConfig {
    pub bbox: BoundingBox,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub tile_url_template: String,
    /// `None` uses the built-in identifying User-Agent.
    pub user_agent: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub output_dir: PathBuf,
    pub tile_extension: String,
    /// Total attempts per tile, including the first.
    pub max_retries: u32,
    pub concurrency: usize,
    pub success_pace_ms: u64,
    pub retry_backoff_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            bbox: BoundingBox {
                min_lat: 24.0,
                max_lat: 40.0,
                min_lon: 44.0,
                max_lon: 63.0,
            },
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            tile_url_template: DEFAULT_TILE_URL_TEMPLATE.to_string(),
            user_agent: None,
            headers: BTreeMap::new(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            tile_extension: DEFAULT_TILE_EXTENSION.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            concurrency: DEFAULT_CONCURRENCY,
            success_pace_ms: DEFAULT_SUCCESS_PACE_MS,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

/// Validated, typed configuration.
#[derive(Debug, Clone)]
pub struct DownloadSettings {
    pub bbox: BoundingBox,
    pub zooms: ZoomRange,
    pub layout: StorageLayout,
    pub template: TileUrlTemplate,
    pub http: HttpSettings,
    pub retry_policy: RetryPolicy,
    pub success_pace: Duration,
    pub concurrency: usize,
}

impl DownloadConfig {
    /// Loads a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Parses JSON config text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] with an empty path.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })
    }

    /// Adds a `NAME:VALUE` header, replacing any earlier value for `NAME`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidHeader`] if there is no colon.
    pub fn add_header(&mut self, header: &str) -> Result<(), ConfigError> {
        let (name, value) = parse_header(header)?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// Checks every field and builds [`DownloadSettings`].
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<DownloadSettings, ConfigError> {
        self.bbox.validate().map_err(ConfigError::region)?;
        let zooms = ZoomRange::new(self.min_zoom, self.max_zoom).map_err(ConfigError::region)?;
        let template = TileUrlTemplate::new(self.tile_url_template.clone())?;

        if !(1..=MAX_CONCURRENCY).contains(&self.concurrency) {
            return Err(ConfigError::Concurrency {
                value: self.concurrency,
            });
        }
        if self.max_retries == 0 {
            return Err(ConfigError::MaxRetries);
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        let extension = self.tile_extension.trim_start_matches('.');
        if extension.is_empty() || extension.contains(['/', '\\']) {
            return Err(ConfigError::InvalidExtension {
                extension: self.tile_extension.clone(),
            });
        }

        let user_agent = match &self.user_agent {
            Some(ua) if ua.trim().is_empty() => return Err(ConfigError::EmptyUserAgent),
            Some(ua) => ua.trim().to_string(),
            None => user_agent::default_tile_user_agent(),
        };
        if HeaderValue::from_str(&user_agent).is_err() {
            return Err(ConfigError::invalid_header(format!("User-Agent:{user_agent}")));
        }

        let mut headers = Vec::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let valid = HeaderName::from_bytes(name.trim().as_bytes()).is_ok()
                && HeaderValue::from_str(value.trim()).is_ok();
            if !valid {
                return Err(ConfigError::invalid_header(format!("{name}:{value}")));
            }
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }

        Ok(DownloadSettings {
            bbox: self.bbox,
            zooms,
            layout: StorageLayout::with_extension(&self.output_dir, extension),
            template,
            http: HttpSettings {
                user_agent,
                headers,
                timeout: Duration::from_millis(self.request_timeout_ms),
            },
            retry_policy: RetryPolicy::new(
                self.max_retries,
                Duration::from_millis(self.retry_backoff_ms),
            ),
            success_pace: Duration::from_millis(self.success_pace_ms),
            concurrency: self.concurrency,
        })
    }
}

/// Splits `NAME:VALUE` at the first colon, trimming both sides.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidHeader`] if there is no colon or the name is
/// empty.
pub fn parse_header(header: &str) -> Result<(String, String), ConfigError> {
    match header.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(ConfigError::invalid_header(header)),
    }
}
