//! Client configuration.
//!
//! `ClientConfig` tells a [`TrackerClient`](crate::client::TrackerClient) where
//! the analytics service lives and where to keep its durable state.
//!
//! # Examples
//!
//! ## Use defaults
//! ```rust
//! use session_tracker::config::ClientConfig;
//! let cfg = ClientConfig::default();
//! assert_eq!(cfg.base_url, "http://localhost:3000");
//! assert_eq!(cfg.report_path, "/api/report");
//! ```
//!
//! ## Customize with the builder
//! ```rust
//! use session_tracker::config::ClientConfig;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = ClientConfig::builder()
//!     .base_url("https://analytics.example.com")
//!     .report_path("/api/session/report")
//!     .storage_path("tracker.db")
//!     .build()?; // returns Result<ClientConfig, ConfigError>
//! # Ok(()) }
//! ```
//!
//! # Environment
//!
//! [`ClientConfig::from_env`] applies these variables over the defaults:
//! - `TRACKER_API_URL`: base address of the service.
//! - `TRACKER_REPORT_PATH`: report endpoint path.
//! - `TRACKER_STORAGE_PATH`: SQLite file for durable client storage.

use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_REPORT_PATH: &str = "/api/report";
/// Report path used by the alternate deployment of the service.
pub const ALTERNATE_REPORT_PATH: &str = "/api/session/report";
const DEFAULT_USER_AGENT: &str = concat!("session-tracker/", env!("CARGO_PKG_VERSION"));

pub const ENV_API_URL: &str = "TRACKER_API_URL";
pub const ENV_REPORT_PATH: &str = "TRACKER_REPORT_PATH";
pub const ENV_STORAGE_PATH: &str = "TRACKER_STORAGE_PATH";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base address every endpoint path is appended to
    pub base_url: String,
    /// Path of the report endpoint
    pub report_path: String,
    /// User agent string for HTTP requests
    pub user_agent: String,
    /// SQLite file backing durable storage. `None` keeps everything in memory.
    pub storage_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            report_path: DEFAULT_REPORT_PATH.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            storage_path: None,
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Defaults overridden by the `TRACKER_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut builder = Self::builder();
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.is_empty()) {
            builder = builder.base_url(url);
        }
        if let Some(path) = lookup(ENV_REPORT_PATH).filter(|v| !v.is_empty()) {
            builder = builder.report_path(path);
        }
        if let Some(path) = lookup(ENV_STORAGE_PATH).filter(|v| !v.is_empty()) {
            builder = builder.storage_path(path);
        }
        builder.build()
    }

    /// Origin of the base address, used as the durable storage scope.
    pub fn origin(&self) -> String {
        match url::Url::parse(&self.base_url) {
            Ok(u) => u.origin().ascii_serialization(),
            Err(_) => self.base_url.clone(),
        }
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    inner: ClientConfig,
}

impl ClientConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut ClientConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn base_url<S: Into<String>>(self, url: S) -> Self { self.map(|c| c.base_url = url.into()) }
    pub fn report_path<S: Into<String>>(self, path: S) -> Self { self.map(|c| c.report_path = path.into()) }
    pub fn user_agent<S: Into<String>>(self, ua: S) -> Self { self.map(|c| c.user_agent = ua.into()) }
    pub fn storage_path<P: Into<PathBuf>>(self, path: P) -> Self { self.map(|c| c.storage_path = Some(path.into())) }
    pub fn in_memory_storage(self) -> Self { self.map(|c| c.storage_path = None) }

    /// Apply multiple changes in one go.
    pub fn with(self, f: impl FnOnce(&mut ClientConfig)) -> Self { self.map(f) }

    /// Validate and build the final config.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        validate(&self.inner)?;
        Ok(self.inner)
    }
}

// ---------- Validation ----------

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidBaseUrl(String),
    UnsupportedScheme(String),
    RelativeReportPath(String),
    EmptyUserAgent,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidBaseUrl(u) =>
                write!(f, "base_url {u:?} is not a valid URL"),
            ConfigError::UnsupportedScheme(s) =>
                write!(f, "base_url scheme {s:?} is not supported (expected http or https)"),
            ConfigError::RelativeReportPath(p) =>
                write!(f, "report_path {p:?} must start with '/'"),
            ConfigError::EmptyUserAgent =>
                write!(f, "user_agent must not be empty"),
        }
    }
}
impl std::error::Error for ConfigError {}

fn validate(c: &ClientConfig) -> Result<(), ConfigError> {
    let url = url::Url::parse(&c.base_url)
        .map_err(|_| ConfigError::InvalidBaseUrl(c.base_url.clone()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::UnsupportedScheme(url.scheme().to_string()));
    }
    if !c.report_path.starts_with('/') {
        return Err(ConfigError::RelativeReportPath(c.report_path.clone()));
    }
    if c.user_agent.trim().is_empty() {
        return Err(ConfigError::EmptyUserAgent);
    }
    Ok(())
}
