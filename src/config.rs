//! Configuration management for diagram-sync.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::{ServerConfig, DEFAULT_PORT, DEFAULT_PORT_RANGE};
use crate::cli::Args;
use crate::page::{origin_of, PageConfig, DEFAULT_EMBED_URL, DEFAULT_POLL_INTERVAL};
use crate::session::{DEFAULT_SWEEP_INTERVAL, DEFAULT_TTL};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerSection,
    /// Session expiry configuration.
    pub session: SessionSection,
    /// Served page configuration.
    pub page: PageSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Host address to bind to.
    pub host: String,
    /// Preferred port.
    pub port: u16,
    /// Extra ports tried above `port` when it is busy.
    pub port_range: u16,
    /// Host name the browser uses to reach the server.
    pub public_host: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            port_range: DEFAULT_PORT_RANGE,
            public_host: "localhost".to_string(),
        }
    }
}

/// Session expiry section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    /// Sessions not written for this long are evicted.
    pub ttl_secs: u64,
    /// Seconds between expiry sweeps.
    pub sweep_interval_secs: u64,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_TTL.as_secs(),
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL.as_secs(),
        }
    }
}

/// Served page section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSection {
    /// Rendering surface URL.
    pub embed_url: String,
    /// Client poll interval in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for PageSection {
    fn default() -> Self {
        Self {
            embed_url: DEFAULT_EMBED_URL.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup (for testing).
    pub fn apply_env_from<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = var("DIAGRAM_SYNC_HOST") {
            self.server.host = host;
        }

        if let Some(port) = var("DIAGRAM_SYNC_PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }

        if let Some(ttl) = var("DIAGRAM_SYNC_SESSION_TTL").and_then(|t| t.parse().ok()) {
            self.session.ttl_secs = ttl;
        }

        if let Some(level) = var("DIAGRAM_SYNC_LOG_LEVEL").or_else(|| var("RUST_LOG")) {
            self.logging.level = level;
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(host) = args.host {
            self.server.host = host.to_string();
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }
        if let Some(range) = args.port_range {
            self.server.port_range = range;
        }
        if let Some(ttl) = args.ttl_secs {
            self.session.ttl_secs = ttl;
        }
        if let Some(interval) = args.sweep_interval_secs {
            self.session.sweep_interval_secs = interval;
        }
        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match args.config {
            Some(ref path) => Config::from_file(path)?,
            None => Config::default(),
        };

        config.apply_env();
        config.apply_args(args);

        Ok(config)
    }

    /// Convert to ServerConfig for the API server.
    pub fn to_server_config(&self) -> Result<ServerConfig, ConfigError> {
        let host: IpAddr = self
            .server
            .host
            .parse()
            .map_err(|_| ConfigError::InvalidHost(self.server.host.clone()))?;

        if origin_of(&self.page.embed_url).is_none() {
            return Err(ConfigError::InvalidEmbedUrl(self.page.embed_url.clone()));
        }
        if self.session.sweep_interval_secs == 0 {
            return Err(ConfigError::InvalidInterval("session.sweep_interval_secs"));
        }
        if self.page.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidInterval("page.poll_interval_ms"));
        }

        let page = PageConfig {
            embed_url: self.page.embed_url.clone(),
            public_host: self.server.public_host.clone(),
            poll_interval: Duration::from_millis(self.page.poll_interval_ms),
        };

        Ok(ServerConfig::new(host, self.server.port)
            .with_port_range(self.server.port_range)
            .with_expiry(
                Duration::from_secs(self.session.ttl_secs),
                Duration::from_secs(self.session.sweep_interval_secs),
            )
            .with_page(page))
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// Invalid host address.
    InvalidHost(String),
    /// Embed URL has no usable origin.
    InvalidEmbedUrl(String),
    /// A periodic interval was set to zero.
    InvalidInterval(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::InvalidHost(host) => write!(f, "invalid host address: {}", host),
            Self::InvalidEmbedUrl(url) => write!(f, "invalid embed url: {}", url),
            Self::InvalidInterval(key) => write!(f, "{} must be greater than zero", key),
        }
    }
}

impl std::error::Error for ConfigError {}
