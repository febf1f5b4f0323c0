//! Motorlot: site-specific crawlers for car marketplace and auction listings
//!
//! This crate implements crawlers for five car sites. Each spider follows the
//! same contract: fetch a listing page, enumerate item URLs, paginate until
//! exhausted, fetch each detail page, extract the site's fields and normalize
//! them into one `ListingRecord` shape emitted to a record sink.

pub mod browser;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod query;
pub mod record;
pub mod sites;

use thiserror::Error;

/// Main error type for Motorlot operations
#[derive(Debug, Error)]
pub enum MotorlotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {message}")]
    Http { url: String, message: String },

    #[error("Start request failed for {url}: {message}")]
    StartRequest { url: String, message: String },

    #[error("Malformed payload at {url}: {message}")]
    MalformedPayload { url: String, message: String },

    #[error("Navigation timeout waiting for `{selector}` at {url}")]
    NavigationTimeout { url: String, selector: String },

    #[error("Browser session error: {0}")]
    Browser(String),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for Motorlot operations
pub type Result<T> = std::result::Result<T, MotorlotError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{NextPageSignal, PaginationCursor};
pub use query::SearchQuery;
pub use record::{Bid, ListingRecord, Site};
