//! Configuration module for Motorlot
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. Every setting has a default, so a config file is optional.
//!
//! # Example
//!
//! ```no_run
//! use motorlot::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Concurrent detail fetches: {}", config.crawler.max_concurrent_details);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};

// Re-export validation
pub use validation::validate;
