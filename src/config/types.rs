use serde::Deserialize;

/// Main configuration structure for Motorlot
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of detail pages fetched concurrently
    #[serde(rename = "max-concurrent-details")]
    pub max_concurrent_details: u32,

    /// Bound on every wait-for-content-marker step (milliseconds)
    #[serde(rename = "detail-wait-timeout-ms")]
    pub detail_wait_timeout_ms: u64,

    /// Bound on repeated "reveal more content" interactions per detail page
    #[serde(rename = "load-more-attempts")]
    pub load_more_attempts: u32,

    /// Maximum listing pages to visit per crawl; 0 means until exhausted
    #[serde(rename = "max-pages")]
    pub max_pages: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_details: 8,
            detail_wait_timeout_ms: 60_000,
            load_more_attempts: 20,
            max_pages: 0,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "Motorlot".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://github.com/motorlot/motorlot".to_string(),
            contact_email: "crawler@motorlot.dev".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the JSON-lines record stream
    #[serde(rename = "records-path")]
    pub records_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            records_path: "./records.jsonl".to_string(),
        }
    }
}
