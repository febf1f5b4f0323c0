//! HTTP fetcher
//!
//! Builds the shared HTTP client and fetches listing/detail pages. Fetch
//! outcomes are classified rather than raised: a failed detail fetch skips a
//! single item, never the crawl.

use crate::config::UserAgentConfig;
use reqwest::Client;
use std::time::Duration;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Response body
        body: String,
    },

    /// Non-success HTTP status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, etc.)
    NetworkError {
        /// Error description
        error: String,
        /// Whether the error was a timeout
        timed_out: bool,
    },
}

impl FetchResult {
    /// The body of a successful fetch, or `None`
    pub fn body(&self) -> Option<&str> {
        match self {
            FetchResult::Success { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Builds the HTTP client shared by a crawl
///
/// User agent format: `CrawlerName/Version (+ContactURL; ContactEmail)`.
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and classifies the outcome
pub async fn fetch_url(client: &Client, url: &str) -> FetchResult {
    match client.get(url).send().await {
        Ok(response) => {
            let status = response.status();
            let final_url = response.url().to_string();

            if !status.is_success() {
                return FetchResult::HttpError {
                    status_code: status.as_u16(),
                };
            }

            match response.text().await {
                Ok(body) => FetchResult::Success {
                    final_url,
                    status_code: status.as_u16(),
                    body,
                },
                Err(e) => FetchResult::NetworkError {
                    error: e.to_string(),
                    timed_out: e.is_timeout(),
                },
            }
        }
        Err(e) => FetchResult::NetworkError {
            error: e.to_string(),
            timed_out: e.is_timeout(),
        },
    }
}
