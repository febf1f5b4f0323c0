//! Per-site spiders
//!
//! Every spider implements the same contract: build a listing URL for a page
//! index, scan one fetched listing page into item URLs plus a next-page
//! signal, and scrape one detail page into a normalized record. All the
//! site-specific selector recipes live here; everything above this module is
//! site-agnostic.

pub mod autotrader;
pub mod bringatrailer;
pub mod cargurus;
pub mod carsandbids;
pub mod carsdotcom;

pub use autotrader::AutotraderSpider;
pub use bringatrailer::BringATrailerSpider;
pub use cargurus::CargurusSpider;
pub use carsandbids::CarsAndBidsSpider;
pub use carsdotcom::CarsDotComSpider;

use crate::config::Config;
use crate::crawler::{build_http_client, fetch_url, FetchResult, ListingPage, PaginationCursor};
use crate::query::SearchQuery;
use crate::record::{ListingRecord, Site};
use crate::{MotorlotError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;

/// Common contract for all site spiders
#[async_trait]
pub trait Spider: Send + Sync {
    /// The site this spider crawls
    fn site(&self) -> Site;

    /// A fresh pagination cursor at the site's starting page index
    fn cursor(&self) -> PaginationCursor;

    /// The listing-page URL for the cursor's current position
    fn listing_url(&self, cursor: &PaginationCursor) -> String;

    /// Fetches one listing page and scans it into item URLs plus the
    /// next-page signal
    async fn fetch_listing(&self, url: &str) -> Result<ListingPage>;

    /// Fetches one detail page and scrapes it into a record
    ///
    /// `Ok(None)` means the payload could not be parsed and the item is
    /// skipped; `Err` means the fetch/render itself failed. Neither is fatal
    /// to the crawl.
    async fn scrape_item(&self, url: &str) -> Result<Option<ListingRecord>>;
}

/// Formats a site-displayed auction end date as MM/DD/YYYY
///
/// The sites render dates in a handful of layouts; an unrecognized one falls
/// back to the local date of the run, matching the treatment of a missing
/// scrape timestamp.
pub(crate) fn parse_end_date(text: &str) -> String {
    const LAYOUTS: [&str; 4] = ["%m/%d/%y", "%m/%d/%Y", "%B %d, %Y", "%b %d, %Y"];

    let trimmed = text.trim();
    for layout in LAYOUTS {
        if let Ok(date) = chrono::NaiveDate::parse_from_str(trimmed, layout) {
            return date.format("%m/%d/%Y").to_string();
        }
    }
    chrono::Local::now().format("%m/%d/%Y").to_string()
}

/// Fetches `url` and returns its body, mapping every failure mode to an
/// HTTP error the caller can log or propagate
pub(crate) async fn fetch_body(client: &Client, url: &str) -> Result<String> {
    match fetch_url(client, url).await {
        FetchResult::Success { body, .. } => Ok(body),
        FetchResult::HttpError { status_code } => Err(MotorlotError::Http {
            url: url.to_string(),
            message: format!("status {}", status_code),
        }),
        FetchResult::NetworkError { error, timed_out } => Err(MotorlotError::Http {
            url: url.to_string(),
            message: if timed_out {
                format!("timed out: {}", error)
            } else {
                error
            },
        }),
    }
}

/// Builds the spider for `site`
///
/// HTTP spiders share a client built from the user-agent config; the
/// browser-driven site launches its headless session here.
pub fn build_spider(
    site: Site,
    config: &Config,
    query: &SearchQuery,
) -> Result<Arc<dyn Spider>> {
    Ok(match site {
        Site::CarsAndBids => Arc::new(CarsAndBidsSpider::launch(config, query)?),
        Site::BringATrailer => Arc::new(BringATrailerSpider::new(build_http_client(
            &config.user_agent,
        )?)),
        Site::Autotrader => Arc::new(AutotraderSpider::new(build_http_client(
            &config.user_agent,
        )?)),
        Site::Cargurus => Arc::new(CargurusSpider::new(build_http_client(
            &config.user_agent,
        )?)),
        Site::CarsDotCom => Arc::new(CarsDotComSpider::new(build_http_client(
            &config.user_agent,
        )?)),
    })
}
