//! Crawl driver
//!
//! Orchestrates one crawl run: start → paginate listing pages → fetch each
//! detail page → extract and normalize → emit. Detail extractions are
//! independent and run concurrently under a semaphore; emission order is not
//! guaranteed to match discovery order. A failed start request is the only
//! fatal error; everything after it is recovered per item or per page.

use crate::config::CrawlerConfig;
use crate::crawler::pagination::NextPageSignal;
use crate::output::{CrawlStats, RecordSink};
use crate::sites::Spider;
use crate::{MotorlotError, Result};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// One scanned listing page: the item URLs it enumerates and the signal
/// deciding whether a next page exists
#[derive(Debug)]
pub struct ListingPage {
    pub item_urls: Vec<String>,
    pub signal: NextPageSignal,
}

/// Site-agnostic crawl orchestrator
pub struct CrawlDriver {
    config: CrawlerConfig,
    sink: Arc<dyn RecordSink>,
}

impl CrawlDriver {
    pub fn new(config: CrawlerConfig, sink: Arc<dyn RecordSink>) -> Self {
        Self { config, sink }
    }

    /// Runs one crawl with `spider` until its pagination cursor is exhausted
    ///
    /// Returns the run's counters. Fails only when the start request itself
    /// fails; later listing-page failures terminate pagination normally and
    /// per-item failures are logged and skipped.
    pub async fn run(&self, spider: Arc<dyn Spider>) -> Result<CrawlStats> {
        let mut cursor = spider.cursor();
        let emitted: Arc<Mutex<HashSet<String>>> = Arc::new(Mutex::new(HashSet::new()));
        let stats = Arc::new(Mutex::new(CrawlStats::new()));
        let permits = Arc::new(Semaphore::new(self.config.max_concurrent_details as usize));
        let mut details: JoinSet<()> = JoinSet::new();

        info!("Starting {} crawl", spider.site());

        let mut first_page = true;
        let mut pages_visited = 0u64;

        while !cursor.is_exhausted() {
            if self.config.max_pages > 0 && pages_visited >= self.config.max_pages {
                info!("Reached max-pages bound ({}), stopping", self.config.max_pages);
                break;
            }

            let listing_url = spider.listing_url(&cursor);
            debug!("Fetching listing page: {}", listing_url);

            let page = match spider.fetch_listing(&listing_url).await {
                Ok(page) => page,
                Err(e) if first_page => {
                    return Err(MotorlotError::StartRequest {
                        url: listing_url,
                        message: e.to_string(),
                    });
                }
                Err(e) => {
                    warn!("Listing page {} failed, stopping pagination: {}", listing_url, e);
                    break;
                }
            };
            first_page = false;
            pages_visited += 1;

            {
                let mut stats = stats.lock().unwrap();
                stats.listing_pages += 1;
                stats.items_discovered += page.item_urls.len() as u64;
            }
            debug!(
                "Listing page {} yielded {} item refs",
                cursor.current(),
                page.item_urls.len()
            );

            for item_url in page.item_urls {
                // Crawl-wide dedup of emitted detail URLs.
                let fresh = emitted.lock().unwrap().insert(item_url.clone());
                if !fresh {
                    stats.lock().unwrap().duplicates += 1;
                    continue;
                }

                let permit = match permits.clone().acquire_owned().await {
                    Ok(p) => p,
                    Err(_) => break,
                };
                let spider = Arc::clone(&spider);
                let sink = Arc::clone(&self.sink);
                let stats = Arc::clone(&stats);

                details.spawn(async move {
                    let _permit = permit;
                    match spider.scrape_item(&item_url).await {
                        Ok(Some(record)) => match sink.emit(&record) {
                            Ok(()) => stats.lock().unwrap().records_emitted += 1,
                            Err(e) => {
                                warn!("Failed to emit record for {}: {}", item_url, e);
                                stats.lock().unwrap().items_skipped += 1;
                            }
                        },
                        Ok(None) => {
                            debug!("No parsable payload at {}, item skipped", item_url);
                            stats.lock().unwrap().items_skipped += 1;
                        }
                        Err(e) => {
                            warn!("Detail page {} skipped: {}", item_url, e);
                            stats.lock().unwrap().items_skipped += 1;
                        }
                    }
                });
            }

            cursor.advance(&page.signal);
        }

        if cursor.is_exhausted() {
            info!("Pagination exhausted after {} listing pages", pages_visited);
        }

        // Drain outstanding detail extractions.
        while details.join_next().await.is_some() {}

        self.sink.finalize()?;

        let stats = *stats.lock().unwrap();
        stats.log_summary();
        Ok(stats)
    }
}
