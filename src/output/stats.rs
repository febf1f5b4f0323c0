//! Crawl counters
//!
//! One `CrawlStats` is accumulated per run and logged at completion.

/// Counters accumulated over one crawl run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Listing pages fetched
    pub listing_pages: u64,

    /// Item references discovered across all listing pages
    pub items_discovered: u64,

    /// Records emitted to the sink
    pub records_emitted: u64,

    /// Items skipped (malformed payload, timeout, fetch failure)
    pub items_skipped: u64,

    /// Item references dropped because their URL was already emitted
    pub duplicates: u64,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share of discovered items that produced a record, as a percentage
    pub fn yield_rate(&self) -> f64 {
        if self.items_discovered == 0 {
            return 0.0;
        }
        (self.records_emitted as f64 / self.items_discovered as f64) * 100.0
    }

    /// Logs the final counters
    pub fn log_summary(&self) {
        tracing::info!(
            "Crawl finished: {} listing pages, {} items discovered, {} records emitted, {} skipped, {} duplicates ({:.1}% yield)",
            self.listing_pages,
            self.items_discovered,
            self.records_emitted,
            self.items_skipped,
            self.duplicates,
            self.yield_rate()
        );
    }
}
