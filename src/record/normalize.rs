//! Normalization of raw extractor output into a `ListingRecord`
//!
//! All textual fields pass through the same cleaning transform: embedded
//! newlines collapse to single spaces and surrounding whitespace is trimmed.
//! Fields the extractor could not locate resolve to the empty string, the
//! sequences to empty vectors, and `reserve` to true.

use crate::record::{Bid, ListingRecord, Site};
use chrono::Local;

/// Applies the uniform string-cleaning transform to one textual value
pub fn clean(value: &str) -> String {
    value.replace('\n', " ").trim().to_string()
}

fn clean_opt(value: Option<String>) -> String {
    value.as_deref().map(clean).unwrap_or_default()
}

/// Raw per-field extractor output for one detail page
///
/// Each spider fills in whatever its site carries and leaves the rest `None`.
#[derive(Debug, Default, Clone)]
pub struct RawListing {
    pub year: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub auction_end_date: Option<String>,
    pub bid_count: Option<String>,
    pub comment_count: Option<String>,
    pub comment_text: Vec<String>,
    pub engine: Option<String>,
    pub drivetrain: Option<String>,
    pub mileage: Option<String>,
    pub vin: Option<String>,
    pub transmission: Option<String>,
    pub title_status: Option<String>,
    pub exterior: Option<String>,
    pub interior: Option<String>,
    pub body_style: Option<String>,
    pub model: Option<String>,
    pub make: Option<String>,
    pub location: Option<String>,
    pub seller: Option<String>,
    pub seller_type: Option<String>,
    pub bids: Vec<Bid>,
    /// None means no explicit no-reserve signal was seen
    pub reserve: Option<bool>,
}

/// Assembles the final record from raw extractor output
///
/// `scraped_date` is stamped here, once, with the local date of the run.
pub fn normalize(raw: RawListing, site: Site, source_page: &str) -> ListingRecord {
    normalize_on(raw, site, source_page, &Local::now().format("%m/%d/%Y").to_string())
}

/// Like [`normalize`] but with the scrape date supplied, for deterministic tests
pub fn normalize_on(
    raw: RawListing,
    site: Site,
    source_page: &str,
    scraped_date: &str,
) -> ListingRecord {
    ListingRecord {
        source: site,
        year: clean_opt(raw.year),
        description: clean_opt(raw.description),
        price: clean_opt(raw.price),
        auction_end_date: clean_opt(raw.auction_end_date),
        bid_count: clean_opt(raw.bid_count),
        comment_count: clean_opt(raw.comment_count),
        comment_text: raw.comment_text.iter().map(|c| clean(c)).collect(),
        engine: clean_opt(raw.engine),
        drivetrain: clean_opt(raw.drivetrain),
        mileage: clean_opt(raw.mileage),
        vin: clean_opt(raw.vin),
        transmission: clean_opt(raw.transmission),
        title_status: clean_opt(raw.title_status),
        exterior: clean_opt(raw.exterior),
        interior: clean_opt(raw.interior),
        body_style: clean_opt(raw.body_style),
        model: clean_opt(raw.model),
        make: clean_opt(raw.make),
        location: clean_opt(raw.location),
        seller: clean_opt(raw.seller),
        seller_type: clean_opt(raw.seller_type),
        bids: raw
            .bids
            .into_iter()
            .map(|b| Bid {
                bidder: clean(&b.bidder),
                amount: clean(&b.amount),
                timestamp: b.timestamp,
            })
            .collect(),
        reserve: raw.reserve.unwrap_or(true),
        scraped_date: scraped_date.to_string(),
        source_page: source_page.to_string(),
    }
}
