//! carsandbids.com spider
//!
//! The only site that requires a real browser: both the auction list and the
//! detail pages are rendered client-side. A listing page is ready once the
//! auctions list element exists; a detail page once the quick-facts panel
//! exists, after which the comment thread is expanded by clicking its
//! load-more control until it disappears. Rendering happens on blocking
//! tasks; all extraction runs over the captured page content.

use crate::browser::BrowserEngine;
use crate::config::Config;
use crate::crawler::{ListingPage, NextPageSignal, PaginationCursor};
use crate::extract::html::{all_text, attr, exists, first_text, first_year, quick_fact};
use crate::query::SearchQuery;
use crate::record::{normalize, Bid, ListingRecord, RawListing, Site};
use crate::sites::{parse_end_date, Spider};
use crate::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use scraper::{Html, Selector};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub struct CarsAndBidsSpider {
    engine: Arc<BrowserEngine>,
    base_url: String,
    /// URL-encoded search phrase; empty means browse past auctions
    search: String,
    wait_timeout: Duration,
    load_more_attempts: u32,
}

impl CarsAndBidsSpider {
    /// Launches the headless session this spider renders pages with
    pub fn launch(config: &Config, query: &SearchQuery) -> Result<Self> {
        Ok(Self {
            engine: Arc::new(BrowserEngine::launch()?),
            base_url: "https://carsandbids.com".to_string(),
            search: if query.is_empty() {
                String::new()
            } else {
                query.encoded()
            },
            wait_timeout: Duration::from_millis(config.crawler.detail_wait_timeout_ms),
            load_more_attempts: config.crawler.load_more_attempts,
        })
    }
}

/// Scans a rendered listing page into item URLs plus the next-arrow signal
fn scan_listing(document: &Html, base: &Url) -> (Vec<String>, NextPageSignal) {
    let links = all_attrs(document, "ul.auctions-list li a.hero", "href");
    let item_urls: Vec<String> = links
        .iter()
        .filter_map(|href| base.join(href).ok())
        .map(String::from)
        .collect();

    let signal = if exists(document, "li.arrow.next button") {
        NextPageSignal::NextControl {
            disabled: attr(document, "li.arrow.next button", "disabled").is_some(),
        }
    } else {
        NextPageSignal::NoNextControl
    };

    (item_urls, signal)
}

/// Extracts one record from a rendered, fully expanded detail page
fn scrape_document(document: &Html, source_page: &str) -> ListingRecord {
    let fact = |label: &str| quick_fact(document, "div.quick-facts dl dt", label);

    let raw = RawListing {
        year: first_text(document, "title").as_deref().and_then(first_year),
        description: Some(all_text(document, "div[class*='auction-title'] ~ div h2").join("")),
        price: Some(all_text(document, "div[class*='current-bid'] span.bid-value").join("")),
        auction_end_date: Some(parse_end_date(&all_text(document, "span.time-ended").join(""))),
        bid_count: first_text(document, "li.num-bids span.value"),
        comment_count: first_text(document, "li.num-comments span.value"),
        comment_text: all_text(document, "li.comment div.message"),
        engine: fact("Engine"),
        drivetrain: fact("Drivetrain"),
        mileage: fact("Mileage"),
        vin: fact("VIN"),
        transmission: fact("Transmission"),
        title_status: fact("Title Status"),
        exterior: fact("Exterior Color"),
        interior: fact("Interior Color"),
        body_style: fact("Body Style"),
        model: fact("Model"),
        make: fact("Make"),
        location: fact("Location"),
        seller: fact("Seller"),
        seller_type: fact("Seller Type"),
        bids: scrape_bids(document),
        reserve: Some(!exists(document, "div.auction-heading span.no-reserve")),
    };
    normalize(raw, Site::CarsAndBids, source_page)
}

/// Collects the bid history entries from the comment thread
fn scrape_bids(document: &Html) -> Vec<Bid> {
    let bid_selector = match Selector::parse("li.bid") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };
    let user = Selector::parse("div.username div.text a").unwrap();
    let amount = Selector::parse("dd").unwrap();
    let time = Selector::parse("div.text span.time").unwrap();

    document
        .select(&bid_selector)
        .map(|entry| Bid {
            bidder: entry
                .select(&user)
                .next()
                .map(|a| {
                    a.value()
                        .attr("title")
                        .map(str::to_string)
                        .unwrap_or_else(|| a.text().collect::<String>().trim().to_string())
                })
                .unwrap_or_default(),
            amount: entry
                .select(&amount)
                .flat_map(|dd| dd.text())
                .collect::<String>()
                .trim()
                .to_string(),
            timestamp: entry
                .select(&time)
                .next()
                .and_then(|t| t.value().attr("data-full"))
                .and_then(parse_bid_timestamp),
        })
        .collect()
}

/// Unix timestamp of a bid's `data-full` attribute, when it is recognizable
fn parse_bid_timestamp(text: &str) -> Option<i64> {
    const LAYOUTS: [&str; 4] = [
        "%m/%d/%y %I:%M %p",
        "%m/%d/%Y %I:%M %p",
        "%b %d, %Y %I:%M %p",
        "%B %d, %Y %I:%M %p",
    ];

    let trimmed = text.trim();
    for layout in LAYOUTS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, layout) {
            return Some(datetime.and_utc().timestamp());
        }
    }
    // A bare date still yields a usable ordering key.
    NaiveDate::parse_from_str(trimmed, "%m/%d/%y")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
}

/// Attribute values of every element matching `selector`
fn all_attrs(document: &Html, selector: &str, name: &str) -> Vec<String> {
    let selector = match Selector::parse(selector) {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };
    document
        .select(&selector)
        .filter_map(|el| el.value().attr(name))
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl Spider for CarsAndBidsSpider {
    fn site(&self) -> Site {
        Site::CarsAndBids
    }

    fn cursor(&self) -> PaginationCursor {
        PaginationCursor::new(1, 1)
    }

    fn listing_url(&self, cursor: &PaginationCursor) -> String {
        if self.search.is_empty() {
            format!("{}/past-auctions/?page={}", self.base_url, cursor.current())
        } else {
            format!(
                "{}/search?q={}&page={}",
                self.base_url,
                self.search,
                cursor.current()
            )
        }
    }

    async fn fetch_listing(&self, url: &str) -> Result<ListingPage> {
        let engine = Arc::clone(&self.engine);
        let target = url.to_string();
        let timeout = self.wait_timeout;

        let content = tokio::task::spawn_blocking(move || -> Result<String> {
            let session = engine.open(&target, "ul.auctions-list", timeout)?;
            session.scroll_to_bottom();
            session.content()
        })
        .await??;

        let document = Html::parse_document(&content);
        let base = Url::parse(&self.base_url)?;
        let (item_urls, signal) = scan_listing(&document, &base);
        debug!("Rendered listing page yielded {} auctions", item_urls.len());
        Ok(ListingPage { item_urls, signal })
    }

    async fn scrape_item(&self, url: &str) -> Result<Option<ListingRecord>> {
        let engine = Arc::clone(&self.engine);
        let target = url.to_string();
        let timeout = self.wait_timeout;
        let attempts = self.load_more_attempts;

        let content = tokio::task::spawn_blocking(move || -> Result<String> {
            let session = engine.open(&target, "div.quick-facts", timeout)?;
            session.click_until_gone("li.load-more button", attempts, Duration::from_millis(500));
            session.content()
        })
        .await??;

        let document = Html::parse_document(&content);
        Ok(Some(scrape_document(&document, url)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAIL_HTML: &str = r##"
        <html><head><title>2019 Audi RS 5 Sportback auction</title></head><body>
          <div class="row auction-heading"><span class="no-reserve">No Reserve</span></div>
          <div class="auction-title "><h1>2019 Audi RS 5</h1></div>
          <div><h2>No Reserve: Modified 2019 Audi RS 5 Sportback</h2></div>
          <div class="current-bid "><span class="bid-value">$41,250</span></div>
          <span class="time-ended">8/14/23</span>
          <ul>
            <li class="num-bids"><span class="value">31</span></li>
            <li class="num-comments"><span class="value">104</span></li>
          </ul>
          <div class="quick-facts"><dl>
            <dt>Make</dt><dd>Audi</dd>
            <dt>Model</dt><dd>RS 5</dd>
            <dt>Mileage</dt><dd>31,000</dd>
            <dt>VIN</dt><dd>WUABWCF53KA900001</dd>
            <dt>Title Status</dt><dd>Clean (CA)</dd>
            <dt>Location</dt><dd>Los Angeles, CA 90012</dd>
            <dt>Seller</dt><dd>rs5fan</dd>
            <dt>Engine</dt><dd>2.9L Twin-Turbocharged V6</dd>
            <dt>Drivetrain</dt><dd>All-wheel drive</dd>
            <dt>Transmission</dt><dd>Automatic (8-Speed)</dd>
            <dt>Body Style</dt><dd>Sedan</dd>
            <dt>Exterior Color</dt><dd>Nardo Gray</dd>
            <dt>Interior Color</dt><dd>Black</dd>
            <dt>Seller Type</dt><dd>Private Party</dd>
          </dl></div>
          <ul class="comments">
            <li class="comment"><div class="message"><p>Sharp build, good luck!</p></div></li>
            <li class="bid">
              <div class="username"><div class="text"><a class="user" href="/u/9" title="bidderOne">bidderOne</a>
                <span class="time" data-full="8/14/23 1:05 PM">1:05 PM</span></div></div>
              <dl><dt>Bid</dt><dd>$41,250</dd></dl>
            </li>
            <li class="comment"><div class="message"><p>GLWS</p></div></li>
          </ul>
        </body></html>"##;

    #[test]
    fn test_scrape_document_full() {
        let document = Html::parse_document(DETAIL_HTML);
        let record = scrape_document(&document, "https://x/auctions/rs5");

        assert_eq!(record.source, Site::CarsAndBids);
        assert_eq!(record.year, "2019");
        assert_eq!(
            record.description,
            "No Reserve: Modified 2019 Audi RS 5 Sportback"
        );
        assert_eq!(record.price, "$41,250");
        assert_eq!(record.auction_end_date, "08/14/2023");
        assert_eq!(record.bid_count, "31");
        assert_eq!(record.comment_count, "104");
        assert_eq!(record.make, "Audi");
        assert_eq!(record.model, "RS 5");
        assert_eq!(record.vin, "WUABWCF53KA900001");
        assert_eq!(record.title_status, "Clean (CA)");
        assert_eq!(record.engine, "2.9L Twin-Turbocharged V6");
        assert_eq!(record.seller, "rs5fan");
        assert_eq!(record.seller_type, "Private Party");
        assert!(!record.reserve);
    }

    #[test]
    fn test_scrape_bids() {
        let document = Html::parse_document(DETAIL_HTML);
        let bids = scrape_bids(&document);

        assert_eq!(bids.len(), 1);
        assert_eq!(bids[0].bidder, "bidderOne");
        assert_eq!(bids[0].amount, "$41,250");
        assert!(bids[0].timestamp.is_some());
    }

    #[test]
    fn test_comments_exclude_bids() {
        let document = Html::parse_document(DETAIL_HTML);
        let record = scrape_document(&document, "https://x/auctions/rs5");
        assert_eq!(record.comment_text.len(), 2);
        assert_eq!(record.comment_text[0], "Sharp build, good luck!");
    }

    #[test]
    fn test_scan_listing_with_next_enabled() {
        let html = r##"
            <ul class="auctions-list past-auctions ">
              <li class="auction-item "><a class="hero" href="/auctions/abc/2019-audi-rs-5"></a></li>
              <li class="auction-item "><a class="hero" href="/auctions/def/1990-mazda-miata"></a></li>
            </ul>
            <li class="arrow next"><button></button></li>"##;
        let document = Html::parse_document(html);
        let base = Url::parse("https://carsandbids.com").unwrap();
        let (urls, signal) = scan_listing(&document, &base);

        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0], "https://carsandbids.com/auctions/abc/2019-audi-rs-5");
        assert_eq!(signal, NextPageSignal::NextControl { disabled: false });
    }

    #[test]
    fn test_scan_listing_with_next_disabled() {
        let html = r##"
            <ul class="auctions-list past-auctions "></ul>
            <li class="arrow next"><button disabled></button></li>"##;
        let document = Html::parse_document(html);
        let base = Url::parse("https://carsandbids.com").unwrap();
        let (urls, signal) = scan_listing(&document, &base);

        assert!(urls.is_empty());
        assert_eq!(signal, NextPageSignal::NextControl { disabled: true });
    }

    #[test]
    fn test_scan_listing_without_next_control() {
        let document = Html::parse_document("<ul class='auctions-list'></ul>");
        let base = Url::parse("https://carsandbids.com").unwrap();
        let (_, signal) = scan_listing(&document, &base);
        assert_eq!(signal, NextPageSignal::NoNextControl);
    }

    #[test]
    fn test_parse_bid_timestamp() {
        assert!(parse_bid_timestamp("8/14/23 1:05 PM").is_some());
        assert!(parse_bid_timestamp("8/14/23").is_some());
        assert_eq!(parse_bid_timestamp("moments ago"), None);
    }
}
