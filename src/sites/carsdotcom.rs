//! cars.com spider
//!
//! Listing pages are HTML addressed by page number, but the item references
//! live in a `data-site-activity` JSON attribute rather than in anchors. The
//! site's "current page" badge is the only trustworthy pagination indicator:
//! past the last page the site keeps serving the same page, so a repeated
//! badge value ends the crawl. Detail fields come from a mix of selectors,
//! a spec list, and two small embedded JSON blobs.

use crate::crawler::{ListingPage, NextPageSignal, PaginationCursor};
use crate::extract::html::{all_text, attr, first_text, first_year, label_value_pairs};
use crate::record::{normalize, ListingRecord, RawListing, Site};
use crate::sites::{fetch_body, Spider};
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;
use serde_json::Value;
use tracing::debug;

const PAGE_SIZE: u64 = 20;

pub struct CarsDotComSpider {
    client: Client,
    base_url: String,
}

impl CarsDotComSpider {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, "https://www.cars.com")
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn detail_url(&self, id: &str) -> String {
        format!("{}/vehicledetail/{}/", self.base_url, id)
    }

    fn scrape_document(&self, document: &Html, source_page: &str) -> ListingRecord {
        let specs = label_value_pairs(document, "dl.fancy-description-list");
        let spec = |label: &str| {
            specs
                .iter()
                .find(|(name, _)| name.to_lowercase().contains(&label.to_lowercase()))
                .map(|(_, value)| value.clone())
        };

        let badging: Option<Value> = attr(document, "div.vehicle-badging", "data-override-payload")
            .and_then(|raw| serde_json::from_str(&raw).ok());
        let activity: Option<Value> = first_text(document, "script#initial-activity-data")
            .and_then(|raw| serde_json::from_str(&raw).ok());

        let badging_field = |key: &str| {
            badging
                .as_ref()
                .and_then(|b| b.get(key))
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        let raw = RawListing {
            year: first_text(document, "h1.listing-title").and_then(|t| first_year(&t)),
            description: first_text(document, "div.sellers-notes"),
            price: first_text(document, "div.price-section span.primary-price"),
            comment_count: first_text(document, "a[data-linkname='research-consumer-reviews']")
                .and_then(|t| digits(&t)),
            engine: spec("engine"),
            drivetrain: spec("drivetrain"),
            mileage: spec("mileage"),
            vin: spec("vin"),
            transmission: spec("transmission"),
            exterior: spec("exterior"),
            interior: spec("interior"),
            body_style: badging_field("bodystyle"),
            model: badging_field("model"),
            // The site nowhere carries a bare make; it stays empty.
            make: Some(String::new()),
            location: first_text(document, "div.dealer-address"),
            seller: first_text(document, "h3[class*='seller-name']"),
            seller_type: activity
                .as_ref()
                .and_then(|a| a.get("seller_type"))
                .and_then(Value::as_str)
                .map(str::to_string),
            reserve: Some(true),
            ..Default::default()
        };
        normalize(raw, Site::CarsDotCom, source_page)
    }
}

/// First run of consecutive ASCII digits in `text`
fn digits(text: &str) -> Option<String> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let run: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    Some(run)
}

#[async_trait]
impl Spider for CarsDotComSpider {
    fn site(&self) -> Site {
        Site::CarsDotCom
    }

    fn cursor(&self) -> PaginationCursor {
        PaginationCursor::new(1, 1)
    }

    fn listing_url(&self, cursor: &PaginationCursor) -> String {
        format!(
            "{}/shopping/results/?page={}&page_size={}",
            self.base_url,
            cursor.current(),
            PAGE_SIZE
        )
    }

    async fn fetch_listing(&self, url: &str) -> Result<ListingPage> {
        let body = fetch_body(&self.client, url).await?;
        let document = Html::parse_document(&body);

        let activity = attr(
            &document,
            "div.sds-page-section.listings-page",
            "data-site-activity",
        )
        .and_then(|raw| serde_json::from_str::<Value>(&raw).ok());

        let item_urls: Vec<String> = activity
            .as_ref()
            .and_then(|a| a.get("vehicleArray"))
            .and_then(Value::as_array)
            .map(|cars| {
                cars.iter()
                    .filter_map(|car| car.get("listing_id"))
                    .filter_map(|id| match id {
                        Value::String(s) => Some(s.clone()),
                        Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    })
                    .map(|id| self.detail_url(&id))
                    .collect()
            })
            .unwrap_or_default();

        // No activity payload means the results shell did not render; treat
        // it as the end of the list.
        let signal = if activity.is_none() {
            NextPageSignal::PageMarker(None)
        } else {
            let marker = all_text(&document, "li.sds-pagination__item.active")
                .into_iter()
                .find_map(|t| digits(&t));
            NextPageSignal::PageMarker(marker)
        };

        debug!("Results page yielded {} listing ids", item_urls.len());
        Ok(ListingPage { item_urls, signal })
    }

    async fn scrape_item(&self, url: &str) -> Result<Option<ListingRecord>> {
        let body = fetch_body(&self.client, url).await?;
        let document = Html::parse_document(&body);
        Ok(Some(self.scrape_document(&document, url)))
    }
}
