//! bringatrailer.com spider
//!
//! The current-auctions page embeds the whole auction list as JSON inside a
//! theme script, so there is exactly one listing page per crawl. Detail
//! pages mix selector lookups (title, price, essentials list) with a second
//! embedded view-model payload that carries the comment and bid history.

use crate::crawler::{ListingPage, NextPageSignal, PaginationCursor};
use crate::extract::html::{all_text, exists, first_text, first_year, strip_tags, text_after_label};
use crate::extract::EmbeddedJson;
use crate::record::{normalize, Bid, ListingRecord, RawListing, Site};
use crate::sites::{fetch_body, parse_end_date, Spider};
use crate::{MotorlotError, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;
use serde_json::Value;
use tracing::debug;

/// Auction list embedded in the current-auctions page
const AUCTIONS: EmbeddedJson = EmbeddedJson::between("Data = ", "];", "]");

/// Comment/bid view-model embedded in every detail page
const VIEW_MODEL: EmbeddedJson = EmbeddedJson::after("VMS =");

pub struct BringATrailerSpider {
    client: Client,
    base_url: String,
}

impl BringATrailerSpider {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, "https://bringatrailer.com")
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn scrape_document(&self, document: &Html, source_page: &str) -> ListingRecord {
        // Essentials list is positional: VIN, mileage, engine, transmission.
        let essential = |position: u32, linked: bool| {
            let selector = if linked {
                format!("div.item ul li:nth-of-type({}) a", position)
            } else {
                format!("div.item ul li:nth-of-type({})", position)
            };
            first_text(document, &selector)
        };

        let view_model = first_text(document, "script#bat-theme-viewmodels-js-extra")
            .and_then(|script| VIEW_MODEL.parse(&script));
        let (comment_text, bids) = match view_model {
            Some(vms) => comments_and_bids(&vms),
            None => {
                debug!("No view-model payload at {}", source_page);
                (Vec::new(), Vec::new())
            }
        };

        let title = first_text(document, "h1.post-title.listing-post-title");

        let raw = RawListing {
            year: title.as_deref().and_then(first_year),
            description: Some(all_text(document, "div[class*='post'] > div > p").join("\n")),
            price: first_text(document, "span.info-value.noborder-tiny strong"),
            auction_end_date: first_text(document, "span[data-ends]")
                .map(|t| parse_end_date(&t)),
            bid_count: first_text(document, "td.listing-stats-value.number-bids-value"),
            comment_count: first_text(
                document,
                "span.comments_header_html span.info-value",
            ),
            comment_text,
            engine: essential(3, false),
            drivetrain: None,
            mileage: essential(2, false),
            vin: essential(1, true),
            transmission: essential(4, false),
            title_status: title,
            body_style: None,
            model: text_after_label(document, "strong", "Model"),
            make: text_after_label(document, "strong", "Make"),
            location: text_after_label(document, "strong", "Location"),
            seller: text_after_label(document, "strong", "Seller"),
            seller_type: text_after_label(document, "strong", "Party"),
            bids,
            reserve: Some(!exists(document, "div.item-tag-noreserve")),
            ..Default::default()
        };
        normalize(raw, Site::BringATrailer, source_page)
    }
}

/// Splits the view-model's `comments` array into comment texts and bids
///
/// Bid entries are the comments carrying a non-zero `bidAmount`; every entry
/// contributes its markup to the comment texts.
fn comments_and_bids(vms: &Value) -> (Vec<String>, Vec<Bid>) {
    let mut texts = Vec::new();
    let mut bids = Vec::new();

    let comments = match vms.get("comments").and_then(Value::as_array) {
        Some(c) => c,
        None => return (texts, bids),
    };

    for comment in comments {
        if let Some(markup) = comment.get("markup").and_then(Value::as_str) {
            texts.push(strip_tags(markup));
        }

        let amount = comment
            .get("bidAmount")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        if amount > 0 {
            bids.push(Bid {
                bidder: comment
                    .get("authorName")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                amount: format!("{}$", amount),
                timestamp: comment.get("timestamp").and_then(Value::as_i64),
            });
        }
    }

    (texts, bids)
}

#[async_trait]
impl Spider for BringATrailerSpider {
    fn site(&self) -> Site {
        Site::BringATrailer
    }

    fn cursor(&self) -> PaginationCursor {
        PaginationCursor::new(0, 1)
    }

    fn listing_url(&self, _cursor: &PaginationCursor) -> String {
        format!("{}/auctions/", self.base_url)
    }

    async fn fetch_listing(&self, url: &str) -> Result<ListingPage> {
        let body = fetch_body(&self.client, url).await?;
        let document = Html::parse_document(&body);

        let auctions = first_text(&document, "script#bat-theme-auctions-current-initial-data")
            .and_then(|script| AUCTIONS.parse(&script))
            .ok_or_else(|| MotorlotError::MalformedPayload {
                url: url.to_string(),
                message: "no decodable auction list in page".to_string(),
            })?;

        let item_urls: Vec<String> = auctions
            .as_array()
            .map(|cars| {
                cars.iter()
                    .filter_map(|car| car.get("url"))
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        debug!("Current-auctions page yielded {} urls", item_urls.len());
        Ok(ListingPage {
            item_urls,
            signal: NextPageSignal::EndOfList,
        })
    }

    async fn scrape_item(&self, url: &str) -> Result<Option<ListingRecord>> {
        let body = fetch_body(&self.client, url).await?;
        let document = Html::parse_document(&body);
        Ok(Some(self.scrape_document(&document, url)))
    }
}
