//! autotrader.com spider
//!
//! The listing endpoint is a JSON search API addressed by record offset in
//! steps of 25. A payload carrying a `stackTrace` key is the site's throttle
//! response and ends pagination. Detail pages are HTML with the whole vehicle
//! state embedded in a bootstrap script after a `DATA__=` marker; if that
//! payload does not decode, the record is abandoned rather than emitted
//! partially empty.

use crate::crawler::{ListingPage, NextPageSignal, PaginationCursor};
use crate::extract::html::first_text;
use crate::extract::{EmbeddedJson, FieldPath, Step};
use crate::record::{normalize, ListingRecord, RawListing, Site};
use crate::sites::{fetch_body, Spider};
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;
use serde_json::Value;
use tracing::{debug, warn};

const PAGE_SIZE: u64 = 25;

const BOOTSTRAP: EmbeddedJson = EmbeddedJson::after("DATA__=");

const YEAR: FieldPath = FieldPath::nested(&[
    Step::Key("initialState"),
    Step::Key("inventory"),
    Step::AnyEntry,
    Step::Key("year"),
]);
const DESCRIPTION: FieldPath = FieldPath::nested(&[
    Step::Key("initialState"),
    Step::Key("inventory"),
    Step::AnyEntry,
    Step::Key("additionalInfo"),
    Step::Key("vehicleDescription"),
]);
const SALE_PRICE: FieldPath = FieldPath::nested(&[
    Step::Key("initialState"),
    Step::Key("inventory"),
    Step::AnyEntry,
    Step::Key("pricingDetail"),
    Step::Key("salePrice"),
]);
const COMMENT_COUNT: FieldPath = FieldPath::nested(&[
    Step::Key("initialState"),
    Step::Key("inventory"),
    Step::AnyEntry,
    Step::Key("kbbConsumerReviewCount"),
]);
const ENGINE: FieldPath = FieldPath::nested(&[
    Step::Key("initialState"),
    Step::Key("inventory"),
    Step::AnyEntry,
    Step::Key("specifications"),
    Step::Key("engineDescription"),
    Step::Key("value"),
]);
const DRIVETRAIN: FieldPath = FieldPath::nested(&[
    Step::Key("initialState"),
    Step::Key("inventory"),
    Step::AnyEntry,
    Step::Key("specifications"),
    Step::Key("driveType"),
    Step::Key("value"),
]);
const MILEAGE: FieldPath = FieldPath::nested(&[
    Step::Key("initialState"),
    Step::Key("inventory"),
    Step::AnyEntry,
    Step::Key("specifications"),
    Step::Key("mileage"),
    Step::Key("value"),
]);
const VIN: FieldPath = FieldPath::nested(&[
    Step::Key("initialState"),
    Step::Key("inventory"),
    Step::AnyEntry,
    Step::Key("vin"),
]);
const TRANSMISSION: FieldPath = FieldPath::nested(&[
    Step::Key("initialState"),
    Step::Key("inventory"),
    Step::AnyEntry,
    Step::Key("specifications"),
    Step::Key("transmission"),
    Step::Key("value"),
]);
const EXTERIOR: FieldPath = FieldPath::nested(&[
    Step::Key("initialState"),
    Step::Key("inventory"),
    Step::AnyEntry,
    Step::Key("exteriorColorSimple"),
]);
const INTERIOR: FieldPath = FieldPath::nested(&[
    Step::Key("initialState"),
    Step::Key("inventory"),
    Step::AnyEntry,
    Step::Key("interiorColorSimple"),
]);
const BODY_STYLE: FieldPath = FieldPath::joined(
    &[
        Step::Key("initialState"),
        Step::Key("inventory"),
        Step::AnyEntry,
        Step::Key("bodyStyleCodes"),
    ],
    ", ",
);
const MODEL: FieldPath = FieldPath::nested(&[
    Step::Key("initialState"),
    Step::Key("inventory"),
    Step::AnyEntry,
    Step::Key("model"),
]);
const MAKE: FieldPath = FieldPath::nested(&[
    Step::Key("initialState"),
    Step::Key("inventory"),
    Step::AnyEntry,
    Step::Key("make"),
]);
const LOCATION: FieldPath = FieldPath::joined(
    &[
        Step::Key("initialState"),
        Step::Key("owners"),
        Step::AnyEntry,
        Step::Key("location"),
        Step::Key("address"),
    ],
    " ",
);
const SELLER: FieldPath = FieldPath::nested(&[
    Step::Key("initialState"),
    Step::Key("owners"),
    Step::AnyEntry,
    Step::Key("name"),
]);
const SELLER_TYPE: FieldPath = FieldPath::nested(&[
    Step::Key("initialState"),
    Step::Key("owners"),
    Step::AnyEntry,
    Step::Key("dealer"),
]);

pub struct AutotraderSpider {
    client: Client,
    base_url: String,
}

impl AutotraderSpider {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, "https://www.autotrader.com")
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn detail_url(&self, id: &str) -> String {
        format!(
            "{}/cars-for-sale/vehicledetails.xhtml?listingId={}",
            self.base_url, id
        )
    }

    fn scrape_payload(&self, payload: &Value, source_page: &str) -> ListingRecord {
        let raw = RawListing {
            year: YEAR.lookup(payload),
            description: DESCRIPTION.lookup(payload),
            // Sale price is numeric in the payload; the site's records carry
            // it as "{amount}$".
            price: SALE_PRICE.lookup(payload).map(|p| format!("{}$", p)),
            comment_count: COMMENT_COUNT.lookup(payload),
            engine: ENGINE.lookup(payload),
            drivetrain: DRIVETRAIN.lookup(payload),
            mileage: MILEAGE.lookup(payload),
            vin: VIN.lookup(payload),
            transmission: TRANSMISSION.lookup(payload),
            exterior: EXTERIOR.lookup(payload),
            interior: INTERIOR.lookup(payload),
            body_style: BODY_STYLE.lookup(payload),
            model: MODEL.lookup(payload),
            make: MAKE.lookup(payload),
            location: LOCATION.lookup(payload),
            seller: SELLER.lookup(payload),
            seller_type: SELLER_TYPE
                .lookup(payload)
                .or_else(|| Some("dealer".to_string())),
            reserve: Some(true),
            ..Default::default()
        };
        normalize(raw, Site::Autotrader, source_page)
    }
}

#[async_trait]
impl Spider for AutotraderSpider {
    fn site(&self) -> Site {
        Site::Autotrader
    }

    fn cursor(&self) -> PaginationCursor {
        PaginationCursor::new(0, PAGE_SIZE)
    }

    fn listing_url(&self, cursor: &PaginationCursor) -> String {
        format!(
            "{}/rest/searchresults/base?allListingType=all-cars&isNewSearch=false&sortBy=relevance&numRecords={}&firstRecord={}",
            self.base_url,
            PAGE_SIZE,
            cursor.offset()
        )
    }

    async fn fetch_listing(&self, url: &str) -> Result<ListingPage> {
        let body = fetch_body(&self.client, url).await?;

        let data: Value = match serde_json::from_str(&body) {
            Ok(v) => v,
            Err(e) => {
                warn!("Search payload did not decode, stopping pagination: {}", e);
                return Ok(ListingPage {
                    item_urls: Vec::new(),
                    signal: NextPageSignal::ItemsRemain(false),
                });
            }
        };

        // A stackTrace key is the throttle response.
        if data.get("stackTrace").is_some() {
            warn!("Search endpoint returned a stack trace, stopping pagination");
            return Ok(ListingPage {
                item_urls: Vec::new(),
                signal: NextPageSignal::ItemsRemain(false),
            });
        }

        let item_urls: Vec<String> = data
            .get("listings")
            .and_then(Value::as_array)
            .map(|listings| {
                listings
                    .iter()
                    .filter_map(|car| car.get("id"))
                    .filter_map(|id| match id {
                        Value::String(s) => Some(s.clone()),
                        Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    })
                    .map(|id| self.detail_url(&id))
                    .collect()
            })
            .unwrap_or_default();

        debug!("Search page yielded {} listing ids", item_urls.len());
        Ok(ListingPage {
            signal: NextPageSignal::ItemsRemain(!item_urls.is_empty()),
            item_urls,
        })
    }

    async fn scrape_item(&self, url: &str) -> Result<Option<ListingRecord>> {
        let body = fetch_body(&self.client, url).await?;
        let document = Html::parse_document(&body);

        // The vehicle state lives in the first script after the mount node.
        // No partial records here: without that payload every field would be
        // empty, so the whole item is dropped instead.
        let payload = first_text(&document, "#mountNode ~ script")
            .and_then(|script| BOOTSTRAP.parse(&script));
        let payload = match payload {
            Some(v) => v,
            None => {
                debug!("No decodable bootstrap payload at {}", url);
                return Ok(None);
            }
        };

        Ok(Some(self.scrape_payload(&payload, url)))
    }
}
