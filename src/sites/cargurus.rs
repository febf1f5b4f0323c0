//! cargurus.com spider
//!
//! The friendliest of the five sites: both the listing endpoint and the
//! detail endpoint return JSON. Listings are addressed by record offset in
//! steps of 15; an empty result array marks the end. Detail fields all live
//! under the payload's `listing` object.

use crate::crawler::{ListingPage, NextPageSignal, PaginationCursor};
use crate::extract::{FieldPath, Step};
use crate::record::{normalize, ListingRecord, RawListing, Site};
use crate::sites::{fetch_body, Spider};
use crate::{MotorlotError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

const PAGE_SIZE: u64 = 15;

const YEAR: FieldPath = FieldPath::nested(&[Step::Key("listing"), Step::Key("year")]);
const DESCRIPTION: FieldPath = FieldPath::nested(&[Step::Key("listing"), Step::Key("description")]);
const PRICE: FieldPath = FieldPath::nested(&[Step::Key("listing"), Step::Key("priceString")]);
const COMMENT_COUNT: FieldPath = FieldPath::nested(&[Step::Key("listing"), Step::Key("reviewCount")]);
const ENGINE: FieldPath = FieldPath::nested(&[
    Step::Key("listing"),
    Step::Key("localizedEngineDisplayName"),
]);
const DRIVETRAIN: FieldPath =
    FieldPath::nested(&[Step::Key("listing"), Step::Key("localizedDriveTrain")]);
const MILEAGE: FieldPath = FieldPath::nested(&[Step::Key("listing"), Step::Key("mileageString")]);
const VIN: FieldPath = FieldPath::nested(&[Step::Key("listing"), Step::Key("vin")]);
const TRANSMISSION: FieldPath =
    FieldPath::nested(&[Step::Key("listing"), Step::Key("localizedTransmission")]);
const EXTERIOR: FieldPath =
    FieldPath::nested(&[Step::Key("listing"), Step::Key("localizedExteriorColor")]);
const INTERIOR: FieldPath =
    FieldPath::nested(&[Step::Key("listing"), Step::Key("localizedInteriorColor")]);
const BODY_STYLE: FieldPath = FieldPath::nested(&[
    Step::Key("listing"),
    Step::Key("autoEntityInfo"),
    Step::Key("bodyStyle"),
]);
const MODEL: FieldPath = FieldPath::nested(&[Step::Key("listing"), Step::Key("modelName")]);
const MAKE: FieldPath = FieldPath::nested(&[Step::Key("listing"), Step::Key("makeName")]);
const LOCATION: FieldPath = FieldPath::joined(
    &[
        Step::Key("listing"),
        Step::Key("seller"),
        Step::Key("address"),
        Step::Key("addressLines"),
    ],
    " ",
);
const SELLER: FieldPath = FieldPath::nested(&[
    Step::Key("listing"),
    Step::Key("seller"),
    Step::Key("name"),
]);
const SELLER_TYPE: FieldPath = FieldPath::nested(&[
    Step::Key("listing"),
    Step::Key("seller"),
    Step::Key("sellerType"),
]);

pub struct CargurusSpider {
    client: Client,
    base_url: String,
}

impl CargurusSpider {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, "https://www.cargurus.com")
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn detail_url(&self, id: &str) -> String {
        format!(
            "{}/Cars/detailListingJson.action?inventoryListing={}",
            self.base_url, id
        )
    }

    /// Extracts the normalized record fields from one detail payload
    fn scrape_payload(&self, payload: &Value, source_page: &str) -> ListingRecord {
        let raw = RawListing {
            year: YEAR.lookup(payload),
            description: DESCRIPTION.lookup(payload),
            price: PRICE.lookup(payload),
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
            seller_type: SELLER_TYPE.lookup(payload),
            reserve: Some(true),
            ..Default::default()
        };
        normalize(raw, Site::Cargurus, source_page)
    }
}

#[async_trait]
impl Spider for CargurusSpider {
    fn site(&self) -> Site {
        Site::Cargurus
    }

    fn cursor(&self) -> PaginationCursor {
        PaginationCursor::new(0, PAGE_SIZE)
    }

    fn listing_url(&self, cursor: &PaginationCursor) -> String {
        format!(
            "{}/Cars/searchResults.action?offset={}&maxResults={}",
            self.base_url,
            cursor.offset(),
            PAGE_SIZE
        )
    }

    async fn fetch_listing(&self, url: &str) -> Result<ListingPage> {
        let body = fetch_body(&self.client, url).await?;
        let cars: Vec<Value> =
            serde_json::from_str(&body).map_err(|e| MotorlotError::MalformedPayload {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let item_urls: Vec<String> = cars
            .iter()
            .filter_map(|car| car.get("id"))
            .filter_map(|id| match id {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .map(|id| self.detail_url(&id))
            .collect();

        debug!("Listing offset page yielded {} ids", item_urls.len());
        Ok(ListingPage {
            signal: NextPageSignal::ItemsRemain(!cars.is_empty()),
            item_urls,
        })
    }

    async fn scrape_item(&self, url: &str) -> Result<Option<ListingRecord>> {
        let body = fetch_body(&self.client, url).await?;
        let payload: Value = match serde_json::from_str(&body) {
            Ok(v) => v,
            Err(e) => {
                debug!("Unparsable detail payload at {}: {}", url, e);
                return Ok(None);
            }
        };
        Ok(Some(self.scrape_payload(&payload, url)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail_payload() -> Value {
        serde_json::json!({
            "listing": {
                "year": 2018,
                "description": "One owner, garage kept",
                "priceString": "$23,987",
                "reviewCount": 42,
                "localizedEngineDisplayName": "2.0L Inline-4 Gas Turbocharged",
                "localizedDriveTrain": "All-Wheel Drive",
                "mileageString": "41,210",
                "vin": "WAUENAF49JA123456",
                "localizedTransmission": "Automatic",
                "localizedExteriorColor": "Glacier White",
                "localizedInteriorColor": "Black",
                "autoEntityInfo": { "bodyStyle": "Sedan" },
                "modelName": "A4",
                "makeName": "Audi",
                "seller": {
                    "name": "Prestige Motors",
                    "sellerType": "DEALER",
                    "address": { "addressLines": ["123 Main St", "Springfield, IL"] }
                }
            }
        })
    }

    #[test]
    fn test_scrape_payload_full() {
        let spider = CargurusSpider::new(Client::new());
        let record = spider.scrape_payload(&detail_payload(), "https://x/detail?id=1");

        assert_eq!(record.source, Site::Cargurus);
        assert_eq!(record.year, "2018");
        assert_eq!(record.price, "$23,987");
        assert_eq!(record.comment_count, "42");
        assert_eq!(record.body_style, "Sedan");
        assert_eq!(record.make, "Audi");
        assert_eq!(record.location, "123 Main St Springfield, IL");
        assert_eq!(record.seller, "Prestige Motors");
        assert_eq!(record.seller_type, "DEALER");
        assert!(record.reserve);
        assert_eq!(record.source_page, "https://x/detail?id=1");
    }

    #[test]
    fn test_scrape_payload_missing_fields_stay_null() {
        let spider = CargurusSpider::new(Client::new());
        let payload = serde_json::json!({ "listing": { "year": 2020 } });
        let record = spider.scrape_payload(&payload, "https://x/detail?id=2");

        assert_eq!(record.year, "2020");
        assert_eq!(record.vin, "");
        assert_eq!(record.seller, "");
        assert_eq!(record.location, "");
    }

    #[test]
    fn test_listing_url_offsets() {
        let spider = CargurusSpider::new(Client::new());
        let mut cursor = spider.cursor();
        assert!(spider.listing_url(&cursor).contains("offset=0&maxResults=15"));
        cursor.advance(&NextPageSignal::ItemsRemain(true));
        assert!(spider.listing_url(&cursor).contains("offset=15&maxResults=15"));
    }
}
