//! The canonical listing record emitted by every spider
//!
//! Every site maps its fields onto this one shape. Field order here is the
//! serialization order of the emitted records.

pub mod normalize;

pub use normalize::{clean, normalize, RawListing};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The site a record was scraped from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Site {
    #[serde(rename = "carsandbids.com")]
    CarsAndBids,
    #[serde(rename = "bringatrailer.com")]
    BringATrailer,
    #[serde(rename = "autotrader.com")]
    Autotrader,
    #[serde(rename = "cargurus.com")]
    Cargurus,
    #[serde(rename = "cars.com")]
    CarsDotCom,
}

impl Site {
    /// The site's domain, used as the record's `source` value
    pub fn domain(&self) -> &'static str {
        match self {
            Site::CarsAndBids => "carsandbids.com",
            Site::BringATrailer => "bringatrailer.com",
            Site::Autotrader => "autotrader.com",
            Site::Cargurus => "cargurus.com",
            Site::CarsDotCom => "cars.com",
        }
    }

    /// All supported sites
    pub fn all() -> &'static [Site] {
        &[
            Site::CarsAndBids,
            Site::BringATrailer,
            Site::Autotrader,
            Site::Cargurus,
            Site::CarsDotCom,
        ]
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.domain())
    }
}

impl FromStr for Site {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "carsandbids" | "carsandbids.com" => Ok(Site::CarsAndBids),
            "bringatrailer" | "bringatrailer.com" | "bat" => Ok(Site::BringATrailer),
            "autotrader" | "autotrader.com" => Ok(Site::Autotrader),
            "cargurus" | "cargurus.com" => Ok(Site::Cargurus),
            "cars" | "cars.com" => Ok(Site::CarsDotCom),
            other => Err(format!(
                "unknown site '{}' (expected one of: carsandbids, bringatrailer, autotrader, cargurus, cars)",
                other
            )),
        }
    }
}

/// A single auction bid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    /// Bidder display name (empty when the site hides it)
    pub bidder: String,

    /// Bid amount as shown by the site, currency formatting included
    pub amount: String,

    /// Unix timestamp of the bid, when the site exposes one
    pub timestamp: Option<i64>,
}

/// One scraped vehicle listing
///
/// Created exactly once per successfully parsed detail page and never mutated
/// afterwards. Textual fields have already passed the cleaning transform and
/// default to the empty string when the site does not carry them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub source: Site,
    pub year: String,
    pub description: String,
    pub price: String,
    pub auction_end_date: String,
    pub bid_count: String,
    pub comment_count: String,
    pub comment_text: Vec<String>,
    pub engine: String,
    pub drivetrain: String,
    pub mileage: String,
    pub vin: String,
    pub transmission: String,
    pub title_status: String,
    pub exterior: String,
    pub interior: String,
    pub body_style: String,
    pub model: String,
    pub make: String,
    pub location: String,
    pub seller: String,
    pub seller_type: String,
    pub bids: Vec<Bid>,
    /// False only when an explicit no-reserve signal was detected
    pub reserve: bool,
    /// Date the extraction ran, fixed MM/DD/YYYY form, set once
    pub scraped_date: String,
    /// URL of the detail page this record came from
    pub source_page: String,
}
