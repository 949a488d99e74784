//! Core data models for the national sites CLI
//!
//! This module contains the records built from scraped NPS pages and MapQuest
//! search results, plus the retrieval functions that produce them through the
//! response cache.

pub mod mapquest;
pub mod nps;

pub use mapquest::get_nearby_places;
pub use nps::{build_state_index, get_site_instance, get_sites_for_state};

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::fetch::FetchError;

/// Maps a lower-cased state name to its NPS state page URL
pub type StateIndex = BTreeMap<String, String>;

/// Errors that can occur while retrieving or parsing site data
#[derive(Debug, Error)]
pub enum DataError {
    /// The underlying fetch failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A JSON response could not be parsed
    #[error("Failed to parse JSON response: {0}")]
    Json(#[from] serde_json::Error),

    /// A required element is missing from an HTML page
    #[error("Missing expected element in page: {0}")]
    MissingElement(&'static str),

    /// No MapQuest API key was configured
    #[error("MapQuest API key not configured")]
    MissingApiKey,
}

/// A national site scraped from its NPS page
///
/// Fields that are not present on the page are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NationalSite {
    /// Name of the site (e.g. "Isle Royale")
    pub name: String,
    /// Designation (e.g. "National Park"); some sites have none
    pub category: Option<String>,
    /// City and state (e.g. "Houghton, MI")
    pub address: Option<String>,
    /// Postal code (e.g. "49931", "82190-0168")
    pub zip_code: Option<String>,
    /// Phone number (e.g. "(616) 319-7906")
    pub phone: Option<String>,
}

impl NationalSite {
    /// One-line summary used in site listings
    ///
    /// Absent fields render as empty text, e.g.
    /// `Isle Royale (National Park): Houghton, MI 49931`.
    pub fn info(&self) -> String {
        format!(
            "{} ({}): {} {}",
            self.name,
            self.category.as_deref().unwrap_or_default(),
            self.address.as_deref().unwrap_or_default(),
            self.zip_code.as_deref().unwrap_or_default()
        )
    }
}

/// A point of interest returned by the MapQuest radius search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NearbyPlace {
    pub name: String,
    /// SIC group name (e.g. "Eating Places")
    pub category: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
}

impl fmt::Display for NearbyPlace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "- {} ({}): {}, {}",
            self.name,
            self.category.as_deref().unwrap_or("no category"),
            self.address.as_deref().unwrap_or("no address"),
            self.city.as_deref().unwrap_or("no city")
        )
    }
}

/// Trims `value` and treats blank text as absent
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
