//! Core data models and API clients
//!
//! This module contains the types returned by the review search and geocoding
//! providers, and the clients that fetch them through the response cache.

pub mod geocode;
pub mod menu;
pub mod search;
pub mod transport;

pub use geocode::{GeocodeClient, GeocodeError};
pub use menu::{ClassRegionLocator, MenuClient, MenuError, MenuLinks, RegionLocator};
pub use search::{SearchClient, SearchError, SearchMode, SearchOutcome, SearchQuery, SearchResults};
pub use transport::{Fetch, FetchError, HttpFetcher, Request};

use serde::{Deserialize, Serialize};

/// Sentinel used for absent price tiers, categories, and location parts
pub const UNKNOWN: &str = "unknown";

/// A category tag on a business
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Identifying slug, e.g. `pizza`
    pub alias: String,
    /// Human-readable title, e.g. `Pizza`
    #[serde(default)]
    pub title: String,
}

/// One reviewed establishment as returned by the search provider
///
/// Fields are taken verbatim from the provider; nothing is validated beyond
/// what deserialization requires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Business {
    pub name: String,
    /// Canonical page reference on the review site
    pub url: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub categories: Vec<Category>,
    /// Price tier such as `$$`, absent for many listings
    #[serde(default)]
    pub price: Option<String>,
}

impl Business {
    /// Slug of the first category, or `unknown`
    pub fn primary_category(&self) -> &str {
        self.categories
            .first()
            .map(|c| c.alias.as_str())
            .unwrap_or(UNKNOWN)
    }

    /// Price tier, or `unknown`
    pub fn price_tier(&self) -> &str {
        self.price.as_deref().unwrap_or(UNKNOWN)
    }
}

/// Latitude/longitude pair as returned by the geocoding provider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Where to search: a postal code or geocoded coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum SearchLocation {
    PostalCode(String),
    Coordinates {
        coordinates: Coordinates,
        /// Display label, e.g. `ann arbor, mi`
        label: String,
    },
}

impl SearchLocation {
    /// Label used in console output and the results table
    pub fn label(&self) -> &str {
        match self {
            SearchLocation::PostalCode(code) => code,
            SearchLocation::Coordinates { label, .. } => label,
        }
    }
}

/// One row of the results table
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub location: String,
    pub rating: f64,
    pub category: String,
    pub price: String,
    pub name: String,
}

impl ResultRow {
    /// Flattens a business into a row for `location`
    pub fn from_business(location: &str, business: &Business) -> Self {
        Self {
            location: location.to_string(),
            rating: business.rating,
            category: business.primary_category().to_string(),
            price: business.price_tier().to_string(),
            name: business.name.clone(),
        }
    }
}
