//! Yelp business search client
//!
//! Fetches top-rated businesses for a location and food category. Each page
//! of results is cached verbatim under a key built from every query input, so
//! repeating a search on a warm cache never touches the network.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use super::transport::{Fetch, FetchError, Request};
use super::{Business, SearchLocation};
use crate::cache::{CacheError, JsonCache};

/// Base URL for the Yelp business search API
const YELP_SEARCH_URL: &str = "https://api.yelp.com/v3/businesses/search";

/// Search term used when no food category was given
pub const GENERIC_TERM: &str = "restaurants";

/// Placeholder for query inputs that do not apply to a search
const NOT_APPLICABLE: &str = "NA";

/// Errors that can occur when searching for businesses
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Response did not contain a `businesses` array
    #[error("Missing expected field in response: {0}")]
    MissingField(String),

    /// A cached business record could not be read back
    #[error("Failed to parse cached businesses: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Search contract: how many pages to fetch and how many names to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// One page of 5 results
    #[default]
    Basic,
    /// Two pages of 50 results, of which 10 are shown
    Enhanced,
}

impl SearchMode {
    /// Parses a mode name from the command line
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Some(SearchMode::Basic),
            "enhanced" => Some(SearchMode::Enhanced),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SearchMode::Basic => "basic",
            SearchMode::Enhanced => "enhanced",
        }
    }

    /// Results requested per page
    pub fn limit(&self) -> u32 {
        match self {
            SearchMode::Basic => 5,
            SearchMode::Enhanced => 50,
        }
    }

    /// Pagination offsets; `None` means the request carries no offset
    pub fn offsets(&self) -> &'static [Option<u32>] {
        match self {
            SearchMode::Basic => &[None],
            SearchMode::Enhanced => &[Some(0), Some(50)],
        }
    }

    /// How many names are listed for the user
    pub fn display_count(&self) -> usize {
        match self {
            SearchMode::Basic => 5,
            SearchMode::Enhanced => 10,
        }
    }
}

/// Inputs of one search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub location: SearchLocation,
    /// Food category; `None` searches for the generic term
    pub category: Option<String>,
}

impl SearchQuery {
    pub fn new(location: SearchLocation, category: Option<String>) -> Self {
        Self { location, category }
    }

    /// Search term sent to the provider
    pub fn term(&self) -> &str {
        self.category
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(GENERIC_TERM)
    }

    /// Cache key for one page: location, latitude, longitude, term, and offset
    ///
    /// Inputs that do not apply are written as `NA`.
    pub fn cache_key(&self, offset: Option<u32>) -> String {
        let (location, lat, lng) = match &self.location {
            SearchLocation::PostalCode(code) => (
                code.clone(),
                NOT_APPLICABLE.to_string(),
                NOT_APPLICABLE.to_string(),
            ),
            SearchLocation::Coordinates { coordinates, .. } => (
                NOT_APPLICABLE.to_string(),
                coordinates.lat.to_string(),
                coordinates.lng.to_string(),
            ),
        };
        let offset = offset.map(|o| o.to_string()).unwrap_or_default();
        format!("{}{}{}{}{}", location, lat, lng, self.term(), offset)
    }
}

/// Businesses gathered from every page of a search, in provider order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchResults {
    pub businesses: Vec<Business>,
    /// Cache keys the businesses were read from
    pub cache_keys: Vec<String>,
}

impl SearchResults {
    /// Page references of every business
    pub fn urls(&self) -> Vec<String> {
        self.businesses.iter().map(|b| b.url.clone()).collect()
    }

    /// The first `n` businesses
    pub fn top(&self, n: usize) -> &[Business] {
        &self.businesses[..n.min(self.businesses.len())]
    }

    pub fn is_empty(&self) -> bool {
        self.businesses.is_empty()
    }
}

/// Result of a search
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Found(SearchResults),
    /// The provider reported an error for these criteria
    NoResults,
}

/// Client for the Yelp business search API
#[derive(Clone)]
pub struct SearchClient {
    fetcher: Arc<dyn Fetch>,
    api_key: String,
    mode: SearchMode,
    base_url: String,
}

impl SearchClient {
    pub fn new(fetcher: Arc<dyn Fetch>, api_key: impl Into<String>, mode: SearchMode) -> Self {
        Self {
            fetcher,
            api_key: api_key.into(),
            mode,
            base_url: YELP_SEARCH_URL.to_string(),
        }
    }

    /// Creates a new SearchClient with a custom base URL (for testing)
    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    /// Runs a search, fetching any page missing from the cache
    ///
    /// # Returns
    /// * `Ok(SearchOutcome::Found)` with the businesses of every page
    /// * `Ok(SearchOutcome::NoResults)` as soon as the provider reports an error;
    ///   remaining pages are not requested
    /// * `Err(SearchError)` if the request, the cache write, or parsing fails
    pub async fn search(
        &self,
        cache: &mut JsonCache,
        query: &SearchQuery,
    ) -> Result<SearchOutcome, SearchError> {
        let mut cache_keys = Vec::new();

        for &offset in self.mode.offsets() {
            let key = query.cache_key(offset);

            if cache.contains(&key) {
                tracing::info!(%key, "Using cache");
            } else {
                tracing::info!(%key, "Fetching");
                let mut response = self.fetcher.get_json(&self.request(query, offset)).await?;

                if let Some(error) = response.get("error") {
                    tracing::warn!(%error, "search provider reported an error");
                    return Ok(SearchOutcome::NoResults);
                }

                let businesses = response
                    .get_mut("businesses")
                    .map(Value::take)
                    .ok_or_else(|| SearchError::MissingField("businesses".to_string()))?;
                cache.insert(key.clone(), businesses)?;
            }

            cache_keys.push(key);
        }

        let businesses = cached_businesses(cache, &cache_keys)?;
        Ok(SearchOutcome::Found(SearchResults {
            businesses,
            cache_keys,
        }))
    }

    fn request(&self, query: &SearchQuery, offset: Option<u32>) -> Request {
        let mut request = Request::get(&self.base_url)
            .bearer(&self.api_key)
            .param("term", query.term());

        request = match &query.location {
            SearchLocation::PostalCode(code) => request.param("location", code),
            SearchLocation::Coordinates { coordinates, .. } => request
                .param("latitude", coordinates.lat)
                .param("longitude", coordinates.lng),
        };

        request = request
            .param("limit", self.mode.limit())
            .param("sort_by", "rating");

        if let Some(offset) = offset {
            request = request
                .param("offset", offset)
                .param("categories", GENERIC_TERM);
        }
        request
    }
}

/// Reads the business arrays stored under `keys`, in order
///
/// Keys missing from the cache contribute nothing.
pub fn cached_businesses(cache: &JsonCache, keys: &[String]) -> Result<Vec<Business>, SearchError> {
    let mut businesses = Vec::new();
    for value in keys.iter().filter_map(|key| cache.get(key)) {
        let page: Vec<Business> = serde_json::from_value(value.clone())?;
        businesses.extend(page);
    }
    Ok(businesses)
}
