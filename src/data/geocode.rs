//! MapQuest geocoding client
//!
//! Resolves a city/state pair to coordinates, keeping the provider's raw
//! `results` array in the response cache.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use super::transport::{Fetch, FetchError, Request};
use super::Coordinates;
use crate::cache::{CacheError, JsonCache};

/// Base URL for the MapQuest geocoding API
const MAPQUEST_BASE_URL: &str = "https://www.mapquestapi.com/geocoding/v1/address";

/// Errors that can occur when geocoding a location
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    /// No API key was configured
    #[error("A MapQuest API key is required to look up a city and state")]
    MissingApiKey,

    /// Response did not contain a `results` array
    #[error("Missing expected field in response: {0}")]
    MissingField(String),

    /// The provider did not resolve the location
    #[error("No coordinates found for {0}")]
    NoResults(String),
}

/// Client for resolving city/state pairs through the MapQuest API
#[derive(Clone)]
pub struct GeocodeClient {
    fetcher: Arc<dyn Fetch>,
    api_key: Option<String>,
    base_url: String,
}

impl GeocodeClient {
    pub fn new(fetcher: Arc<dyn Fetch>, api_key: Option<String>) -> Self {
        Self {
            fetcher,
            api_key,
            base_url: MAPQUEST_BASE_URL.to_string(),
        }
    }

    /// Creates a new GeocodeClient with a custom base URL (for testing)
    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Cache key for a lookup: the provider request string without the API key
    pub fn cache_key(&self, city: &str, state: &str) -> String {
        format!(
            "{}?inFormat=kvp&outFormat=json&location={}+{}&thumbMaps=false",
            self.base_url, city, state
        )
    }

    /// Resolves `city`, `state` to coordinates
    ///
    /// # Arguments
    /// * `cache` - Response cache consulted before, and written after, the request
    /// * `city` - Sanitized city name
    /// * `state` - Sanitized state name
    ///
    /// # Returns
    /// * `Ok(Coordinates)` of the first result
    /// * `Err(GeocodeError::NoResults)` if the provider found nothing
    pub async fn coordinates(
        &self,
        cache: &mut JsonCache,
        city: &str,
        state: &str,
    ) -> Result<Coordinates, GeocodeError> {
        let key = self.cache_key(city, state);

        if cache.contains(&key) {
            tracing::info!(%city, %state, "Using cache");
        } else {
            let api_key = self.api_key.as_deref().ok_or(GeocodeError::MissingApiKey)?;
            tracing::info!(%city, %state, "Fetching");

            let request = Request::get(&self.base_url)
                .param("key", api_key)
                .param("inFormat", "kvp")
                .param("outFormat", "json")
                .param("location", format!("{} {}", city, state))
                .param("thumbMaps", "false");
            let mut response = self.fetcher.get_json(&request).await?;

            let results = response
                .get_mut("results")
                .map(Value::take)
                .ok_or_else(|| GeocodeError::MissingField("results".to_string()))?;
            cache.insert(key.clone(), results)?;
        }

        cache
            .get(&key)
            .and_then(first_coordinates)
            .ok_or_else(|| GeocodeError::NoResults(format!("{}, {}", city, state)))
    }
}

/// Extracts `results[0].locations[0].latLng`
fn first_coordinates(results: &Value) -> Option<Coordinates> {
    let lat_lng = results.get(0)?.get("locations")?.get(0)?.get("latLng")?;
    Some(Coordinates {
        lat: lat_lng.get("lat")?.as_f64()?,
        lng: lat_lng.get("lng")?.as_f64()?,
    })
}
