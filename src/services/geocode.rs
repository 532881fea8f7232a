use crate::models::Coordinates;
use moka::future::Cache;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when resolving a place name
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("No coordinates found for {0}")]
    NotFound(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// One hit of a Nominatim search; coordinates arrive as strings
#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

/// Nominatim geocoding client
///
/// Resolves free-text birthplaces to coordinates. Successful lookups are
/// kept in a bounded in-process cache keyed by the normalized place name.
pub struct GeocodeClient {
    base_url: String,
    user_agent: String,
    client: Client,
    cache: Cache<String, Coordinates>,
}

impl GeocodeClient {
    pub fn new(
        base_url: String,
        user_agent: String,
        timeout_secs: u64,
        cache_size: u64,
        cache_ttl_secs: u64,
    ) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        let cache = moka::future::CacheBuilder::new(cache_size)
            .time_to_live(Duration::from_secs(cache_ttl_secs))
            .build();

        Ok(Self {
            base_url,
            user_agent,
            client,
            cache,
        })
    }

    /// Resolve a place name to latitude/longitude
    pub async fn resolve(&self, place: &str) -> Result<Coordinates, GeocodeError> {
        let key = cache_key(place);
        if key.is_empty() {
            return Err(GeocodeError::NotFound("an empty place".to_string()));
        }

        if let Some(coordinates) = self.cache.get(&key).await {
            tracing::trace!("Geocode cache hit: {}", key);
            return Ok(coordinates);
        }

        let url = format!("{}/search", self.base_url.trim_end_matches('/'));

        tracing::debug!("Geocoding place: {}", place);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .query(&[("q", place), ("format", "json"), ("limit", "1")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeocodeError::ApiError(format!(
                "Geocoding request failed: {}",
                response.status()
            )));
        }

        let hits: Vec<SearchHit> = response
            .json()
            .await
            .map_err(|e| GeocodeError::InvalidResponse(e.to_string()))?;

        let hit = hits
            .first()
            .ok_or_else(|| GeocodeError::NotFound(place.to_string()))?;

        let coordinates = Coordinates {
            lat: parse_degrees(&hit.lat)?,
            lon: parse_degrees(&hit.lon)?,
        };

        self.cache.insert(key, coordinates).await;

        tracing::debug!("Resolved {} to ({}, {})", place, coordinates.lat, coordinates.lon);

        Ok(coordinates)
    }
}

fn cache_key(place: &str) -> String {
    place.trim().to_lowercase()
}

fn parse_degrees(value: &str) -> Result<f64, GeocodeError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| GeocodeError::InvalidResponse(format!("Invalid coordinate '{}'", value)))
}
