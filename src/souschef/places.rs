// SPDX-License-Identifier: MIT

//! Places search client
//!
//! `PlacesSearch` is the capability the venue-lookup step depends on.
//! `GooglePlacesClient` queries the Places text-search API; `DisabledPlaces`
//! stands in when no API key is configured and always fails, which the
//! degrading venue step converts into an empty result.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum PlacesError {
    #[error("places API error: {0}")]
    Api(String),

    #[error("search disabled: {0}")]
    Disabled(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Url(#[from] url::ParseError),
}

/// A venue record in the workflow's auxiliary list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Venue {
    pub name: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

/// Search parameters for one lookup
#[derive(Debug, Clone)]
pub struct PlacesQuery {
    pub query: String,
    pub location: String,
    pub radius_meters: u32,
    pub max_results: usize,
}

#[async_trait]
pub trait PlacesSearch: Send + Sync {
    async fn search(&self, query: &PlacesQuery) -> Result<Vec<Venue>, PlacesError>;
}

/// Google Places text-search client
pub struct GooglePlacesClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl GooglePlacesClient {
    pub fn new(api_key: String, endpoint: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            endpoint,
        }
    }

    /// Map the raw `results` array to typed venues
    fn parse_results(body: &Value, max_results: usize) -> Result<Vec<Venue>, PlacesError> {
        let results = body
            .get("results")
            .and_then(|r| r.as_array())
            .ok_or_else(|| PlacesError::Api("missing results array".to_string()))?;

        Ok(results
            .iter()
            .take(max_results)
            .map(|entry| Venue {
                name: entry["name"].as_str().unwrap_or_default().to_string(),
                address: entry["formatted_address"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string(),
                rating: entry["rating"].as_f64(),
            })
            .collect())
    }
}

#[async_trait]
impl PlacesSearch for GooglePlacesClient {
    async fn search(&self, query: &PlacesQuery) -> Result<Vec<Venue>, PlacesError> {
        let mut url = Url::parse(&self.endpoint)?;
        url.query_pairs_mut()
            .append_pair(
                "query",
                &format!("restaurants serving {} in {}", query.query, query.location),
            )
            .append_pair("radius", &query.radius_meters.to_string())
            .append_pair("key", &self.api_key);

        let resp = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            return Err(PlacesError::Api(text));
        }

        let body: Value = resp.json().await?;
        Self::parse_results(&body, query.max_results)
    }
}

/// Placeholder used when no places API key is configured
pub struct DisabledPlaces;

#[async_trait]
impl PlacesSearch for DisabledPlaces {
    async fn search(&self, _query: &PlacesQuery) -> Result<Vec<Venue>, PlacesError> {
        Err(PlacesError::Disabled(
            "no places API key configured".to_string(),
        ))
    }
}
