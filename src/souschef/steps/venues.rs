// SPDX-License-Identifier: MIT

//! Venue lookup step (degrading)
//!
//! The only step that absorbs its own failure: a broken or unconfigured
//! places service must not abort the whole run, so any search error is
//! converted into an empty suggestion list.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use super::keys;
use crate::flow::{StateRecord, StateUpdate, StepBody, StepError};
use crate::souschef::places::{PlacesQuery, PlacesSearch, Venue};

/// Finds restaurants matching the user's request near a configured
/// location.
///
/// Reads `user_input`; writes `restaurant_suggestions` (possibly empty)
/// and `step`.
pub struct VenueLookupStep {
    places: Arc<dyn PlacesSearch>,
    location: String,
    radius_meters: u32,
    max_results: usize,
}

impl VenueLookupStep {
    pub fn new(
        places: Arc<dyn PlacesSearch>,
        location: String,
        radius_meters: u32,
        max_results: usize,
    ) -> Self {
        Self {
            places,
            location,
            radius_meters,
            max_results,
        }
    }
}

#[async_trait]
impl StepBody for VenueLookupStep {
    fn name(&self) -> &str {
        "venue_lookup"
    }

    async fn invoke(&self, state: &StateRecord) -> Result<StateUpdate, StepError> {
        let user_input = state.require_str(keys::USER_INPUT)?;

        let query = PlacesQuery {
            query: user_input.to_string(),
            location: self.location.clone(),
            radius_meters: self.radius_meters,
            max_results: self.max_results,
        };

        log::info!("finding nearby restaurants in {}", self.location);
        let venues: Vec<Venue> = match self.places.search(&query).await {
            Ok(venues) => venues,
            Err(err) => {
                log::warn!("restaurant lookup failed, continuing without: {}", err);
                Vec::new()
            }
        };

        let suggestions = serde_json::to_value(&venues).unwrap_or_else(|_| Value::Array(vec![]));

        let mut update = StateUpdate::new();
        update.insert(keys::RESTAURANT_SUGGESTIONS.to_string(), suggestions);
        update.insert(keys::STEP.to_string(), json!("restaurants_suggested"));
        Ok(update)
    }
}
