// SPDX-License-Identifier: MIT

//! Application configuration
//!
//! All ambient lookup happens here, once, at the process boundary
//! (`AppConfig::from_env`). Step bodies and the engine receive explicit
//! values at construction and never read the environment themselves.

use std::env;
use thiserror::Error;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL_NAME: &str = "gpt-3.5-turbo";
pub const DEFAULT_PLACES_ENDPOINT: &str =
    "https://maps.googleapis.com/maps/api/place/textsearch/json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    MissingVar(&'static str),

    #[error("invalid value for {var}: '{value}'")]
    InvalidVar { var: &'static str, value: String },
}

/// Full application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub model_name: String,
    /// Temperature for drafting/review steps
    pub creative_temperature: f32,
    /// Temperature for analysis/verdict steps
    pub analytical_temperature: f32,
    /// Venue lookup degrades to an empty result without a key
    pub places_api_key: Option<String>,
    pub places_endpoint: String,
    pub default_location: String,
    pub venue_radius_meters: u32,
    pub venue_max_results: usize,
    pub default_goal: String,
    pub default_weight: u32,
    /// Loop bound for one workflow run
    pub max_steps: u32,
}

impl AppConfig {
    /// Read configuration from the environment. `OPENAI_API_KEY` is the
    /// only required variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            openai_api_key: env::var("OPENAI_API_KEY")
                .map_err(|_| ConfigError::MissingVar("OPENAI_API_KEY"))?,
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string()),
            model_name: env::var("MODEL_NAME").unwrap_or_else(|_| DEFAULT_MODEL_NAME.to_string()),
            creative_temperature: parse_var("CREATIVE_TEMPERATURE", 0.7)?,
            analytical_temperature: parse_var("ANALYTICAL_TEMPERATURE", 0.0)?,
            places_api_key: env::var("GOOGLE_PLACES_API_KEY").ok(),
            places_endpoint: env::var("GOOGLE_PLACES_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_PLACES_ENDPOINT.to_string()),
            default_location: env::var("DEFAULT_LOCATION")
                .unwrap_or_else(|_| "Toronto".to_string()),
            venue_radius_meters: parse_var("VENUE_RADIUS_METERS", 5000)?,
            venue_max_results: parse_var("VENUE_MAX_RESULTS", 5)?,
            default_goal: env::var("DEFAULT_GOAL").unwrap_or_else(|_| "balanced diet".to_string()),
            default_weight: parse_var("DEFAULT_WEIGHT", 150)?,
            max_steps: parse_var("WORKFLOW_MAX_STEPS", 12)?,
        })
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidVar { var, value }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> AppConfig {
    AppConfig {
        openai_api_key: "test-key".to_string(),
        openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
        model_name: DEFAULT_MODEL_NAME.to_string(),
        creative_temperature: 0.7,
        analytical_temperature: 0.0,
        places_api_key: None,
        places_endpoint: DEFAULT_PLACES_ENDPOINT.to_string(),
        default_location: "Toronto".to_string(),
        venue_radius_meters: 5000,
        venue_max_results: 5,
        default_goal: "balanced diet".to_string(),
        default_weight: 150,
        max_steps: 12,
    }
}
