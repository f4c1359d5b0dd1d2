// src/config.rs

use serde::Deserialize;
use tracing::debug;

use crate::hr_api::HrApiError;
use crate::location::ReverseGeocoder;

fn default_request_timeout_secs() -> u64 {
    30
}

/// Environment-driven configuration, variables prefixed `PUNCHDESK_`.
/// A `.env` file in the working directory is honoured if present.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsoleConfig {
    pub api_base_url: String,
    pub api_token: String,
    #[serde(default)]
    pub geocoder_url: Option<String>,
    #[serde(default)]
    pub geocoder_api_key: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Employee acted on by default in manager flows and detail views.
    #[serde(default)]
    pub employee_id: Option<String>,
}

impl ConsoleConfig {
    pub fn from_env() -> Result<Self, HrApiError> {
        if dotenv::dotenv().is_ok() {
            debug!("Loaded environment from .env file");
        }
        envy::prefixed("PUNCHDESK_")
            .from_env::<ConsoleConfig>()
            .map_err(|e| HrApiError::Config(e.to_string()))
    }

    /// Reverse geocoding is optional; without an endpoint the location layer
    /// falls back to coordinate-formatted addresses.
    pub fn reverse_geocoder(&self) -> Option<ReverseGeocoder> {
        let endpoint = self.geocoder_url.as_deref()?;
        Some(ReverseGeocoder::new(
            endpoint,
            self.geocoder_api_key.as_deref().unwrap_or(""),
            self.request_timeout_secs,
        ))
    }
}
