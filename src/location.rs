// src/location.rs

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

pub const FIX_TIMEOUT: Duration = Duration::from_secs(15);

// --- Error Type ---

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Position unavailable")]
    PositionUnavailable,

    #[error("Timed out waiting for a position fix")]
    Timeout,

    #[error("No location capability on this platform")]
    Unsupported,
}

// --- Position Sources ---

/// One-shot fix request options. Defaults mirror what the punch flow needs:
/// a fresh high-accuracy fix, never a cached one.
#[derive(Debug, Clone, Copy)]
pub struct FixOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    pub max_age: Duration,
}

impl Default for FixOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: FIX_TIMEOUT,
            max_age: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoFix {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_m: f64,
}

/// Seam over the platform positioning capability.
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn current_fix(&self, options: FixOptions) -> Result<GeoFix, LocationError>;
}

/// Source backed by operator-supplied coordinates (e.g. CLI flags).
#[derive(Debug, Clone, Copy)]
pub struct FixedLocationSource {
    fix: GeoFix,
}

impl FixedLocationSource {
    pub fn new(latitude: f64, longitude: f64, accuracy_m: f64) -> Self {
        Self {
            fix: GeoFix {
                latitude,
                longitude,
                accuracy_m,
            },
        }
    }
}

#[async_trait]
impl LocationSource for FixedLocationSource {
    async fn current_fix(&self, _options: FixOptions) -> Result<GeoFix, LocationError> {
        Ok(self.fix)
    }
}

/// Placeholder for platforms with no positioning capability at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedLocationSource;

#[async_trait]
impl LocationSource for UnsupportedLocationSource {
    async fn current_fix(&self, _options: FixOptions) -> Result<GeoFix, LocationError> {
        Err(LocationError::Unsupported)
    }
}

// --- Reverse Geocoding ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeocodePayload {
    display_name: Option<String>,
}

#[derive(Clone)]
pub struct ReverseGeocoder {
    http: Client,
    endpoint: String,
    api_key: String,
}

impl ReverseGeocoder {
    pub fn new(endpoint: &str, api_key: &str, timeout_secs: u64) -> Self {
        let http = match Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                warn!("Failed to build geocoder HTTP client, using defaults: {}", e);
                Client::default()
            }
        };
        Self {
            http,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        }
    }

    async fn lookup(&self, fix: &GeoFix) -> Result<Option<String>, reqwest::Error> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("lat", fix.latitude.to_string()),
                ("lon", fix.longitude.to_string()),
                ("key", self.api_key.clone()),
            ])
            .send()
            .await?
            .error_for_status()?;
        let payload: GeocodePayload = response.json().await?;
        Ok(payload.display_name)
    }
}

pub fn coordinate_label(fix: &GeoFix) -> String {
    format!("{:.6}, {:.6}", fix.latitude, fix.longitude)
}

// --- Provider ---

#[derive(Debug, Clone, PartialEq)]
pub struct LocationReading {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_m: f64,
    pub captured_at: DateTime<Utc>,
    pub address: String,
}

/// Turns a raw platform fix into an address-enriched reading. Geocoding
/// failures degrade to a coordinate string and never fail the capture.
#[derive(Clone)]
pub struct LocationProvider {
    source: Arc<dyn LocationSource>,
    geocoder: Option<ReverseGeocoder>,
    options: FixOptions,
}

impl LocationProvider {
    pub fn new(source: Arc<dyn LocationSource>, geocoder: Option<ReverseGeocoder>) -> Self {
        Self {
            source,
            geocoder,
            options: FixOptions::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    pub async fn capture(&self) -> Result<LocationReading, LocationError> {
        // The outer timeout also covers sources that ignore the option.
        let fix = match tokio::time::timeout(
            self.options.timeout,
            self.source.current_fix(self.options),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => return Err(LocationError::Timeout),
        };

        let address = self.resolve_address(&fix).await;
        debug!(
            "Captured location fix: lat={}, lon={}, accuracy={}m",
            fix.latitude, fix.longitude, fix.accuracy_m
        );

        Ok(LocationReading {
            latitude: fix.latitude,
            longitude: fix.longitude,
            accuracy_m: fix.accuracy_m,
            captured_at: Utc::now(),
            address,
        })
    }

    async fn resolve_address(&self, fix: &GeoFix) -> String {
        if let Some(geocoder) = &self.geocoder {
            match geocoder.lookup(fix).await {
                Ok(Some(address)) if !address.is_empty() => return address,
                Ok(_) => debug!("Reverse geocoding returned no address"),
                Err(e) => warn!(
                    "Reverse geocoding failed, falling back to coordinates: {}",
                    e
                ),
            }
        }
        coordinate_label(fix)
    }
}
