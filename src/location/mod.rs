// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Where the user is.
//!
//! A desktop has no geolocation API, so positions come from one of a few
//! providers: nothing at all, a fixed coordinate from the config, or an
//! IP-based lookup. [`LocationService`] wraps the provider with the usual
//! timeout and cached-fix semantics, and [`tracker::LocationTracker`] decides
//! what the map does with each result.

pub mod tracker;

pub use tracker::{LocationAction, LocationTracker};

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::Deserialize;
use thiserror::Error;

use crate::data::GeoPoint;

/// Primary IP geolocation endpoint
pub const IPAPI_URL: &str = "https://ipapi.co/json/";
/// Secondary IP geolocation endpoint
pub const IP_API_URL: &str = "http://ip-api.com/json";

/// How often a watch asks the provider again.
pub const WATCH_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached fix that may be returned instead of a fresh query.
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: false,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fix {
    pub position: GeoPoint,
    /// Rough accuracy radius in metres, when the provider reports one.
    pub accuracy_m: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("position unavailable: {0}")]
    PositionUnavailable(String),

    #[error("location request timed out")]
    Timeout,

    #[error("location error: {0}")]
    Unknown(String),
}

impl LocationError {
    /// Banner text for errors the user should hear about.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            LocationError::PermissionDenied => {
                Some("Location access is turned off. Enable it in the settings to see where you are.")
            }
            LocationError::PositionUnavailable(_) => {
                Some("Your location is currently unavailable.")
            }
            LocationError::Timeout => Some("Finding your location took too long."),
            LocationError::Unknown(_) => None,
        }
    }
}

/// Source of raw positions.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationProvider {
    /// Location is switched off; every request is denied.
    Disabled,
    /// A fixed coordinate, typically from the config.
    Fixed(GeoPoint),
    /// Approximate position from the public IP address.
    IpLookup,
}

#[derive(Debug, Deserialize)]
struct IpapiResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default)]
    error: bool,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    lat: Option<f64>,
    lon: Option<f64>,
    message: Option<String>,
}

pub struct LocationService {
    provider: LocationProvider,
    http: reqwest::Client,
    cached: Option<(Fix, Instant)>,
}

impl LocationService {
    pub fn new(provider: LocationProvider) -> Self {
        Self {
            provider,
            http: reqwest::Client::new(),
            cached: None,
        }
    }

    /// A fix no older than `options.maximum_age`, querying the provider if
    /// the cache is stale.
    pub async fn current_position(&mut self, options: PositionOptions) -> Result<Fix, LocationError> {
        if let Some((fix, at)) = &self.cached {
            if at.elapsed() <= options.maximum_age {
                debug!("Using cached position fix from {}", fix.timestamp);
                return Ok(fix.clone());
            }
        }

        let fix = match tokio::time::timeout(options.timeout, self.query()).await {
            Ok(result) => result?,
            Err(_) => return Err(LocationError::Timeout),
        };
        self.cached = Some((fix.clone(), Instant::now()));
        Ok(fix)
    }

    async fn query(&self) -> Result<Fix, LocationError> {
        match &self.provider {
            LocationProvider::Disabled => Err(LocationError::PermissionDenied),
            LocationProvider::Fixed(point) => Ok(Fix {
                position: *point,
                accuracy_m: None,
                timestamp: Utc::now(),
            }),
            LocationProvider::IpLookup => match self.query_ipapi().await {
                Ok(fix) => Ok(fix),
                Err(e) => {
                    warn!("ipapi.co lookup failed ({}), trying ip-api.com", e);
                    self.query_ip_api().await
                }
            },
        }
    }

    async fn query_ipapi(&self) -> Result<Fix, LocationError> {
        let body: IpapiResponse = self.get_json(IPAPI_URL).await?;
        if body.error {
            return Err(LocationError::PositionUnavailable(
                body.reason.unwrap_or_else(|| "lookup refused".to_string()),
            ));
        }
        match (body.latitude, body.longitude) {
            (Some(lat), Some(lon)) => Ok(ip_fix(lat, lon)),
            _ => Err(LocationError::PositionUnavailable(
                "no coordinates in response".to_string(),
            )),
        }
    }

    async fn query_ip_api(&self) -> Result<Fix, LocationError> {
        let body: IpApiResponse = self.get_json(IP_API_URL).await?;
        match (body.status.as_str(), body.lat, body.lon) {
            ("success", Some(lat), Some(lon)) => Ok(ip_fix(lat, lon)),
            _ => Err(LocationError::PositionUnavailable(
                body.message.unwrap_or(body.status),
            )),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, LocationError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| LocationError::PositionUnavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(LocationError::PositionUnavailable(format!(
                "HTTP {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| LocationError::Unknown(e.to_string()))
    }
}

fn ip_fix(lat: f64, lon: f64) -> Fix {
    Fix {
        position: GeoPoint::new(lat, lon),
        // City-level at best
        accuracy_m: Some(5_000.0),
        timestamp: Utc::now(),
    }
}
