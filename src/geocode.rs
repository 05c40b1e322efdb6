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

//! Free-text address lookup against the Mapbox places endpoint.

use log::debug;
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;

use crate::data::GeoPoint;

pub const DEFAULT_GEOCODING_URL: &str = "https://api.mapbox.com/geocoding/v5/mapbox.places";

/// Environment variable that overrides the configured token.
pub const ACCESS_TOKEN_ENV: &str = "MAPBOX_ACCESS_TOKEN";

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("no Mapbox access token configured")]
    MissingToken,

    #[error("invalid geocoding URL: {0}")]
    InvalidUrl(String),

    #[error("geocoding request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("geocoding returned HTTP {0}")]
    Status(u16),

    #[error("geocoding response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    /// `[lon, lat]`
    center: Option<[f64; 2]>,
}

/// Resolve the access token, environment first.
pub fn resolve_access_token(config_token: Option<&str>) -> Option<String> {
    if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
        if !token.is_empty() {
            return Some(token);
        }
    }
    config_token.map(|s| s.to_string()).filter(|s| !s.is_empty())
}

/// Centre of the first feature, or `None` when nothing matched.
pub fn parse_first_center(body: &[u8]) -> Result<Option<GeoPoint>, serde_json::Error> {
    let collection: FeatureCollection = serde_json::from_slice(body)?;
    Ok(collection
        .features
        .into_iter()
        .next()
        .and_then(|f| f.center)
        .map(|[lon, lat]| GeoPoint::new(lat, lon)))
}

#[derive(Debug, Clone)]
pub struct Geocoder {
    http: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
    proximity: GeoPoint,
}

impl Geocoder {
    pub fn new(base_url: impl Into<String>, access_token: Option<String>, proximity: GeoPoint) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            access_token,
            proximity,
        }
    }

    pub fn has_token(&self) -> bool {
        self.access_token.is_some()
    }

    fn request_url(&self, address: &str) -> Result<Url, GeocodeError> {
        let token = self.access_token.as_deref().ok_or(GeocodeError::MissingToken)?;

        let mut url =
            Url::parse(&self.base_url).map_err(|e| GeocodeError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| GeocodeError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .push(&format!("{address}.json"));
        url.query_pairs_mut()
            .append_pair("access_token", token)
            .append_pair("limit", "1")
            .append_pair(
                "proximity",
                &format!("{},{}", self.proximity.lon, self.proximity.lat),
            );
        Ok(url)
    }

    /// Look an address up. `Ok(None)` means the service found nothing.
    pub async fn lookup(&self, address: &str) -> Result<Option<GeoPoint>, GeocodeError> {
        let url = self.request_url(address)?;
        debug!("Geocoding '{}'", address);

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status.as_u16()));
        }
        let body = response.bytes().await?;
        Ok(parse_first_center(&body)?)
    }
}
