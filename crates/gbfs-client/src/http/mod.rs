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

//! HTTP access to GBFS endpoints.

use std::time::Duration;

use log::{debug, info, warn};
use serde::Deserialize;
use thiserror::Error;

use crate::feed::{parse_stations, StationInformation, StationStatus};
use crate::rental::{join_and_normalize, RentalLocation};

/// Station information feed for the Chattanooga public bike system.
pub const DEFAULT_STATION_INFORMATION_URL: &str =
    "https://chattanooga.publicbikesystem.net/customer/ube/gbfs/v1/en/station_information";

/// Station status feed for the Chattanooga public bike system.
pub const DEFAULT_STATION_STATUS_URL: &str =
    "https://chattanooga.publicbikesystem.net/customer/ube/gbfs/v1/en/station_status";

/// Errors that can occur while fetching a feed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("could not decode feed from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Endpoint configuration for a GBFS system.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub station_information_url: String,
    pub station_status_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            station_information_url: DEFAULT_STATION_INFORMATION_URL.to_string(),
            station_status_url: DEFAULT_STATION_STATUS_URL.to_string(),
            timeout: Duration::from_secs(15),
        }
    }
}

/// Client for the two station feeds of one GBFS system.
#[derive(Debug, Clone)]
pub struct GbfsClient {
    http: reqwest::Client,
    config: FeedConfig,
}

impl GbfsClient {
    /// Create a client with its own connection pool.
    #[must_use]
    pub fn new(config: FeedConfig) -> Self {
        let http = match reqwest::Client::builder().timeout(config.timeout).build() {
            Ok(http) => http,
            Err(e) => {
                warn!("Failed to build HTTP client, using defaults without a timeout: {}", e);
                reqwest::Client::new()
            }
        };
        Self::with_http_client(http, config)
    }

    /// Create a client that shares an existing `reqwest::Client`.
    #[must_use]
    pub fn with_http_client(http: reqwest::Client, config: FeedConfig) -> Self {
        Self { http, config }
    }

    #[must_use]
    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Fetch the `station_information` feed.
    pub async fn fetch_station_information(&self) -> Result<Vec<StationInformation>, FetchError> {
        self.fetch_stations(&self.config.station_information_url).await
    }

    /// Fetch the `station_status` feed.
    pub async fn fetch_station_status(&self) -> Result<Vec<StationStatus>, FetchError> {
        self.fetch_stations(&self.config.station_status_url).await
    }

    /// Fetch both feeds concurrently and join them.
    pub async fn fetch_rental_locations(&self) -> Result<Vec<RentalLocation>, FetchError> {
        let (stations, statuses) = tokio::try_join!(
            self.fetch_station_information(),
            self.fetch_station_status()
        )?;
        let locations = join_and_normalize(&stations, &statuses);
        info!(
            "Loaded {} bike share stations ({} status records)",
            locations.len(),
            statuses.len()
        );
        Ok(locations)
    }

    async fn fetch_stations<T>(&self, url: &str) -> Result<Vec<T>, FetchError>
    where
        T: for<'de> Deserialize<'de>,
    {
        debug!("GET {url}");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;

        parse_stations(&body).map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

impl Default for GbfsClient {
    fn default() -> Self {
        Self::new(FeedConfig::default())
    }
}
