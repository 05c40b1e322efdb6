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

//! Application configuration management.
//!
//! Settings are stored as TOML through `confy`. Every field has a serde
//! default so older or hand-edited files keep loading. The sidebar and layer
//! flags stand in for the browser's `sidebar_state` cookie.

use std::path::PathBuf;

use log::info;
use serde::{Deserialize, Serialize};

use crate::data::GeoPoint;
use crate::geocode::DEFAULT_GEOCODING_URL;
use crate::legend::LayerVisibility;
use crate::location::LocationProvider;
use crate::map::tiles::DEFAULT_MAPBOX_STYLE;
use crate::map::Basemap;
use gbfs_client::{DEFAULT_STATION_INFORMATION_URL, DEFAULT_STATION_STATUS_URL};

const APP_NAME: &str = "bikemap-desktop";
const CONFIG_NAME: &str = "config";

/// Current schema version
pub const CONFIG_VERSION: u32 = 1;

/// Per-run overrides from the command line. Never written back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOverrides {
    pub no_location: bool,
    pub basemap: Option<Basemap>,
}

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Configuration schema version for migrations
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// GBFS `station_information` feed
    #[serde(default = "default_station_information_url")]
    pub station_information_url: String,

    /// GBFS `station_status` feed
    #[serde(default = "default_station_status_url")]
    pub station_status_url: String,

    /// Mapbox places endpoint used for address search
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,

    /// Mapbox access token (optional, env var takes precedence)
    #[serde(default)]
    pub mapbox_access_token: Option<String>,

    #[serde(default)]
    pub basemap: Basemap,

    /// Mapbox style as `owner/style_id`
    #[serde(default = "default_mapbox_style")]
    pub mapbox_style: String,

    /// Initial map centre latitude
    #[serde(default = "default_home_lat")]
    pub home_lat: f64,

    /// Initial map centre longitude
    #[serde(default = "default_home_lon")]
    pub home_lon: f64,

    /// Initial map zoom
    #[serde(default = "default_home_zoom")]
    pub home_zoom: f64,

    /// Legend sidebar open state
    #[serde(default = "default_true")]
    pub sidebar_open: bool,

    #[serde(default)]
    pub show_attractions: bool,

    #[serde(default)]
    pub show_bike_resources: bool,

    #[serde(default)]
    pub show_bike_rentals: bool,

    /// Show and track the current location
    #[serde(default = "default_true")]
    pub location_enabled: bool,

    /// Override latitude (skips the IP lookup)
    #[serde(default)]
    pub location_override_lat: Option<f64>,

    /// Override longitude (skips the IP lookup)
    #[serde(default)]
    pub location_override_lon: Option<f64>,

    /// Load route GeoJSON from here instead of the built-in copies
    #[serde(default)]
    pub route_geometry_dir: Option<PathBuf>,
}

// Default value functions for serde
fn default_config_version() -> u32 {
    CONFIG_VERSION
}

fn default_station_information_url() -> String {
    DEFAULT_STATION_INFORMATION_URL.to_string()
}

fn default_station_status_url() -> String {
    DEFAULT_STATION_STATUS_URL.to_string()
}

fn default_geocoding_url() -> String {
    DEFAULT_GEOCODING_URL.to_string()
}

fn default_mapbox_style() -> String {
    DEFAULT_MAPBOX_STYLE.to_string()
}

fn default_home_lat() -> f64 {
    35.04828
}

fn default_home_lon() -> f64 {
    -85.31225
}

fn default_home_zoom() -> f64 {
    14.89
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            station_information_url: default_station_information_url(),
            station_status_url: default_station_status_url(),
            geocoding_url: default_geocoding_url(),
            mapbox_access_token: None,
            basemap: Basemap::default(),
            mapbox_style: default_mapbox_style(),
            home_lat: default_home_lat(),
            home_lon: default_home_lon(),
            home_zoom: default_home_zoom(),
            sidebar_open: true,
            show_attractions: false,
            show_bike_resources: false,
            show_bike_rentals: false,
            location_enabled: true,
            location_override_lat: None,
            location_override_lon: None,
            route_geometry_dir: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, bumping older schema versions
    pub fn load() -> Result<Self, confy::ConfyError> {
        let mut config: AppConfig = confy::load(APP_NAME, CONFIG_NAME)?;

        if config.config_version < CONFIG_VERSION {
            info!(
                "Upgrading configuration from version {} to {}",
                config.config_version, CONFIG_VERSION
            );
            config.config_version = CONFIG_VERSION;
            config.save()?;
        }

        Ok(config)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store(APP_NAME, CONFIG_NAME, self)
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    pub fn home(&self) -> GeoPoint {
        GeoPoint::new(self.home_lat, self.home_lon)
    }

    pub fn layers(&self) -> LayerVisibility {
        LayerVisibility {
            attractions: self.show_attractions,
            bike_resources: self.show_bike_resources,
            bike_rentals: self.show_bike_rentals,
        }
    }

    /// Copy persisted UI state back in. Returns true if anything changed.
    pub fn apply_ui_state(&mut self, is_open: bool, layers: LayerVisibility) -> bool {
        let before = (
            self.sidebar_open,
            self.show_attractions,
            self.show_bike_resources,
            self.show_bike_rentals,
        );
        self.sidebar_open = is_open;
        self.show_attractions = layers.attractions;
        self.show_bike_resources = layers.bike_resources;
        self.show_bike_rentals = layers.bike_rentals;
        before
            != (
                self.sidebar_open,
                self.show_attractions,
                self.show_bike_resources,
                self.show_bike_rentals,
            )
    }

    /// The settings for this run, leaving the persisted copy untouched.
    pub fn with_overrides(&self, overrides: RunOverrides) -> Self {
        let mut config = self.clone();
        if overrides.no_location {
            config.location_enabled = false;
        }
        if let Some(basemap) = overrides.basemap {
            config.basemap = basemap;
        }
        config
    }

    /// Where positions come from. An override needs both coordinates.
    pub fn location_provider(&self) -> LocationProvider {
        if !self.location_enabled {
            return LocationProvider::Disabled;
        }
        match (self.location_override_lat, self.location_override_lon) {
            (Some(lat), Some(lon)) => LocationProvider::Fixed(GeoPoint::new(lat, lon)),
            _ => LocationProvider::IpLookup,
        }
    }
}
