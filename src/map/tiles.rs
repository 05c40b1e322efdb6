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

//! Basemap tile sources.

use std::path::PathBuf;

use eframe::egui;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use walkers::sources::{Attribution, TileSource};
use walkers::{HttpOptions, HttpTiles, TileId};

/// Default Mapbox style, the bike map's own street style.
pub const DEFAULT_MAPBOX_STYLE: &str = "kwiens/cm6au0n48006h01s28k1p0faz";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Basemap {
    #[default]
    CartoLight,
    CartoDark,
    /// Needs an access token.
    Mapbox,
}

impl Basemap {
    pub fn as_str(&self) -> &'static str {
        match self {
            Basemap::CartoLight => "carto-light",
            Basemap::CartoDark => "carto-dark",
            Basemap::Mapbox => "mapbox",
        }
    }
}

/// Carto CDN basemap tiles
/// Uses subdomain load balancing across a-d.basemaps.cartocdn.com
pub struct CartoTileSource {
    style: &'static str,
}

impl CartoTileSource {
    pub fn light() -> Self {
        Self { style: "light_all" }
    }

    pub fn dark() -> Self {
        Self { style: "dark_all" }
    }
}

impl TileSource for CartoTileSource {
    fn tile_url(&self, tile_id: TileId) -> String {
        let subdomain = ['a', 'b', 'c', 'd'][((tile_id.x + tile_id.y) % 4) as usize];

        format!(
            "https://{}.basemaps.cartocdn.com/{}/{}/{}/{}.png",
            subdomain, self.style, tile_id.zoom, tile_id.x, tile_id.y
        )
    }

    fn attribution(&self) -> Attribution {
        Attribution {
            text: "© OpenStreetMap contributors, © CARTO",
            url: "https://carto.com/attributions",
            logo_light: None,
            logo_dark: None,
        }
    }
}

/// Raster tiles rendered from a Mapbox style
pub struct MapboxStyleSource {
    style: String,
    access_token: String,
}

impl MapboxStyleSource {
    pub fn new(style: String, access_token: String) -> Self {
        Self {
            style,
            access_token,
        }
    }
}

impl TileSource for MapboxStyleSource {
    fn tile_url(&self, tile_id: TileId) -> String {
        format!(
            "https://api.mapbox.com/styles/v1/{}/tiles/256/{}/{}/{}?access_token={}",
            self.style, tile_id.zoom, tile_id.x, tile_id.y, self.access_token
        )
    }

    fn attribution(&self) -> Attribution {
        Attribution {
            text: "© Mapbox © OpenStreetMap",
            url: "https://www.mapbox.com/about/maps/",
            logo_light: None,
            logo_dark: None,
        }
    }
}

fn cache_dir(name: &str) -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("bikemap-desktop")
        .join("tiles")
        .join(name)
}

/// Build the tile layer for a basemap, with an on-disk cache.
///
/// Mapbox without a token falls back to the light Carto basemap.
pub fn build_tiles(
    basemap: Basemap,
    mapbox_style: &str,
    access_token: Option<&str>,
    ctx: &egui::Context,
) -> HttpTiles {
    let basemap = match (basemap, access_token) {
        (Basemap::Mapbox, None) => {
            warn!("Mapbox basemap needs an access token, using carto-light");
            Basemap::CartoLight
        }
        (other, _) => other,
    };
    info!("Using {} basemap", basemap.as_str());

    let http_options = HttpOptions {
        cache: Some(cache_dir(basemap.as_str())),
        ..Default::default()
    };

    match (basemap, access_token) {
        (Basemap::Mapbox, Some(token)) => HttpTiles::with_options(
            MapboxStyleSource::new(mapbox_style.to_string(), token.to_string()),
            http_options,
            ctx.clone(),
        ),
        (Basemap::CartoDark, _) => {
            HttpTiles::with_options(CartoTileSource::dark(), http_options, ctx.clone())
        }
        _ => HttpTiles::with_options(CartoTileSource::light(), http_options, ctx.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carto_urls() {
        let tile = TileId { x: 1, y: 2, zoom: 14 };
        assert_eq!(
            CartoTileSource::light().tile_url(tile),
            "https://d.basemaps.cartocdn.com/light_all/14/1/2.png"
        );
        assert!(CartoTileSource::dark().tile_url(tile).contains("/dark_all/"));
    }

    #[test]
    fn test_mapbox_url() {
        let source = MapboxStyleSource::new(DEFAULT_MAPBOX_STYLE.into(), "pk.test".into());
        assert_eq!(
            source.tile_url(TileId { x: 4, y: 5, zoom: 15 }),
            "https://api.mapbox.com/styles/v1/kwiens/cm6au0n48006h01s28k1p0faz/tiles/256/15/4/5?access_token=pk.test"
        );
    }

    #[test]
    fn test_basemap_names() {
        assert_eq!(Basemap::default().as_str(), "carto-light");
        assert_eq!(Basemap::Mapbox.as_str(), "mapbox");
    }
}
