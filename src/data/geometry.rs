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

//! Route line geometry loaded from GeoJSON.
//!
//! The built-in geometry for every route is compiled into the binary. A
//! directory of `<route-id>.geojson` files can override it at runtime.

use std::path::Path;
use std::str::FromStr;

use geojson::{GeoJson, Geometry, Value};
use log::{info, warn};
use thiserror::Error;

use super::GeoPoint;

/// Polylines making up one route.
pub type RouteGeometry = Vec<Vec<GeoPoint>>;

#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("no geometry available for route '{0}'")]
    Missing(String),

    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid GeoJSON: {0}")]
    Parse(#[from] geojson::Error),
}

const BUILTIN: &[(&str, &str)] = &[
    (
        "riverwalk-loop-v3-public",
        include_str!("../../assets/routes/riverwalk-loop-v3-public.geojson"),
    ),
    (
        "zoo-loop-v2-full-public",
        include_str!("../../assets/routes/zoo-loop-v2-full-public.geojson"),
    ),
    (
        "Riverwalk_trail-test-public",
        include_str!("../../assets/routes/Riverwalk_trail-test-public.geojson"),
    ),
    (
        "South_Chick_GreenWay-public",
        include_str!("../../assets/routes/South_Chick_GreenWay-public.geojson"),
    ),
    (
        "Chatt_TPL_Trails-public",
        include_str!("../../assets/routes/Chatt_TPL_Trails-public.geojson"),
    ),
];

/// Load a route's geometry, preferring `override_dir` when given.
pub fn load_route_geometry(
    route_id: &str,
    override_dir: Option<&Path>,
) -> Result<RouteGeometry, GeometryError> {
    if let Some(dir) = override_dir {
        let path = dir.join(format!("{route_id}.geojson"));
        if path.exists() {
            let text = std::fs::read_to_string(&path).map_err(|source| GeometryError::Io {
                path: path.display().to_string(),
                source,
            })?;
            info!("Loaded geometry for '{}' from {}", route_id, path.display());
            return parse_lines(&text);
        }
        warn!(
            "No override geometry for '{}' in {}, using built-in",
            route_id,
            dir.display()
        );
    }

    let text = BUILTIN
        .iter()
        .find(|(id, _)| *id == route_id)
        .map(|(_, text)| *text)
        .ok_or_else(|| GeometryError::Missing(route_id.to_string()))?;
    parse_lines(text)
}

/// Extract every line string from a GeoJSON document.
///
/// Non-line geometries are skipped.
pub fn parse_lines(text: &str) -> Result<RouteGeometry, GeometryError> {
    let geojson = GeoJson::from_str(text)?;
    let mut lines = Vec::new();

    match geojson {
        GeoJson::FeatureCollection(collection) => {
            for feature in collection.features {
                if let Some(geometry) = feature.geometry {
                    collect_lines(&geometry, &mut lines);
                }
            }
        }
        GeoJson::Feature(feature) => {
            if let Some(geometry) = feature.geometry {
                collect_lines(&geometry, &mut lines);
            }
        }
        GeoJson::Geometry(geometry) => collect_lines(&geometry, &mut lines),
    }

    Ok(lines)
}

fn collect_lines(geometry: &Geometry, out: &mut RouteGeometry) {
    match &geometry.value {
        Value::LineString(coords) => out.push(to_points(coords)),
        Value::MultiLineString(parts) => out.extend(parts.iter().map(|c| to_points(c))),
        Value::GeometryCollection(children) => {
            for child in children {
                collect_lines(child, out);
            }
        }
        _ => {}
    }
}

fn to_points(coords: &[Vec<f64>]) -> Vec<GeoPoint> {
    coords
        .iter()
        .filter(|c| c.len() >= 2)
        .map(|c| GeoPoint::new(c[1], c[0]))
        .collect()
}
