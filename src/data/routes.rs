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

//! Bike route definitions.

use crate::map::camera::Bounds;

/// Opacity a route is drawn with before any selection happens.
pub const DEFAULT_ROUTE_OPACITY: f32 = 1.0;

/// Static description of a route.
#[derive(Debug, Clone, Copy)]
pub struct RouteDef {
    /// Layer id; must match the geometry asset name.
    pub id: &'static str,
    pub name: &'static str,
    /// Hex colour, e.g. `#2563EB`.
    pub color: &'static str,
    pub description: &'static str,
    pub default_width: f32,
}

pub const ROUTE_DEFS: &[RouteDef] = &[
    RouteDef {
        id: "riverwalk-loop-v3-public",
        name: "Riverwalk Loop",
        color: "#2563EB",
        description: "Explore the riverwalk and visit the aquarium",
        default_width: 8.0,
    },
    RouteDef {
        id: "zoo-loop-v2-full-public",
        name: "Zoo Loop",
        color: "#DC2626",
        description: "Fun route through the university to visit the zoo and a nearby park",
        default_width: 8.0,
    },
    RouteDef {
        id: "Riverwalk_trail-test-public",
        name: "Riverwalk Greenway Trail",
        color: "#059669",
        description: "Fun route through the university to visit the zoo and a nearby park",
        default_width: 8.0,
    },
    RouteDef {
        id: "South_Chick_GreenWay-public",
        name: "South Chickamauga Creek",
        color: "#7C3AED",
        description: "A new bike route to explore",
        default_width: 8.0,
    },
    RouteDef {
        id: "Chatt_TPL_Trails-public",
        name: "Local Greenways",
        color: "#16A34A",
        description: "A new bike route to explore",
        default_width: 8.0,
    },
];

/// A route with its per-session display state.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub id: String,
    pub name: String,
    pub color: String,
    pub description: String,
    pub default_width: f32,
    pub opacity: f32,
    /// Computed once, after the map has rendered the route.
    pub bounds: Option<Bounds>,
}

impl From<&RouteDef> for Route {
    fn from(def: &RouteDef) -> Self {
        Self {
            id: def.id.to_string(),
            name: def.name.to_string(),
            color: def.color.to_string(),
            description: def.description.to_string(),
            default_width: def.default_width,
            opacity: DEFAULT_ROUTE_OPACITY,
            bounds: None,
        }
    }
}

impl Route {
    /// All built-in routes in display order.
    #[must_use]
    pub fn all() -> Vec<Route> {
        ROUTE_DEFS.iter().map(Route::from).collect()
    }

    /// Route colour as an egui colour, falling back to grey for bad hex.
    #[must_use]
    pub fn color32(&self) -> egui::Color32 {
        egui::Color32::from_hex(&self.color).unwrap_or(egui::Color32::GRAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_route_ids_are_unique() {
        let ids: HashSet<_> = ROUTE_DEFS.iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), ROUTE_DEFS.len());
    }

    #[test]
    fn test_routes_start_fully_opaque_without_bounds() {
        for route in Route::all() {
            assert!((route.opacity - 1.0).abs() < f32::EPSILON);
            assert!(route.bounds.is_none());
        }
    }

    #[test]
    fn test_route_colors_parse() {
        for route in Route::all() {
            assert_ne!(route.color32(), egui::Color32::GRAY, "{}", route.color);
        }
    }
}
