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

//! Recording map surface for controller tests.

use std::collections::{HashMap, VecDeque};

use crate::data::{load_route_geometry, GeoPoint, Route, RouteGeometry};
use crate::markers::{Marker, MarkerId};

use super::surface::{MapSurface, SurfaceClick, SurfaceError};

#[derive(Default)]
pub struct FakeSurface {
    pub loaded: bool,
    pub initialize_calls: usize,
    pub route_opacity: HashMap<String, f32>,
    pub features: HashMap<String, RouteGeometry>,
    pub markers: HashMap<MarkerId, Marker>,
    pub add_calls: usize,
    pub fly_to_calls: Vec<(GeoPoint, f64)>,
    pub popups_opened: Vec<MarkerId>,
    pub resize_calls: usize,
    pub clicks: VecDeque<SurfaceClick>,
    pub removed: bool,
    /// Every call that changes what the map shows.
    pub mutations: usize,
    /// When false, `initialize` leaves `features` alone.
    pub load_features: bool,
}

impl FakeSurface {
    /// A surface that finishes loading as soon as it is initialized.
    pub fn loaded() -> Self {
        Self {
            loaded: true,
            load_features: true,
            ..Default::default()
        }
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn opacity(&self, route_id: &str) -> Option<f32> {
        self.route_opacity.get(route_id).copied()
    }
}

impl MapSurface for FakeSurface {
    fn initialize(&mut self, routes: &[Route]) {
        self.initialize_calls += 1;
        self.mutations += 1;
        for route in routes {
            self.route_opacity.insert(route.id.clone(), route.opacity);
            if self.load_features {
                if let Ok(lines) = load_route_geometry(&route.id, None) {
                    self.features.insert(route.id.clone(), lines);
                }
            }
        }
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn set_route_opacity(&mut self, route_id: &str, opacity: f32) -> Result<(), SurfaceError> {
        self.mutations += 1;
        match self.route_opacity.get_mut(route_id) {
            Some(current) => {
                *current = opacity;
                Ok(())
            }
            None => Err(SurfaceError::UnknownRoute(route_id.to_string())),
        }
    }

    fn query_route_features(&self, route_id: &str) -> Result<RouteGeometry, SurfaceError> {
        if !self.loaded {
            return Err(SurfaceError::NotLoaded);
        }
        self.features
            .get(route_id)
            .cloned()
            .ok_or_else(|| SurfaceError::UnknownRoute(route_id.to_string()))
    }

    fn add_marker(&mut self, marker: &Marker) {
        self.mutations += 1;
        self.add_calls += 1;
        self.markers.insert(marker.id.clone(), marker.clone());
    }

    fn remove_marker(&mut self, id: &MarkerId) {
        self.mutations += 1;
        self.markers.remove(id);
    }

    fn has_marker(&self, id: &MarkerId) -> bool {
        self.markers.contains_key(id)
    }

    fn open_popup(&mut self, id: &MarkerId) -> Result<(), SurfaceError> {
        if !self.markers.contains_key(id) {
            return Err(SurfaceError::UnknownMarker(id.clone()));
        }
        self.mutations += 1;
        self.popups_opened.push(id.clone());
        Ok(())
    }

    fn fly_to(&mut self, center: GeoPoint, zoom: f64) {
        self.mutations += 1;
        self.fly_to_calls.push((center, zoom));
    }

    fn resize(&mut self) {
        self.mutations += 1;
        self.resize_calls += 1;
    }

    fn take_click(&mut self) -> Option<SurfaceClick> {
        self.clicks.pop_front()
    }

    fn remove(&mut self) {
        self.mutations += 1;
        self.removed = true;
        self.markers.clear();
    }
}
