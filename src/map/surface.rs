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

//! The narrow command interface the map controller drives.

use thiserror::Error;

use crate::data::{GeoPoint, Route, RouteGeometry};
use crate::markers::{Marker, MarkerId};

#[derive(Debug, Error, PartialEq)]
pub enum SurfaceError {
    #[error("route layer '{0}' does not exist")]
    UnknownRoute(String),

    #[error("marker '{0}' is not on the map")]
    UnknownMarker(MarkerId),

    #[error("map has not finished loading")]
    NotLoaded,
}

/// A click the surface saw since the last poll.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceClick {
    Marker(MarkerId),
    Background(GeoPoint),
}

/// A map instance. Only the map controller holds one.
pub trait MapSurface {
    /// Build base layers and the route lines.
    fn initialize(&mut self, routes: &[Route]);

    /// True once base layers are rendered and queries can succeed.
    fn is_loaded(&self) -> bool;

    fn set_route_opacity(&mut self, route_id: &str, opacity: f32) -> Result<(), SurfaceError>;

    /// Line features currently rendered for a route.
    fn query_route_features(&self, route_id: &str) -> Result<RouteGeometry, SurfaceError>;

    /// Attach a marker. Attaching an id that is already present replaces it.
    fn add_marker(&mut self, marker: &Marker);

    fn remove_marker(&mut self, id: &MarkerId);

    fn has_marker(&self, id: &MarkerId) -> bool;

    fn open_popup(&mut self, id: &MarkerId) -> Result<(), SurfaceError>;

    /// Animated camera move.
    fn fly_to(&mut self, center: GeoPoint, zoom: f64);

    /// Reflow after the available area changed.
    fn resize(&mut self);

    fn take_click(&mut self) -> Option<SurfaceClick>;

    /// Tear down the map instance.
    fn remove(&mut self);
}
