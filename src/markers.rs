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

//! Marker construction.
//!
//! Everything here is pure: a factory turns a data record into a [`Marker`]
//! value and never touches a map. The map controller decides when a marker is
//! attached to or removed from the surface.

use egui::Color32;
use gbfs_client::RentalLocation;
use reqwest::Url;

use crate::data::{GeoPoint, Icon, Place};
use crate::events::Layer;

pub const ATTRACTION_COLOR: Color32 = Color32::from_rgb(0x3b, 0x82, 0xf6);
pub const RESOURCE_COLOR: Color32 = Color32::from_rgb(0x34, 0xd3, 0x99);
pub const RENTAL_COLOR: Color32 = Color32::from_rgb(0x93, 0x33, 0xea);
pub const LOCATION_COLOR: Color32 = Color32::from_rgb(0x25, 0x63, 0xeb);
pub const HIGHLIGHT_COLOR: Color32 = Color32::from_rgb(0xf5, 0x9e, 0x0b);

/// Stable identity of a marker, unique across all layers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(String);

impl MarkerId {
    #[must_use]
    pub fn for_place(layer: Layer, place: &Place) -> Self {
        Self(format!("{}:{}", layer.wire_name(), place.key()))
    }

    #[must_use]
    pub fn for_rental(station_id: &str) -> Self {
        Self(format!("{}:{}", Layer::BikeRentals.wire_name(), station_id))
    }

    #[must_use]
    pub fn location() -> Self {
        Self("current-location".to_string())
    }

    #[must_use]
    pub fn highlight() -> Self {
        Self("highlight".to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MarkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// Round pin with a glyph.
    Pin,
    /// Pulsing dot for the user's position.
    CurrentLocation,
    /// Ring drawn around a centred target.
    Highlight,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerStyle {
    pub kind: MarkerKind,
    pub color: Color32,
    pub glyph: Option<&'static str>,
}

/// Content shown when a marker is clicked.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Popup {
    pub title: String,
    pub description: String,
    pub address: String,
    /// "Open in Google Maps" link for the address.
    pub maps_url: Option<String>,
    /// Extra label/value rows.
    pub details: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: MarkerId,
    pub position: GeoPoint,
    pub style: MarkerStyle,
    pub popup: Option<Popup>,
}

/// Google Maps search link for an address.
#[must_use]
pub fn maps_url(address: &str) -> Option<String> {
    Url::parse_with_params("https://maps.google.com/", &[("q", address)])
        .ok()
        .map(String::from)
}

fn place_marker(layer: Layer, place: &Place, color: Color32) -> Marker {
    Marker {
        id: MarkerId::for_place(layer, place),
        position: GeoPoint::new(place.latitude, place.longitude),
        style: MarkerStyle {
            kind: MarkerKind::Pin,
            color,
            glyph: Some(place.icon.glyph()),
        },
        popup: Some(Popup {
            title: place.name.to_string(),
            description: place.description.to_string(),
            address: place.address.to_string(),
            maps_url: maps_url(place.address),
            details: Vec::new(),
        }),
    }
}

#[must_use]
pub fn attraction_marker(place: &Place) -> Marker {
    place_marker(Layer::Attractions, place, ATTRACTION_COLOR)
}

#[must_use]
pub fn resource_marker(place: &Place) -> Marker {
    place_marker(Layer::BikeResources, place, RESOURCE_COLOR)
}

#[must_use]
pub fn rental_marker(location: &RentalLocation) -> Marker {
    let count = |n: Option<u32>| n.map_or_else(|| "unknown".to_string(), |n| n.to_string());

    let mut details = vec![
        ("Type".to_string(), location.rental_type.clone()),
        ("Price".to_string(), location.price.clone()),
        ("Hours".to_string(), location.hours.clone()),
        ("Capacity".to_string(), location.capacity.to_string()),
        ("Bikes available".to_string(), count(location.available_bikes)),
        ("Docks available".to_string(), count(location.available_docks)),
    ];
    if location.is_charging_station {
        details.push(("Charging".to_string(), "Yes".to_string()));
    }

    Marker {
        id: MarkerId::for_rental(&location.station_id),
        position: GeoPoint::new(location.latitude, location.longitude),
        style: MarkerStyle {
            kind: MarkerKind::Pin,
            color: RENTAL_COLOR,
            glyph: Some(Icon::Bicycle.glyph()),
        },
        popup: Some(Popup {
            title: location.name.clone(),
            description: location.description.clone(),
            address: location.address.clone(),
            maps_url: maps_url(&location.address),
            details,
        }),
    }
}

#[must_use]
pub fn location_marker(position: GeoPoint) -> Marker {
    Marker {
        id: MarkerId::location(),
        position,
        style: MarkerStyle {
            kind: MarkerKind::CurrentLocation,
            color: LOCATION_COLOR,
            glyph: None,
        },
        popup: None,
    }
}

#[must_use]
pub fn highlight_marker(position: GeoPoint) -> Marker {
    Marker {
        id: MarkerId::highlight(),
        position,
        style: MarkerStyle {
            kind: MarkerKind::Highlight,
            color: HIGHLIGHT_COLOR,
            glyph: None,
        },
        popup: None,
    }
}
