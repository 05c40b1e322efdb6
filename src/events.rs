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

//! Typed event bus shared by the sidebar and the map.
//!
//! The two controllers never hold references to each other. Everything they
//! need to coordinate goes through [`MapEvent`]s published on an [`EventBus`].
//! Every subscriber sees every event in publish order, including events it
//! published itself.

use log::{debug, warn};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

/// Default number of undelivered events a subscriber may fall behind by.
pub const DEFAULT_BUS_CAPACITY: usize = 256;

/// A togglable group of markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Attractions,
    BikeResources,
    BikeRentals,
}

impl Layer {
    pub const ALL: [Layer; 3] = [Layer::Attractions, Layer::BikeResources, Layer::BikeRentals];

    /// Stable name used in logs and event payloads.
    #[must_use]
    pub fn wire_name(self) -> &'static str {
        match self {
            Layer::Attractions => "attractions",
            Layer::BikeResources => "bikeResources",
            Layer::BikeRentals => "bikeRentals",
        }
    }

    /// Label shown in the legend.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Layer::Attractions => "Attractions",
            Layer::BikeResources => "Bike Shops",
            Layer::BikeRentals => "Bike Share",
        }
    }
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Where a center-location request should go.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationTarget {
    Coordinates { latitude: f64, longitude: f64 },
    /// Free-text address, resolved by geocoding.
    Address(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    RouteSelect { route_id: String },
    RouteDeselect,
    LayerToggle { layer: Layer, visible: bool },
    CenterLocation { location: LocationTarget },
    SidebarToggle { is_open: bool },
}

impl MapEvent {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            MapEvent::RouteSelect { .. } => "route-select",
            MapEvent::RouteDeselect => "route-deselect",
            MapEvent::LayerToggle { .. } => "layer-toggle",
            MapEvent::CenterLocation { .. } => "center-location",
            MapEvent::SidebarToggle { .. } => "sidebar-toggle",
        }
    }
}

/// Publish side of the bus. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<MapEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event to every current subscriber. Never fails.
    pub fn publish(&self, event: MapEvent) {
        let name = event.name();
        match self.tx.send(event) {
            Ok(receivers) => debug!("Published {} to {} subscriber(s)", name, receivers),
            Err(_) => debug!("Dropped {}: no subscribers", name),
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            rx: self.tx.subscribe(),
        }
    }
}

/// Receive side of the bus, polled once per frame.
#[derive(Debug)]
pub struct EventReceiver {
    rx: broadcast::Receiver<MapEvent>,
}

impl EventReceiver {
    /// Take every pending event, oldest first.
    pub fn drain(&mut self) -> Vec<MapEvent> {
        let mut events = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("Event receiver lagged, {} event(s) skipped", skipped);
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        events
    }
}
