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

//! Sidebar state and the gestures that change it.

use log::debug;

use crate::events::{EventBus, EventReceiver, Layer, LocationTarget, MapEvent};

/// Per-layer visibility flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayerVisibility {
    pub attractions: bool,
    pub bike_resources: bool,
    pub bike_rentals: bool,
}

impl LayerVisibility {
    pub fn get(&self, layer: Layer) -> bool {
        match layer {
            Layer::Attractions => self.attractions,
            Layer::BikeResources => self.bike_resources,
            Layer::BikeRentals => self.bike_rentals,
        }
    }

    pub fn set(&mut self, layer: Layer, visible: bool) {
        match layer {
            Layer::Attractions => self.attractions = visible,
            Layer::BikeResources => self.bike_resources = visible,
            Layer::BikeRentals => self.bike_rentals = visible,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
    pub is_open: bool,
    pub selected_route: Option<String>,
    pub layers: LayerVisibility,
    /// The window is narrower than the mobile breakpoint.
    pub narrow: bool,
}

/// Owns the legend's state and turns gestures into bus events.
///
/// None of these operations can fail. The controller never talks to the map
/// directly, only through the bus.
#[derive(Debug)]
pub struct SidebarController {
    state: UiState,
    bus: EventBus,
    events: EventReceiver,
    dirty: bool,
}

impl SidebarController {
    pub fn new(bus: &EventBus, is_open: bool, layers: LayerVisibility) -> Self {
        Self {
            state: UiState {
                is_open,
                selected_route: None,
                layers,
                narrow: false,
            },
            bus: bus.clone(),
            events: bus.subscribe(),
            dirty: false,
        }
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn select_route(&mut self, route_id: &str) {
        self.state.selected_route = Some(route_id.to_string());
        self.bus.publish(MapEvent::RouteSelect {
            route_id: route_id.to_string(),
        });
        if self.state.narrow && self.state.is_open {
            self.toggle();
        }
    }

    pub fn toggle_layer(&mut self, layer: Layer) {
        let visible = !self.state.layers.get(layer);
        self.state.layers.set(layer, visible);
        self.dirty = true;

        self.bus.publish(MapEvent::LayerToggle { layer, visible });
        if visible {
            // Fewer things competing for attention
            self.bus.publish(MapEvent::RouteDeselect);
        }
    }

    pub fn center_on(&mut self, location: LocationTarget) {
        self.bus.publish(MapEvent::CenterLocation { location });
    }

    pub fn toggle(&mut self) {
        self.state.is_open = !self.state.is_open;
        self.dirty = true;
        self.bus.publish(MapEvent::SidebarToggle {
            is_open: self.state.is_open,
        });
    }

    pub fn set_narrow(&mut self, narrow: bool) {
        self.state.narrow = narrow;
    }

    /// Tell the map about layers that start out visible.
    pub fn announce_visible_layers(&self) {
        for layer in Layer::ALL {
            if self.state.layers.get(layer) {
                self.bus.publish(MapEvent::LayerToggle {
                    layer,
                    visible: true,
                });
            }
        }
    }

    /// Catch up with changes made elsewhere, such as map-side resets.
    pub fn sync(&mut self) {
        for event in self.events.drain() {
            match event {
                MapEvent::RouteDeselect => self.state.selected_route = None,
                MapEvent::RouteSelect { route_id } => self.state.selected_route = Some(route_id),
                MapEvent::LayerToggle { layer, visible } => {
                    if self.state.layers.get(layer) != visible {
                        debug!("Legend following {} -> {}", layer, visible);
                        self.state.layers.set(layer, visible);
                        self.dirty = true;
                    }
                }
                MapEvent::CenterLocation { .. } | MapEvent::SidebarToggle { .. } => {}
            }
        }
    }

    /// True once after any persisted state changed.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
