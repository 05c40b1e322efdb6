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

//! The map controller.
//!
//! Owns the single map surface and turns bus events, worker replies, clicks
//! and timers into surface commands. Nothing else touches the surface.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use gbfs_client::RentalLocation;
use log::{debug, error, info, warn};
use tokio::sync::mpsc::UnboundedSender;

use crate::data::{GeoPoint, Place, Route, ATTRACTIONS, BIKE_RESOURCES};
use crate::events::{EventBus, EventReceiver, Layer, LocationTarget, MapEvent};
use crate::location::{LocationAction, LocationTracker, PositionOptions};
use crate::markers::{
    attraction_marker, highlight_marker, location_marker, rental_marker, resource_marker,
    Marker, MarkerId,
};
use crate::notices::{NoticeLevel, Notices};
use crate::worker::{WorkerReply, WorkerRequest};

use super::camera::{Bounds, ZoomProfile, CENTER_ZOOM};
use super::pool::MarkerPool;
use super::surface::{MapSurface, SurfaceClick};
use super::timers::{TimerKind, Timers};

pub const SELECTED_ROUTE_OPACITY: f32 = 0.8;
pub const DIMMED_ROUTE_OPACITY: f32 = 0.2;

/// How long the highlight ring stays after centring on a location.
pub const HIGHLIGHT_DURATION: Duration = Duration::from_secs(3);

/// Lets the sidebar animation settle before the map reflows.
pub const SIDEBAR_RESIZE_DELAY: Duration = Duration::from_millis(300);

/// Windows narrower than this use the mobile zoom profile.
pub const NARROW_VIEWPORT_WIDTH: f32 = 768.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Initializing,
    Ready,
    Destroyed,
}

pub struct MapController<S: MapSurface> {
    surface: S,
    state: Lifecycle,
    bus: EventBus,
    events: EventReceiver,
    requests: UnboundedSender<WorkerRequest>,
    routes: Vec<Route>,
    selected_route: Option<String>,
    visible: HashMap<Layer, bool>,
    pools: HashMap<Layer, MarkerPool>,
    rentals: Vec<RentalLocation>,
    timers: Timers,
    tracker: LocationTracker,
    location_enabled: bool,
    position_options: PositionOptions,
    watch_id: Option<u64>,
    next_watch_id: u64,
    narrow: bool,
    notices: Notices,
}

impl<S: MapSurface> MapController<S> {
    pub fn new(
        surface: S,
        bus: &EventBus,
        requests: UnboundedSender<WorkerRequest>,
        location_enabled: bool,
    ) -> Self {
        Self {
            surface,
            state: Lifecycle::Uninitialized,
            bus: bus.clone(),
            events: bus.subscribe(),
            requests,
            routes: Route::all(),
            selected_route: None,
            visible: Layer::ALL.iter().map(|&l| (l, false)).collect(),
            pools: Layer::ALL.iter().map(|&l| (l, MarkerPool::new())).collect(),
            rentals: Vec::new(),
            timers: Timers::new(),
            tracker: LocationTracker::new(),
            location_enabled,
            position_options: PositionOptions::default(),
            watch_id: None,
            next_watch_id: 1,
            narrow: false,
            notices: Notices::new(),
        }
    }

    pub fn state(&self) -> Lifecycle {
        self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn selected_route(&self) -> Option<&str> {
        self.selected_route.as_deref()
    }

    pub fn is_layer_visible(&self, layer: Layer) -> bool {
        self.visible.get(&layer).copied().unwrap_or(false)
    }

    pub fn rentals(&self) -> &[RentalLocation] {
        &self.rentals
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    pub fn is_narrow(&self) -> bool {
        self.narrow
    }

    /// When the controller next needs a tick even without input.
    pub fn next_deadline(&self) -> Option<Instant> {
        let banner = self.notices.banner(Instant::now()).map(|b| b.expires_at);
        match (self.timers.next_deadline(), banner) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Build the map. Only the first call does anything.
    pub fn mount(&mut self) {
        if self.state != Lifecycle::Uninitialized {
            debug!("Map already mounted ({:?}), ignoring", self.state);
            return;
        }
        info!("Initializing map with {} routes", self.routes.len());
        self.state = Lifecycle::Initializing;
        self.surface.initialize(&self.routes);
    }

    /// Per-frame driver: detects load, then handles clicks, events and timers.
    pub fn tick(&mut self, now: Instant) {
        match self.state {
            Lifecycle::Uninitialized | Lifecycle::Destroyed => return,
            Lifecycle::Initializing => {
                if !self.surface.is_loaded() {
                    return;
                }
                self.on_load();
            }
            Lifecycle::Ready => {}
        }

        while let Some(click) = self.surface.take_click() {
            self.on_surface_click(click);
        }
        for event in self.events.drain() {
            self.handle_event(event, now);
        }
        for kind in self.timers.due(now) {
            self.on_timer(kind, now);
        }
        self.notices.expire(now);
    }

    fn on_load(&mut self) {
        info!("Map loaded");
        self.state = Lifecycle::Ready;
        for i in 0..self.routes.len() {
            self.ensure_route_bounds(i);
        }
        self.start_watch();
    }

    pub fn handle_event(&mut self, event: MapEvent, now: Instant) {
        if self.state != Lifecycle::Ready {
            return;
        }
        debug!("Map handling {}", event.name());
        match event {
            MapEvent::RouteSelect { route_id } => self.on_route_select(&route_id),
            MapEvent::RouteDeselect => self.on_route_deselect(),
            MapEvent::LayerToggle { layer, visible } => self.on_layer_toggle(layer, visible),
            MapEvent::CenterLocation { location } => self.on_center_location(location, now),
            MapEvent::SidebarToggle { .. } => {
                self.timers
                    .schedule(TimerKind::SidebarResize, now, SIDEBAR_RESIZE_DELAY);
            }
        }
    }

    /// Apply a worker reply. Replies after teardown are dropped.
    pub fn handle_reply(&mut self, reply: WorkerReply, now: Instant) {
        if self.state == Lifecycle::Destroyed {
            debug!("Dropping worker reply after teardown");
            return;
        }
        match reply {
            WorkerReply::Rentals(Ok(locations)) => self.on_rentals(locations),
            WorkerReply::Rentals(Err(e)) => {
                error!("Bike share feed unavailable: {}", e);
                if self.is_layer_visible(Layer::BikeRentals) {
                    self.notices.record_rental_error(&e.to_string());
                    self.show_rentals(Vec::new());
                }
            }
            WorkerReply::Geocoded { address, result } => match result {
                Ok(Some(point)) => self.center_at(point, now),
                Ok(None) => {
                    info!("No geocoding result for '{}'", address);
                    self.notices.show_banner(
                        NoticeLevel::Warning,
                        format!("Could not find \"{}\"", address),
                        now,
                    );
                }
                Err(e) => {
                    error!("Geocoding '{}' failed: {}", address, e);
                    self.notices
                        .push(NoticeLevel::Error, format!("Geocoding failed: {}", e));
                }
            },
            WorkerReply::WatchPosition { watch_id, result } => {
                if self.watch_id != Some(watch_id) {
                    debug!("Ignoring result from stale watch {}", watch_id);
                    return;
                }
                let action = self.tracker.on_watch_result(result);
                self.apply_location_action(action, now);
            }
            WorkerReply::CurrentPosition(result) => {
                let action = self.tracker.on_fallback_result(result);
                self.apply_location_action(action, now);
            }
        }
    }

    pub fn on_route_select(&mut self, route_id: &str) {
        let Some(index) = self.routes.iter().position(|r| r.id == route_id) else {
            warn!("Unknown route '{}'", route_id);
            return;
        };
        self.selected_route = Some(route_id.to_string());

        for route in &mut self.routes {
            route.opacity = if route.id == route_id {
                SELECTED_ROUTE_OPACITY
            } else {
                DIMMED_ROUTE_OPACITY
            };
            if let Err(e) = self.surface.set_route_opacity(&route.id, route.opacity) {
                warn!("Could not set opacity of '{}': {}", route.id, e);
            }
        }

        match self.routes[index].bounds {
            Some(bounds) => {
                let zoom = ZoomProfile::for_viewport(self.narrow).fit_zoom(&bounds);
                self.surface.fly_to(bounds.center(), zoom);
            }
            None => {
                // First query: remember the extent, leave the camera alone
                self.ensure_route_bounds(index);
            }
        }
    }

    fn on_route_deselect(&mut self) {
        self.selected_route = None;
        for route in &mut self.routes {
            route.opacity = DIMMED_ROUTE_OPACITY;
            if let Err(e) = self.surface.set_route_opacity(&route.id, route.opacity) {
                warn!("Could not set opacity of '{}': {}", route.id, e);
            }
        }
    }

    fn ensure_route_bounds(&mut self, index: usize) {
        let route = &mut self.routes[index];
        if route.bounds.is_some() {
            return;
        }
        match self.surface.query_route_features(&route.id) {
            Ok(lines) => {
                route.bounds = Bounds::from_points(lines.iter().flatten());
                if route.bounds.is_none() {
                    warn!("Route '{}' has no rendered features", route.id);
                }
            }
            Err(e) => warn!("Could not query route '{}': {}", route.id, e),
        }
    }

    pub fn on_layer_toggle(&mut self, layer: Layer, visible: bool) {
        if self.is_layer_visible(layer) == visible {
            debug!("Layer {} already {}", layer, if visible { "shown" } else { "hidden" });
            return;
        }
        self.visible.insert(layer, visible);
        info!("Layer {} {}", layer, if visible { "shown" } else { "hidden" });

        let Some(pool) = self.pools.get_mut(&layer) else {
            return;
        };
        match (layer, visible) {
            (Layer::BikeRentals, false) => {
                pool.discard_all(&mut self.surface);
                self.rentals.clear();
            }
            (Layer::BikeRentals, true) => {
                pool.discard_all(&mut self.surface);
                self.send(WorkerRequest::FetchRentals);
            }
            (_, false) => pool.detach_all(&mut self.surface),
            (_, true) => {
                pool.ensure(static_markers(layer));
                pool.attach_all(&mut self.surface);
            }
        }
    }

    fn on_rentals(&mut self, locations: Vec<RentalLocation>) {
        if !self.is_layer_visible(Layer::BikeRentals) {
            debug!(
                "Bike share layer hidden, dropping {} fetched stations",
                locations.len()
            );
            return;
        }
        self.notices.record_rentals(&locations);
        self.show_rentals(locations);
    }

    fn show_rentals(&mut self, locations: Vec<RentalLocation>) {
        let markers = locations.iter().map(rental_marker).collect();
        let attach = self.state == Lifecycle::Ready;
        if let Some(pool) = self.pools.get_mut(&Layer::BikeRentals) {
            pool.replace(markers, attach, &mut self.surface);
        }
        self.rentals = locations;
    }

    pub fn on_center_location(&mut self, location: LocationTarget, now: Instant) {
        match location {
            LocationTarget::Coordinates {
                latitude,
                longitude,
            } => self.center_at(GeoPoint::new(latitude, longitude), now),
            LocationTarget::Address(address) => {
                self.send(WorkerRequest::Geocode { address });
            }
        }
    }

    fn center_at(&mut self, point: GeoPoint, now: Instant) {
        self.surface.fly_to(point, CENTER_ZOOM);
        self.surface.add_marker(&highlight_marker(point));
        self.timers
            .schedule(TimerKind::RemoveHighlight, now, HIGHLIGHT_DURATION);

        let Some((layer, id)) = self.match_location(point) else {
            return;
        };
        if !self.is_layer_visible(layer) {
            self.on_layer_toggle(layer, true);
            self.bus.publish(MapEvent::LayerToggle {
                layer,
                visible: true,
            });
        }
        if let Err(e) = self.surface.open_popup(&id) {
            warn!("Could not open popup for {}: {}", id, e);
        }
    }

    /// First known marker at exactly `point`.
    fn match_location(&self, point: GeoPoint) -> Option<(Layer, MarkerId)> {
        let at = |p: &&Place| GeoPoint::new(p.latitude, p.longitude) == point;

        if let Some(place) = ATTRACTIONS.iter().find(at) {
            return Some((Layer::Attractions, MarkerId::for_place(Layer::Attractions, place)));
        }
        if let Some(place) = BIKE_RESOURCES.iter().find(at) {
            return Some((
                Layer::BikeResources,
                MarkerId::for_place(Layer::BikeResources, place),
            ));
        }
        self.rentals
            .iter()
            .find(|r| GeoPoint::new(r.latitude, r.longitude) == point)
            .map(|r| (Layer::BikeRentals, MarkerId::for_rental(&r.station_id)))
    }

    fn on_surface_click(&mut self, click: SurfaceClick) {
        match click {
            SurfaceClick::Marker(id) => {
                if let Err(e) = self.surface.open_popup(&id) {
                    debug!("Click on {} did not open a popup: {}", id, e);
                }
            }
            SurfaceClick::Background(at) => {
                if self.selected_route.is_some() {
                    debug!("Background click at {}, clearing route selection", at);
                    self.bus.publish(MapEvent::RouteDeselect);
                }
            }
        }
    }

    /// The window itself changed size. Reflow right away.
    pub fn on_window_resize(&mut self) {
        if self.state == Lifecycle::Ready {
            self.surface.resize();
        }
    }

    pub fn set_viewport_width(&mut self, width: f32) {
        let narrow = width < NARROW_VIEWPORT_WIDTH;
        if narrow != self.narrow {
            debug!("Viewport {} px wide, narrow = {}", width, narrow);
            self.narrow = narrow;
        }
    }

    fn on_timer(&mut self, kind: TimerKind, now: Instant) {
        match kind {
            TimerKind::RemoveHighlight => self.surface.remove_marker(&MarkerId::highlight()),
            TimerKind::SidebarResize => self.surface.resize(),
            TimerKind::LocationRetry => {
                let action = self.tracker.on_retry_timer();
                self.apply_location_action(action, now);
            }
        }
    }

    fn start_watch(&mut self) {
        if !self.location_enabled {
            return;
        }
        if let Some(old) = self.watch_id.take() {
            self.send(WorkerRequest::ClearWatch { watch_id: old });
        }
        let watch_id = self.next_watch_id;
        self.next_watch_id += 1;
        self.watch_id = Some(watch_id);
        self.tracker.reset();
        self.send(WorkerRequest::WatchPosition {
            watch_id,
            options: self.position_options,
        });
    }

    fn apply_location_action(&mut self, action: Option<LocationAction>, now: Instant) {
        match action {
            Some(LocationAction::MoveMarker(position)) => {
                self.surface.add_marker(&location_marker(position));
            }
            Some(LocationAction::ScheduleRetry(delay)) => {
                self.timers.schedule(TimerKind::LocationRetry, now, delay);
            }
            Some(LocationAction::RequestCurrentPosition) => {
                self.send(WorkerRequest::CurrentPosition {
                    options: self.position_options,
                });
            }
            Some(LocationAction::ShowBanner(message)) => {
                self.notices.show_banner(NoticeLevel::Warning, message, now);
            }
            None => {}
        }
    }

    /// Tear everything down. Nothing touches the surface afterwards.
    pub fn destroy(&mut self) {
        if self.state == Lifecycle::Destroyed {
            return;
        }
        info!("Destroying map");
        if self.state != Lifecycle::Uninitialized {
            for pool in self.pools.values_mut() {
                pool.discard_all(&mut self.surface);
            }
            self.surface.remove_marker(&MarkerId::highlight());
            self.surface.remove_marker(&MarkerId::location());
        }
        if let Some(watch_id) = self.watch_id.take() {
            self.send(WorkerRequest::ClearWatch { watch_id });
        }
        self.timers.clear();
        self.tracker.reset();
        self.rentals.clear();
        if self.state != Lifecycle::Uninitialized {
            self.surface.remove();
        }
        self.state = Lifecycle::Destroyed;
    }

    fn send(&self, request: WorkerRequest) {
        if self.requests.send(request).is_err() {
            warn!("Background worker is gone, request dropped");
        }
    }
}

fn static_markers(layer: Layer) -> Vec<Marker> {
    match layer {
        Layer::Attractions => ATTRACTIONS.iter().map(attraction_marker).collect(),
        Layer::BikeResources => BIKE_RESOURCES.iter().map(resource_marker).collect(),
        Layer::BikeRentals => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{Fix, LocationError};
    use crate::map::testing::FakeSurface;
    use approx::assert_relative_eq;
    use chrono::Utc;
    use gbfs_client::FetchError;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    const ZOO_LOOP: &str = "zoo-loop-v2-full-public";

    struct Harness {
        map: MapController<FakeSurface>,
        bus: EventBus,
        requests: UnboundedReceiver<WorkerRequest>,
        now: Instant,
    }

    impl Harness {
        fn new(location_enabled: bool) -> Self {
            let bus = EventBus::default();
            let (tx, requests) = mpsc::unbounded_channel();
            let mut map = MapController::new(FakeSurface::loaded(), &bus, tx, location_enabled);
            let now = Instant::now();
            map.mount();
            map.tick(now);
            assert_eq!(map.state(), Lifecycle::Ready);
            Self {
                map,
                bus,
                requests,
                now,
            }
        }

        fn advance(&mut self, by: Duration) {
            self.now += by;
            self.map.tick(self.now);
        }

        fn publish(&mut self, event: MapEvent) {
            self.bus.publish(event);
            self.map.tick(self.now);
        }

        fn sent(&mut self) -> Vec<WorkerRequest> {
            let mut out = Vec::new();
            while let Ok(r) = self.requests.try_recv() {
                out.push(r);
            }
            out
        }
    }

    fn fix(lat: f64, lon: f64) -> Fix {
        Fix {
            position: GeoPoint::new(lat, lon),
            accuracy_m: None,
            timestamp: Utc::now(),
        }
    }

    fn station(id: &str, lat: f64, lon: f64) -> RentalLocation {
        RentalLocation {
            station_id: id.into(),
            name: format!("Station {id}"),
            description: String::new(),
            address: String::new(),
            latitude: lat,
            longitude: lon,
            rental_type: "Bike Share Station".into(),
            price: "Pay per ride".into(),
            hours: "24/7".into(),
            capacity: 10,
            available_bikes: Some(3),
            available_docks: Some(7),
            is_charging_station: false,
        }
    }

    #[test]
    fn test_mount_is_reentrant() {
        let mut h = Harness::new(false);
        h.map.mount();
        h.map.mount();
        assert_eq!(h.map.surface().initialize_calls, 1);
    }

    #[test]
    fn test_waits_for_surface_to_load() {
        let bus = EventBus::default();
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut map = MapController::new(FakeSurface::default(), &bus, tx, false);
        let now = Instant::now();

        map.mount();
        bus.publish(MapEvent::RouteSelect {
            route_id: ZOO_LOOP.into(),
        });
        map.tick(now);
        assert_eq!(map.state(), Lifecycle::Initializing);
        assert_eq!(map.selected_route(), None);

        map.surface_mut().loaded = true;
        map.tick(now);
        assert_eq!(map.state(), Lifecycle::Ready);
        assert_eq!(map.selected_route(), Some(ZOO_LOOP));
    }

    #[test]
    fn test_route_select_highlights_one_route() {
        let mut h = Harness::new(false);
        h.publish(MapEvent::RouteSelect {
            route_id: ZOO_LOOP.into(),
        });

        for route in h.map.routes() {
            let expected = if route.id == ZOO_LOOP { 0.8 } else { 0.2 };
            assert_relative_eq!(route.opacity, expected);
            assert_relative_eq!(h.map.surface().opacity(&route.id).unwrap(), expected);
        }
        let dimmed = h
            .map
            .routes()
            .iter()
            .filter(|r| (r.opacity - DIMMED_ROUTE_OPACITY).abs() < f32::EPSILON)
            .count();
        assert_eq!(dimmed, 4);
    }

    #[test]
    fn test_route_select_flies_to_bounds() {
        let mut h = Harness::new(false);
        let bounds = h
            .map
            .routes()
            .iter()
            .find(|r| r.id == ZOO_LOOP)
            .and_then(|r| r.bounds)
            .unwrap();

        h.map.on_route_select(ZOO_LOOP);

        let (center, zoom) = *h.map.surface().fly_to_calls.last().unwrap();
        assert_eq!(center, bounds.center());
        assert_relative_eq!(zoom, ZoomProfile::DESKTOP.fit_zoom(&bounds));

        h.map.set_viewport_width(400.0);
        h.map.on_route_select(ZOO_LOOP);
        let (_, zoom) = *h.map.surface().fly_to_calls.last().unwrap();
        assert_relative_eq!(zoom, ZoomProfile::MOBILE.fit_zoom(&bounds));
    }

    #[test]
    fn test_first_select_without_bounds_keeps_camera() {
        let bus = EventBus::default();
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut surface = FakeSurface::loaded();
        surface.load_features = false;
        let mut map = MapController::new(surface, &bus, tx, false);
        map.mount();
        map.tick(Instant::now());

        // Features show up only after the load event
        let lines = crate::data::load_route_geometry(ZOO_LOOP, None).unwrap();
        map.surface_mut().features.insert(ZOO_LOOP.into(), lines);

        map.on_route_select(ZOO_LOOP);
        assert!(map.surface().fly_to_calls.is_empty());

        map.on_route_select(ZOO_LOOP);
        assert_eq!(map.surface().fly_to_calls.len(), 1);
    }

    #[test]
    fn test_unknown_route_layer_does_not_stop_others() {
        let mut h = Harness::new(false);
        h.map.surface_mut().route_opacity.remove(ZOO_LOOP);

        h.map.on_route_select("riverwalk-loop-v3-public");

        assert_relative_eq!(
            h.map.surface().opacity("Chatt_TPL_Trails-public").unwrap(),
            DIMMED_ROUTE_OPACITY
        );
    }

    #[test]
    fn test_toggle_on_off_on_leaves_one_marker_per_item() {
        let mut h = Harness::new(false);
        for visible in [true, false, true] {
            h.publish(MapEvent::LayerToggle {
                layer: Layer::Attractions,
                visible,
            });
        }

        assert_eq!(h.map.surface().marker_count(), ATTRACTIONS.len());
        assert!(h.map.is_layer_visible(Layer::Attractions));
    }

    #[test]
    fn test_rentals_refetch_on_every_show() {
        let mut h = Harness::new(false);

        h.map.on_layer_toggle(Layer::BikeRentals, true);
        assert_eq!(h.sent(), vec![WorkerRequest::FetchRentals]);

        h.map.handle_reply(
            WorkerReply::Rentals(Ok(vec![
                station("1", 35.05, -85.31),
                station("2", 35.06, -85.30),
            ])),
            h.now,
        );
        assert_eq!(h.map.surface().marker_count(), 2);

        h.map.on_layer_toggle(Layer::BikeRentals, false);
        assert_eq!(h.map.surface().marker_count(), 0);
        assert!(h.map.rentals().is_empty());

        h.map.on_layer_toggle(Layer::BikeRentals, true);
        assert_eq!(h.sent(), vec![WorkerRequest::FetchRentals]);
    }

    #[test]
    fn test_rental_reply_after_hide_is_not_attached() {
        let mut h = Harness::new(false);
        h.map.on_layer_toggle(Layer::BikeRentals, true);
        h.map.on_layer_toggle(Layer::BikeRentals, false);

        h.map.handle_reply(
            WorkerReply::Rentals(Ok(vec![station("1", 35.05, -85.31)])),
            h.now,
        );

        assert_eq!(h.map.surface().marker_count(), 0);
    }

    #[test]
    fn test_latest_rental_reply_replaces_pool() {
        let mut h = Harness::new(false);
        h.map.on_layer_toggle(Layer::BikeRentals, true);

        h.map.handle_reply(
            WorkerReply::Rentals(Ok(vec![station("1", 35.05, -85.31), station("2", 35.0, -85.0)])),
            h.now,
        );
        h.map.handle_reply(
            WorkerReply::Rentals(Ok(vec![station("3", 35.07, -85.29)])),
            h.now,
        );

        assert_eq!(h.map.surface().marker_count(), 1);
        assert!(h.map.surface().has_marker(&MarkerId::for_rental("3")));
    }

    #[test]
    fn test_failed_rental_fetch_shows_nothing() {
        let mut h = Harness::new(false);
        h.map.on_layer_toggle(Layer::BikeRentals, true);

        h.map.handle_reply(
            WorkerReply::Rentals(Err(FetchError::Status {
                url: "http://feed".into(),
                status: 503,
            })),
            h.now,
        );

        assert_eq!(h.map.surface().marker_count(), 0);
        assert!(h.map.notices().rentals.last_error.is_some());
    }

    #[test]
    fn test_center_on_aquarium_reveals_attractions_once() {
        let mut h = Harness::new(false);
        let mut observer = h.bus.subscribe();

        h.publish(MapEvent::CenterLocation {
            location: LocationTarget::Coordinates {
                latitude: 35.055_833_3,
                longitude: -85.311_111_1,
            },
        });
        // The map also receives its own reveal
        h.advance(Duration::from_millis(16));

        let (center, zoom) = h.map.surface().fly_to_calls[0];
        assert_eq!(center, GeoPoint::new(35.055_833_3, -85.311_111_1));
        assert_relative_eq!(zoom, 17.0);

        let toggles: Vec<_> = observer
            .drain()
            .into_iter()
            .filter(|e| matches!(e, MapEvent::LayerToggle { .. }))
            .collect();
        assert_eq!(
            toggles,
            vec![MapEvent::LayerToggle {
                layer: Layer::Attractions,
                visible: true
            }]
        );

        let aquarium = MarkerId::for_place(Layer::Attractions, &ATTRACTIONS[0]);
        assert_eq!(h.map.surface().popups_opened, vec![aquarium]);
        // Attractions plus the highlight ring
        assert_eq!(h.map.surface().marker_count(), ATTRACTIONS.len() + 1);
    }

    #[test]
    fn test_rental_success_clears_earlier_error() {
        let mut h = Harness::new(false);
        h.map.on_layer_toggle(Layer::BikeRentals, true);
        h.map.handle_reply(
            WorkerReply::Rentals(Err(FetchError::Status {
                url: "http://feed".into(),
                status: 503,
            })),
            h.now,
        );
        assert!(h.map.notices().rentals.last_error.is_some());

        // An empty feed is still a successful fetch
        h.map.handle_reply(WorkerReply::Rentals(Ok(Vec::new())), h.now);

        assert!(h.map.notices().rentals.last_error.is_none());
        assert!(!h.map.notices().rental_summary().contains("unavailable"));
    }

    #[test]
    fn test_rental_error_while_hidden_is_not_recorded() {
        let mut h = Harness::new(false);
        h.map.on_layer_toggle(Layer::BikeRentals, true);
        h.map.on_layer_toggle(Layer::BikeRentals, false);

        h.map.handle_reply(
            WorkerReply::Rentals(Err(FetchError::Status {
                url: "http://feed".into(),
                status: 503,
            })),
            h.now,
        );

        assert!(h.map.notices().rentals.last_error.is_none());
        assert_eq!(h.map.notices().rental_summary(), "Bike share not loaded");
    }

    #[test]
    fn test_desktop_window_uses_desktop_zoom() {
        let mut h = Harness::new(false);
        let bounds = h
            .map
            .routes()
            .iter()
            .find(|r| r.id == ZOO_LOOP)
            .and_then(|r| r.bounds)
            .unwrap();

        h.map.set_viewport_width(400.0);
        assert!(h.map.is_narrow());
        // 1024 px window with the 300 px legend open
        h.map.set_viewport_width(1024.0);
        assert!(!h.map.is_narrow());

        h.map.on_route_select(ZOO_LOOP);
        let (_, zoom) = *h.map.surface().fly_to_calls.last().unwrap();
        assert_relative_eq!(zoom, ZoomProfile::DESKTOP.fit_zoom(&bounds));
    }

    fn layer_toggles(observer: &mut EventReceiver) -> Vec<MapEvent> {
        observer
            .drain()
            .into_iter()
            .filter(|e| matches!(e, MapEvent::LayerToggle { .. }))
            .collect()
    }

    #[test]
    fn test_center_on_bike_shop_reveals_resources_once() {
        let mut h = Harness::new(false);
        let mut observer = h.bus.subscribe();
        let shop = &BIKE_RESOURCES[1];

        h.publish(MapEvent::CenterLocation {
            location: LocationTarget::Coordinates {
                latitude: shop.latitude,
                longitude: shop.longitude,
            },
        });
        h.advance(Duration::from_millis(16));

        assert_eq!(
            layer_toggles(&mut observer),
            vec![MapEvent::LayerToggle {
                layer: Layer::BikeResources,
                visible: true
            }]
        );
        assert!(h.map.is_layer_visible(Layer::BikeResources));
        assert!(!h.map.is_layer_visible(Layer::Attractions));
        assert_eq!(
            h.map.surface().popups_opened,
            vec![MarkerId::for_place(Layer::BikeResources, shop)]
        );
        assert_eq!(h.map.surface().marker_count(), BIKE_RESOURCES.len() + 1);
    }

    #[test]
    fn test_shared_coordinate_resolves_to_attraction() {
        let mut h = Harness::new(false);
        let mut observer = h.bus.subscribe();
        let ridge = &ATTRACTIONS[5];
        let shop = &BIKE_RESOURCES[0];
        assert_eq!(ridge.name, "Stringer's Ridge");
        assert_eq!(
            GeoPoint::new(ridge.latitude, ridge.longitude),
            GeoPoint::new(shop.latitude, shop.longitude)
        );

        h.publish(MapEvent::CenterLocation {
            location: LocationTarget::Coordinates {
                latitude: ridge.latitude,
                longitude: ridge.longitude,
            },
        });
        h.advance(Duration::from_millis(16));

        assert_eq!(
            layer_toggles(&mut observer),
            vec![MapEvent::LayerToggle {
                layer: Layer::Attractions,
                visible: true
            }]
        );
        assert!(!h.map.is_layer_visible(Layer::BikeResources));
        assert_eq!(
            h.map.surface().popups_opened,
            vec![MarkerId::for_place(Layer::Attractions, ridge)]
        );
    }

    #[test]
    fn test_center_on_rental_station_opens_its_popup() {
        let mut h = Harness::new(false);
        h.map.on_layer_toggle(Layer::BikeRentals, true);
        h.map.handle_reply(
            WorkerReply::Rentals(Ok(vec![
                station("7", 35.0512, -85.3097),
                station("8", 35.0444, -85.3001),
            ])),
            h.now,
        );
        let mut observer = h.bus.subscribe();

        h.map.on_center_location(
            LocationTarget::Coordinates {
                latitude: 35.0444,
                longitude: -85.3001,
            },
            h.now,
        );

        assert!(layer_toggles(&mut observer).is_empty());
        assert_eq!(
            h.map.surface().popups_opened,
            vec![MarkerId::for_rental("8")]
        );
        // Both stations plus the highlight ring
        assert_eq!(h.map.surface().marker_count(), 3);
    }

    #[test]
    fn test_results_from_other_watches_are_ignored() {
        let mut h = Harness::new(true);
        let watch_id = match h.sent().as_slice() {
            [WorkerRequest::WatchPosition { watch_id, .. }] => *watch_id,
            other => panic!("expected one watch request, got {other:?}"),
        };

        for stale in [watch_id - 1, watch_id + 1] {
            h.map.handle_reply(
                WorkerReply::WatchPosition {
                    watch_id: stale,
                    result: Ok(fix(35.05, -85.31)),
                },
                h.now,
            );
            h.map.handle_reply(
                WorkerReply::WatchPosition {
                    watch_id: stale,
                    result: Err(LocationError::PermissionDenied),
                },
                h.now,
            );
        }
        assert!(!h.map.surface().has_marker(&MarkerId::location()));
        assert!(h.map.notices().banner(h.now).is_none());

        h.map.handle_reply(
            WorkerReply::WatchPosition {
                watch_id,
                result: Ok(fix(35.05, -85.31)),
            },
            h.now,
        );
        assert!(h.map.surface().has_marker(&MarkerId::location()));
    }

    #[test]
    fn test_center_on_visible_layer_emits_nothing() {
        let mut h = Harness::new(false);
        h.map.on_layer_toggle(Layer::Attractions, true);
        let mut observer = h.bus.subscribe();

        h.map.on_center_location(
            LocationTarget::Coordinates {
                latitude: 35.055_833_3,
                longitude: -85.311_111_1,
            },
            h.now,
        );

        assert!(observer.drain().is_empty());
        assert_eq!(h.map.surface().popups_opened.len(), 1);
    }

    #[test]
    fn test_highlight_removed_after_delay() {
        let mut h = Harness::new(false);
        h.map.on_center_location(
            LocationTarget::Coordinates {
                latitude: 35.0,
                longitude: -85.0,
            },
            h.now,
        );
        assert!(h.map.surface().has_marker(&MarkerId::highlight()));

        h.advance(Duration::from_millis(2_900));
        assert!(h.map.surface().has_marker(&MarkerId::highlight()));

        h.advance(Duration::from_millis(200));
        assert!(!h.map.surface().has_marker(&MarkerId::highlight()));
    }

    #[test]
    fn test_address_goes_through_geocoder() {
        let mut h = Harness::new(false);
        h.map.on_center_location(LocationTarget::Address("1 Broad Street".into()), h.now);
        assert_eq!(
            h.sent(),
            vec![WorkerRequest::Geocode {
                address: "1 Broad Street".into()
            }]
        );
        assert!(h.map.surface().fly_to_calls.is_empty());

        let target = GeoPoint::new(35.0558, -85.3111);
        h.map.handle_reply(
            WorkerReply::Geocoded {
                address: "1 Broad Street".into(),
                result: Ok(Some(target)),
            },
            h.now,
        );
        assert_eq!(h.map.surface().fly_to_calls, vec![(target, CENTER_ZOOM)]);
    }

    #[test]
    fn test_background_click_deselects_route() {
        let mut h = Harness::new(false);
        h.map.on_route_select(ZOO_LOOP);
        let mut observer = h.bus.subscribe();

        h.map
            .surface_mut()
            .clicks
            .push_back(SurfaceClick::Background(GeoPoint::new(35.0, -85.3)));
        h.advance(Duration::from_millis(16));

        assert_eq!(observer.drain(), vec![MapEvent::RouteDeselect]);
        assert_eq!(h.map.selected_route(), None);
        assert!(h
            .map
            .routes()
            .iter()
            .all(|r| (r.opacity - DIMMED_ROUTE_OPACITY).abs() < f32::EPSILON));
    }

    #[test]
    fn test_sidebar_toggle_resize_is_debounced() {
        let mut h = Harness::new(false);
        h.publish(MapEvent::SidebarToggle { is_open: false });
        h.advance(Duration::from_millis(100));
        h.publish(MapEvent::SidebarToggle { is_open: true });

        h.advance(Duration::from_millis(250));
        assert_eq!(h.map.surface().resize_calls, 0);

        h.advance(Duration::from_millis(100));
        assert_eq!(h.map.surface().resize_calls, 1);

        h.map.on_window_resize();
        assert_eq!(h.map.surface().resize_calls, 2);
    }

    #[test]
    fn test_location_watch_moves_marker() {
        let mut h = Harness::new(true);
        let sent = h.sent();
        let watch_id = match sent.as_slice() {
            [WorkerRequest::WatchPosition { watch_id, .. }] => *watch_id,
            other => panic!("expected one watch request, got {other:?}"),
        };

        h.map.handle_reply(
            WorkerReply::WatchPosition {
                watch_id,
                result: Ok(fix(35.05, -85.31)),
            },
            h.now,
        );
        h.map.handle_reply(
            WorkerReply::WatchPosition {
                watch_id,
                result: Ok(fix(35.06, -85.30)),
            },
            h.now,
        );

        let marker = &h.map.surface().markers[&MarkerId::location()];
        assert_eq!(marker.position, GeoPoint::new(35.06, -85.30));
        assert!(h.map.surface().fly_to_calls.is_empty());
    }

    #[test]
    fn test_timeout_triggers_single_fallback() {
        let mut h = Harness::new(true);
        let watch_id = match h.sent().as_slice() {
            [WorkerRequest::WatchPosition { watch_id, .. }] => *watch_id,
            other => panic!("expected one watch request, got {other:?}"),
        };
        let timeout = |id| WorkerReply::WatchPosition {
            watch_id: id,
            result: Err(LocationError::Timeout),
        };

        h.map.handle_reply(timeout(watch_id), h.now);
        h.map.handle_reply(timeout(watch_id), h.now);
        h.advance(Duration::from_secs(1));

        // A timeout while the fallback is in flight adds nothing
        h.map.handle_reply(timeout(watch_id), h.now);
        h.advance(Duration::from_secs(5));

        let fallbacks = h
            .sent()
            .into_iter()
            .filter(|r| matches!(r, WorkerRequest::CurrentPosition { .. }))
            .count();
        assert_eq!(fallbacks, 1);

        h.map.handle_reply(WorkerReply::CurrentPosition(Err(LocationError::Timeout)), h.now);
        assert!(h.map.notices().banner(h.now).is_some());
    }

    #[test]
    fn test_denied_location_keeps_marker_and_camera() {
        let mut h = Harness::new(true);
        let watch_id = match h.sent().as_slice() {
            [WorkerRequest::WatchPosition { watch_id, .. }] => *watch_id,
            other => panic!("expected one watch request, got {other:?}"),
        };
        h.map.handle_reply(
            WorkerReply::WatchPosition {
                watch_id,
                result: Ok(fix(35.05, -85.31)),
            },
            h.now,
        );

        h.map.handle_reply(
            WorkerReply::WatchPosition {
                watch_id,
                result: Err(LocationError::PermissionDenied),
            },
            h.now,
        );

        assert!(h.map.surface().has_marker(&MarkerId::location()));
        assert!(h.map.surface().fly_to_calls.is_empty());
        assert!(h.map.notices().banner(h.now).is_some());
    }

    #[test]
    fn test_destroy_stops_all_mutation() {
        let mut h = Harness::new(true);
        let watch_id = match h.sent().as_slice() {
            [WorkerRequest::WatchPosition { watch_id, .. }] => *watch_id,
            other => panic!("expected one watch request, got {other:?}"),
        };
        h.map.on_center_location(
            LocationTarget::Coordinates {
                latitude: 35.0,
                longitude: -85.0,
            },
            h.now,
        );
        h.map.handle_reply(
            WorkerReply::WatchPosition {
                watch_id,
                result: Err(LocationError::Timeout),
            },
            h.now,
        );

        h.map.destroy();
        assert!(h.map.surface().removed);
        assert_eq!(h.sent(), vec![WorkerRequest::ClearWatch { watch_id }]);
        let mutations = h.map.surface().mutations;

        h.bus.publish(MapEvent::RouteSelect {
            route_id: ZOO_LOOP.into(),
        });
        h.advance(Duration::from_secs(10));
        h.map.handle_reply(
            WorkerReply::WatchPosition {
                watch_id,
                result: Ok(fix(35.05, -85.31)),
            },
            h.now,
        );
        h.map.handle_reply(WorkerReply::CurrentPosition(Ok(fix(35.0, -85.0))), h.now);
        h.map.destroy();

        assert_eq!(h.map.surface().mutations, mutations);
        assert!(h.sent().is_empty());
    }
}
