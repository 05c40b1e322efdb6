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

//! [`MapSurface`] on top of the walkers slippy map.

use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use eframe::egui;
use egui::{Align2, Color32, FontId, Pos2, Stroke};
use log::{debug, info, warn};
use walkers::{lat_lon, HttpTiles, Map, MapMemory, Plugin, Position, Projector, Tiles};

use crate::data::{load_route_geometry, GeoPoint, Route, RouteGeometry};
use crate::markers::{Marker, MarkerId, MarkerKind};

use super::surface::{MapSurface, SurfaceClick, SurfaceError};

const FLY_DURATION: Duration = Duration::from_millis(1500);
const PIN_RADIUS: f32 = 12.0;
/// How far from a pin a click still counts as hitting it.
const HIT_RADIUS: f32 = 16.0;
/// Route widths are given in style units; screen strokes are half that.
const LINE_WIDTH_SCALE: f32 = 0.5;

struct RouteLayer {
    id: String,
    color: Color32,
    width: f32,
    opacity: f32,
    lines: RouteGeometry,
}

struct Flight {
    from: GeoPoint,
    to: GeoPoint,
    from_zoom: f64,
    to_zoom: f64,
    started: Instant,
}

impl Flight {
    /// Camera position and zoom at `now`, plus whether the flight is over.
    fn sample(&self, now: Instant) -> (GeoPoint, f64, bool) {
        let t = (now.duration_since(self.started).as_secs_f64() / FLY_DURATION.as_secs_f64())
            .clamp(0.0, 1.0);
        let e = ease_in_out(t);
        let lerp = |a: f64, b: f64| a + (b - a) * e;
        (
            GeoPoint::new(lerp(self.from.lat, self.to.lat), lerp(self.from.lon, self.to.lon)),
            lerp(self.from_zoom, self.to_zoom),
            t >= 1.0,
        )
    }
}

fn ease_in_out(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

fn position(p: GeoPoint) -> Position {
    lat_lon(p.lat, p.lon)
}

/// Things the overlay plugin reports back after a frame.
#[derive(Default)]
struct OverlayOutput {
    click: Option<SurfaceClick>,
    close_popup: bool,
}

/// Draws routes, markers and the open popup, and hit-tests clicks.
struct Overlay<'a> {
    routes: &'a [RouteLayer],
    markers: &'a BTreeMap<MarkerId, Marker>,
    popup: Option<&'a MarkerId>,
    output: &'a mut OverlayOutput,
}

impl Plugin for Overlay<'_> {
    fn run(
        self: Box<Self>,
        ui: &mut egui::Ui,
        response: &egui::Response,
        projector: &Projector,
        _memory: &MapMemory,
    ) {
        let Overlay {
            routes,
            markers,
            popup,
            output,
        } = *self;
        let painter = ui.painter().with_clip_rect(response.rect);
        let project = |p: GeoPoint| {
            let v = projector.project(position(p));
            egui::pos2(v.x, v.y)
        };

        for route in routes {
            let stroke = Stroke::new(
                route.width * LINE_WIDTH_SCALE,
                route.color.gamma_multiply(route.opacity),
            );
            for line in &route.lines {
                let points: Vec<Pos2> = line.iter().map(|p| project(*p)).collect();
                painter.add(egui::Shape::line(points, stroke));
            }
        }

        // Pins first, then the location dot and highlight ring on top
        let mut hit: Option<(&MarkerId, f32)> = None;
        let click_pos = if response.clicked() {
            response.interact_pointer_pos()
        } else {
            None
        };
        let time = ui.input(|i| i.time);

        for pass in [MarkerKind::Pin, MarkerKind::CurrentLocation, MarkerKind::Highlight] {
            for marker in markers.values().filter(|m| m.style.kind == pass) {
                let at = project(marker.position);
                draw_marker(&painter, marker, at, time);

                if let Some(click) = click_pos {
                    let dist = at.distance(click);
                    if marker.style.kind != MarkerKind::Highlight
                        && dist <= HIT_RADIUS
                        && hit.is_none_or(|(_, best)| dist < best)
                    {
                        hit = Some((&marker.id, dist));
                    }
                }
            }
        }
        if markers
            .values()
            .any(|m| m.style.kind == MarkerKind::CurrentLocation)
        {
            ui.ctx().request_repaint_after(Duration::from_millis(50));
        }

        if let Some(click) = click_pos {
            output.click = Some(match hit {
                Some((id, _)) => SurfaceClick::Marker(id.clone()),
                None => {
                    let p = projector.unproject(click.to_vec2());
                    SurfaceClick::Background(GeoPoint::new(p.y(), p.x()))
                }
            });
        }

        if let Some(marker) = popup.and_then(|id| markers.get(id)) {
            let anchor = project(marker.position) - egui::vec2(0.0, PIN_RADIUS + 4.0);
            if response.rect.contains(anchor) {
                output.close_popup = show_popup(ui.ctx(), marker, anchor);
            }
        }
    }
}

fn draw_marker(painter: &egui::Painter, marker: &Marker, at: Pos2, time: f64) {
    let color = marker.style.color;
    match marker.style.kind {
        MarkerKind::Pin => {
            painter.circle_filled(at, PIN_RADIUS, color);
            painter.circle_stroke(at, PIN_RADIUS, Stroke::new(2.0, Color32::WHITE));
            if let Some(glyph) = marker.style.glyph {
                painter.text(
                    at,
                    Align2::CENTER_CENTER,
                    glyph,
                    FontId::proportional(13.0),
                    Color32::WHITE,
                );
            }
        }
        MarkerKind::CurrentLocation => {
            let phase = (time * 1.5).fract() as f32;
            painter.circle_filled(at, 8.0 + 16.0 * phase, color.gamma_multiply(0.4 * (1.0 - phase)));
            painter.circle_filled(at, 8.0, color);
            painter.circle_stroke(at, 8.0, Stroke::new(2.5, Color32::WHITE));
        }
        MarkerKind::Highlight => {
            painter.circle_stroke(at, PIN_RADIUS + 10.0, Stroke::new(3.0, color));
        }
    }
}

/// Returns true when the user closed the popup.
fn show_popup(ctx: &egui::Context, marker: &Marker, anchor: Pos2) -> bool {
    let Some(popup) = &marker.popup else {
        return false;
    };
    let mut close = false;

    egui::Area::new(egui::Id::new("map-popup"))
        .fixed_pos(anchor)
        .pivot(Align2::CENTER_BOTTOM)
        .order(egui::Order::Foreground)
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.set_max_width(260.0);
                ui.horizontal(|ui| {
                    ui.strong(&popup.title);
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("✕").clicked() {
                            close = true;
                        }
                    });
                });
                if !popup.description.is_empty() {
                    ui.label(&popup.description);
                }
                if !popup.details.is_empty() {
                    egui::Grid::new("map-popup-details")
                        .num_columns(2)
                        .show(ui, |ui| {
                            for (label, value) in &popup.details {
                                ui.weak(label);
                                ui.label(value);
                                ui.end_row();
                            }
                        });
                }
                if !popup.address.is_empty() {
                    ui.small(&popup.address);
                }
                if let Some(url) = &popup.maps_url {
                    if ui.link("Open in Google Maps").clicked() {
                        if let Err(e) = webbrowser::open(url) {
                            warn!("Could not open browser: {}", e);
                        }
                    }
                }
            });
        });

    close
}

pub struct WalkersSurface {
    ctx: egui::Context,
    tiles: HttpTiles,
    memory: MapMemory,
    home: GeoPoint,
    home_zoom: f64,
    geometry_dir: Option<PathBuf>,
    routes: Vec<RouteLayer>,
    markers: BTreeMap<MarkerId, Marker>,
    popup: Option<MarkerId>,
    flight: Option<Flight>,
    clicks: VecDeque<SurfaceClick>,
    initialized: bool,
    rendered: bool,
    removed: bool,
}

impl WalkersSurface {
    pub fn new(
        ctx: &egui::Context,
        tiles: HttpTiles,
        home: GeoPoint,
        home_zoom: f64,
        geometry_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            ctx: ctx.clone(),
            tiles,
            memory: MapMemory::default(),
            home,
            home_zoom,
            geometry_dir,
            routes: Vec::new(),
            markers: BTreeMap::new(),
            popup: None,
            flight: None,
            clicks: VecDeque::new(),
            initialized: false,
            rendered: false,
            removed: false,
        }
    }

    fn camera(&self) -> (GeoPoint, f64) {
        let center = self
            .memory
            .detached()
            .map_or(self.home, |p| GeoPoint::new(p.y(), p.x()));
        (center, self.memory.zoom())
    }

    fn set_zoom(&mut self, zoom: f64) {
        if self.memory.set_zoom(zoom).is_err() {
            debug!("Zoom {} out of range", zoom);
        }
    }

    /// Draw the map into the remaining space of `ui`.
    pub fn show(&mut self, ui: &mut egui::Ui) {
        if self.removed {
            return;
        }

        if let Some(flight) = &self.flight {
            let (center, zoom, done) = flight.sample(Instant::now());
            self.memory.center_at(position(center));
            self.set_zoom(zoom);
            if done {
                self.flight = None;
            } else {
                self.ctx.request_repaint();
            }
        }

        let mut output = OverlayOutput::default();
        let overlay = Overlay {
            routes: &self.routes,
            markers: &self.markers,
            popup: self.popup.as_ref(),
            output: &mut output,
        };
        let map = Map::new(Some(&mut self.tiles), &mut self.memory, position(self.home))
            .with_plugin(overlay);
        let response = ui.add(map);

        if response.dragged() && self.flight.take().is_some() {
            debug!("Fly-to interrupted by drag");
        }
        if output.close_popup {
            self.popup = None;
        }
        if let Some(click) = output.click {
            if matches!(click, SurfaceClick::Background(_)) {
                self.popup = None;
            }
            self.clicks.push_back(click);
        }

        let attribution = self.tiles.attribution();
        ui.painter().text(
            response.rect.right_bottom() - egui::vec2(4.0, 4.0),
            Align2::RIGHT_BOTTOM,
            attribution.text,
            FontId::proportional(10.0),
            Color32::DARK_GRAY,
        );

        if self.initialized && !self.rendered {
            info!("First map frame rendered");
            self.rendered = true;
        }
    }
}

impl MapSurface for WalkersSurface {
    fn initialize(&mut self, routes: &[Route]) {
        self.memory.center_at(position(self.home));
        self.set_zoom(self.home_zoom);

        for route in routes {
            match load_route_geometry(&route.id, self.geometry_dir.as_deref()) {
                Ok(lines) => self.routes.push(RouteLayer {
                    id: route.id.clone(),
                    color: route.color32(),
                    width: route.default_width,
                    opacity: route.opacity,
                    lines,
                }),
                Err(e) => warn!("Route '{}' not drawn: {}", route.name, e),
            }
        }
        info!("Map initialized with {} route layers", self.routes.len());
        self.initialized = true;
    }

    fn is_loaded(&self) -> bool {
        self.initialized && self.rendered
    }

    fn set_route_opacity(&mut self, route_id: &str, opacity: f32) -> Result<(), SurfaceError> {
        let layer = self
            .routes
            .iter_mut()
            .find(|r| r.id == route_id)
            .ok_or_else(|| SurfaceError::UnknownRoute(route_id.to_string()))?;
        layer.opacity = opacity;
        self.ctx.request_repaint();
        Ok(())
    }

    fn query_route_features(&self, route_id: &str) -> Result<RouteGeometry, SurfaceError> {
        if !self.is_loaded() {
            return Err(SurfaceError::NotLoaded);
        }
        self.routes
            .iter()
            .find(|r| r.id == route_id)
            .map(|r| r.lines.clone())
            .ok_or_else(|| SurfaceError::UnknownRoute(route_id.to_string()))
    }

    fn add_marker(&mut self, marker: &Marker) {
        self.markers.insert(marker.id.clone(), marker.clone());
        self.ctx.request_repaint();
    }

    fn remove_marker(&mut self, id: &MarkerId) {
        if self.markers.remove(id).is_some() {
            if self.popup.as_ref() == Some(id) {
                self.popup = None;
            }
            self.ctx.request_repaint();
        }
    }

    fn has_marker(&self, id: &MarkerId) -> bool {
        self.markers.contains_key(id)
    }

    fn open_popup(&mut self, id: &MarkerId) -> Result<(), SurfaceError> {
        match self.markers.get(id) {
            Some(marker) if marker.popup.is_some() => {
                self.popup = Some(id.clone());
                self.ctx.request_repaint();
                Ok(())
            }
            _ => Err(SurfaceError::UnknownMarker(id.clone())),
        }
    }

    fn fly_to(&mut self, center: GeoPoint, zoom: f64) {
        let (from, from_zoom) = self.camera();
        debug!("Flying from {} to {} (zoom {:.1})", from, center, zoom);
        self.flight = Some(Flight {
            from,
            to: center,
            from_zoom,
            to_zoom: zoom,
            started: Instant::now(),
        });
        self.ctx.request_repaint();
    }

    fn resize(&mut self) {
        // walkers lays out against the allocated rect every frame
        self.ctx.request_repaint();
    }

    fn take_click(&mut self) -> Option<SurfaceClick> {
        self.clicks.pop_front()
    }

    fn remove(&mut self) {
        info!("Removing map surface");
        self.routes.clear();
        self.markers.clear();
        self.popup = None;
        self.flight = None;
        self.clicks.clear();
        self.removed = true;
    }
}
