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

//! The eframe application: wires the legend, the map and the worker together.

use std::time::Instant;

use eframe::egui;
use log::{info, warn};

use crate::config::{AppConfig, RunOverrides};
use crate::events::EventBus;
use crate::geocode::{resolve_access_token, Geocoder};
use crate::legend::{LegendPanel, SidebarController};
use crate::location::LocationProvider;
use crate::map::{build_tiles, MapController, WalkersSurface};
use crate::notices::NoticeLevel;
use crate::worker::{Worker, WorkerSettings};
use gbfs_client::FeedConfig;

pub struct BikeMapApp {
    config: AppConfig,
    sidebar: SidebarController,
    legend: LegendPanel,
    map: MapController<WalkersSurface>,
    worker: Worker,
    window_size: Option<egui::Vec2>,
}

impl BikeMapApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        overrides: RunOverrides,
    ) -> std::io::Result<Self> {
        let ctx = &cc.egui_ctx;
        let run = config.with_overrides(overrides);
        let access_token = resolve_access_token(run.mapbox_access_token.as_deref());
        let geocoder = Geocoder::new(run.geocoding_url.clone(), access_token.clone(), run.home());
        if !geocoder.has_token() {
            info!("No Mapbox access token, address search is disabled");
        }

        let location = run.location_provider();
        if location == LocationProvider::Disabled {
            info!("Location tracking disabled");
        }

        let settings = WorkerSettings {
            feed: FeedConfig {
                station_information_url: run.station_information_url.clone(),
                station_status_url: run.station_status_url.clone(),
                ..FeedConfig::default()
            },
            geocoder,
            location,
        };
        let worker = Worker::spawn(settings, Some(ctx.clone()))?;

        let tiles = build_tiles(
            run.basemap,
            &run.mapbox_style,
            access_token.as_deref(),
            ctx,
        );
        let surface = WalkersSurface::new(
            ctx,
            tiles,
            run.home(),
            run.home_zoom,
            run.route_geometry_dir.clone(),
        );

        let bus = EventBus::default();
        let mut map = MapController::new(surface, &bus, worker.requester(), run.location_enabled);
        let sidebar = SidebarController::new(&bus, run.sidebar_open, run.layers());

        // Queued until the map reports it has loaded
        sidebar.announce_visible_layers();
        map.mount();

        Ok(Self {
            config,
            sidebar,
            legend: LegendPanel::new(),
            map,
            worker,
            window_size: None,
        })
    }

    fn track_sizes(&mut self, ctx: &egui::Context) {
        let window_size = window_size(ctx);
        if window_size == self.window_size {
            return;
        }
        if self.window_size.is_some() {
            self.map.on_window_resize();
        }
        self.window_size = window_size;

        if let Some(size) = window_size {
            self.map.set_viewport_width(size.x);
            self.sidebar.set_narrow(self.map.is_narrow());
        }
    }

    fn persist_ui_state(&mut self) {
        if !self.sidebar.take_dirty() {
            return;
        }
        let state = self.sidebar.state();
        if self.config.apply_ui_state(state.is_open, state.layers) {
            if let Err(e) = self.config.save() {
                warn!("Failed to save configuration: {}", e);
            }
        }
    }

    fn draw_banner(&self, ctx: &egui::Context, now: Instant) {
        let Some(banner) = self.map.notices().banner(now) else {
            return;
        };
        let fill = match banner.level {
            NoticeLevel::Info => egui::Color32::from_rgb(0x1f, 0x29, 0x37),
            NoticeLevel::Warning => egui::Color32::from_rgb(0xb4, 0x53, 0x09),
            NoticeLevel::Error => egui::Color32::from_rgb(0xb9, 0x1c, 0x1c),
        };
        egui::Area::new(egui::Id::new("map_banner"))
            .anchor(egui::Align2::CENTER_TOP, egui::vec2(0.0, 12.0))
            .interactable(false)
            .show(ctx, |ui| {
                egui::Frame::new()
                    .fill(fill)
                    .corner_radius(6.0)
                    .inner_margin(egui::Margin::symmetric(12, 8))
                    .show(ui, |ui| {
                        ui.label(egui::RichText::new(&banner.message).color(egui::Color32::WHITE));
                    });
            });
    }
}

/// Size of the whole window, sidebar included.
fn window_size(ctx: &egui::Context) -> Option<egui::Vec2> {
    ctx.input(|i| i.viewport().inner_rect).map(|r| r.size())
}

impl eframe::App for BikeMapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        while let Some(reply) = self.worker.try_recv() {
            self.map.handle_reply(reply, now);
        }

        self.legend
            .show(ctx, &mut self.sidebar, self.map.routes(), self.map.notices());

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.map.surface_mut().show(ui));
        self.track_sizes(ctx);

        self.map.tick(now);
        self.sidebar.sync();
        self.persist_ui_state();
        self.draw_banner(ctx, now);

        if let Some(deadline) = self.map.next_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(now));
        }
    }
}

impl Drop for BikeMapApp {
    fn drop(&mut self) {
        self.map.destroy();
        self.worker.shutdown();
    }
}
