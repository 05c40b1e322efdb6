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

use eframe::egui;
use log::warn;

use crate::data::{Place, Route, ATTRACTIONS, BIKE_RESOURCES, LOCAL_RESOURCES};
use crate::events::{Layer, LocationTarget};
use crate::notices::{NoticeLevel, Notices};

use super::controller::SidebarController;

const MAP_FEATURES: &[(&str, &str, &str)] = &[
    (
        "📍",
        "Your Location",
        "Blue pulsing dot shows your current position",
    ),
    ("🧭", "Navigation", "Drag to pan, scroll to zoom"),
    ("⌨", "Keyboard", "Ctrl+B (Cmd+B on macOS) shows or hides this panel"),
];

const FOOTER: &str = "Discover the Scenic City on two wheels! Whether you're pedaling past the \
Tennessee Aquarium for a glimpse of underwater wonders, coasting by the Chattanooga Zoo to see \
furry friends, or cruising toward the historic Railroad Museum for a step back in time, this map \
has you covered. From easy-going boardwalks to mountain-bike-ready trails, there's a loop for \
every cyclist's sense of adventure.";

const ACTIVITY_ROWS: usize = 10;

const MUTED: egui::Color32 = egui::Color32::from_rgb(0x6b, 0x72, 0x80);

/// The legend side panel
#[derive(Debug, Default)]
pub struct LegendPanel {
    search: String,
}

impl LegendPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render the legend, or the button that reopens it
    pub fn show(
        &mut self,
        ctx: &egui::Context,
        sidebar: &mut SidebarController,
        routes: &[Route],
        notices: &Notices,
    ) {
        let shortcut = egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::B);
        if ctx.input_mut(|i| i.consume_shortcut(&shortcut)) {
            sidebar.toggle();
        }

        if !sidebar.state().is_open {
            egui::Window::new("show_legend")
                .title_bar(false)
                .anchor(egui::Align2::LEFT_TOP, egui::vec2(10.0, 10.0))
                .resizable(false)
                .show(ctx, |ui| {
                    if ui.button("☰ Legend").clicked() {
                        sidebar.toggle();
                    }
                });
            return;
        }

        egui::SidePanel::left("legend")
            .resizable(false)
            .exact_width(300.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("Chattanooga Bike Map");
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("⏴").on_hover_text("Hide (Ctrl+B)").clicked() {
                            sidebar.toggle();
                        }
                    });
                });
                ui.separator();

                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.search_box(ui, sidebar);
                    ui.add_space(8.0);
                    routes_section(ui, sidebar, routes);
                    ui.add_space(8.0);
                    layers_section(ui, sidebar, &notices.rental_summary());
                    ui.add_space(8.0);
                    places_section(ui, sidebar, "Attractions", ATTRACTIONS);
                    places_section(ui, sidebar, "Bike Shops", BIKE_RESOURCES);
                    ui.add_space(8.0);
                    resources_section(ui);
                    ui.add_space(8.0);
                    features_section(ui);
                    ui.add_space(8.0);
                    activity_section(ui, notices);

                    ui.separator();
                    ui.label(egui::RichText::new(FOOTER).small().color(MUTED));
                });
            });
    }

    fn search_box(&mut self, ui: &mut egui::Ui, sidebar: &mut SidebarController) {
        ui.horizontal(|ui| {
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.search)
                    .hint_text("Find an address")
                    .desired_width(220.0),
            );
            let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if (submitted || ui.button("Go").clicked()) && !self.search.trim().is_empty() {
                sidebar.center_on(LocationTarget::Address(self.search.trim().to_string()));
            }
        });
    }
}

fn section_heading(ui: &mut egui::Ui, text: &str) {
    ui.label(egui::RichText::new(text).strong().size(14.0));
}

fn routes_section(ui: &mut egui::Ui, sidebar: &mut SidebarController, routes: &[Route]) {
    section_heading(ui, "Trail Types");
    for route in routes {
        let selected = sidebar.state().selected_route.as_deref() == Some(route.id.as_str());
        ui.horizontal(|ui| {
            let (rect, _) = ui.allocate_exact_size(egui::vec2(16.0, 16.0), egui::Sense::hover());
            ui.painter().rect_filled(rect, 4.0, route.color32());
            if ui.selectable_label(selected, &route.name).clicked() {
                sidebar.select_route(&route.id);
            }
        });
        ui.label(egui::RichText::new(&route.description).small().color(MUTED));
    }
}

fn layers_section(ui: &mut egui::Ui, sidebar: &mut SidebarController, rental_status: &str) {
    section_heading(ui, "Toggle Map Layers");
    for layer in Layer::ALL {
        let mut visible = sidebar.state().layers.get(layer);
        if ui.checkbox(&mut visible, layer.label()).changed() {
            sidebar.toggle_layer(layer);
        }
    }
    if sidebar.state().layers.bike_rentals {
        ui.label(egui::RichText::new(rental_status).small().color(MUTED));
    }
}

fn places_section(
    ui: &mut egui::Ui,
    sidebar: &mut SidebarController,
    title: &str,
    places: &[Place],
) {
    egui::CollapsingHeader::new(title)
        .default_open(false)
        .show(ui, |ui| {
            for place in places {
                let text = format!("{} {}", place.icon.glyph(), place.name);
                if ui
                    .selectable_label(false, text)
                    .on_hover_text(place.address)
                    .clicked()
                {
                    sidebar.center_on(LocationTarget::Coordinates {
                        latitude: place.latitude,
                        longitude: place.longitude,
                    });
                }
            }
        });
}

fn resources_section(ui: &mut egui::Ui) {
    section_heading(ui, "Information");
    for resource in LOCAL_RESOURCES {
        let color = egui::Color32::from_hex(resource.color).unwrap_or(MUTED);
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(resource.icon.glyph()).color(color));
            if ui.link(resource.name).clicked() {
                if let Err(e) = webbrowser::open(resource.url) {
                    warn!("Could not open {}: {}", resource.url, e);
                }
            }
        });
        ui.label(egui::RichText::new(resource.description).small().color(MUTED));
    }
}

fn features_section(ui: &mut egui::Ui) {
    section_heading(ui, "Map Features");
    for (glyph, name, description) in MAP_FEATURES {
        ui.horizontal(|ui| {
            ui.label(*glyph);
            ui.label(egui::RichText::new(*name).strong());
        });
        ui.label(egui::RichText::new(*description).small().color(MUTED));
    }
}

fn activity_section(ui: &mut egui::Ui, notices: &Notices) {
    egui::CollapsingHeader::new("Recent activity")
        .default_open(false)
        .show(ui, |ui| {
            if notices.history.is_empty() {
                ui.label(egui::RichText::new("Nothing yet").small().color(MUTED));
                return;
            }
            for notice in notices.recent(ACTIVITY_ROWS) {
                let color = match notice.level {
                    NoticeLevel::Info => MUTED,
                    NoticeLevel::Warning => egui::Color32::from_rgb(0xb4, 0x53, 0x09),
                    NoticeLevel::Error => egui::Color32::from_rgb(0xb9, 0x1c, 0x1c),
                };
                ui.horizontal_wrapped(|ui| {
                    let time = notice
                        .timestamp
                        .with_timezone(&chrono::Local)
                        .format("%H:%M:%S");
                    ui.label(egui::RichText::new(time.to_string()).small().monospace());
                    ui.label(egui::RichText::new(&notice.message).small().color(color));
                });
            }
        });
}
