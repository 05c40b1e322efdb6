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

//! BikeMap: a desktop map of a city's bike routes, attractions, bike shops
//! and bike share stations.

use clap::Parser;
use eframe::egui;
use log::{info, warn};

mod app;
mod config;
mod data;
mod events;
mod geocode;
mod legend;
mod location;
mod map;
mod markers;
mod notices;
mod worker;

use config::{AppConfig, RunOverrides};
use map::Basemap;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser, Debug)]
#[command(name = "bikemap-desktop", author, version, about = "Chattanooga bike map")]
struct Args {
    /// Log filter, e.g. `debug` or `bikemap_desktop=trace` (RUST_LOG wins)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Do not look up or track the current location
    #[arg(long)]
    no_location: bool,

    /// Basemap for this run (overrides the config file)
    #[arg(long, value_enum)]
    basemap: Option<Basemap>,

    /// Overwrite the config file with defaults before starting
    #[arg(long)]
    reset_config: bool,

    /// Print the config file location and exit
    #[arg(long)]
    print_config_path: bool,
}

fn load_config(args: &Args) -> AppConfig {
    if args.reset_config {
        let config = AppConfig::default();
        match config.save() {
            Ok(()) => info!("Configuration reset to defaults"),
            Err(e) => warn!("Failed to write default configuration: {}", e),
        }
        return config;
    }
    AppConfig::load().unwrap_or_else(|e| {
        warn!("Failed to load configuration, using defaults: {}", e);
        AppConfig::default()
    })
}

fn main() -> eframe::Result {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    if args.print_config_path {
        match AppConfig::get_config_path() {
            Ok(path) => println!("{}", path.display()),
            Err(e) => eprintln!("Could not determine config path: {}", e),
        }
        return Ok(());
    }

    info!("Starting BikeMap...");
    let config = load_config(&args);
    let overrides = RunOverrides {
        no_location: args.no_location,
        basemap: args.basemap,
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([360.0, 480.0])
            .with_title("Chattanooga Bike Map"),
        ..Default::default()
    };

    eframe::run_native(
        "BikeMap",
        options,
        Box::new(|cc| Ok(Box::new(app::BikeMapApp::new(cc, config, overrides)?))),
    )
}
