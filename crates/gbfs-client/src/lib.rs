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

//! GBFS client library for bike-share station feeds.
//!
//! The General Bikeshare Feed Specification publishes station data as a set
//! of JSON documents. This crate covers the two a map needs:
//!
//! - **Feed layer**: envelope and record types with lenient decoding
//!   ([`feed`])
//! - **HTTP layer**: one GET per feed, with typed failures ([`http`])
//! - **Rental layer**: joins information and status into display-ready
//!   [`RentalLocation`]s ([`rental`])
//!
//! # Quick Start
//!
//! ```no_run
//! use gbfs_client::{FeedConfig, GbfsClient};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let client = GbfsClient::new(FeedConfig::default());
//!     match client.fetch_rental_locations().await {
//!         Ok(locations) => {
//!             for location in locations {
//!                 println!("{}: {:?} bikes", location.name, location.available_bikes);
//!             }
//!         }
//!         Err(e) => eprintln!("feed unavailable: {e}"),
//!     }
//! }
//! ```
//!
//! # Joining Without the Network
//!
//! ```
//! use gbfs_client::feed::{parse_stations, StationInformation, StationStatus};
//! use gbfs_client::join_and_normalize;
//!
//! let info = br#"{"last_updated":0,"ttl":0,"data":{"stations":[
//!     {"station_id":"1","name":"Aquarium","lat":35.0558,"lon":-85.3111,"capacity":12}]}}"#;
//! let stations: Vec<StationInformation> = parse_stations(info).unwrap();
//! let locations = join_and_normalize(&stations, &[] as &[StationStatus]);
//! assert_eq!(locations[0].available_bikes, None);
//! ```

pub mod feed;
pub mod http;
pub mod rental;

pub use feed::{Envelope, StationInformation, StationStatus};
pub use http::{
    FeedConfig, FetchError, GbfsClient, DEFAULT_STATION_INFORMATION_URL,
    DEFAULT_STATION_STATUS_URL,
};
pub use rental::{join_and_normalize, RentalLocation};
