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

//! Normalization of GBFS station feeds into rental locations.
//!
//! Station information (where a dock is) and station status (what is in it
//! right now) arrive as separate feeds. They are correlated by `station_id`
//! into a single [`RentalLocation`] per station.

use std::collections::HashMap;

use crate::feed::{StationInformation, StationStatus};

/// A bike-share station ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct RentalLocation {
    pub station_id: String,
    pub name: String,
    pub description: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub rental_type: String,
    pub price: String,
    pub hours: String,
    pub capacity: u32,
    /// `None` when the status feed had no record for this station.
    pub available_bikes: Option<u32>,
    /// `None` when the status feed had no record for this station.
    pub available_docks: Option<u32>,
    pub is_charging_station: bool,
}

impl RentalLocation {
    /// Build a rental location from a station and its (optional) status.
    #[must_use]
    pub fn from_station(station: &StationInformation, status: Option<&StationStatus>) -> Self {
        let is_charging_station = station.is_charging_station.unwrap_or(false);
        let description = format!(
            "Bike share station with {} docks{}",
            station.capacity,
            if is_charging_station {
                " and charging capabilities"
            } else {
                ""
            }
        );
        let address = station
            .address
            .clone()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| format!("{}, {}", station.lat, station.lon));

        Self {
            station_id: station.station_id.clone(),
            name: station.name.clone(),
            description,
            address,
            latitude: station.lat,
            longitude: station.lon,
            rental_type: "Bike Share Station".to_string(),
            price: "Pay per ride".to_string(),
            hours: "24/7".to_string(),
            capacity: station.capacity,
            available_bikes: status.map(|s| s.num_bikes_available),
            available_docks: status.map(|s| s.num_docks_available),
            is_charging_station,
        }
    }
}

/// Join station information with station status by id.
///
/// Total over its input: every station yields exactly one location, in the
/// order given. Stations without a status record get `None` availability.
#[must_use]
pub fn join_and_normalize(
    stations: &[StationInformation],
    statuses: &[StationStatus],
) -> Vec<RentalLocation> {
    let by_id: HashMap<&str, &StationStatus> = statuses
        .iter()
        .map(|s| (s.station_id.as_str(), s))
        .collect();

    stations
        .iter()
        .map(|station| {
            RentalLocation::from_station(station, by_id.get(station.station_id.as_str()).copied())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(id: &str, capacity: u32, charging: Option<bool>) -> StationInformation {
        StationInformation {
            station_id: id.to_string(),
            name: format!("Station {id}"),
            lat: 35.0456,
            lon: -85.3097,
            address: None,
            capacity,
            rental_methods: Vec::new(),
            groups: None,
            is_charging_station: charging,
        }
    }

    fn status(id: &str, bikes: u32, docks: u32) -> StationStatus {
        StationStatus {
            station_id: id.to_string(),
            num_bikes_available: bikes,
            num_docks_available: docks,
            is_installed: true,
            is_renting: true,
            is_returning: true,
            last_reported: 0,
        }
    }

    #[test]
    fn test_join_matches_status_by_id() {
        let stations = vec![station("a", 10, None), station("b", 12, None)];
        let statuses = vec![status("b", 3, 9), status("a", 7, 3)];

        let locations = join_and_normalize(&stations, &statuses);

        assert_eq!(locations.len(), 2);
        assert_eq!(locations[0].station_id, "a");
        assert_eq!(locations[0].available_bikes, Some(7));
        assert_eq!(locations[1].available_docks, Some(9));
    }

    #[test]
    fn test_station_without_status_has_unknown_availability() {
        let stations = vec![station("orphan", 8, None)];

        let locations = join_and_normalize(&stations, &[status("other", 1, 1)]);

        assert_eq!(locations.len(), 1);
        assert!(locations[0].available_bikes.is_none());
        assert!(locations[0].available_docks.is_none());
    }

    #[test]
    fn test_empty_status_feed_is_not_an_error() {
        let stations = vec![station("a", 8, None), station("b", 4, None)];
        let locations = join_and_normalize(&stations, &[]);
        assert!(locations.iter().all(|l| l.available_bikes.is_none()));
    }

    #[test]
    fn test_description_mentions_charging() {
        let plain = RentalLocation::from_station(&station("a", 15, None), None);
        let charging = RentalLocation::from_station(&station("b", 15, Some(true)), None);

        assert_eq!(plain.description, "Bike share station with 15 docks");
        assert_eq!(
            charging.description,
            "Bike share station with 15 docks and charging capabilities"
        );
        assert!(charging.is_charging_station);
    }

    #[test]
    fn test_address_falls_back_to_coordinates() {
        let location = RentalLocation::from_station(&station("a", 1, None), None);
        assert_eq!(location.address, "35.0456, -85.3097");

        let mut with_address = station("b", 1, None);
        with_address.address = Some("100 Market St".to_string());
        let location = RentalLocation::from_station(&with_address, None);
        assert_eq!(location.address, "100 Market St");
    }
}
