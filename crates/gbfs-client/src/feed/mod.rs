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

//! GBFS feed documents.
//!
//! Every GBFS endpoint wraps its payload in the same envelope:
//! `{ "last_updated": ..., "ttl": ..., "data": { "stations": [...] } }`.
//! Feeds in the wild disagree on a few primitive types (station ids as
//! numbers, flags as `0`/`1`), so decoding here is deliberately lenient.

use serde::{Deserialize, Deserializer};

/// Top-level GBFS response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    /// POSIX timestamp of the last feed update.
    #[serde(default)]
    pub last_updated: i64,
    /// Seconds until the feed should be considered stale.
    #[serde(default)]
    pub ttl: u32,
    pub data: StationList<T>,
}

/// The `data` object of a station feed.
#[derive(Debug, Clone, Deserialize)]
pub struct StationList<T> {
    #[serde(default = "Vec::new")]
    pub stations: Vec<T>,
}

/// One record from `station_information`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StationInformation {
    #[serde(deserialize_with = "de_station_id")]
    pub station_id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub capacity: u32,
    #[serde(default)]
    pub rental_methods: Vec<String>,
    #[serde(default)]
    pub groups: Option<Vec<String>>,
    #[serde(default, deserialize_with = "de_optional_flag")]
    pub is_charging_station: Option<bool>,
}

/// One record from `station_status`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StationStatus {
    #[serde(deserialize_with = "de_station_id")]
    pub station_id: String,
    #[serde(default)]
    pub num_bikes_available: u32,
    #[serde(default)]
    pub num_docks_available: u32,
    #[serde(default, deserialize_with = "de_flag")]
    pub is_installed: bool,
    #[serde(default, deserialize_with = "de_flag")]
    pub is_renting: bool,
    #[serde(default, deserialize_with = "de_flag")]
    pub is_returning: bool,
    #[serde(default)]
    pub last_reported: i64,
}

impl StationStatus {
    /// A station that is installed and both renting and accepting returns.
    #[must_use]
    pub fn is_operational(&self) -> bool {
        self.is_installed && self.is_renting && self.is_returning
    }
}

/// Decode a feed body and return the inner station array.
pub fn parse_stations<T>(body: &[u8]) -> Result<Vec<T>, serde_json::Error>
where
    T: for<'de> Deserialize<'de>,
{
    let envelope: Envelope<T> = serde_json::from_slice(body)?;
    Ok(envelope.data.stations)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Text(String),
    Int(i64),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagRepr {
    Bool(bool),
    Int(i64),
}

impl From<FlagRepr> for bool {
    fn from(flag: FlagRepr) -> Self {
        match flag {
            FlagRepr::Bool(b) => b,
            FlagRepr::Int(i) => i != 0,
        }
    }
}

fn de_station_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match IdRepr::deserialize(deserializer)? {
        IdRepr::Text(s) => s,
        IdRepr::Int(i) => i.to_string(),
    })
}

fn de_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    FlagRepr::deserialize(deserializer).map(bool::from)
}

fn de_optional_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<FlagRepr>::deserialize(deserializer)?.map(bool::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    const INFO_FEED: &str = r#"{
        "last_updated": 1717000000,
        "ttl": 10,
        "data": { "stations": [
            { "station_id": "12", "name": "Market St & 10th", "lat": 35.0456, "lon": -85.3097,
              "address": "1000 Market St", "capacity": 15, "rental_methods": ["KEY", "CREDITCARD"],
              "is_charging_station": true },
            { "station_id": 13, "name": "Coolidge Park", "lat": 35.0612, "lon": -85.3077,
              "capacity": 19 }
        ] }
    }"#;

    const STATUS_FEED: &str = r#"{
        "last_updated": 1717000000,
        "ttl": 10,
        "data": { "stations": [
            { "station_id": "12", "num_bikes_available": 4, "num_docks_available": 11,
              "is_installed": 1, "is_renting": 1, "is_returning": 0, "last_reported": 1716999990 },
            { "station_id": "13", "num_bikes_available": 0, "num_docks_available": 19,
              "is_installed": true, "is_renting": true, "is_returning": true }
        ] }
    }"#;

    #[test]
    fn test_parse_station_information() {
        let stations: Vec<StationInformation> = parse_stations(INFO_FEED.as_bytes()).unwrap();
        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].station_id, "12");
        assert_eq!(stations[0].address.as_deref(), Some("1000 Market St"));
        assert_eq!(stations[0].is_charging_station, Some(true));
        assert_eq!(stations[0].rental_methods.len(), 2);
    }

    #[test]
    fn test_numeric_station_id_becomes_string() {
        let stations: Vec<StationInformation> = parse_stations(INFO_FEED.as_bytes()).unwrap();
        assert_eq!(stations[1].station_id, "13");
        assert!(stations[1].address.is_none());
        assert!(stations[1].is_charging_station.is_none());
    }

    #[test]
    fn test_status_flags_accept_integers_and_booleans() {
        let statuses: Vec<StationStatus> = parse_stations(STATUS_FEED.as_bytes()).unwrap();
        assert!(statuses[0].is_installed);
        assert!(!statuses[0].is_returning);
        assert!(!statuses[0].is_operational());
        assert!(statuses[1].is_operational());
        assert_eq!(statuses[1].last_reported, 0);
    }

    #[test]
    fn test_missing_stations_array_is_empty() {
        let stations: Vec<StationStatus> =
            parse_stations(br#"{"last_updated": 0, "ttl": 0, "data": {}}"#).unwrap();
        assert!(stations.is_empty());
    }

    #[test]
    fn test_malformed_body_is_an_error() {
        assert!(parse_stations::<StationStatus>(b"<html>oops</html>").is_err());
    }
}
