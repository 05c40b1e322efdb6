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

//! Points of interest, bike shops and local resource links.

/// Marker / list icon for a place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Icon {
    Fish,
    Paw,
    Train,
    Gamepad,
    Hiking,
    Tree,
    HorseHead,
    Palette,
    Mountain,
    Bicycle,
    Road,
    Bolt,
    HandsHelping,
    Info,
    MapPin,
    Route,
}

impl Icon {
    /// Glyph rendered inside markers and list rows.
    #[must_use]
    pub fn glyph(self) -> &'static str {
        match self {
            Icon::Fish => "🐟",
            Icon::Paw => "🐾",
            Icon::Train => "🚂",
            Icon::Gamepad => "🎮",
            Icon::Hiking => "🥾",
            Icon::Tree => "🌳",
            Icon::HorseHead => "🐴",
            Icon::Palette => "🎨",
            Icon::Mountain => "⛰",
            Icon::Bicycle => "🚲",
            Icon::Road => "🛣",
            Icon::Bolt => "⚡",
            Icon::HandsHelping => "🤝",
            Icon::Info => "ℹ",
            Icon::MapPin => "📍",
            Icon::Route => "〰",
        }
    }
}

/// An attraction or bike resource with a fixed location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Place {
    pub name: &'static str,
    pub description: &'static str,
    pub address: &'static str,
    pub latitude: f64,
    pub longitude: f64,
    pub icon: Icon,
}

impl Place {
    /// Stable identifier derived from the name, e.g. `tennessee-aquarium`.
    #[must_use]
    pub fn key(&self) -> String {
        slug(self.name)
    }
}

/// An external link listed in the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalResource {
    pub name: &'static str,
    pub description: &'static str,
    pub url: &'static str,
    pub icon: Icon,
    pub color: &'static str,
}

fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

pub const ATTRACTIONS: &[Place] = &[
    Place {
        name: "Tennessee Aquarium",
        description: "Immerse yourself in Chattanooga's underwater world—perfect for families and nature lovers!",
        address: "1 Broad Street, Chattanooga, TN 37402",
        latitude: 35.055_833_3,
        longitude: -85.311_111_1,
        icon: Icon::Fish,
    },
    Place {
        name: "Chattanooga Zoo at Warner Park",
        description: "Meet furry, feathered, and scaly friends at the Chattanooga Zoo—an easy, fun stop for all ages.",
        address: "301 N Holtzclaw Avenue, Chattanooga, TN 37404",
        latitude: 35.0431,
        longitude: -85.2837,
        icon: Icon::Paw,
    },
    Place {
        name: "Tennessee Valley Railroad Museum",
        description: "Step back in time on nostalgic train rides and explore vintage locomotives at the Railroad Museum.",
        address: "4119 Cromwell Road, Chattanooga, TN 37421",
        latitude: 35.0657,
        longitude: -85.2031,
        icon: Icon::Train,
    },
    Place {
        name: "Chattanooga Pinball Museum",
        description: "Score big with classic and modern pinball games—get your flippers ready for family-friendly fun!",
        address: "409 Broad Street, Chattanooga, TN 37402",
        latitude: 35.0539,
        longitude: -85.3121,
        icon: Icon::Gamepad,
    },
    Place {
        name: "Outdoor Chattanooga",
        description: "Your go-to resource for outdoor adventure and recreation in Chattanooga.",
        address: "200 River Street, Chattanooga, TN 37405",
        latitude: 35.061_111,
        longitude: -85.306_389,
        icon: Icon::Hiking,
    },
    Place {
        name: "Stringer's Ridge",
        description: "Explore 92 acres of urban wilderness with multi-use trails offering panoramic views of Chattanooga.",
        address: "787 W Bell Avenue, Chattanooga, TN 37405",
        latitude: 35.0735,
        longitude: -85.3188,
        icon: Icon::Tree,
    },
    Place {
        name: "Reflection Riding Arboretum & Nature Center",
        description: "Discover over 300 acres of natural beauty featuring walking trails, native plants, and wildlife exhibits.",
        address: "400 Garden Road, Chattanooga, TN 37419",
        latitude: 35.0042,
        longitude: -85.3622,
        icon: Icon::HorseHead,
    },
    Place {
        name: "Hunter Museum of American Art",
        description: "Art museum featuring works from the Hudson River School, American Impressionism, early modernism, and contemporary art. Offers tours and live performances.",
        address: "10 Bluff View Ave, Chattanooga, TN 37403",
        latitude: 35.055_833_3,
        longitude: -85.306_111_1,
        icon: Icon::Palette,
    },
];

pub const BIKE_RESOURCES: &[Place] = &[
    Place {
        name: "Suck Creek Cycle",
        description: "Chattanooga's premier local bike shop offering premium brands and expert repairs for mountain biking enthusiasts.",
        address: "630 W Bell Avenue, Chattanooga, TN 37405",
        latitude: 35.0735,
        longitude: -85.3188,
        icon: Icon::Mountain,
    },
    Place {
        name: "East Ridge Bicycles",
        description: "Serving the community for over 35 years with a wide selection of bikes and professional fitting services.",
        address: "5910 Ringgold Road, Chattanooga, TN 37412",
        latitude: 34.9899,
        longitude: -85.1992,
        icon: Icon::Bicycle,
    },
    Place {
        name: "Trek Bicycle Store",
        description: "Official retailer offering a range of Trek bikes, accessories, and professional maintenance services.",
        address: "307 Manufacturers Road, Suite 117, Chattanooga, TN 37405",
        latitude: 35.0617,
        longitude: -85.3086,
        icon: Icon::Road,
    },
    Place {
        name: "Chatt eBikes",
        description: "Chattanooga's premium electric bike shop specializing in sales, rentals, and services for electric bicycles.",
        address: "1404 McCallie Avenue, Suite 102, Chattanooga, TN 37404",
        latitude: 35.0375,
        longitude: -85.2845,
        icon: Icon::Bolt,
    },
    Place {
        name: "Two Bikes Chattanooga",
        description: "Non-profit bike shop transforming donated bikes into practical transportation for underserved community members.",
        address: "1810 E. Main Street, Suite 100, Chattanooga, TN 37404",
        latitude: 35.026_111,
        longitude: -85.281_111,
        icon: Icon::HandsHelping,
    },
    Place {
        name: "Pedego Electric Bikes Chattanooga",
        description: "Specializing in electric bike sales, rentals, and services, offering a variety of models for all riders.",
        address: "191 River St, Chattanooga, TN 37405",
        latitude: 35.0625,
        longitude: -85.3077,
        icon: Icon::Bolt,
    },
    Place {
        name: "Owen Cyclery",
        description: "Family-owned shop since 1973, offering a wide range of bicycles, gear, and expert repair services.",
        address: "1920 Northpoint Blvd, Hixson, TN 37343",
        latitude: 35.1260,
        longitude: -85.2490,
        icon: Icon::Bicycle,
    },
];

pub const LOCAL_RESOURCES: &[LocalResource] = &[
    LocalResource {
        name: "About This Map",
        description: "This map is a guide to the best bike routes in Chattanooga. Made with ❤️ by iFixit, the free repair guide for every thing.",
        url: "https://www.ifixit.com",
        icon: Icon::Info,
        color: "#6B7280",
    },
    LocalResource {
        name: "Chattanooga City Bike Rentals",
        description: "Find bike rentals throughout the city.",
        url: "https://www.chattanooga.gov/bike-map",
        icon: Icon::Bicycle,
        color: "#6B7280",
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_slug() {
        assert_eq!(slug("Tennessee Aquarium"), "tennessee-aquarium");
        assert_eq!(slug("Stringer's Ridge"), "stringer-s-ridge");
        assert_eq!(
            slug("Reflection Riding Arboretum & Nature Center"),
            "reflection-riding-arboretum-nature-center"
        );
    }

    #[test]
    fn test_place_keys_are_unique_per_layer() {
        for layer in [ATTRACTIONS, BIKE_RESOURCES] {
            let keys: HashSet<_> = layer.iter().map(Place::key).collect();
            assert_eq!(keys.len(), layer.len());
        }
    }

    #[test]
    fn test_aquarium_coordinates() {
        let aquarium = ATTRACTIONS
            .iter()
            .find(|p| p.name == "Tennessee Aquarium")
            .unwrap();
        assert!((aquarium.latitude - 35.055_833_3).abs() < f64::EPSILON);
        assert!((aquarium.longitude - -85.311_111_1).abs() < f64::EPSILON);
    }
}
