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

//! Camera math: route extents and the fit-zoom formula.

use crate::data::GeoPoint;

/// Zoom used when centring on a single location.
pub const CENTER_ZOOM: f64 = 17.0;

/// Axis-aligned lat/lon extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Bounds {
    /// Extent of all points, or `None` if there are none.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a GeoPoint>) -> Option<Self> {
        points.into_iter().fold(None, |acc: Option<Bounds>, p| {
            Some(match acc {
                None => Bounds {
                    min_lat: p.lat,
                    max_lat: p.lat,
                    min_lon: p.lon,
                    max_lon: p.lon,
                },
                Some(b) => Bounds {
                    min_lat: b.min_lat.min(p.lat),
                    max_lat: b.max_lat.max(p.lat),
                    min_lon: b.min_lon.min(p.lon),
                    max_lon: b.max_lon.max(p.lon),
                },
            })
        })
    }

    #[must_use]
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }

    #[must_use]
    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    #[must_use]
    pub fn lon_span(&self) -> f64 {
        self.max_lon - self.min_lon
    }
}

/// Constants for `zoom = max(floor, base - factor * max(lat_span, lon_span))`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomProfile {
    pub floor: f64,
    pub base: f64,
    pub span_factor: f64,
}

impl ZoomProfile {
    pub const DESKTOP: ZoomProfile = ZoomProfile {
        floor: 12.0,
        base: 15.0,
        span_factor: 25.0,
    };

    /// Narrow viewports zoom out further.
    pub const MOBILE: ZoomProfile = ZoomProfile {
        floor: 11.0,
        base: 14.0,
        span_factor: 25.0,
    };

    #[must_use]
    pub fn for_viewport(narrow: bool) -> Self {
        if narrow {
            Self::MOBILE
        } else {
            Self::DESKTOP
        }
    }

    #[must_use]
    pub fn fit_zoom(&self, bounds: &Bounds) -> f64 {
        let span = bounds.lat_span().max(bounds.lon_span());
        (self.base - self.span_factor * span).max(self.floor)
    }
}
