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

//! Map rendering and the map controller.
//!
//! [`MapController`] owns the one map instance and is driven by bus events,
//! worker replies and per-frame ticks. The instance sits behind the
//! [`MapSurface`] trait so the controller can be exercised without a window.

pub mod camera;
pub mod controller;
pub mod pool;
pub mod surface;
pub mod tiles;
pub mod timers;
pub mod walkers_surface;

#[cfg(test)]
pub(crate) mod testing;

pub use camera::{Bounds, ZoomProfile};
pub use controller::{Lifecycle, MapController};
pub use surface::{MapSurface, SurfaceClick, SurfaceError};
pub use tiles::{build_tiles, Basemap};
pub use walkers_surface::WalkersSurface;
