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

//! Per-layer marker pools.

use std::collections::HashMap;

use crate::markers::{Marker, MarkerId};

use super::surface::MapSurface;

struct PoolEntry {
    marker: Marker,
    attached: bool,
}

/// Marker handles for one layer, keyed by [`MarkerId`].
///
/// A handle is created once and can be attached and detached any number of
/// times. It is never on the surface more than once.
#[derive(Default)]
pub struct MarkerPool {
    entries: Vec<PoolEntry>,
    index: HashMap<MarkerId, usize>,
}

impl MarkerPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create handles for markers not already pooled. Existing handles win.
    pub fn ensure(&mut self, markers: impl IntoIterator<Item = Marker>) -> usize {
        let mut created = 0;
        for marker in markers {
            if self.index.contains_key(&marker.id) {
                continue;
            }
            self.index.insert(marker.id.clone(), self.entries.len());
            self.entries.push(PoolEntry {
                marker,
                attached: false,
            });
            created += 1;
        }
        created
    }

    /// Attach every detached handle.
    pub fn attach_all<S: MapSurface>(&mut self, surface: &mut S) {
        for entry in self.entries.iter_mut().filter(|e| !e.attached) {
            surface.add_marker(&entry.marker);
            entry.attached = true;
        }
    }

    /// Remove every attached handle from the surface, keeping the handles.
    pub fn detach_all<S: MapSurface>(&mut self, surface: &mut S) {
        for entry in self.entries.iter_mut().filter(|e| e.attached) {
            surface.remove_marker(&entry.marker.id);
            entry.attached = false;
        }
    }

    /// Detach and forget every handle.
    pub fn discard_all<S: MapSurface>(&mut self, surface: &mut S) {
        self.detach_all(surface);
        self.entries.clear();
        self.index.clear();
    }

    /// Swap the whole pool for fresh markers, attaching them if asked.
    pub fn replace<S: MapSurface>(&mut self, markers: Vec<Marker>, attach: bool, surface: &mut S) {
        self.discard_all(surface);
        self.ensure(markers);
        if attach {
            self.attach_all(surface);
        }
    }
}
