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

//! Single-shot deadlines polled once per frame.

use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Take the transient highlight marker down.
    RemoveHighlight,
    /// Reflow the map once the sidebar has finished animating.
    SidebarResize,
    /// Fallback position request after a watch timeout.
    LocationRetry,
}

/// At most one pending deadline per [`TimerKind`].
///
/// Scheduling a kind that is already pending moves its deadline, so repeated
/// scheduling debounces.
#[derive(Debug, Default)]
pub struct Timers {
    deadlines: HashMap<TimerKind, Instant>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, kind: TimerKind, now: Instant, delay: Duration) {
        self.deadlines.insert(kind, now + delay);
    }

    pub fn clear(&mut self) {
        self.deadlines.clear();
    }

    /// Remove and return every timer whose deadline has passed, earliest first.
    pub fn due(&mut self, now: Instant) -> Vec<TimerKind> {
        let mut fired: Vec<(Instant, TimerKind)> = self
            .deadlines
            .iter()
            .filter(|(_, &at)| at <= now)
            .map(|(&kind, &at)| (at, kind))
            .collect();
        fired.sort_by_key(|(at, _)| *at);

        for (_, kind) in &fired {
            self.deadlines.remove(kind);
        }
        fired.into_iter().map(|(_, kind)| kind).collect()
    }

    /// Earliest pending deadline, for scheduling the next repaint.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }
}
