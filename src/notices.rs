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

use chrono::{DateTime, Utc};
use gbfs_client::RentalLocation;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// How long a banner stays on top of the map
pub const BANNER_DURATION: Duration = Duration::from_secs(5);

const MAX_NOTICES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Notice message with timestamp
#[derive(Debug, Clone)]
pub struct Notice {
    pub timestamp: DateTime<Utc>,
    pub level: NoticeLevel,
    pub message: String,
}

/// Transient user-visible message
#[derive(Debug, Clone)]
pub struct Banner {
    pub level: NoticeLevel,
    pub message: String,
    pub expires_at: Instant,
}

/// Latest state of the bike share feed, for the legend's status line
#[derive(Debug, Clone, Default)]
pub struct RentalFeedStatus {
    pub station_count: usize,
    pub bikes_available: u32,
    pub updated_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Recent notices, the current banner, and rental feed status
pub struct Notices {
    pub history: VecDeque<Notice>,
    pub rentals: RentalFeedStatus,
    banner: Option<Banner>,
    max_history: usize,
}

impl Default for Notices {
    fn default() -> Self {
        Self::new()
    }
}

impl Notices {
    pub fn new() -> Self {
        Self {
            history: VecDeque::with_capacity(MAX_NOTICES),
            rentals: RentalFeedStatus::default(),
            banner: None,
            max_history: MAX_NOTICES,
        }
    }

    /// Add a notice to the history
    pub fn push(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.history.push_back(Notice {
            timestamp: Utc::now(),
            level,
            message: message.into(),
        });

        // Keep only the last N messages
        while self.history.len() > self.max_history {
            self.history.pop_front();
        }
    }

    /// Show a banner and record it in the history
    pub fn show_banner(&mut self, level: NoticeLevel, message: impl Into<String>, now: Instant) {
        let message = message.into();
        self.push(level, message.clone());
        self.banner = Some(Banner {
            level,
            message,
            expires_at: now + BANNER_DURATION,
        });
    }

    /// Current banner, if it has not expired
    pub fn banner(&self, now: Instant) -> Option<&Banner> {
        self.banner.as_ref().filter(|b| now < b.expires_at)
    }

    /// Drop an expired banner
    pub fn expire(&mut self, now: Instant) {
        if self.banner.as_ref().is_some_and(|b| now >= b.expires_at) {
            self.banner = None;
        }
    }

    /// Up to `limit` notices, newest first
    pub fn recent(&self, limit: usize) -> impl Iterator<Item = &Notice> {
        self.history.iter().rev().take(limit)
    }

    pub fn record_rentals(&mut self, locations: &[RentalLocation]) {
        self.rentals = RentalFeedStatus {
            station_count: locations.len(),
            bikes_available: locations.iter().filter_map(|l| l.available_bikes).sum(),
            updated_at: Some(Utc::now()),
            last_error: None,
        };
        self.push(
            NoticeLevel::Info,
            format!("Bike share feed loaded: {} stations", locations.len()),
        );
    }

    pub fn record_rental_error(&mut self, error: &str) {
        self.rentals.last_error = Some(error.to_string());
        self.push(NoticeLevel::Error, format!("Bike share feed failed: {}", error));
    }

    /// One-line summary of the rental feed
    pub fn rental_summary(&self) -> String {
        if let Some(err) = &self.rentals.last_error {
            return format!("Bike share unavailable ({})", err);
        }
        match self.rentals.updated_at {
            Some(at) => format!(
                "{} stations, {} bikes available (updated {})",
                self.rentals.station_count,
                self.rentals.bikes_available,
                at.with_timezone(&chrono::Local).format("%H:%M:%S")
            ),
            None => "Bike share not loaded".to_string(),
        }
    }
}
