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

//! Retry guard for live location updates.

use std::time::Duration;

use log::{debug, info, warn};

use super::{Fix, LocationError};
use crate::data::GeoPoint;

/// Delay before the single fallback request after a watch timeout.
pub const RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Idle,
    /// A retry timer is armed.
    RetryScheduled,
    /// The fallback single-shot request has been issued.
    FallbackInFlight,
}

/// What the map should do in response to a location result.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationAction {
    /// Create or move the current-location marker.
    MoveMarker(GeoPoint),
    /// Arm the retry timer.
    ScheduleRetry(Duration),
    /// Issue one single-shot position request.
    RequestCurrentPosition,
    ShowBanner(&'static str),
}

/// Turns watch and fallback results into [`LocationAction`]s.
///
/// A watch timeout arms one retry. Until that retry resolves, further
/// timeouts are ignored so fallback requests never stack. Errors never move
/// the camera and never remove an existing marker.
#[derive(Debug)]
pub struct LocationTracker {
    state: RetryState,
}

impl Default for LocationTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationTracker {
    pub fn new() -> Self {
        Self {
            state: RetryState::Idle,
        }
    }

    pub fn on_watch_result(&mut self, result: Result<Fix, LocationError>) -> Option<LocationAction> {
        match result {
            Ok(fix) => Some(LocationAction::MoveMarker(fix.position)),
            Err(LocationError::Timeout) => match self.state {
                RetryState::Idle => {
                    info!("Location watch timed out, retrying once in {:?}", RETRY_DELAY);
                    self.state = RetryState::RetryScheduled;
                    Some(LocationAction::ScheduleRetry(RETRY_DELAY))
                }
                RetryState::RetryScheduled | RetryState::FallbackInFlight => {
                    debug!("Location watch timed out again, retry already pending");
                    None
                }
            },
            Err(e) => Self::report(&e),
        }
    }

    /// The retry timer fired.
    pub fn on_retry_timer(&mut self) -> Option<LocationAction> {
        if self.state != RetryState::RetryScheduled {
            return None;
        }
        self.state = RetryState::FallbackInFlight;
        Some(LocationAction::RequestCurrentPosition)
    }

    /// Result of the single-shot fallback request.
    pub fn on_fallback_result(&mut self, result: Result<Fix, LocationError>) -> Option<LocationAction> {
        self.state = RetryState::Idle;
        match result {
            Ok(fix) => Some(LocationAction::MoveMarker(fix.position)),
            Err(e) => Self::report(&e),
        }
    }

    /// Forget any pending retry, e.g. when the watch is cleared.
    pub fn reset(&mut self) {
        self.state = RetryState::Idle;
    }

    fn report(error: &LocationError) -> Option<LocationAction> {
        warn!("Location error: {}", error);
        error.user_message().map(LocationAction::ShowBanner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn fix(lat: f64, lon: f64) -> Fix {
        Fix {
            position: GeoPoint::new(lat, lon),
            accuracy_m: None,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_fix_moves_marker() {
        let mut tracker = LocationTracker::new();
        let action = tracker.on_watch_result(Ok(fix(35.05, -85.31)));
        assert_eq!(action, Some(LocationAction::MoveMarker(GeoPoint::new(35.05, -85.31))));
    }

    #[test]
    fn test_timeouts_do_not_stack_fallbacks() {
        let mut tracker = LocationTracker::new();

        assert_eq!(
            tracker.on_watch_result(Err(LocationError::Timeout)),
            Some(LocationAction::ScheduleRetry(RETRY_DELAY))
        );
        assert_eq!(tracker.on_watch_result(Err(LocationError::Timeout)), None);

        assert_eq!(
            tracker.on_retry_timer(),
            Some(LocationAction::RequestCurrentPosition)
        );
        // Still in flight: neither a timeout nor a stray timer adds a request
        assert_eq!(tracker.on_watch_result(Err(LocationError::Timeout)), None);
        assert_eq!(tracker.on_retry_timer(), None);

        tracker.on_fallback_result(Ok(fix(35.0, -85.3)));
        // Settled: the next timeout may arm a retry again
        assert_eq!(
            tracker.on_watch_result(Err(LocationError::Timeout)),
            Some(LocationAction::ScheduleRetry(RETRY_DELAY))
        );
    }

    #[test]
    fn test_fallback_timeout_shows_banner() {
        let mut tracker = LocationTracker::new();
        tracker.on_watch_result(Err(LocationError::Timeout));
        tracker.on_retry_timer();

        let action = tracker.on_fallback_result(Err(LocationError::Timeout));

        assert!(matches!(action, Some(LocationAction::ShowBanner(_))));
        assert_eq!(
            tracker.on_watch_result(Err(LocationError::Timeout)),
            Some(LocationAction::ScheduleRetry(RETRY_DELAY))
        );
    }

    #[test]
    fn test_denied_and_unknown_errors() {
        let mut tracker = LocationTracker::new();
        assert!(matches!(
            tracker.on_watch_result(Err(LocationError::PermissionDenied)),
            Some(LocationAction::ShowBanner(_))
        ));
        assert_eq!(
            tracker.on_watch_result(Err(LocationError::Unknown("boom".into()))),
            None
        );
        // Neither error arms a retry
        assert_eq!(
            tracker.on_watch_result(Err(LocationError::Timeout)),
            Some(LocationAction::ScheduleRetry(RETRY_DELAY))
        );
    }
}
