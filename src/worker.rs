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

//! Background runtime for network and location work.
//!
//! The UI thread never awaits anything. It sends [`WorkerRequest`]s to a
//! dedicated thread running a tokio runtime and picks up [`WorkerReply`]s
//! once per frame.

use std::sync::Arc;
use std::thread::JoinHandle;

use gbfs_client::{FeedConfig, FetchError, GbfsClient, RentalLocation};
use log::{debug, error, info, warn};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::data::GeoPoint;
use crate::geocode::{GeocodeError, Geocoder};
use crate::location::{
    Fix, LocationError, LocationProvider, LocationService, PositionOptions, WATCH_INTERVAL,
};

#[derive(Debug, Clone, PartialEq)]
pub enum WorkerRequest {
    /// Fetch both GBFS feeds and join them.
    FetchRentals,
    Geocode { address: String },
    /// Start a continuous watch. Replaces any running watch.
    WatchPosition { watch_id: u64, options: PositionOptions },
    /// One single-shot position request.
    CurrentPosition { options: PositionOptions },
    ClearWatch { watch_id: u64 },
}

#[derive(Debug)]
pub enum WorkerReply {
    Rentals(Result<Vec<RentalLocation>, FetchError>),
    Geocoded {
        address: String,
        result: Result<Option<GeoPoint>, GeocodeError>,
    },
    WatchPosition {
        watch_id: u64,
        result: Result<Fix, LocationError>,
    },
    CurrentPosition(Result<Fix, LocationError>),
}

/// Everything the worker needs to build its clients.
pub struct WorkerSettings {
    pub feed: FeedConfig,
    pub geocoder: Geocoder,
    pub location: LocationProvider,
}

/// Wakes the UI when a reply is ready.
#[derive(Clone)]
struct Waker(Option<egui::Context>);

impl Waker {
    fn wake(&self) {
        if let Some(ctx) = &self.0 {
            ctx.request_repaint();
        }
    }
}

#[derive(Clone)]
struct Outbox {
    tx: UnboundedSender<WorkerReply>,
    waker: Waker,
}

impl Outbox {
    /// False once the UI side has gone away.
    fn send(&self, reply: WorkerReply) -> bool {
        let delivered = self.tx.send(reply).is_ok();
        if delivered {
            self.waker.wake();
        }
        delivered
    }
}

pub struct Worker {
    requests: UnboundedSender<WorkerRequest>,
    replies: UnboundedReceiver<WorkerReply>,
    cancel_token: CancellationToken,
    thread: Option<JoinHandle<()>>,
}

impl Worker {
    /// Start the worker thread. `repaint` is poked after every reply.
    pub fn spawn(settings: WorkerSettings, repaint: Option<egui::Context>) -> std::io::Result<Self> {
        let (requests, requests_rx) = mpsc::unbounded_channel();
        let (replies_tx, replies) = mpsc::unbounded_channel();
        let cancel_token = CancellationToken::new();

        let outbox = Outbox {
            tx: replies_tx,
            waker: Waker(repaint),
        };
        let token = cancel_token.clone();

        let thread = std::thread::Builder::new()
            .name("bikemap-worker".to_string())
            .spawn(move || {
                let rt = match tokio::runtime::Builder::new_multi_thread()
                    .worker_threads(2)
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        error!("Failed to start worker runtime: {}", e);
                        return;
                    }
                };
                rt.block_on(run(settings, requests_rx, outbox, token));
            })?;

        info!("Background worker started");
        Ok(Self {
            requests,
            replies,
            cancel_token,
            thread: Some(thread),
        })
    }

    /// A sender for controllers that issue requests.
    pub fn requester(&self) -> UnboundedSender<WorkerRequest> {
        self.requests.clone()
    }

    pub fn try_recv(&mut self) -> Option<WorkerReply> {
        self.replies.try_recv().ok()
    }

    /// Stop the watch and the request loop, then wait for the thread.
    pub fn shutdown(&mut self) {
        self.cancel_token.cancel();
        if let Some(thread) = self.thread.take() {
            info!("Shutting down background worker");
            if thread.join().is_err() {
                warn!("Background worker panicked during shutdown");
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run(
    settings: WorkerSettings,
    mut requests: UnboundedReceiver<WorkerRequest>,
    outbox: Outbox,
    cancel_token: CancellationToken,
) {
    let gbfs = Arc::new(GbfsClient::new(settings.feed));
    let geocoder = Arc::new(settings.geocoder);
    let location = Arc::new(Mutex::new(LocationService::new(settings.location)));
    let mut watch: Option<(u64, CancellationToken)> = None;

    loop {
        let request = tokio::select! {
            _ = cancel_token.cancelled() => break,
            request = requests.recv() => match request {
                Some(request) => request,
                None => break,
            },
        };
        debug!("Worker request: {:?}", request);

        match request {
            WorkerRequest::FetchRentals => {
                let gbfs = gbfs.clone();
                let outbox = outbox.clone();
                tokio::spawn(async move {
                    let result = gbfs.fetch_rental_locations().await;
                    if let Err(e) = &result {
                        error!("Bike share feed fetch failed: {}", e);
                    }
                    outbox.send(WorkerReply::Rentals(result));
                });
            }
            WorkerRequest::Geocode { address } => {
                let geocoder = geocoder.clone();
                let outbox = outbox.clone();
                tokio::spawn(async move {
                    let result = geocoder.lookup(&address).await;
                    outbox.send(WorkerReply::Geocoded { address, result });
                });
            }
            WorkerRequest::WatchPosition { watch_id, options } => {
                if let Some((old_id, token)) = watch.take() {
                    debug!("Replacing location watch {} with {}", old_id, watch_id);
                    token.cancel();
                }
                let token = cancel_token.child_token();
                watch = Some((watch_id, token.clone()));
                tokio::spawn(watch_position(
                    watch_id,
                    options,
                    location.clone(),
                    outbox.clone(),
                    token,
                ));
            }
            WorkerRequest::CurrentPosition { options } => {
                let location = location.clone();
                let outbox = outbox.clone();
                tokio::spawn(async move {
                    let result = location.lock().await.current_position(options).await;
                    outbox.send(WorkerReply::CurrentPosition(result));
                });
            }
            WorkerRequest::ClearWatch { watch_id } => match &watch {
                Some((id, token)) if *id == watch_id => {
                    info!("Clearing location watch {}", watch_id);
                    token.cancel();
                    watch = None;
                }
                _ => debug!("Location watch {} is not active", watch_id),
            },
        }
    }

    if let Some((_, token)) = watch {
        token.cancel();
    }
    info!("Background worker stopped");
}

async fn watch_position(
    watch_id: u64,
    options: PositionOptions,
    location: Arc<Mutex<LocationService>>,
    outbox: Outbox,
    cancel_token: CancellationToken,
) {
    let mut interval = tokio::time::interval(WATCH_INTERVAL);
    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => break,
            _ = interval.tick() => {
                let result = location.lock().await.current_position(options).await;
                if !outbox.send(WorkerReply::WatchPosition { watch_id, result }) {
                    break;
                }
            }
        }
    }
    debug!("Location watch {} ended", watch_id);
}
