//! Common test utilities, fixtures, and mocks
//! This module contains shared functionality used across the integration suites.

#![allow(dead_code)]

pub mod fixtures;
pub mod mocks;

use std::sync::{Arc, Once};
use std::time::Duration;

use jukebot::commands::music::utils::scheduler::{QueuedTrack, SchedulerSnapshot, TrackScheduler};
use jukebot::{ChatGateway, Services, VoiceTransport};
use tracing::Level;

use mocks::{FakePlayer, FakeResolver};

static INIT: Once = Once::new();

/// Initialize test environment
pub fn init() {
    INIT.call_once(|| {
        // Initialize tracing for tests
        tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_test_writer()
            .init();
    });
}

/// Scheduler wired to in-memory fakes.
pub fn scheduler(resolver: FakeResolver) -> (Arc<FakePlayer>, Arc<FakeResolver>, TrackScheduler) {
    let player = Arc::new(FakePlayer::default());
    let resolver = Arc::new(resolver);
    let scheduler = TrackScheduler::spawn(player.clone(), resolver.clone());
    (player, resolver, scheduler)
}

pub fn services(
    gateway: impl ChatGateway + 'static,
    voice: impl VoiceTransport + 'static,
    scheduler: TrackScheduler,
) -> Services {
    Services {
        gateway: Arc::new(gateway),
        voice: Arc::new(voice),
        scheduler,
    }
}

/// Poll the scheduler until no load is in flight, or give up after `limit`.
pub async fn wait_for_loads(scheduler: &TrackScheduler, limit: Duration) -> SchedulerSnapshot {
    let deadline = tokio::time::Instant::now() + limit;
    loop {
        let snapshot = scheduler.snapshot().await.expect("scheduler is running");
        let loading = snapshot.loading.is_some()
            || snapshot
                .queued
                .iter()
                .any(|entry| matches!(entry, QueuedTrack::Loading(_)));
        if !loading || tokio::time::Instant::now() >= deadline {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
