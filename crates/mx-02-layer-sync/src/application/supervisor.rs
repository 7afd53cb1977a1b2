//! # Live Sync Supervision
//!
//! `LiveSync` drives the engine until it fails; `Supervisor` restarts it
//! after a backoff, indefinitely, until shutdown. The outer loop does not
//! classify errors.

use std::sync::Arc;
use std::time::Duration;

use mx_telemetry::metrics::SYNC_RESTARTS;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::application::SyncEngine;
use crate::domain::{Backoff, SyncError};
use crate::ports::Clock;

/// The live sync loop.
pub struct LiveSync {
    engine: Arc<SyncEngine>,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
}

impl LiveSync {
    pub fn new(engine: Arc<SyncEngine>, clock: Arc<dyn Clock>, poll_interval: Duration) -> Self {
        Self {
            engine,
            clock,
            poll_interval,
        }
    }

    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    /// Advance until an error or shutdown. Sleeps `poll_interval` whenever
    /// caught up.
    pub async fn run(&self, shutdown: &mut watch::Receiver<bool>) -> Result<(), SyncError> {
        loop {
            if *shutdown.borrow() {
                return Ok(());
            }

            if self.engine.advance().await? > 0 {
                continue;
            }

            tokio::select! {
                _ = self.clock.sleep(self.poll_interval) => {}
                _ = shutdown.changed() => return Ok(()),
            }
        }
    }
}

/// Restarts [`LiveSync`] after every failure.
pub struct Supervisor {
    backoff: Backoff,
    clock: Arc<dyn Clock>,
}

impl Supervisor {
    pub fn new(backoff: Backoff, clock: Arc<dyn Clock>) -> Self {
        Self { backoff, clock }
    }

    /// Run `live` until shutdown. The backoff attempt counter resets whenever
    /// a failed run had moved the cursor forward.
    pub async fn run(&self, live: &LiveSync, mut shutdown: watch::Receiver<bool>) {
        info!("[mx-02] live sync started");
        let mut attempt: u32 = 0;

        loop {
            let before = live.engine().cursor();
            match live.run(&mut shutdown).await {
                Ok(()) => {
                    info!("[mx-02] Shutdown signal received");
                    return;
                }
                Err(e) => {
                    if live.engine().cursor() > before {
                        attempt = 0;
                    }
                    let delay = self.backoff.delay(attempt);
                    attempt = attempt.saturating_add(1);
                    SYNC_RESTARTS.inc();
                    warn!(
                        error = %e,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "[mx-02] live sync failed, restarting"
                    );

                    tokio::select! {
                        _ = self.clock.sleep(delay) => {}
                        _ = shutdown.changed() => {
                            info!("[mx-02] Shutdown signal received");
                            return;
                        }
                    }
                }
            }
        }
    }
}
