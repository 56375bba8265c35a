// ABOUTME: Scheduling seam between the manager and whatever runs sync jobs
// ABOUTME: Tokio implementation drives a worker task through an mpsc channel
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pulseboard Contributors

//! # Sync Scheduling
//!
//! The manager never talks to a job system directly; it asks a
//! [`SyncScheduler`] for "a run soon" or "runs every period" and stays
//! testable against a recording fake. [`TokioScheduler`] and [`SyncWorker`]
//! are the production pair: timers push run requests into a channel, one
//! worker drains it and calls back into the manager.

use crate::manager::IntegrationManager;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// One request for a synchronization run.
#[derive(Debug, Clone, Copy)]
pub struct SyncRequest;

/// How the manager asks for background runs.
#[async_trait::async_trait]
pub trait SyncScheduler: Send + Sync {
    /// Make sure a recurring run exists; calling again must not duplicate it.
    async fn ensure_recurring(&self, period: Duration);

    /// Request a single run after `delay`.
    async fn schedule_once(&self, delay: Duration);
}

/// Timer-driven scheduler feeding a [`SyncWorker`] through a channel.
pub struct TokioScheduler {
    tx: mpsc::Sender<SyncRequest>,
    recurring_started: AtomicBool,
}

impl TokioScheduler {
    /// Create the scheduler and the receiving end for its worker.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<SyncRequest>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Self {
                tx,
                recurring_started: AtomicBool::new(false),
            },
            rx,
        )
    }
}

#[async_trait::async_trait]
impl SyncScheduler for TokioScheduler {
    async fn ensure_recurring(&self, period: Duration) {
        if self.recurring_started.swap(true, Ordering::SeqCst) {
            debug!("Recurring sync already scheduled");
            return;
        }

        let tx = self.tx.clone();
        tokio::spawn(async move {
            // First run happens one full period out; activation kicks off an
            // immediate one-shot separately.
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            loop {
                interval.tick().await;
                if tx.send(SyncRequest).await.is_err() {
                    warn!("Sync worker is gone; stopping recurring schedule");
                    break;
                }
            }
        });
        info!("Scheduled recurring sync every {}s", period.as_secs());
    }

    async fn schedule_once(&self, delay: Duration) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(SyncRequest).await.is_err() {
                warn!("Sync worker is gone; dropping one-shot run");
            }
        });
        debug!("Scheduled one-shot sync in {}s", delay.as_secs());
    }
}

/// Worker loop that executes queued run requests one at a time.
pub struct SyncWorker {
    rx: mpsc::Receiver<SyncRequest>,
    manager: Arc<IntegrationManager>,
}

impl SyncWorker {
    /// Pair a request receiver with the manager that runs the work.
    #[must_use]
    pub fn new(rx: mpsc::Receiver<SyncRequest>, manager: Arc<IntegrationManager>) -> Self {
        Self { rx, manager }
    }

    /// Drain run requests until every sender is dropped.
    pub async fn run(mut self) {
        info!("Sync worker started");
        while self.rx.recv().await.is_some() {
            match self.manager.run_sync().await {
                Ok(outcome) if outcome.started => {
                    info!(
                        refreshed = outcome.refreshed.len(),
                        skipped = outcome.skipped.len(),
                        "Sync run finished"
                    );
                }
                Ok(_) => debug!("Sync run skipped; another run holds the lock"),
                Err(e) => error!("Sync run failed: {e}"),
            }
        }
        info!("Sync worker stopped");
    }
}
