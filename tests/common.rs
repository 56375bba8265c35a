// ABOUTME: Shared test utilities and wiring helpers for integration tests
// ABOUTME: Provides in-memory storage, a recording scheduler fake, and credential builders
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pulseboard Contributors

#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]
#![allow(missing_docs)]

//! Shared test utilities for `pulseboard`
//!
//! Common wiring so every integration test gets the same manager setup:
//! in-memory storage, a scheduler fake that records instead of spawning, and
//! valid credential fixtures for the registered tools.

use async_trait::async_trait;
use pulseboard::{
    config::AppConfig,
    manager::IntegrationManager,
    scheduler::SyncScheduler,
    storage::{factory::Storage, memory::MemoryStorage},
};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        // TEST_LOG controls test logging verbosity; default stays quiet
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Scheduler fake that records requests instead of spawning timers.
#[derive(Default)]
pub struct RecordingScheduler {
    /// Periods passed to `ensure_recurring`, in call order.
    pub recurring: Mutex<Vec<Duration>>,
    /// Delays passed to `schedule_once`, in call order.
    pub one_shots: Mutex<Vec<Duration>>,
}

impl RecordingScheduler {
    pub fn one_shot_count(&self) -> usize {
        self.one_shots.lock().unwrap().len()
    }

    pub fn recurring_count(&self) -> usize {
        self.recurring.lock().unwrap().len()
    }
}

#[async_trait]
impl SyncScheduler for RecordingScheduler {
    async fn ensure_recurring(&self, period: Duration) {
        self.recurring.lock().unwrap().push(period);
    }

    async fn schedule_once(&self, delay: Duration) {
        self.one_shots.lock().unwrap().push(delay);
    }
}

/// Fully wired manager over in-memory storage and a recording scheduler.
pub struct TestHarness {
    pub storage: Storage,
    pub scheduler: Arc<RecordingScheduler>,
    pub manager: Arc<IntegrationManager>,
}

/// Standard harness with default configuration
pub fn harness() -> TestHarness {
    harness_with_config(&AppConfig::default())
}

/// Harness with custom configuration (short TTLs and the like)
pub fn harness_with_config(config: &AppConfig) -> TestHarness {
    init_test_logging();
    let storage = Storage::Memory(MemoryStorage::new(1024));
    let scheduler = Arc::new(RecordingScheduler::default());
    let manager = Arc::new(IntegrationManager::new(
        storage.clone(),
        scheduler.clone(),
        config,
    ));
    TestHarness {
        storage,
        scheduler,
        manager,
    }
}

/// Build a credential map from field/value pairs
pub fn credentials(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(field, value)| ((*field).to_owned(), (*value).to_owned()))
        .collect()
}

/// Valid project-key credentials for the clarity tool
pub fn clarity_credentials() -> BTreeMap<String, String> {
    credentials(&[("project_id", "proj123"), ("project_key", "abcdef123456")])
}

/// Mautic credentials with a caller-chosen endpoint URL
pub fn mautic_credentials(api_url: &str) -> BTreeMap<String, String> {
    credentials(&[
        ("api_url", api_url),
        ("api_key", "0123456789abcdef0123456789abcdef"),
    ])
}
