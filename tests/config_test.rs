// ABOUTME: Integration tests for environment-driven configuration loading
// ABOUTME: Serialized because they mutate process environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pulseboard Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use pulseboard::config::{AppConfig, StorageBackend};
use serial_test::serial;
use std::env;
use std::time::Duration;

#[test]
#[serial]
fn test_defaults_without_environment() {
    env::remove_var("PULSEBOARD_STORAGE");
    env::remove_var("PULSEBOARD_SYNC_PERIOD_SECS");
    env::remove_var("PULSEBOARD_SYNC_KICKOFF_DELAY_SECS");
    env::remove_var("PULSEBOARD_OAUTH_REDIRECT_URI");

    let config = AppConfig::from_env();

    assert_eq!(config.storage.backend, StorageBackend::Memory);
    assert_eq!(config.sync.recurring_period, Duration::from_secs(3600));
    assert_eq!(config.sync.kickoff_delay, Duration::from_secs(10));
    assert_eq!(config.sync.lock_ttl, Duration::from_secs(300));
    assert_eq!(config.integration.summary_ttl, Duration::from_secs(1800));
    assert_eq!(config.integration.oauth_state_ttl, Duration::from_secs(600));
}

#[test]
#[serial]
fn test_sync_cadence_from_environment() {
    env::set_var("PULSEBOARD_SYNC_PERIOD_SECS", "120");
    env::set_var("PULSEBOARD_SYNC_KICKOFF_DELAY_SECS", "3");

    let config = AppConfig::from_env();
    assert_eq!(config.sync.recurring_period, Duration::from_secs(120));
    assert_eq!(config.sync.kickoff_delay, Duration::from_secs(3));

    env::remove_var("PULSEBOARD_SYNC_PERIOD_SECS");
    env::remove_var("PULSEBOARD_SYNC_KICKOFF_DELAY_SECS");
}

#[test]
#[serial]
fn test_malformed_values_fall_back_to_defaults() {
    env::set_var("PULSEBOARD_SYNC_PERIOD_SECS", "not-a-number");

    let config = AppConfig::from_env();
    assert_eq!(config.sync.recurring_period, Duration::from_secs(3600));

    env::remove_var("PULSEBOARD_SYNC_PERIOD_SECS");
}

#[test]
#[serial]
fn test_storage_backend_selection() {
    env::set_var("PULSEBOARD_STORAGE", "redis");

    let config = AppConfig::from_env();
    assert_eq!(config.storage.backend, StorageBackend::Redis);

    env::remove_var("PULSEBOARD_STORAGE");
}

#[test]
#[serial]
fn test_redirect_uri_override() {
    env::set_var(
        "PULSEBOARD_OAUTH_REDIRECT_URI",
        "https://example.com/oauth/done",
    );

    let config = AppConfig::from_env();
    assert_eq!(
        config.integration.oauth_redirect_uri,
        "https://example.com/oauth/done"
    );

    env::remove_var("PULSEBOARD_OAUTH_REDIRECT_URI");
}

#[test]
#[serial]
fn test_summary_names_the_operative_settings() {
    env::remove_var("PULSEBOARD_STORAGE");
    env::remove_var("PULSEBOARD_SYNC_PERIOD_SECS");

    let summary = AppConfig::from_env().summary();
    assert!(summary.contains("storage=memory"));
    assert!(summary.contains("sync_period=3600s"));
    assert!(summary.contains("redirect_uri="));
}
