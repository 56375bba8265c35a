// ABOUTME: Integration tests for connect and disconnect flows through the manager
// ABOUTME: Covers validation outcomes, persisted records, and the immediate-sync kickoff
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pulseboard Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use anyhow::Result;
use pulseboard::config::AppConfig;
use pulseboard::errors::IntegrationError;
use pulseboard::models::{ConnectOutcome, SyncState, ValidationStatus};
use pulseboard::registry::ToolId;
use pulseboard::summaries::SummaryCache;
use std::time::Duration;

#[tokio::test]
async fn test_connect_clarity_stores_and_validates() -> Result<()> {
    let harness = common::harness();

    let outcome = harness
        .manager
        .connect_tool("clarity", common::clarity_credentials())
        .await?;

    let ConnectOutcome::Connected(validation) = outcome else {
        panic!("expected a direct connection, got {outcome:?}");
    };
    assert_eq!(validation.status, ValidationStatus::Success);
    assert!(validation.last_success_at.is_some());
    assert_eq!(validation.message, "Validation succeeded");

    assert!(harness.manager.is_connected("clarity").await?);

    // The stored record carries the same message the outcome reported.
    let stored = harness.manager.validation_state("clarity").await?;
    assert_eq!(stored.message, "Validation succeeded");

    let record = harness.manager.connection("clarity").await?.unwrap();
    assert_eq!(record.credential("project_id"), Some("proj123"));
    assert!(record.stored_at.is_some());

    let metadata = harness.manager.connection_metadata("clarity").await?;
    assert_eq!(metadata.get("project_id").map(String::as_str), Some("proj123"));
    assert!(metadata.contains_key("project_key_mask"));
    assert!(!metadata.contains_key("project_key"));

    Ok(())
}

#[tokio::test]
async fn test_successful_connect_queues_an_immediate_sync() -> Result<()> {
    let harness = common::harness();
    let config = AppConfig::default();

    harness
        .manager
        .connect_tool("clarity", common::clarity_credentials())
        .await?;

    let one_shots = harness.scheduler.one_shots.lock().unwrap().clone();
    assert_eq!(one_shots, vec![config.sync.kickoff_delay]);

    let status = harness.manager.sync_status().await?;
    assert_eq!(status.state, SyncState::Queued);
    assert!(status.queued_at.is_some());

    Ok(())
}

#[tokio::test]
async fn test_failed_validation_is_stored_but_not_synced() -> Result<()> {
    let harness = common::harness();

    // The key passes the shape check, the scheme fails the deep check.
    let outcome = harness
        .manager
        .connect_tool(
            "mautic",
            common::mautic_credentials("http://marketing.example.com/api"),
        )
        .await?;

    let ConnectOutcome::Connected(validation) = outcome else {
        panic!("expected a stored connection, got {outcome:?}");
    };
    assert_eq!(validation.status, ValidationStatus::Failed);
    assert_eq!(validation.message, "the API URL must use https");

    // The record exists so the admin can correct it in place.
    assert!(harness.manager.connection("mautic").await?.is_some());
    assert!(!harness.manager.is_connected("mautic").await?);

    // No refresh is queued for a connection that cannot fetch.
    assert_eq!(harness.scheduler.one_shot_count(), 0);

    Ok(())
}

#[tokio::test]
async fn test_shape_invalid_credentials_persist_nothing() -> Result<()> {
    let harness = common::harness();

    let err = harness
        .manager
        .connect_tool(
            "clarity",
            common::credentials(&[("project_id", "proj123"), ("project_key", "")]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, IntegrationError::InvalidCredentials));
    assert_eq!(harness.manager.connection("clarity").await?, None);

    let err = harness
        .manager
        .connect_tool("mautic", common::mautic_credentials("not a url"))
        .await
        .unwrap_err();
    assert!(matches!(err, IntegrationError::InvalidCredentials));
    assert_eq!(harness.manager.connection("mautic").await?, None);

    Ok(())
}

#[tokio::test]
async fn test_unknown_tool_is_rejected_everywhere() {
    let harness = common::harness();

    let err = harness
        .manager
        .connect_tool("hubspot", common::credentials(&[]))
        .await
        .unwrap_err();
    assert!(matches!(err, IntegrationError::InvalidTool(name) if name == "hubspot"));

    let err = harness.manager.disconnect_tool("hubspot").await.unwrap_err();
    assert!(matches!(err, IntegrationError::InvalidTool(_)));

    let err = harness.manager.is_connected("hubspot").await.unwrap_err();
    assert!(matches!(err, IntegrationError::InvalidTool(_)));
}

#[tokio::test]
async fn test_disconnect_is_idempotent() -> Result<()> {
    let harness = common::harness();

    harness
        .manager
        .connect_tool("clarity", common::clarity_credentials())
        .await?;
    assert!(harness.manager.is_connected("clarity").await?);

    harness.manager.disconnect_tool("clarity").await?;
    assert_eq!(harness.manager.connection("clarity").await?, None);
    assert!(!harness.manager.is_connected("clarity").await?);

    // Second disconnect finds nothing and still succeeds.
    harness.manager.disconnect_tool("clarity").await?;

    Ok(())
}

#[tokio::test]
async fn test_disconnect_drops_the_cached_summary() -> Result<()> {
    let harness = common::harness();
    let cache = SummaryCache::new(harness.storage.clone(), Duration::from_secs(60));

    harness
        .manager
        .connect_tool("clarity", common::clarity_credentials())
        .await?;

    let mut figures = serde_json::Map::new();
    figures.insert("sessions_30d".to_owned(), serde_json::json!(1234));
    cache.put(ToolId::Clarity, figures).await?;
    assert!(!harness.manager.cached_summary("clarity").await?.is_empty());

    harness.manager.disconnect_tool("clarity").await?;

    assert!(harness.manager.cached_summary("clarity").await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_reconnect_failure_preserves_the_last_success_stamp() -> Result<()> {
    let harness = common::harness();

    harness
        .manager
        .connect_tool(
            "mautic",
            common::mautic_credentials("https://marketing.example.com/api"),
        )
        .await?;
    let healthy = harness.manager.validation_state("mautic").await?;
    assert_eq!(healthy.status, ValidationStatus::Success);
    let first_success = healthy.last_success_at.unwrap();

    harness
        .manager
        .connect_tool(
            "mautic",
            common::mautic_credentials("http://marketing.example.com/api"),
        )
        .await?;

    let failed = harness.manager.validation_state("mautic").await?;
    assert_eq!(failed.status, ValidationStatus::Failed);
    assert_eq!(failed.last_success_at, Some(first_success));
    assert!(failed.checked_at.unwrap() >= first_success);

    Ok(())
}

#[tokio::test]
async fn test_reconnect_keeps_the_original_stored_at() -> Result<()> {
    let harness = common::harness();

    harness
        .manager
        .connect_tool("clarity", common::clarity_credentials())
        .await?;
    let first = harness.manager.connection("clarity").await?.unwrap();

    harness
        .manager
        .connect_tool(
            "clarity",
            common::credentials(&[("project_id", "proj456"), ("project_key", "zyxwvu987654")]),
        )
        .await?;
    let second = harness.manager.connection("clarity").await?.unwrap();

    assert_eq!(second.stored_at, first.stored_at);
    assert_eq!(second.credential("project_id"), Some("proj456"));

    Ok(())
}

#[tokio::test]
async fn test_oauth_connect_persists_nothing_until_the_callback() -> Result<()> {
    let harness = common::harness();

    let outcome = harness
        .manager
        .connect_tool("google_analytics", common::credentials(&[]))
        .await?;

    assert!(matches!(outcome, ConnectOutcome::AuthorizationRequired { .. }));
    assert_eq!(harness.manager.connection("google_analytics").await?, None);
    assert!(!harness.manager.is_connected("google_analytics").await?);
    assert_eq!(harness.scheduler.one_shot_count(), 0);

    Ok(())
}

#[tokio::test]
async fn test_unconnected_tool_reads_come_back_empty() -> Result<()> {
    let harness = common::harness();

    let validation = harness.manager.validation_state("mautic").await?;
    assert_eq!(validation.status, ValidationStatus::Unknown);

    assert!(harness.manager.cached_summary("mautic").await?.is_empty());

    let err = harness
        .manager
        .connection_metadata("mautic")
        .await
        .unwrap_err();
    assert!(matches!(err, IntegrationError::MissingConnection(ToolId::Mautic)));

    Ok(())
}
