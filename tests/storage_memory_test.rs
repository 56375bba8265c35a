// ABOUTME: Unit tests for the in-memory storage backend
// ABOUTME: Covers option persistence, transient TTL expiry, nx locking, and patterns
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pulseboard Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use anyhow::Result;
use pulseboard::constants::keys;
use pulseboard::errors::StoreError;
use pulseboard::registry::ToolId;
use pulseboard::storage::factory::Storage;
use pulseboard::storage::memory::MemoryStorage;
use pulseboard::storage::{OptionStore, TransientKey, TransientStore};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct TestData {
    value: String,
    count: u32,
}

fn test_storage(max_entries: usize) -> Storage {
    common::init_test_logging();
    Storage::Memory(MemoryStorage::new(max_entries))
}

#[tokio::test]
async fn test_option_set_get_delete() -> Result<()> {
    let storage = test_storage(64);
    let value = serde_json::json!({"credentials": {"api_key": "k"}});

    assert_eq!(storage.get_option("pulseboard:connection:mautic").await?, None);

    storage
        .update_option("pulseboard:connection:mautic", &value)
        .await?;
    assert_eq!(
        storage.get_option("pulseboard:connection:mautic").await?,
        Some(value)
    );

    assert!(storage.delete_option("pulseboard:connection:mautic").await?);
    assert!(!storage.delete_option("pulseboard:connection:mautic").await?);
    assert_eq!(storage.get_option("pulseboard:connection:mautic").await?, None);

    Ok(())
}

#[tokio::test]
async fn test_transient_set_and_get() -> Result<()> {
    let storage = test_storage(64);
    let key = TransientKey::Summary(ToolId::Mautic);
    let data = TestData {
        value: "summary".to_owned(),
        count: 42,
    };

    storage
        .set_transient(&key, &data, Some(Duration::from_secs(60)))
        .await?;

    let retrieved: Option<TestData> = storage.get_transient(&key).await?;
    assert_eq!(retrieved, Some(data));

    Ok(())
}

#[tokio::test]
async fn test_transient_expiration() -> Result<()> {
    let storage = test_storage(64);
    let key = TransientKey::Summary(ToolId::Clarity);
    let data = TestData {
        value: "expires".to_owned(),
        count: 1,
    };

    storage
        .set_transient(&key, &data, Some(Duration::from_millis(200)))
        .await?;
    let live: Option<TestData> = storage.get_transient(&key).await?;
    assert!(live.is_some());

    tokio::time::sleep(Duration::from_millis(500)).await;

    let expired: Option<TestData> = storage.get_transient(&key).await?;
    assert_eq!(expired, None);

    Ok(())
}

#[tokio::test]
async fn test_transient_without_ttl_persists() -> Result<()> {
    let storage = test_storage(64);
    let key = TransientKey::SyncStatus;

    storage.set_transient(&key, &"status", None).await?;
    tokio::time::sleep(Duration::from_millis(300)).await;

    let retrieved: Option<String> = storage.get_transient(&key).await?;
    assert_eq!(retrieved.as_deref(), Some("status"));

    Ok(())
}

#[tokio::test]
async fn test_nx_set_is_a_lock() -> Result<()> {
    let storage = test_storage(64);
    let key = TransientKey::SyncLock;

    // First claim wins, second loses while the entry is live.
    assert!(
        storage
            .set_transient_nx(&key, &true, Duration::from_secs(60))
            .await?
    );
    assert!(
        !storage
            .set_transient_nx(&key, &true, Duration::from_secs(60))
            .await?
    );

    // Releasing reopens the lock.
    assert!(storage.delete_transient(&key).await?);
    assert!(
        storage
            .set_transient_nx(&key, &true, Duration::from_secs(60))
            .await?
    );

    Ok(())
}

#[tokio::test]
async fn test_take_transient_is_one_shot() -> Result<()> {
    let storage = test_storage(64);
    let key = TransientKey::OauthState("nonce-1".to_owned());

    storage
        .set_transient(&key, &"google_analytics", Some(Duration::from_secs(600)))
        .await?;

    let first: Option<String> = storage.take_transient(&key).await?;
    assert_eq!(first.as_deref(), Some("google_analytics"));

    let second: Option<String> = storage.take_transient(&key).await?;
    assert_eq!(second, None);

    Ok(())
}

#[tokio::test]
async fn test_pattern_delete_scopes_to_one_tool() -> Result<()> {
    let storage = test_storage(64);
    let data = TestData {
        value: "pattern".to_owned(),
        count: 1,
    };

    storage
        .set_transient(
            &TransientKey::Summary(ToolId::Mautic),
            &data,
            Some(Duration::from_secs(60)),
        )
        .await?;
    storage
        .set_transient(
            &TransientKey::Summary(ToolId::Clarity),
            &data,
            Some(Duration::from_secs(60)),
        )
        .await?;
    storage
        .set_transient(&TransientKey::SyncLock, &true, Some(Duration::from_secs(60)))
        .await?;
    let option_key = keys::connection_option(ToolId::Mautic);
    let record = serde_json::json!({"credentials": {"api_key": "k".repeat(16)}});
    storage.update_option(&option_key, &record).await?;

    let removed = storage
        .delete_transients_matching(&keys::tool_transient_pattern(ToolId::Mautic))
        .await?;
    assert_eq!(removed, 1);

    let mautic: Option<TestData> = storage
        .get_transient(&TransientKey::Summary(ToolId::Mautic))
        .await?;
    assert_eq!(mautic, None);

    let clarity: Option<TestData> = storage
        .get_transient(&TransientKey::Summary(ToolId::Clarity))
        .await?;
    assert!(clarity.is_some());

    let lock: Option<bool> = storage.get_transient(&TransientKey::SyncLock).await?;
    assert_eq!(lock, Some(true));

    // The durable connection record sits outside the transient sweep.
    assert_eq!(storage.get_option(&option_key).await?, Some(record));

    Ok(())
}

#[tokio::test]
async fn test_invalid_pattern_is_rejected() {
    let storage = test_storage(64);

    let err = storage
        .delete_transients_matching("pulseboard:[")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidPattern(_)));
}

#[tokio::test]
async fn test_capacity_eviction_drops_the_oldest() -> Result<()> {
    let storage = test_storage(2);
    let data = TestData {
        value: "evict".to_owned(),
        count: 1,
    };

    storage
        .set_transient(
            &TransientKey::Summary(ToolId::GoogleAnalytics),
            &data,
            Some(Duration::from_secs(60)),
        )
        .await?;
    storage
        .set_transient(
            &TransientKey::Summary(ToolId::Mautic),
            &data,
            Some(Duration::from_secs(60)),
        )
        .await?;
    storage
        .set_transient(
            &TransientKey::Summary(ToolId::Clarity),
            &data,
            Some(Duration::from_secs(60)),
        )
        .await?;

    // Strict LRU with capacity 2: the first entry is gone.
    let oldest: Option<TestData> = storage
        .get_transient(&TransientKey::Summary(ToolId::GoogleAnalytics))
        .await?;
    assert_eq!(oldest, None);

    let newer: Option<TestData> = storage
        .get_transient(&TransientKey::Summary(ToolId::Clarity))
        .await?;
    assert!(newer.is_some());

    Ok(())
}

#[tokio::test]
async fn test_health_check() -> Result<()> {
    let storage = test_storage(64);
    storage.health_check().await?;
    Ok(())
}
