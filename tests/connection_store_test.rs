// ABOUTME: Integration tests for the connection store's lazy record migration
// ABOUTME: Legacy shapes written raw into storage must come back healed and persisted
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pulseboard Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use anyhow::Result;
use chrono::Utc;
use pulseboard::connections::ConnectionStore;
use pulseboard::constants::keys;
use pulseboard::models::{ConnectionRecord, ValidationStatus};
use pulseboard::registry::ToolId;
use pulseboard::storage::factory::Storage;
use pulseboard::storage::memory::MemoryStorage;
use pulseboard::storage::OptionStore;
use std::collections::BTreeMap;

fn test_store() -> (Storage, ConnectionStore) {
    common::init_test_logging();
    let storage = Storage::Memory(MemoryStorage::new(64));
    let store = ConnectionStore::new(storage.clone());
    (storage, store)
}

#[tokio::test]
async fn test_bare_token_string_migrates_on_read() -> Result<()> {
    let (storage, store) = test_store();
    let key = keys::connection_option(ToolId::GoogleAnalytics);

    // An old release stored just the access token.
    storage
        .update_option(&key, &serde_json::json!("legacy-token"))
        .await?;

    let record = store.get(ToolId::GoogleAnalytics).await?.unwrap();
    assert_eq!(record.credential("access_token"), Some("legacy-token"));
    assert_eq!(record.validation.status, ValidationStatus::Unknown);
    assert!(record.stored_at.is_some());

    // The healed record was written back: the raw value is now an object
    // carrying every current field.
    let raw = storage.get_option(&key).await?.unwrap();
    assert!(raw.get("credentials").is_some());
    assert!(raw.get("metadata").is_some());
    assert!(raw.get("validation").is_some());
    assert_eq!(
        raw.pointer("/credentials/access_token").and_then(|v| v.as_str()),
        Some("legacy-token")
    );

    Ok(())
}

#[tokio::test]
async fn test_bare_credential_map_migrates_on_read() -> Result<()> {
    let (storage, store) = test_store();
    let key = keys::connection_option(ToolId::Mautic);

    storage
        .update_option(
            &key,
            &serde_json::json!({
                "api_url": "https://marketing.example.com/api",
                "api_key": "0123456789abcdef",
            }),
        )
        .await?;

    let record = store.get(ToolId::Mautic).await?.unwrap();
    assert_eq!(
        record.credential("api_url"),
        Some("https://marketing.example.com/api")
    );
    assert_eq!(record.credential("api_key"), Some("0123456789abcdef"));

    let raw = storage.get_option(&key).await?.unwrap();
    assert!(raw.get("credentials").is_some());

    Ok(())
}

#[tokio::test]
async fn test_current_shape_is_not_rewritten() -> Result<()> {
    let (storage, store) = test_store();
    let key = keys::connection_option(ToolId::Clarity);

    let mut credentials = BTreeMap::new();
    credentials.insert("project_id".to_owned(), "proj123".to_owned());
    credentials.insert("project_key".to_owned(), "abcdef123456".to_owned());
    let record = ConnectionRecord::new(credentials, Utc::now());
    store.put(ToolId::Clarity, &record).await?;

    let before = storage.get_option(&key).await?;
    let read = store.get(ToolId::Clarity).await?.unwrap();
    let after = storage.get_option(&key).await?;

    assert_eq!(read, record);
    assert_eq!(before, after);

    Ok(())
}

#[tokio::test]
async fn test_structured_record_backfills_missing_fields() -> Result<()> {
    let (storage, store) = test_store();
    let key = keys::connection_option(ToolId::Clarity);

    // A structured record from a release before validation bookkeeping.
    storage
        .update_option(
            &key,
            &serde_json::json!({
                "credentials": {"project_id": "proj123", "project_key": "abcdef123456"},
                "stored_at": null,
            }),
        )
        .await?;

    let record = store.get(ToolId::Clarity).await?.unwrap();
    assert_eq!(record.credential("project_id"), Some("proj123"));
    assert_eq!(record.validation.status, ValidationStatus::Unknown);
    assert!(record.stored_at.is_some());

    let raw = storage.get_option(&key).await?.unwrap();
    assert!(raw.get("validation").is_some());
    assert!(raw.get("metadata").is_some());
    assert!(raw.pointer("/stored_at").and_then(serde_json::Value::as_str).is_some());

    Ok(())
}

#[tokio::test]
async fn test_unrecognizable_value_reads_as_absent() -> Result<()> {
    let (storage, store) = test_store();
    let key = keys::connection_option(ToolId::Mautic);

    storage.update_option(&key, &serde_json::json!(12_345)).await?;

    assert_eq!(store.get(ToolId::Mautic).await?, None);

    // The garbage is left in place rather than destroyed.
    assert!(storage.get_option(&key).await?.is_some());

    Ok(())
}

#[tokio::test]
async fn test_delete_reports_prior_existence() -> Result<()> {
    let (_storage, store) = test_store();

    let record = ConnectionRecord::new(BTreeMap::new(), Utc::now());
    store.put(ToolId::Mautic, &record).await?;

    assert!(store.delete(ToolId::Mautic).await?);
    assert!(!store.delete(ToolId::Mautic).await?);
    assert_eq!(store.get(ToolId::Mautic).await?, None);

    Ok(())
}
