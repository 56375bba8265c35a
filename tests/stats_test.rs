// ABOUTME: Integration tests for the stats aggregator over a host content store
// ABOUTME: Full-fixture figures plus the degrade-to-zero contract for broken stores
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pulseboard Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pulseboard::models::CommerceActivity;
use pulseboard::stats::{ContentStore, SampleContentStore, StatsAggregator};
use std::sync::Arc;

/// A store whose every query fails, standing in for a broken host database.
struct FailingStore;

#[async_trait]
impl ContentStore for FailingStore {
    async fn count_published(&self, _kind: &str) -> Result<u64> {
        Err(anyhow!("table missing"))
    }

    async fn count_created_since(&self, _kind: &str, _since: DateTime<Utc>) -> Result<u64> {
        Err(anyhow!("table missing"))
    }

    async fn count_approved_comments_since(
        &self,
        _since: Option<DateTime<Utc>>,
    ) -> Result<u64> {
        Err(anyhow!("table missing"))
    }

    async fn count_terms(&self, _taxonomy: &str) -> Result<u64> {
        Err(anyhow!("table missing"))
    }

    async fn count_users(&self) -> Result<u64> {
        Err(anyhow!("table missing"))
    }

    async fn content_kinds(&self) -> Result<Vec<String>> {
        Err(anyhow!("table missing"))
    }

    async fn commerce_activity(&self, _days: i64) -> Result<Option<Vec<CommerceActivity>>> {
        Err(anyhow!("table missing"))
    }
}

fn sample_aggregator() -> StatsAggregator {
    common::init_test_logging();
    StatsAggregator::new(Arc::new(SampleContentStore::new()))
}

#[tokio::test]
async fn test_totals_reflect_the_sample_site() {
    let aggregator = sample_aggregator();

    let totals = aggregator.totals().await;
    assert_eq!(totals.posts, 128);
    assert_eq!(totals.pages, 14);
    assert_eq!(totals.comments, 213);
    assert_eq!(totals.users, 17);
    assert_eq!(totals.categories, 9);
    assert_eq!(totals.tags, 42);
}

#[tokio::test]
async fn test_recent_activity_uses_the_trailing_window() {
    let aggregator = sample_aggregator();

    let recent = aggregator.recent_activity().await;
    assert_eq!(recent.window_days, 30);
    assert_eq!(recent.new_posts, 8);
    assert_eq!(recent.new_comments, 8);
}

#[tokio::test]
async fn test_kind_totals_cover_every_registered_kind() {
    let aggregator = sample_aggregator();

    let kinds = aggregator.kind_totals().await;
    assert_eq!(kinds.len(), 2);
    assert_eq!(kinds.get("post"), Some(&128));
    assert_eq!(kinds.get("page"), Some(&14));
}

#[tokio::test]
async fn test_commerce_activity_summarizes_the_window() {
    let aggregator = sample_aggregator();

    let commerce = aggregator.commerce_activity(30).await;
    assert_eq!(
        commerce.get("window_days").and_then(serde_json::Value::as_i64),
        Some(30)
    );
    assert_eq!(commerce.get("orders").and_then(serde_json::Value::as_u64), Some(4));
    let revenue = commerce
        .get("revenue")
        .and_then(serde_json::Value::as_f64)
        .unwrap();
    assert!((revenue - 274.40).abs() < 0.001);

    // A wider window pulls in the older orders.
    let wider = aggregator.commerce_activity(60).await;
    assert_eq!(wider.get("orders").and_then(serde_json::Value::as_u64), Some(5));
}

#[tokio::test]
async fn test_non_positive_window_falls_back_to_the_default() {
    let aggregator = sample_aggregator();

    let defaulted = aggregator.commerce_activity(0).await;
    assert_eq!(
        defaulted.get("window_days").and_then(serde_json::Value::as_i64),
        Some(30)
    );

    let negative = aggregator.commerce_activity(-7).await;
    assert_eq!(
        negative.get("window_days").and_then(serde_json::Value::as_i64),
        Some(30)
    );
}

#[tokio::test]
async fn test_missing_storefront_hides_the_commerce_section() {
    common::init_test_logging();
    let aggregator = StatsAggregator::new(Arc::new(SampleContentStore::without_commerce()));

    assert!(aggregator.commerce_activity(30).await.is_empty());
}

#[tokio::test]
async fn test_broken_store_degrades_to_zeros() {
    common::init_test_logging();
    let aggregator = StatsAggregator::new(Arc::new(FailingStore));

    let totals = aggregator.totals().await;
    assert_eq!(totals.posts, 0);
    assert_eq!(totals.comments, 0);
    assert_eq!(totals.users, 0);

    let recent = aggregator.recent_activity().await;
    assert_eq!(recent.new_posts, 0);
    assert_eq!(recent.new_comments, 0);
    assert_eq!(recent.window_days, 30);

    assert!(aggregator.kind_totals().await.is_empty());
    assert!(aggregator.commerce_activity(30).await.is_empty());
}
