// ABOUTME: Read-only site statistics: content store contract plus aggregator
// ABOUTME: Store failures are logged and read as zero, never shown as errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pulseboard Contributors

//! # Site Statistics
//!
//! The dashboard's left half: counts pulled from the host content store
//! (posts, pages, comments, users, taxonomy terms, optional commerce
//! orders). The host side implements [`ContentStore`]; [`StatsAggregator`]
//! turns raw counts into the figures the cards and tables display.
//!
//! A statistics card must never take the whole dashboard down, so every
//! store failure here degrades to zero or an empty collection and a warning
//! in the log.

use crate::constants::stats::{ACTIVITY_WINDOW_DAYS, COMMERCE_WINDOW_DAYS};
use crate::models::CommerceActivity;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// Content kind identifier for blog posts.
const KIND_POST: &str = "post";
/// Content kind identifier for static pages.
const KIND_PAGE: &str = "page";
/// Taxonomy identifier for categories.
const TAXONOMY_CATEGORY: &str = "category";
/// Taxonomy identifier for tags.
const TAXONOMY_TAG: &str = "post_tag";

/// Read-only query surface the host content store exposes to the dashboard.
///
/// Implementations translate these calls onto whatever the host actually
/// stores content in. Counts for unknown kinds or taxonomies are `Ok(0)`,
/// not errors.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Published items of one content kind.
    async fn count_published(&self, kind: &str) -> anyhow::Result<u64>;

    /// Items of one content kind created at or after `since`.
    async fn count_created_since(&self, kind: &str, since: DateTime<Utc>)
        -> anyhow::Result<u64>;

    /// Approved comments created at or after `since`; all of them when `None`.
    async fn count_approved_comments_since(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> anyhow::Result<u64>;

    /// Terms in one taxonomy.
    async fn count_terms(&self, taxonomy: &str) -> anyhow::Result<u64>;

    /// Registered user accounts.
    async fn count_users(&self) -> anyhow::Result<u64>;

    /// Every content kind the host registers, for the per-kind totals table.
    async fn content_kinds(&self) -> anyhow::Result<Vec<String>>;

    /// Orders placed in the last `days` days, or `None` when the storefront
    /// extension is not installed or not readable by the current actor.
    async fn commerce_activity(&self, days: i64)
        -> anyhow::Result<Option<Vec<CommerceActivity>>>;
}

/// Headline counts for the dashboard cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteTotals {
    /// Published blog posts.
    pub posts: u64,
    /// Published static pages.
    pub pages: u64,
    /// Approved comments, all time.
    pub comments: u64,
    /// Registered users.
    pub users: u64,
    /// Category terms.
    pub categories: u64,
    /// Tag terms.
    pub tags: u64,
}

/// Recent publishing activity over a fixed trailing window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentActivity {
    /// Length of the trailing window in days.
    pub window_days: i64,
    /// Posts created inside the window.
    pub new_posts: u64,
    /// Approved comments created inside the window.
    pub new_comments: u64,
}

/// Turns raw [`ContentStore`] counts into dashboard figures.
///
/// Every accessor is infallible by contract: a failing store query is logged
/// and surfaces as zero (or an empty collection), matching how the host
/// renders a dashboard with a broken widget rather than no dashboard.
pub struct StatsAggregator {
    store: Arc<dyn ContentStore>,
}

impl StatsAggregator {
    /// Wraps a host content store.
    #[must_use]
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Headline counts for the overview cards.
    pub async fn totals(&self) -> SiteTotals {
        SiteTotals {
            posts: zero_on_error(
                "published posts",
                self.store.count_published(KIND_POST).await,
            ),
            pages: zero_on_error(
                "published pages",
                self.store.count_published(KIND_PAGE).await,
            ),
            comments: zero_on_error(
                "approved comments",
                self.store.count_approved_comments_since(None).await,
            ),
            users: zero_on_error("users", self.store.count_users().await),
            categories: zero_on_error(
                "category terms",
                self.store.count_terms(TAXONOMY_CATEGORY).await,
            ),
            tags: zero_on_error("tag terms", self.store.count_terms(TAXONOMY_TAG).await),
        }
    }

    /// New posts and approved comments over the trailing activity window.
    pub async fn recent_activity(&self) -> RecentActivity {
        let since = Utc::now() - Duration::days(ACTIVITY_WINDOW_DAYS);
        RecentActivity {
            window_days: ACTIVITY_WINDOW_DAYS,
            new_posts: zero_on_error(
                "recent posts",
                self.store.count_created_since(KIND_POST, since).await,
            ),
            new_comments: zero_on_error(
                "recent comments",
                self.store.count_approved_comments_since(Some(since)).await,
            ),
        }
    }

    /// Published count per registered content kind, for the totals table.
    pub async fn kind_totals(&self) -> BTreeMap<String, u64> {
        let kinds = match self.store.content_kinds().await {
            Ok(kinds) => kinds,
            Err(e) => {
                warn!("Stats query for content kinds failed, table will be empty: {e}");
                return BTreeMap::new();
            }
        };

        let mut totals = BTreeMap::new();
        for kind in kinds {
            let count = zero_on_error(&kind, self.store.count_published(&kind).await);
            totals.insert(kind, count);
        }
        totals
    }

    /// Order count and revenue over the last `days` days.
    ///
    /// Empty when the storefront extension is unavailable or the query
    /// fails; non-positive `days` falls back to the default window.
    pub async fn commerce_activity(&self, days: i64) -> serde_json::Map<String, serde_json::Value> {
        let window = if days > 0 { days } else { COMMERCE_WINDOW_DAYS };
        let orders = match self.store.commerce_activity(window).await {
            Ok(Some(orders)) => orders,
            Ok(None) => return serde_json::Map::new(),
            Err(e) => {
                warn!("Commerce activity query failed, hiding the section: {e}");
                return serde_json::Map::new();
            }
        };

        let revenue: f64 = orders.iter().map(|order| order.total).sum();
        let mut map = serde_json::Map::new();
        map.insert("window_days".to_owned(), json!(window));
        map.insert("orders".to_owned(), json!(orders.len()));
        map.insert("revenue".to_owned(), json!((revenue * 100.0).round() / 100.0));
        map
    }
}

/// Unwrap a count, logging and reading zero on failure.
fn zero_on_error(what: &str, result: anyhow::Result<u64>) -> u64 {
    match result {
        Ok(count) => count,
        Err(e) => {
            warn!("Stats query for {what} failed, reading as zero: {e}");
            0
        }
    }
}

/// Deterministic in-memory content store for demos and tests.
///
/// Holds a fixed snapshot of a modest site: some published content with
/// creation stamps spread over the last weeks, a handful of taxonomy terms,
/// and a few storefront orders. No query ever fails.
pub struct SampleContentStore {
    published: BTreeMap<String, u64>,
    created: BTreeMap<String, Vec<DateTime<Utc>>>,
    approved_comments_total: u64,
    comment_stamps: Vec<DateTime<Utc>>,
    terms: BTreeMap<String, u64>,
    users: u64,
    orders: Option<Vec<CommerceActivity>>,
}

impl SampleContentStore {
    /// Full fixture including storefront orders.
    #[must_use]
    pub fn new() -> Self {
        let mut published = BTreeMap::new();
        published.insert(KIND_POST.to_owned(), 128);
        published.insert(KIND_PAGE.to_owned(), 14);

        let mut created = BTreeMap::new();
        created.insert(
            KIND_POST.to_owned(),
            [1, 2, 4, 7, 11, 16, 22, 28, 35, 44].map(days_ago).to_vec(),
        );
        created.insert(KIND_PAGE.to_owned(), [9, 60].map(days_ago).to_vec());

        let mut terms = BTreeMap::new();
        terms.insert(TAXONOMY_CATEGORY.to_owned(), 9);
        terms.insert(TAXONOMY_TAG.to_owned(), 42);

        Self {
            published,
            created,
            approved_comments_total: 213,
            comment_stamps: [1, 1, 3, 5, 9, 14, 21, 27, 33].map(days_ago).to_vec(),
            terms,
            users: 17,
            orders: Some(vec![
                sample_order(1041, 49.90, "completed", 2),
                sample_order(1040, 120.00, "processing", 6),
                sample_order(1037, 15.50, "completed", 13),
                sample_order(1031, 89.00, "completed", 26),
                sample_order(1019, 230.00, "refunded", 40),
            ]),
        }
    }

    /// Same fixture with the storefront extension absent.
    #[must_use]
    pub fn without_commerce() -> Self {
        Self {
            orders: None,
            ..Self::new()
        }
    }
}

impl Default for SampleContentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for SampleContentStore {
    async fn count_published(&self, kind: &str) -> anyhow::Result<u64> {
        Ok(self.published.get(kind).copied().unwrap_or(0))
    }

    async fn count_created_since(
        &self,
        kind: &str,
        since: DateTime<Utc>,
    ) -> anyhow::Result<u64> {
        let stamps = self.created.get(kind).map(Vec::as_slice).unwrap_or(&[]);
        Ok(stamps.iter().filter(|stamp| **stamp >= since).count() as u64)
    }

    async fn count_approved_comments_since(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> anyhow::Result<u64> {
        match since {
            None => Ok(self.approved_comments_total),
            Some(since) => Ok(self
                .comment_stamps
                .iter()
                .filter(|stamp| **stamp >= since)
                .count() as u64),
        }
    }

    async fn count_terms(&self, taxonomy: &str) -> anyhow::Result<u64> {
        Ok(self.terms.get(taxonomy).copied().unwrap_or(0))
    }

    async fn count_users(&self) -> anyhow::Result<u64> {
        Ok(self.users)
    }

    async fn content_kinds(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.published.keys().cloned().collect())
    }

    async fn commerce_activity(
        &self,
        days: i64,
    ) -> anyhow::Result<Option<Vec<CommerceActivity>>> {
        let Some(orders) = &self.orders else {
            return Ok(None);
        };
        let cutoff = Utc::now() - Duration::days(days);
        Ok(Some(
            orders
                .iter()
                .filter(|order| order.placed_at >= cutoff)
                .cloned()
                .collect(),
        ))
    }
}

fn days_ago(days: i64) -> DateTime<Utc> {
    Utc::now() - Duration::days(days)
}

fn sample_order(order_id: u64, total: f64, status: &str, placed_days_ago: i64) -> CommerceActivity {
    CommerceActivity {
        order_id,
        total,
        status: status.to_owned(),
        placed_at: days_ago(placed_days_ago),
    }
}
