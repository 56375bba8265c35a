// ABOUTME: Main library entry point for the Pulseboard analytics dashboard
// ABOUTME: Integration manager, site stats, and the dashboard presentation layer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pulseboard Contributors

#![deny(unsafe_code)]

//! # Pulseboard
//!
//! An admin-area analytics dashboard engine for CMS hosts. Pulseboard
//! aggregates content counts from the host (posts, pages, comments, users,
//! taxonomies, optional storefront orders) and manages a small set of
//! third-party marketing tool connections whose metrics are fetched on a
//! schedule and cached for display.
//!
//! ## Features
//!
//! - **Integration manager**: connect, validate, and disconnect marketing
//!   tools over OAuth, API-key, and project-key credential flows
//! - **Summary cache**: per-tool metric snapshots with a 30-minute TTL
//! - **Background sync**: lock-guarded best-effort refresh across all tools
//! - **Site statistics**: read-only aggregation that never errors the page
//! - **Pluggable storage**: in-memory and Redis key-value backends
//!
//! ## Architecture
//!
//! - **Registry**: the closed set of supported tools and their descriptors
//! - **Connectors**: one client per tool behind a shared capability trait
//! - **Storage**: option (durable) and transient (TTL) store abstractions
//! - **Manager**: connect/disconnect/OAuth/sync orchestration
//! - **Dashboard**: assembles the render payload from stats and manager
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use pulseboard::config::AppConfig;
//! use pulseboard::manager::IntegrationManager;
//! use pulseboard::scheduler::TokioScheduler;
//! use pulseboard::storage::factory::Storage;
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::from_env();
//!     let storage = Storage::from_config(&config.storage).await?;
//!     let (scheduler, _requests) = TokioScheduler::channel(8);
//!     let manager = IntegrationManager::new(storage, Arc::new(scheduler), &config);
//!
//!     let mut credentials = BTreeMap::new();
//!     credentials.insert("project_id".to_owned(), "proj123".to_owned());
//!     credentials.insert("project_key".to_owned(), "abcdef123456".to_owned());
//!     let outcome = manager.connect_tool("clarity", credentials).await?;
//!     println!("connect outcome: {outcome:?}");
//!     Ok(())
//! }
//! ```

/// Capability-checked gateway in front of mutating operations
pub mod admin;

/// Configuration loaded from the environment
pub mod config;

/// Credential store with lazy legacy-record migration
pub mod connections;

/// Tool clients behind a shared capability trait
pub mod connectors;

/// Application constants: TTLs, key names, limits, schedules
pub mod constants;

/// Dashboard payload assembly for cards, tables, and the shortcode
pub mod dashboard;

/// Error taxonomy for integration flows and storage backends
pub mod errors;

/// Production logging and structured output
pub mod logging;

/// Integration manager orchestrating connect, OAuth, and sync
pub mod manager;

/// Shared data model for connections, summaries, and sync state
pub mod models;

/// The closed registry of supported tools
pub mod registry;

/// Scheduler abstraction and the Tokio-backed implementation
pub mod scheduler;

/// Site statistics aggregation over the host content store
pub mod stats;

/// Option and transient store abstractions with pluggable backends
pub mod storage;

/// Per-tool summary cache with TTL expiry
pub mod summaries;
