// ABOUTME: End-to-end demo wiring for the Pulseboard dashboard engine
// ABOUTME: Connects the sample tools, runs a sync pass, and prints the dashboard
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pulseboard Contributors

//! Demo runner for the Pulseboard dashboard engine.
//!
//! Wires the full stack the way a host would: storage backend, scheduler,
//! integration manager, background sync worker, capability gate, and the
//! dashboard presenter. Then it walks every connect flow (including a failed
//! validation and a simulated OAuth round trip), runs one sync pass, and
//! prints the assembled dashboard.
//!
//! Usage:
//! ```bash
//! # In-memory storage, text output
//! cargo run --bin pulseboard-demo
//!
//! # Redis storage, full dashboard payload as JSON
//! REDIS_URL=redis://localhost:6379 cargo run --bin pulseboard-demo -- --storage redis --json
//! ```

use anyhow::Result;
use clap::Parser;
use pulseboard::{
    admin::{AdminGateway, AllowAll},
    config::{AppConfig, StorageBackend},
    dashboard::DashboardPresenter,
    logging,
    manager::IntegrationManager,
    models::ConnectOutcome,
    scheduler::{SyncWorker, TokioScheduler},
    stats::{SampleContentStore, StatsAggregator},
    storage::factory::Storage,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "pulseboard-demo")]
#[command(about = "Pulseboard - dashboard engine demo with sample integrations")]
pub struct Args {
    /// Storage backend override: memory or redis
    #[arg(long)]
    storage: Option<String>,

    /// Print the full dashboard payload as JSON instead of text
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = AppConfig::from_env();
    if let Some(backend) = &args.storage {
        config.storage.backend = StorageBackend::from_str_or_default(backend);
    }
    info!("Starting Pulseboard demo");
    info!("{}", config.summary());

    let storage = Storage::from_config(&config.storage).await?;
    storage.health_check().await?;
    info!("Storage initialized: {}", storage.backend_info());

    let (scheduler, requests) = TokioScheduler::channel(16);
    let manager = Arc::new(IntegrationManager::new(
        storage,
        Arc::new(scheduler),
        &config,
    ));

    // Background worker drains scheduler requests for the process lifetime.
    tokio::spawn(SyncWorker::new(requests, Arc::clone(&manager)).run());
    manager.ensure_sync_schedule().await;

    let gateway = AdminGateway::new(Arc::clone(&manager), Arc::new(AllowAll));
    run_connect_flows(&gateway).await?;

    // Run a pass directly instead of waiting out the scheduler's delay.
    let outcome = manager.run_sync().await?;
    info!(
        "Sync pass: {} refreshed, {} skipped",
        outcome.refreshed.len(),
        outcome.skipped.len()
    );

    let stats = StatsAggregator::new(Arc::new(SampleContentStore::new()));
    let presenter = DashboardPresenter::new(stats, Arc::clone(&manager));
    let data = presenter.dashboard_data().await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        print_dashboard(&data);
    }

    Ok(())
}

/// Walk every connect flow: failed validation, recovery, and OAuth.
async fn run_connect_flows(gateway: &AdminGateway) -> Result<()> {
    // Project-key tool connects in one step.
    connect(
        gateway,
        "clarity",
        &[("project_id", "proj123"), ("project_key", "abcdef123456")],
    )
    .await?;

    // A plain-http endpoint passes the shape check but fails validation;
    // the record is stored with the failure for the card to display.
    connect(
        gateway,
        "mautic",
        &[
            ("api_url", "http://marketing.example.com/api"),
            ("api_key", "0123456789012345"),
        ],
    )
    .await?;

    // Reconnecting with a proper endpoint recovers.
    connect(
        gateway,
        "mautic",
        &[
            ("api_url", "https://marketing.example.com/api"),
            ("api_key", "m4ut1c-demo-key-0123456789abcdef"),
        ],
    )
    .await?;

    // OAuth: authorize, then simulate the provider redirecting back.
    let outcome = gateway
        .connect_tool("google_analytics", BTreeMap::new())
        .await?;
    match outcome {
        ConnectOutcome::AuthorizationRequired {
            authorization_url,
            state,
        } => {
            info!("google_analytics authorization URL: {authorization_url}");
            let validation = gateway
                .handle_oauth_callback("google_analytics", "demo-authorization-code", &state)
                .await?;
            info!(
                "google_analytics connected, validation status: {:?}",
                validation.status
            );
        }
        ConnectOutcome::Connected(validation) => {
            warn!(
                "Expected an authorization URL, got immediate connect: {:?}",
                validation.status
            );
        }
    }

    Ok(())
}

async fn connect(gateway: &AdminGateway, tool: &str, pairs: &[(&str, &str)]) -> Result<()> {
    let credentials = pairs
        .iter()
        .map(|(field, value)| ((*field).to_owned(), (*value).to_owned()))
        .collect();
    match gateway.connect_tool(tool, credentials).await? {
        ConnectOutcome::Connected(validation) => {
            if validation.is_success() {
                info!("{tool} connected");
            } else {
                info!("{tool} stored with failed validation: {}", validation.message);
            }
        }
        ConnectOutcome::AuthorizationRequired { .. } => {
            warn!("{tool} unexpectedly asked for OAuth authorization");
        }
    }
    Ok(())
}

fn print_dashboard(data: &pulseboard::dashboard::DashboardData) {
    info!(
        "Site totals: {} posts, {} pages, {} comments, {} users, {} categories, {} tags",
        data.totals.posts,
        data.totals.pages,
        data.totals.comments,
        data.totals.users,
        data.totals.categories,
        data.totals.tags
    );
    info!(
        "Last {} days: {} new posts, {} new comments",
        data.recent_activity.window_days,
        data.recent_activity.new_posts,
        data.recent_activity.new_comments
    );
    for (kind, count) in &data.kind_totals {
        info!("  {kind}: {count} published");
    }
    if data.commerce.is_empty() {
        info!("Commerce: storefront not available");
    } else {
        info!(
            "Commerce: {} orders, revenue {}",
            data.commerce
                .get("orders")
                .and_then(serde_json::Value::as_u64)
                .unwrap_or(0),
            data.commerce
                .get("revenue")
                .and_then(serde_json::Value::as_f64)
                .unwrap_or(0.0)
        );
    }
    for card in &data.tools {
        info!(
            "  [{}] {} - connected: {}, validation: {:?}, cached metrics: {}",
            card.id,
            card.label,
            card.connected,
            card.validation.status,
            card.summary.data.len()
        );
    }

    println!("{}", data.compact_summary());
}
