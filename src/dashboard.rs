// ABOUTME: Assembles the full dashboard payload from stats and integrations
// ABOUTME: Presentation only; every read error degrades to an empty default
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pulseboard Contributors

//! # Dashboard Presenter
//!
//! Builds the single [`DashboardData`] document the admin screen renders
//! from: headline totals, recent activity, the per-kind table, commerce
//! figures, and one [`ToolCard`] per integration. Nothing here mutates
//! state, and nothing here fails; a backend hiccup turns into an empty
//! section and a log line.

use crate::constants::stats::COMMERCE_WINDOW_DAYS;
use crate::errors::IntegrationError;
use crate::manager::IntegrationManager;
use crate::models::{SummarySnapshot, ValidationState};
use crate::registry::{ToolId, ToolKind};
use crate::stats::{RecentActivity, SiteTotals, StatsAggregator};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// One integration's card on the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct ToolCard {
    /// Tool identifier, also the card's DOM anchor.
    pub id: ToolId,
    /// Human-readable tool name.
    pub label: &'static str,
    /// One-line description shown under the name.
    pub description: &'static str,
    /// Credential kind, for the card's connect form variant.
    pub kind: ToolKind,
    /// Whether the tool is connected and its last validation passed.
    pub connected: bool,
    /// Validation bookkeeping rendered as the card's status line.
    pub validation: ValidationState,
    /// Non-secret connection metadata (account email, masked key).
    pub metadata: BTreeMap<String, String>,
    /// Cached metrics summary; empty when nothing is cached.
    pub summary: SummarySnapshot,
}

/// Everything the dashboard screen renders, assembled in one pass.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardData {
    /// Headline site counts.
    pub totals: SiteTotals,
    /// Posts and comments over the trailing activity window.
    pub recent_activity: RecentActivity,
    /// Published count per content kind.
    pub kind_totals: BTreeMap<String, u64>,
    /// Commerce orders/revenue map; empty when the storefront is absent.
    pub commerce: serde_json::Map<String, serde_json::Value>,
    /// One card per registered integration, in display order.
    pub tools: Vec<ToolCard>,
}

impl DashboardData {
    /// One-line text rendering for the front-end shortcode.
    #[must_use]
    pub fn compact_summary(&self) -> String {
        let connected = self.tools.iter().filter(|card| card.connected).count();
        format!(
            "{} posts, {} comments, {} users; {} new posts in the last {} days; {} of {} tools connected",
            self.totals.posts,
            self.totals.comments,
            self.totals.users,
            self.recent_activity.new_posts,
            self.recent_activity.window_days,
            connected,
            self.tools.len()
        )
    }
}

/// Read-side facade over the aggregator and the integration manager.
pub struct DashboardPresenter {
    stats: StatsAggregator,
    manager: Arc<IntegrationManager>,
}

impl DashboardPresenter {
    /// Wires the presenter from its two read sources.
    #[must_use]
    pub fn new(stats: StatsAggregator, manager: Arc<IntegrationManager>) -> Self {
        Self { stats, manager }
    }

    /// Assemble the complete dashboard payload.
    pub async fn dashboard_data(&self) -> DashboardData {
        let totals = self.stats.totals().await;
        let recent_activity = self.stats.recent_activity().await;
        let kind_totals = self.stats.kind_totals().await;
        let commerce = self.stats.commerce_activity(COMMERCE_WINDOW_DAYS).await;

        let mut tools = Vec::with_capacity(self.manager.tools().len());
        for descriptor in self.manager.tools() {
            tools.push(self.tool_card(descriptor.id).await);
        }

        DashboardData {
            totals,
            recent_activity,
            kind_totals,
            commerce,
            tools,
        }
    }

    /// Build one integration card, reading state defensively.
    async fn tool_card(&self, id: ToolId) -> ToolCard {
        let tool = id.as_str();
        let descriptor = id.descriptor();

        let connected = match self.manager.is_connected(tool).await {
            Ok(connected) => connected,
            Err(e) => {
                warn!("Could not read connection state for {id}: {e}");
                false
            }
        };
        let validation = match self.manager.validation_state(tool).await {
            Ok(validation) => validation,
            Err(e) => {
                warn!("Could not read validation state for {id}: {e}");
                ValidationState::default()
            }
        };
        let metadata = match self.manager.connection_metadata(tool).await {
            Ok(metadata) => metadata,
            // Disconnected cards simply have no metadata to show.
            Err(IntegrationError::MissingConnection(_)) => BTreeMap::new(),
            Err(e) => {
                warn!("Could not read connection metadata for {id}: {e}");
                BTreeMap::new()
            }
        };
        let summary = match self.manager.cached_summary(tool).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!("Could not read cached summary for {id}: {e}");
                SummarySnapshot::default()
            }
        };

        ToolCard {
            id,
            label: descriptor.label,
            description: descriptor.description,
            kind: descriptor.kind,
            connected,
            validation,
            metadata,
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValidationStatus;
    use chrono::Utc;

    fn card(id: ToolId, connected: bool) -> ToolCard {
        let descriptor = id.descriptor();
        ToolCard {
            id,
            label: descriptor.label,
            description: descriptor.description,
            kind: descriptor.kind,
            connected,
            validation: if connected {
                ValidationState::succeeded(Utc::now())
            } else {
                ValidationState::default()
            },
            metadata: BTreeMap::new(),
            summary: SummarySnapshot::default(),
        }
    }

    #[test]
    fn compact_summary_reads_as_one_line() {
        let data = DashboardData {
            totals: SiteTotals {
                posts: 128,
                pages: 14,
                comments: 213,
                users: 17,
                categories: 9,
                tags: 42,
            },
            recent_activity: RecentActivity {
                window_days: 30,
                new_posts: 8,
                new_comments: 8,
            },
            kind_totals: BTreeMap::new(),
            commerce: serde_json::Map::new(),
            tools: vec![
                card(ToolId::GoogleAnalytics, false),
                card(ToolId::Mautic, true),
                card(ToolId::Clarity, true),
            ],
        };

        let summary = data.compact_summary();
        assert_eq!(
            summary,
            "128 posts, 213 comments, 17 users; 8 new posts in the last 30 days; 2 of 3 tools connected"
        );
        assert!(!summary.contains('\n'));
    }

    #[test]
    fn connected_cards_mirror_validation_status() {
        let card = card(ToolId::Clarity, true);
        assert_eq!(card.validation.status, ValidationStatus::Success);
        assert_eq!(card.kind, ToolKind::ProjectKey);
    }
}
