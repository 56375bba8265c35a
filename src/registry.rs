// ABOUTME: Static registry of the supported marketing tools
// ABOUTME: Maps tool identifiers to labels, kinds, and credential form fields
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pulseboard Contributors

//! # Tool Registry
//!
//! The set of supported integrations is closed and known at compile time:
//! one OAuth-style tool, one API-key-style tool, and one project-key-style
//! tool. The registry is a static table of descriptors; host code addresses
//! tools by their string identifiers and [`ToolId`] parses them.

use crate::errors::IntegrationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a registered marketing tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolId {
    /// Google Analytics, connected through an OAuth account grant.
    GoogleAnalytics,
    /// Mautic marketing automation, connected with an instance URL + API key.
    Mautic,
    /// Microsoft Clarity session analytics, connected with a project id + key.
    Clarity,
}

impl ToolId {
    /// Every registered tool, in registry order.
    pub const ALL: [Self; 3] = [Self::GoogleAnalytics, Self::Mautic, Self::Clarity];

    /// Stable string identifier used in storage keys and by host code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GoogleAnalytics => "google_analytics",
            Self::Mautic => "mautic",
            Self::Clarity => "clarity",
        }
    }

    /// Descriptor for this tool from the static registry.
    #[must_use]
    pub fn descriptor(self) -> &'static ToolDescriptor {
        match self {
            Self::GoogleAnalytics => &TOOLS[0],
            Self::Mautic => &TOOLS[1],
            Self::Clarity => &TOOLS[2],
        }
    }

    /// Connection kind for this tool.
    #[must_use]
    pub fn kind(self) -> ToolKind {
        self.descriptor().kind
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolId {
    type Err = IntegrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google_analytics" => Ok(Self::GoogleAnalytics),
            "mautic" => Ok(Self::Mautic),
            "clarity" => Ok(Self::Clarity),
            other => Err(IntegrationError::InvalidTool(other.to_owned())),
        }
    }
}

/// How a tool authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Authorization-code OAuth flow; credentials arrive via callback.
    OAuth,
    /// Endpoint URL plus a long-lived API key submitted in the admin form.
    ApiKey,
    /// Provider-issued project id and project key pair.
    ProjectKey,
}

impl ToolKind {
    /// Stable string form, matching the serialized representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OAuth => "oauth",
            Self::ApiKey => "api_key",
            Self::ProjectKey => "project_key",
        }
    }
}

/// Registry entry describing one tool's identity and connection shape.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    /// Tool identifier.
    pub id: ToolId,
    /// Human-readable name for cards and settings forms.
    pub label: &'static str,
    /// One-line description shown alongside the connect control.
    pub description: &'static str,
    /// Connection kind, which selects the connect flow.
    pub kind: ToolKind,
    /// Credential fields the settings form submits for this tool.
    ///
    /// Empty for OAuth tools, whose credentials arrive via the callback.
    pub credential_fields: &'static [&'static str],
    /// Provider authorization endpoint for OAuth tools.
    pub authorize_url: Option<&'static str>,
    /// OAuth scope requested at authorization, for OAuth tools.
    pub oauth_scope: Option<&'static str>,
}

/// The closed set of supported tools.
pub static TOOLS: [ToolDescriptor; 3] = [
    ToolDescriptor {
        id: ToolId::GoogleAnalytics,
        label: "Google Analytics",
        description: "Traffic and audience reporting, connected through a Google account.",
        kind: ToolKind::OAuth,
        credential_fields: &[],
        authorize_url: Some("https://accounts.google.com/o/oauth2/v2/auth"),
        oauth_scope: Some("https://www.googleapis.com/auth/analytics.readonly"),
    },
    ToolDescriptor {
        id: ToolId::Mautic,
        label: "Mautic",
        description: "Self-hosted marketing automation; contact and campaign summaries over its REST API.",
        kind: ToolKind::ApiKey,
        credential_fields: &["api_url", "api_key"],
        authorize_url: None,
        oauth_scope: None,
    },
    ToolDescriptor {
        id: ToolId::Clarity,
        label: "Microsoft Clarity",
        description: "Session analytics with heatmaps and user-behavior scoring.",
        kind: ToolKind::ProjectKey,
        credential_fields: &["project_id", "project_key"],
        authorize_url: None,
        oauth_scope: None,
    },
];

/// All registered tool descriptors, in display order.
#[must_use]
pub fn all_tools() -> &'static [ToolDescriptor] {
    &TOOLS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_ids_round_trip_through_strings() {
        for descriptor in all_tools() {
            let parsed: ToolId = descriptor.id.as_str().parse().unwrap();
            assert_eq!(parsed, descriptor.id);
        }
    }

    #[test]
    fn unknown_identifier_is_invalid_tool() {
        let err = "hubspot".parse::<ToolId>().unwrap_err();
        assert!(matches!(err, IntegrationError::InvalidTool(ref t) if t == "hubspot"));
    }

    #[test]
    fn descriptors_match_their_kinds() {
        assert_eq!(ToolId::GoogleAnalytics.kind(), ToolKind::OAuth);
        assert_eq!(ToolId::Mautic.kind(), ToolKind::ApiKey);
        assert_eq!(ToolId::Clarity.kind(), ToolKind::ProjectKey);
        assert!(ToolId::GoogleAnalytics.descriptor().authorize_url.is_some());
        assert!(ToolId::Clarity.descriptor().authorize_url.is_none());
    }
}
