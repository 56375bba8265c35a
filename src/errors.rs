// ABOUTME: Error types for integration management and the storage layer
// ABOUTME: Expected failures are values the caller renders, never panics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pulseboard Contributors

//! # Error Handling
//!
//! Expected failure paths (unknown tool, bad credentials, failed validation)
//! surface as [`IntegrationError`] values so the admin UI can render them as
//! notices. Infrastructure failures from the backing stores are a separate
//! [`StoreError`] wrapped into the integration taxonomy, keeping the
//! user-facing variants clean.

use crate::registry::ToolId;
use thiserror::Error;

/// Result alias for integration-manager operations.
pub type IntegrationResult<T> = Result<T, IntegrationError>;

/// Errors surfaced by connect/disconnect/sync flows and the tool clients.
///
/// Every variant's `Display` output is suitable for rendering directly as an
/// admin notice; client validation failures are persisted verbatim as the
/// connection record's `validation.message`.
#[derive(Debug, Error)]
pub enum IntegrationError {
    /// The supplied identifier does not name a registered tool.
    #[error("unknown integration tool: {0}")]
    InvalidTool(String),

    /// Submitted credential fields failed the client's shape validation.
    #[error("the submitted credentials are incomplete or malformed")]
    InvalidCredentials,

    /// An API endpoint URL was given over plain http.
    #[error("the API URL must use https")]
    InsecureUrl,

    /// A project key does not match the provider's expected format.
    #[error("the project key does not match the expected format")]
    InvalidKeyFormat,

    /// OAuth access or refresh token is absent from the stored credentials.
    #[error("OAuth tokens are missing; reconnect the account")]
    MissingTokens,

    /// Connectivity validation failed for a reason the client reported.
    #[error("connection validation failed: {0}")]
    ValidationFailed(String),

    /// A registered tool resolved to no client implementation.
    ///
    /// Only reachable through an inconsistent registry edit; surfaced as a
    /// value rather than a panic so a misconfigured build degrades to a
    /// rendered notice.
    #[error("no client implementation registered for tool: {0}")]
    MissingClientClass(ToolId),

    /// An operation required a stored connection that does not exist.
    #[error("no stored connection for tool: {0}")]
    MissingConnection(ToolId),

    /// OAuth callback arrived without a code or state parameter.
    #[error("missing authorization code or state parameter")]
    InvalidOAuthParams,

    /// OAuth state nonce was absent, expired, already used, or bound to a
    /// different tool.
    #[error("OAuth state did not match; restart the authorization flow")]
    OAuthStateMismatch,

    /// The backing option or transient store failed.
    #[error("storage backend error: {0}")]
    Store(#[from] StoreError),
}

/// Errors from the key-value storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend rejected or failed the operation.
    #[error("{0}")]
    Backend(String),

    /// A value could not be serialized or deserialized.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A transient invalidation pattern did not parse as a glob.
    #[error("invalid key pattern '{0}'")]
    InvalidPattern(String),

    /// The backend is unreachable.
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integration_errors_render_as_notices() {
        assert_eq!(
            IntegrationError::InvalidTool("hubspot".into()).to_string(),
            "unknown integration tool: hubspot"
        );
        assert_eq!(
            IntegrationError::InsecureUrl.to_string(),
            "the API URL must use https"
        );
        assert_eq!(
            IntegrationError::ValidationFailed("endpoint returned 503".into()).to_string(),
            "connection validation failed: endpoint returned 503"
        );
    }

    #[test]
    fn store_errors_wrap_into_integration_errors() {
        let err = IntegrationError::from(StoreError::Unavailable("redis down".into()));
        assert!(matches!(err, IntegrationError::Store(_)));
        assert!(err.to_string().contains("redis down"));
    }
}
