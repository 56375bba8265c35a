// ABOUTME: Credential store for tool connections over the option store
// ABOUTME: Reads migrate legacy record shapes transparently and persist the healed form
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pulseboard Contributors

//! # Connection Store
//!
//! One durable record per tool under `pulseboard:connection:{tool}`. Earlier
//! releases stored a bare token string, later ones a bare credential map;
//! [`ConnectionStore::get`] upgrades both into the structured
//! [`ConnectionRecord`] and writes the healed record back, so callers only
//! ever see the current shape. Credential *content* is never judged here;
//! that is the clients' job.

use crate::constants::keys;
use crate::models::ConnectionRecord;
use crate::registry::ToolId;
use crate::storage::factory::Storage;
use crate::storage::{OptionStore, StoreResult};
use chrono::Utc;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Durable store of per-tool connection records.
#[derive(Clone)]
pub struct ConnectionStore {
    storage: Storage,
}

impl ConnectionStore {
    /// Wrap the given storage backend.
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Read one tool's record, upgrading legacy shapes in place.
    ///
    /// Returns `None` when nothing is stored or the stored value is
    /// unrecognizable.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend fails.
    pub async fn get(&self, tool: ToolId) -> StoreResult<Option<ConnectionRecord>> {
        let key = keys::connection_option(tool);
        let Some(raw) = self.storage.get_option(&key).await? else {
            return Ok(None);
        };

        let Some((record, healed)) = upgrade_record(tool, raw) else {
            return Ok(None);
        };

        if healed {
            debug!("Migrated legacy connection record for {tool}");
            self.storage
                .update_option(&key, &serde_json::to_value(&record)?)
                .await?;
        }

        Ok(Some(record))
    }

    /// Create or replace one tool's record.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend fails.
    pub async fn put(&self, tool: ToolId, record: &ConnectionRecord) -> StoreResult<()> {
        let key = keys::connection_option(tool);
        self.storage
            .update_option(&key, &serde_json::to_value(record)?)
            .await
    }

    /// Delete one tool's record; returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend fails.
    pub async fn delete(&self, tool: ToolId) -> StoreResult<bool> {
        self.storage
            .delete_option(&keys::connection_option(tool))
            .await
    }
}

/// Upgrade whatever shape is stored into the current record.
///
/// Returns the record and whether anything had to change; `None` for values
/// no release ever wrote.
fn upgrade_record(tool: ToolId, raw: serde_json::Value) -> Option<(ConnectionRecord, bool)> {
    match raw {
        // Oldest shape: a bare access token string.
        serde_json::Value::String(token) => {
            let mut credentials = BTreeMap::new();
            credentials.insert("access_token".to_owned(), token);
            let record = ConnectionRecord::new(credentials, Utc::now());
            Some((record, true))
        }
        serde_json::Value::Object(map) => {
            if map.contains_key("credentials") {
                upgrade_structured(tool, map)
            } else {
                // Interim shape: the credential fields stored as a bare map.
                let credentials: BTreeMap<String, String> = map
                    .into_iter()
                    .filter_map(|(field, value)| {
                        value.as_str().map(|v| (field, v.to_owned()))
                    })
                    .collect();
                let record = ConnectionRecord::new(credentials, Utc::now());
                Some((record, true))
            }
        }
        other => {
            warn!(
                "Ignoring unrecognizable stored connection for {tool}: {}",
                summary_of(&other)
            );
            None
        }
    }
}

/// Deserialize a structured record, backfilling fields older writers omitted.
fn upgrade_structured(
    tool: ToolId,
    map: serde_json::Map<String, serde_json::Value>,
) -> Option<(ConnectionRecord, bool)> {
    let mut healed = !map.contains_key("metadata") || !map.contains_key("validation");

    let mut record: ConnectionRecord = match serde_json::from_value(serde_json::Value::Object(map))
    {
        Ok(record) => record,
        Err(e) => {
            warn!("Ignoring undecodable stored connection for {tool}: {e}");
            return None;
        }
    };

    if record.stored_at.is_none() {
        record.stored_at = Some(Utc::now());
        healed = true;
    }

    Some((record, healed))
}

fn summary_of(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
