// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Edge-controller join tokens, keyed by `(organization_id, token_id)`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{is_expired, unix_now};
use crate::storage::{composite_key, key_prefix, Backend, StoreError, StoreResult, Table};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinTokenRecord {
    pub organization_id: String,
    pub token_id: String,
    /// Unix seconds.
    pub expires_at: i64,
}

#[derive(Clone)]
pub struct JoinTokenProvider {
    table: Arc<dyn Table<JoinTokenRecord>>,
}

fn token_key(organization_id: &str, token_id: &str) -> String {
    composite_key(&[organization_id, token_id])
}

fn not_found(organization_id: &str, token_id: &str) -> StoreError {
    StoreError::NotFound(format!("join token {organization_id}/{token_id}"))
}

impl JoinTokenProvider {
    pub fn new(backend: &Backend) -> StoreResult<Self> {
        Ok(Self {
            table: backend.table("join_tokens")?,
        })
    }

    pub fn add(&self, record: JoinTokenRecord) -> StoreResult<()> {
        self.table
            .insert(&token_key(&record.organization_id, &record.token_id), &record)
    }

    pub fn get(&self, organization_id: &str, token_id: &str) -> StoreResult<JoinTokenRecord> {
        let key = token_key(organization_id, token_id);
        match self.table.get(&key)? {
            Some(record) if is_expired(record.expires_at, unix_now()) => {
                self.table.remove(&key)?;
                Err(not_found(organization_id, token_id))
            }
            Some(record) => Ok(record),
            None => Err(not_found(organization_id, token_id)),
        }
    }

    pub fn exists(&self, organization_id: &str, token_id: &str) -> StoreResult<bool> {
        match self.get(organization_id, token_id) {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn delete(&self, organization_id: &str, token_id: &str) -> StoreResult<()> {
        self.table
            .remove(&token_key(organization_id, token_id))?
            .map(|_| ())
            .ok_or_else(|| not_found(organization_id, token_id))
    }

    /// Live join tokens of one organization.
    pub fn list(&self, organization_id: &str) -> StoreResult<Vec<JoinTokenRecord>> {
        let now = unix_now();
        Ok(self
            .table
            .scan_prefix(&key_prefix(&[organization_id]))?
            .into_iter()
            .filter(|record| !is_expired(record.expires_at, now))
            .collect())
    }

    pub fn purge_expired(&self, now: i64) -> StoreResult<usize> {
        self.table
            .remove_where(&|record: &JoinTokenRecord| is_expired(record.expires_at, now))
    }

    pub fn truncate(&self) -> StoreResult<()> {
        self.table.clear()
    }
}
