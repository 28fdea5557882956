// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Live user refresh tokens, keyed by `(username, token_id)`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{is_expired, unix_now};
use crate::storage::{composite_key, Backend, StoreError, StoreResult, Table};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTokenRecord {
    pub username: String,
    /// `jti` of the access token this refresh token belongs to.
    pub token_id: String,
    pub refresh_token: String,
    /// Unix seconds.
    pub expires_at: i64,
}

#[derive(Clone)]
pub struct UserTokenProvider {
    table: Arc<dyn Table<UserTokenRecord>>,
}

fn token_key(username: &str, token_id: &str) -> String {
    composite_key(&[username, token_id])
}

fn not_found(username: &str, token_id: &str) -> StoreError {
    StoreError::NotFound(format!("user token {username}/{token_id}"))
}

impl UserTokenProvider {
    pub fn new(backend: &Backend) -> StoreResult<Self> {
        Ok(Self {
            table: backend.table("user_tokens")?,
        })
    }

    pub fn add(&self, record: UserTokenRecord) -> StoreResult<()> {
        self.table
            .insert(&token_key(&record.username, &record.token_id), &record)
    }

    /// Expired rows read as absent and are dropped on the way.
    pub fn get(&self, username: &str, token_id: &str) -> StoreResult<UserTokenRecord> {
        let key = token_key(username, token_id);
        match self.table.get(&key)? {
            Some(record) if is_expired(record.expires_at, unix_now()) => {
                self.table.remove(&key)?;
                Err(not_found(username, token_id))
            }
            Some(record) => Ok(record),
            None => Err(not_found(username, token_id)),
        }
    }

    pub fn exists(&self, username: &str, token_id: &str) -> StoreResult<bool> {
        match self.get(username, token_id) {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn delete(&self, username: &str, token_id: &str) -> StoreResult<()> {
        self.table
            .remove(&token_key(username, token_id))?
            .map(|_| ())
            .ok_or_else(|| not_found(username, token_id))
    }

    /// Remove every row whose expiry lies before `now`.
    pub fn purge_expired(&self, now: i64) -> StoreResult<usize> {
        self.table
            .remove_where(&|record: &UserTokenRecord| is_expired(record.expires_at, now))
    }

    pub fn truncate(&self) -> StoreResult<()> {
        self.table.clear()
    }
}
