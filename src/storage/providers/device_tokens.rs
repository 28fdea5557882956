// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Live device refresh tokens, keyed by `(device_id, token_id)` and
//! indexed by the refresh token itself.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{is_expired, unix_now};
use crate::storage::{composite_key, Backend, StoreError, StoreResult, Table};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceTokenRecord {
    pub device_id: String,
    pub token_id: String,
    pub refresh_token: String,
    /// Unix seconds.
    pub expires_at: i64,
    pub organization_id: String,
    pub device_group_id: String,
}

#[derive(Clone)]
pub struct DeviceTokenProvider {
    tokens: Arc<dyn Table<DeviceTokenRecord>>,
    by_refresh_token: Arc<dyn Table<String>>,
}

fn token_key(device_id: &str, token_id: &str) -> String {
    composite_key(&[device_id, token_id])
}

fn not_found(device_id: &str, token_id: &str) -> StoreError {
    StoreError::NotFound(format!("device token {device_id}/{token_id}"))
}

impl DeviceTokenProvider {
    pub fn new(backend: &Backend) -> StoreResult<Self> {
        Ok(Self {
            tokens: backend.table("device_tokens")?,
            by_refresh_token: backend.table("device_refresh_tokens")?,
        })
    }

    pub fn add(&self, record: DeviceTokenRecord) -> StoreResult<()> {
        let key = token_key(&record.device_id, &record.token_id);
        self.tokens.insert(&key, &record)?;
        if let Err(e) = self.by_refresh_token.insert(&record.refresh_token, &key) {
            self.tokens.remove(&key)?;
            return Err(e);
        }
        Ok(())
    }

    pub fn get(&self, device_id: &str, token_id: &str) -> StoreResult<DeviceTokenRecord> {
        let record = self
            .tokens
            .get(&token_key(device_id, token_id))?
            .ok_or_else(|| not_found(device_id, token_id))?;
        if is_expired(record.expires_at, unix_now()) {
            self.drop_record(&record)?;
            return Err(not_found(device_id, token_id));
        }
        Ok(record)
    }

    /// Secondary lookup used during refresh.
    pub fn get_by_refresh_token(&self, refresh_token: &str) -> StoreResult<DeviceTokenRecord> {
        let key = self
            .by_refresh_token
            .get(refresh_token)?
            .ok_or_else(|| StoreError::NotFound("device refresh token".to_string()))?;
        let record = match self.tokens.get(&key)? {
            Some(record) => record,
            None => {
                // Dangling index entry left by a partial delete.
                self.by_refresh_token.remove(refresh_token)?;
                return Err(StoreError::NotFound("device refresh token".to_string()));
            }
        };
        if is_expired(record.expires_at, unix_now()) {
            self.drop_record(&record)?;
            return Err(StoreError::NotFound("device refresh token".to_string()));
        }
        Ok(record)
    }

    pub fn exists(&self, device_id: &str, token_id: &str) -> StoreResult<bool> {
        match self.get(device_id, token_id) {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn delete(&self, device_id: &str, token_id: &str) -> StoreResult<()> {
        let removed = self
            .tokens
            .remove(&token_key(device_id, token_id))?
            .ok_or_else(|| not_found(device_id, token_id))?;
        self.by_refresh_token.remove(&removed.refresh_token)?;
        Ok(())
    }

    pub fn purge_expired(&self, now: i64) -> StoreResult<usize> {
        let expired: Vec<DeviceTokenRecord> = self
            .tokens
            .scan_prefix("")?
            .into_iter()
            .filter(|record| is_expired(record.expires_at, now))
            .collect();
        for record in &expired {
            self.drop_record(record)?;
        }
        Ok(expired.len())
    }

    pub fn truncate(&self) -> StoreResult<()> {
        self.tokens.clear()?;
        self.by_refresh_token.clear()
    }

    fn drop_record(&self, record: &DeviceTokenRecord) -> StoreResult<()> {
        self.tokens
            .remove(&token_key(&record.device_id, &record.token_id))?;
        self.by_refresh_token.remove(&record.refresh_token)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::providers::test_backends;

    fn record(token_id: &str, refresh: &str, expires_at: i64) -> DeviceTokenRecord {
        DeviceTokenRecord {
            device_id: "dZ".to_string(),
            token_id: token_id.to_string(),
            refresh_token: refresh.to_string(),
            expires_at,
            organization_id: "orgX".to_string(),
            device_group_id: "gY".to_string(),
        }
    }

    #[test]
    fn lookup_by_refresh_token() {
        for (backend, _dir) in test_backends() {
            let provider = DeviceTokenProvider::new(&backend).unwrap();
            let live = record("t1", "r1", unix_now() + 3600);
            provider.add(live.clone()).unwrap();

            assert_eq!(provider.get_by_refresh_token("r1").unwrap(), live);
            assert_eq!(provider.get("dZ", "t1").unwrap(), live);
        }
    }

    #[test]
    fn delete_removes_the_index_entry() {
        for (backend, _dir) in test_backends() {
            let provider = DeviceTokenProvider::new(&backend).unwrap();
            provider
                .add(record("t1", "r1", unix_now() + 3600))
                .unwrap();
            provider.delete("dZ", "t1").unwrap();

            assert!(matches!(
                provider.get_by_refresh_token("r1"),
                Err(StoreError::NotFound(_))
            ));
        }
    }

    #[test]
    fn expired_record_is_not_found_either_way() {
        for (backend, _dir) in test_backends() {
            let provider = DeviceTokenProvider::new(&backend).unwrap();
            provider.add(record("t1", "r1", unix_now() - 5)).unwrap();

            assert!(matches!(
                provider.get_by_refresh_token("r1"),
                Err(StoreError::NotFound(_))
            ));
            assert!(!provider.exists("dZ", "t1").unwrap());
        }
    }

    #[test]
    fn purge_drops_expired_rows_and_index() {
        for (backend, _dir) in test_backends() {
            let provider = DeviceTokenProvider::new(&backend).unwrap();
            let now = unix_now();
            provider.add(record("old", "r-old", now - 5)).unwrap();
            provider.add(record("new", "r-new", now + 3600)).unwrap();

            assert_eq!(provider.purge_expired(now).unwrap(), 1);
            assert!(provider.get_by_refresh_token("r-new").is_ok());
            // Reusing the purged refresh token value is possible again.
            provider.add(record("again", "r-old", now + 3600)).unwrap();
        }
    }
}
