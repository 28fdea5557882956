// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory table backend.
//!
//! Rows live in a `BTreeMap` behind a single mutex per table. The lock is held
//! only for the duration of one operation. Used in tests and dev mode.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::{display_key, Record, StoreError, StoreResult, Table};

/// Process-local table.
pub struct MemoryTable<V> {
    name: &'static str,
    rows: Mutex<BTreeMap<String, V>>,
}

impl<V: Record> MemoryTable<V> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            rows: Mutex::new(BTreeMap::new()),
        }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, BTreeMap<String, V>>> {
        self.rows
            .lock()
            .map_err(|_| StoreError::Unavailable(format!("{} lock poisoned", self.name)))
    }

    fn describe(&self, key: &str) -> String {
        format!("{} {}", self.name, display_key(key))
    }
}

impl<V: Record> Table<V> for MemoryTable<V> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn insert(&self, key: &str, value: &V) -> StoreResult<()> {
        let mut rows = self.lock()?;
        if rows.contains_key(key) {
            return Err(StoreError::AlreadyExists(self.describe(key)));
        }
        rows.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn get(&self, key: &str) -> StoreResult<Option<V>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn replace(&self, key: &str, value: &V) -> StoreResult<()> {
        let mut rows = self.lock()?;
        match rows.get_mut(key) {
            Some(row) => {
                *row = value.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(self.describe(key))),
        }
    }

    fn remove(&self, key: &str) -> StoreResult<Option<V>> {
        Ok(self.lock()?.remove(key))
    }

    fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<V>> {
        let rows = self.lock()?;
        Ok(rows
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(_, value)| value.clone())
            .collect())
    }

    fn remove_where(&self, predicate: &dyn Fn(&V) -> bool) -> StoreResult<usize> {
        let mut rows = self.lock()?;
        let before = rows.len();
        rows.retain(|_, value| !predicate(value));
        Ok(before - rows.len())
    }

    fn clear(&self) -> StoreResult<()> {
        self.lock()?.clear();
        Ok(())
    }
}
