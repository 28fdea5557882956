// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Persistent table backend on an embedded redb database (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! One redb table per entity, `composite key → JSON bytes`:
//!
//! - `credentials`: username
//! - `roles`: organization_id | role_id
//! - `device_groups`: organization_id | device_group_id
//! - `device_group_api_keys`: api key → composite group key
//! - `devices`: organization_id | device_group_id | device_id
//! - `device_api_keys`: api key → composite device key
//! - `user_tokens`: username | token_id
//! - `device_tokens`: device_id | token_id
//! - `device_refresh_tokens`: refresh token → composite token key
//! - `join_tokens`: organization_id | token_id

use std::marker::PhantomData;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use super::{display_key, Record, StoreError, StoreResult, Table};

type RawTable = TableDefinition<'static, &'static str, &'static [u8]>;

/// Typed view of one redb table.
pub struct PersistentTable<V> {
    db: Arc<Database>,
    name: &'static str,
    definition: RawTable,
    _marker: PhantomData<fn() -> V>,
}

impl<V: Record> PersistentTable<V> {
    /// Open the table, creating it on first use so later read transactions
    /// don't fail.
    pub fn open(db: Arc<Database>, name: &'static str) -> StoreResult<Self> {
        let definition: RawTable = TableDefinition::new(name);
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(definition)?;
        }
        write_txn.commit()?;

        Ok(Self {
            db,
            name,
            definition,
            _marker: PhantomData,
        })
    }

    fn describe(&self, key: &str) -> String {
        format!("{} {}", self.name, display_key(key))
    }
}

impl<V: Record> Table<V> for PersistentTable<V> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn insert(&self, key: &str, value: &V) -> StoreResult<()> {
        let json = serde_json::to_vec(value)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(self.definition)?;
            if table.get(key)?.is_some() {
                return Err(StoreError::AlreadyExists(self.describe(key)));
            }
            table.insert(key, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn get(&self, key: &str) -> StoreResult<Option<V>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(self.definition)?;
        match table.get(key)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn replace(&self, key: &str, value: &V) -> StoreResult<()> {
        let json = serde_json::to_vec(value)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(self.definition)?;
            if table.get(key)?.is_none() {
                return Err(StoreError::NotFound(self.describe(key)));
            }
            table.insert(key, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<Option<V>> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(self.definition)?;
            let old = table.remove(key)?;
            match old {
                Some(guard) => Some(serde_json::from_slice::<V>(guard.value())?),
                None => None,
            }
        };
        write_txn.commit()?;
        Ok(removed)
    }

    fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<V>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(self.definition)?;

        let mut values = Vec::new();
        for entry in table.range(prefix..)? {
            let (key, value) = entry?;
            if !key.value().starts_with(prefix) {
                break;
            }
            values.push(serde_json::from_slice(value.value())?);
        }
        Ok(values)
    }

    fn remove_where(&self, predicate: &dyn Fn(&V) -> bool) -> StoreResult<usize> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(self.definition)?;

            let mut doomed = Vec::new();
            for entry in table.iter()? {
                let (key, value) = entry?;
                match serde_json::from_slice::<V>(value.value()) {
                    Ok(row) if predicate(&row) => doomed.push(key.value().to_string()),
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(
                            table = self.name,
                            key = %display_key(key.value()),
                            error = %e,
                            "Skipping undecodable row"
                        );
                    }
                }
            }

            for key in &doomed {
                table.remove(key.as_str())?;
            }
            doomed.len()
        };
        write_txn.commit()?;
        Ok(removed)
    }

    fn clear(&self) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(self.definition)?;
            let mut keys = Vec::new();
            for entry in table.iter()? {
                let (key, _) = entry?;
                keys.push(key.value().to_string());
            }
            for key in &keys {
                table.remove(key.as_str())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }
}

/// Read probe used by health checks.
pub(crate) fn probe(db: &Database) -> StoreResult<()> {
    let _ = db.begin_read()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::conformance;
    use tempfile::TempDir;

    fn open_db() -> (Arc<Database>, TempDir) {
        let dir = TempDir::new().expect("temp dir");
        let db = Database::create(dir.path().join("authx.redb")).expect("create db");
        (Arc::new(db), dir)
    }

    #[test]
    fn persistent_table_honours_the_table_contract() {
        let (db, _dir) = open_db();
        let table = PersistentTable::<conformance::Sample>::open(db, "samples").unwrap();
        conformance::exercise(&table);
    }

    #[test]
    fn rows_survive_reopening_the_table() {
        let (db, _dir) = open_db();
        {
            let table = PersistentTable::<conformance::Sample>::open(db.clone(), "samples").unwrap();
            table
                .insert("k", &conformance::Sample::new("k", 7))
                .unwrap();
        }
        let table = PersistentTable::<conformance::Sample>::open(db, "samples").unwrap();
        assert_eq!(
            table.get("k").unwrap(),
            Some(conformance::Sample::new("k", 7))
        );
    }

    #[test]
    fn tables_are_isolated_by_name() {
        let (db, _dir) = open_db();
        let a = PersistentTable::<conformance::Sample>::open(db.clone(), "a").unwrap();
        let b = PersistentTable::<conformance::Sample>::open(db, "b").unwrap();
        a.insert("k", &conformance::Sample::new("k", 1)).unwrap();
        assert_eq!(b.get("k").unwrap(), None);
    }

    #[test]
    fn probe_reads_the_database() {
        let (db, _dir) = open_db();
        assert!(probe(&db).is_ok());
    }
}
