// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistence for credentials, roles, devices and token records.
//!
//! ## Layers
//!
//! - [`Table`] is the narrow keyed-table contract every backend honours.
//!   Two backends exist: [`memory::MemoryTable`] (process local, one mutex per
//!   table) and [`persistent::PersistentTable`] (embedded redb database).
//! - [`providers`] wrap typed tables into the entity providers used by the
//!   rest of the service (credentials, roles, device groups, devices, user
//!   tokens, device tokens, join tokens).
//! - [`sweeper::TtlSweeper`] purges expired token rows in the background.
//!
//! ## Keys
//!
//! Composite primary keys are joined with the ASCII unit separator (`0x1f`),
//! so a prefix scan over `organization_id` lists one tenant's entities.
//!
//! ## Guarantees
//!
//! - `insert` never overwrites, `replace` never creates.
//! - Operations are linearizable per key. Nothing spans two keys atomically.
//! - Values handed out are copies; callers cannot mutate stored state.

#[cfg(test)]
pub(crate) mod conformance;
pub mod error;
pub mod memory;
pub mod persistent;
pub mod providers;
pub mod sweeper;

use std::path::Path;
use std::sync::Arc;

use redb::Database;
use serde::{de::DeserializeOwned, Serialize};

pub use error::{StoreError, StoreResult};
pub use memory::MemoryTable;
pub use persistent::PersistentTable;
pub use providers::{
    BasicCredentials, CredentialsProvider, DeviceCredentials, DeviceGroupCredentials,
    DeviceGroupProvider, DeviceProvider, DeviceTokenProvider, DeviceTokenRecord, EditBasicCredentials,
    EditDeviceCredentials, EditDeviceGroupCredentials,
    JoinTokenProvider, JoinTokenRecord, Providers, Role, RoleProvider, UserTokenProvider,
    UserTokenRecord,
};
pub use sweeper::TtlSweeper;

/// Separator between the parts of a composite key.
pub(crate) const KEY_SEPARATOR: char = '\u{1f}';

/// Values a table can hold.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T> Record for T where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

/// Keyed table contract shared by the in-memory and persistent backends.
pub trait Table<V>: Send + Sync {
    /// Table name, used in error messages.
    fn name(&self) -> &'static str;

    /// Insert a new row. Fails with `AlreadyExists` if the key is present.
    fn insert(&self, key: &str, value: &V) -> StoreResult<()>;

    /// Read one row.
    fn get(&self, key: &str) -> StoreResult<Option<V>>;

    /// Overwrite an existing row. Fails with `NotFound` if the key is absent.
    fn replace(&self, key: &str, value: &V) -> StoreResult<()>;

    /// Remove one row, returning it if it was present.
    fn remove(&self, key: &str) -> StoreResult<Option<V>>;

    /// All rows whose key starts with `prefix`, in key order.
    fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<V>>;

    /// Remove every row matching `predicate`. Returns how many were removed.
    fn remove_where(&self, predicate: &dyn Fn(&V) -> bool) -> StoreResult<usize>;

    /// Remove every row.
    fn clear(&self) -> StoreResult<()>;
}

/// Storage backend selected at startup.
#[derive(Clone)]
pub enum Backend {
    /// Process-local tables; state is lost on restart.
    Memory,
    /// Embedded redb database.
    Persistent(Arc<Database>),
}

impl Backend {
    /// In-memory backend.
    pub fn memory() -> Self {
        Backend::Memory
    }

    /// Open (or create) the persistent database at `path`.
    pub fn open_persistent(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Unavailable(format!("{}: {e}", parent.display())))?;
        }
        let db = Database::create(path)?;
        tracing::info!(path = %path.display(), "opened persistent store");
        Ok(Backend::Persistent(Arc::new(db)))
    }

    /// Build a typed table on this backend.
    pub fn table<V: Record>(&self, name: &'static str) -> StoreResult<Arc<dyn Table<V>>> {
        match self {
            Backend::Memory => Ok(Arc::new(MemoryTable::<V>::new(name))),
            Backend::Persistent(db) => Ok(Arc::new(PersistentTable::<V>::open(db.clone(), name)?)),
        }
    }

    /// Backend name for logs and health reports.
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Memory => "memory",
            Backend::Persistent(_) => "persistent",
        }
    }

    /// Check the backend can serve a read.
    pub fn health_check(&self) -> StoreResult<()> {
        match self {
            Backend::Memory => Ok(()),
            Backend::Persistent(db) => persistent::probe(db),
        }
    }
}

/// Join key parts into a composite key.
pub(crate) fn composite_key(parts: &[&str]) -> String {
    let mut key = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            key.push(KEY_SEPARATOR);
        }
        key.push_str(part);
    }
    key
}

/// Prefix matching every key that starts with `parts`.
pub(crate) fn key_prefix(parts: &[&str]) -> String {
    let mut prefix = composite_key(parts);
    prefix.push(KEY_SEPARATOR);
    prefix
}

/// Human readable form of a composite key.
pub(crate) fn display_key(key: &str) -> String {
    key.replace(KEY_SEPARATOR, "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_key_joins_with_separator() {
        assert_eq!(composite_key(&["org1", "role1"]), "org1\u{1f}role1");
        assert_eq!(composite_key(&["alice"]), "alice");
        assert_eq!(key_prefix(&["org1"]), "org1\u{1f}");
        assert_eq!(display_key("org1\u{1f}role1"), "org1/role1");
    }

    #[test]
    fn prefix_does_not_match_longer_ids() {
        let prefix = key_prefix(&["org1"]);
        assert!(composite_key(&["org1", "x"]).starts_with(&prefix));
        assert!(!composite_key(&["org10", "x"]).starts_with(&prefix));
    }

    #[test]
    fn memory_backend_is_healthy() {
        let backend = Backend::memory();
        assert!(backend.health_check().is_ok());
        assert_eq!(backend.name(), "memory");
    }
}
