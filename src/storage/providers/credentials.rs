// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Basic (username + password) credentials.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::storage::{Backend, StoreError, StoreResult, Table};

/// One row per user. `username` is the primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicCredentials {
    pub username: String,
    /// Adaptive salted hash in PHC string form.
    pub password_hash: String,
    pub role_id: String,
    pub organization_id: String,
}

/// Narrow mutation of a credential row.
#[derive(Debug, Clone, Default)]
pub struct EditBasicCredentials {
    pub password_hash: Option<String>,
    pub role_id: Option<String>,
}

impl EditBasicCredentials {
    pub fn with_password_hash(mut self, hash: impl Into<String>) -> Self {
        self.password_hash = Some(hash.into());
        self
    }

    pub fn with_role_id(mut self, role_id: impl Into<String>) -> Self {
        self.role_id = Some(role_id.into());
        self
    }

    fn apply(self, credentials: &mut BasicCredentials) {
        if let Some(hash) = self.password_hash {
            credentials.password_hash = hash;
        }
        if let Some(role_id) = self.role_id {
            credentials.role_id = role_id;
        }
    }
}

#[derive(Clone)]
pub struct CredentialsProvider {
    table: Arc<dyn Table<BasicCredentials>>,
}

impl CredentialsProvider {
    pub fn new(backend: &Backend) -> StoreResult<Self> {
        Ok(Self {
            table: backend.table("credentials")?,
        })
    }

    pub fn add(&self, credentials: BasicCredentials) -> StoreResult<()> {
        self.table.insert(&credentials.username, &credentials)
    }

    pub fn get(&self, username: &str) -> StoreResult<BasicCredentials> {
        self.table
            .get(username)?
            .ok_or_else(|| StoreError::NotFound(format!("credentials {username}")))
    }

    pub fn exists(&self, username: &str) -> StoreResult<bool> {
        Ok(self.table.get(username)?.is_some())
    }

    pub fn edit(&self, username: &str, edit: EditBasicCredentials) -> StoreResult<()> {
        let mut credentials = self.get(username)?;
        edit.apply(&mut credentials);
        self.table.replace(username, &credentials)
    }

    pub fn delete(&self, username: &str) -> StoreResult<()> {
        self.table
            .remove(username)?
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("credentials {username}")))
    }

    /// Every credential of an organization.
    pub fn list(&self, organization_id: &str) -> StoreResult<Vec<BasicCredentials>> {
        Ok(self
            .table
            .scan_prefix("")?
            .into_iter()
            .filter(|c| c.organization_id == organization_id)
            .collect())
    }

    pub fn truncate(&self) -> StoreResult<()> {
        self.table.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::providers::test_backends;

    fn alice() -> BasicCredentials {
        BasicCredentials {
            username: "alice".to_string(),
            password_hash: "hash".to_string(),
            role_id: "role1".to_string(),
            organization_id: "org1".to_string(),
        }
    }

    #[test]
    fn add_get_edit_delete() {
        for (backend, _dir) in test_backends() {
            let provider = CredentialsProvider::new(&backend).unwrap();

            provider.add(alice()).unwrap();
            assert!(provider.exists("alice").unwrap());
            assert_eq!(provider.get("alice").unwrap(), alice());

            provider
                .edit(
                    "alice",
                    EditBasicCredentials::default()
                        .with_role_id("role2")
                        .with_password_hash("hash2"),
                )
                .unwrap();
            let edited = provider.get("alice").unwrap();
            assert_eq!(edited.role_id, "role2");
            assert_eq!(edited.password_hash, "hash2");

            provider.delete("alice").unwrap();
            assert!(!provider.exists("alice").unwrap());
            assert!(matches!(provider.delete("alice"), Err(StoreError::NotFound(_))));
        }
    }

    #[test]
    fn duplicate_username_is_rejected() {
        for (backend, _dir) in test_backends() {
            let provider = CredentialsProvider::new(&backend).unwrap();
            provider.add(alice()).unwrap();
            assert!(matches!(provider.add(alice()), Err(StoreError::AlreadyExists(_))));
        }
    }

    #[test]
    fn missing_credentials_are_not_found() {
        for (backend, _dir) in test_backends() {
            let provider = CredentialsProvider::new(&backend).unwrap();
            assert!(matches!(provider.get("bob"), Err(StoreError::NotFound(_))));
            assert!(matches!(
                provider.edit("bob", EditBasicCredentials::default()),
                Err(StoreError::NotFound(_))
            ));
        }
    }

    #[test]
    fn list_filters_by_organization() {
        for (backend, _dir) in test_backends() {
            let provider = CredentialsProvider::new(&backend).unwrap();
            provider.add(alice()).unwrap();
            provider
                .add(BasicCredentials {
                    username: "bob".to_string(),
                    organization_id: "org2".to_string(),
                    ..alice()
                })
                .unwrap();

            let org1 = provider.list("org1").unwrap();
            assert_eq!(org1.len(), 1);
            assert_eq!(org1[0].username, "alice");
        }
    }
}
