// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Roles: named bundles of primitives scoped to one organization.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Primitive;
use crate::storage::{composite_key, key_prefix, Backend, StoreError, StoreResult, Table};

/// Role keyed by `(organization_id, role_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Role {
    pub organization_id: String,
    pub role_id: String,
    pub name: String,
    /// Internal roles are reserved for platform services.
    #[serde(default)]
    pub internal: bool,
    pub primitives: Vec<Primitive>,
}

/// Narrow mutation of a role.
#[derive(Debug, Clone, Default)]
pub struct EditRole {
    pub name: Option<String>,
    pub primitives: Option<Vec<Primitive>>,
}

#[derive(Clone)]
pub struct RoleProvider {
    table: Arc<dyn Table<Role>>,
}

fn role_key(organization_id: &str, role_id: &str) -> String {
    composite_key(&[organization_id, role_id])
}

fn not_found(organization_id: &str, role_id: &str) -> StoreError {
    StoreError::NotFound(format!("role {organization_id}/{role_id}"))
}

impl RoleProvider {
    pub fn new(backend: &Backend) -> StoreResult<Self> {
        Ok(Self {
            table: backend.table("roles")?,
        })
    }

    pub fn add(&self, role: Role) -> StoreResult<()> {
        self.table
            .insert(&role_key(&role.organization_id, &role.role_id), &role)
    }

    pub fn get(&self, organization_id: &str, role_id: &str) -> StoreResult<Role> {
        self.table
            .get(&role_key(organization_id, role_id))?
            .ok_or_else(|| not_found(organization_id, role_id))
    }

    pub fn exists(&self, organization_id: &str, role_id: &str) -> StoreResult<bool> {
        Ok(self.table.get(&role_key(organization_id, role_id))?.is_some())
    }

    pub fn edit(&self, organization_id: &str, role_id: &str, edit: EditRole) -> StoreResult<()> {
        let mut role = self.get(organization_id, role_id)?;
        if let Some(name) = edit.name {
            role.name = name;
        }
        if let Some(primitives) = edit.primitives {
            role.primitives = primitives;
        }
        self.table.replace(&role_key(organization_id, role_id), &role)
    }

    pub fn delete(&self, organization_id: &str, role_id: &str) -> StoreResult<()> {
        self.table
            .remove(&role_key(organization_id, role_id))?
            .map(|_| ())
            .ok_or_else(|| not_found(organization_id, role_id))
    }

    pub fn list(&self, organization_id: &str) -> StoreResult<Vec<Role>> {
        self.table.scan_prefix(&key_prefix(&[organization_id]))
    }

    pub fn truncate(&self) -> StoreResult<()> {
        self.table.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::providers::test_backends;

    fn role(org: &str, id: &str) -> Role {
        Role {
            organization_id: org.to_string(),
            role_id: id.to_string(),
            name: format!("{id} name"),
            internal: false,
            primitives: vec![Primitive::Org],
        }
    }

    #[test]
    fn role_id_is_unique_within_an_organization() {
        for (backend, _dir) in test_backends() {
            let provider = RoleProvider::new(&backend).unwrap();
            provider.add(role("org1", "admin")).unwrap();
            assert!(matches!(
                provider.add(role("org1", "admin")),
                Err(StoreError::AlreadyExists(_))
            ));
            // Same id in another organization is a different role.
            provider.add(role("org2", "admin")).unwrap();
        }
    }

    #[test]
    fn edit_replaces_primitives() {
        for (backend, _dir) in test_backends() {
            let provider = RoleProvider::new(&backend).unwrap();
            provider.add(role("org1", "admin")).unwrap();
            provider
                .edit(
                    "org1",
                    "admin",
                    EditRole {
                        name: None,
                        primitives: Some(vec![Primitive::Apps, Primitive::Profile]),
                    },
                )
                .unwrap();
            let edited = provider.get("org1", "admin").unwrap();
            assert_eq!(edited.primitives, vec![Primitive::Apps, Primitive::Profile]);
            assert_eq!(edited.name, "admin name");
        }
    }

    #[test]
    fn list_returns_one_organization() {
        for (backend, _dir) in test_backends() {
            let provider = RoleProvider::new(&backend).unwrap();
            provider.add(role("org1", "a")).unwrap();
            provider.add(role("org1", "b")).unwrap();
            provider.add(role("org10", "c")).unwrap();

            let mut ids: Vec<String> = provider
                .list("org1")
                .unwrap()
                .into_iter()
                .map(|r| r.role_id)
                .collect();
            ids.sort();
            assert_eq!(ids, vec!["a", "b"]);
        }
    }

    #[test]
    fn delete_missing_role_is_not_found() {
        for (backend, _dir) in test_backends() {
            let provider = RoleProvider::new(&backend).unwrap();
            assert!(matches!(
                provider.delete("org1", "nope"),
                Err(StoreError::NotFound(_))
            ));
        }
    }
}
