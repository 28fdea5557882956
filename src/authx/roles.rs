// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use tracing::info;

use super::{require, require_id, Authx};
use crate::error::AuthxError;
use crate::storage::{EditBasicCredentials, Role};

impl Authx {
    /// Primitives are stored as a set: duplicates collapse.
    pub fn add_role(&self, mut role: Role) -> Result<(), AuthxError> {
        require_id("organization_id", &role.organization_id)?;
        require_id("role_id", &role.role_id)?;
        require("name", &role.name)?;
        if role.primitives.is_empty() {
            return Err(AuthxError::invalid_argument("a role needs at least one primitive"));
        }
        role.primitives.sort();
        role.primitives.dedup();

        self.providers.roles.add(role.clone())?;
        info!(
            organization_id = %role.organization_id,
            role_id = %role.role_id,
            primitives = ?role.primitives,
            "role added"
        );
        Ok(())
    }

    /// Move a user to another role of the same organization.
    pub fn edit_user_role(&self, username: &str, new_role_id: &str) -> Result<(), AuthxError> {
        require_id("username", username)?;
        require_id("new_role_id", new_role_id)?;

        let credentials = self.providers.credentials.get(username)?;
        if !self
            .providers
            .roles
            .exists(&credentials.organization_id, new_role_id)?
        {
            return Err(AuthxError::not_found(format!(
                "role {new_role_id} in organization {}",
                credentials.organization_id
            )));
        }
        self.providers.credentials.edit(
            username,
            EditBasicCredentials::default().with_role_id(new_role_id),
        )?;

        info!(username, new_role_id, "user role changed");
        Ok(())
    }

    pub fn list_roles(&self, organization_id: &str) -> Result<Vec<Role>, AuthxError> {
        require_id("organization_id", organization_id)?;
        Ok(self.providers.roles.list(organization_id)?)
    }

    /// Role of the user identified by `email` (the username).
    pub fn get_user_role(&self, organization_id: &str, email: &str) -> Result<Role, AuthxError> {
        require_id("organization_id", organization_id)?;
        require_id("email", email)?;

        let credentials = self.providers.credentials.get(email)?;
        if credentials.organization_id != organization_id {
            return Err(AuthxError::not_found(format!(
                "credentials {email} in organization {organization_id}"
            )));
        }
        Ok(self
            .providers
            .roles
            .get(organization_id, &credentials.role_id)?)
    }
}
