// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use tracing::info;

use super::{require, require_id, Authx};
use crate::auth::claims::PersonalClaim;
use crate::error::AuthxError;
use crate::password::check_password;
use crate::storage::{BasicCredentials, EditBasicCredentials, StoreError};
use crate::token::TokenPair;

impl Authx {
    /// Provision a user. The role must exist in the same organization.
    pub async fn add_basic_credentials(
        &self,
        username: &str,
        organization_id: &str,
        role_id: &str,
        password: &str,
    ) -> Result<(), AuthxError> {
        require_id("username", username)?;
        require_id("organization_id", organization_id)?;
        require_id("role_id", role_id)?;
        check_password(password)?;

        if !self.providers.roles.exists(organization_id, role_id)? {
            return Err(AuthxError::not_found(format!(
                "role {role_id} in organization {organization_id}"
            )));
        }
        if self.providers.credentials.exists(username)? {
            return Err(AuthxError::already_exists(format!("credentials {username}")));
        }

        let password_hash = self.password.hash_blocking(password.to_string()).await?;
        self.providers.credentials.add(BasicCredentials {
            username: username.to_string(),
            password_hash,
            role_id: role_id.to_string(),
            organization_id: organization_id.to_string(),
        })?;

        info!(username, organization_id, role_id, "credentials added");
        Ok(())
    }

    pub async fn change_password(
        &self,
        username: &str,
        password: &str,
        new_password: &str,
    ) -> Result<(), AuthxError> {
        require_id("username", username)?;
        check_password(new_password)?;

        let credentials = self.providers.credentials.get(username)?;
        self.password
            .verify_blocking(credentials.password_hash, password.to_string())
            .await?;
        let password_hash = self.password.hash_blocking(new_password.to_string()).await?;
        self.providers.credentials.edit(
            username,
            EditBasicCredentials::default().with_password_hash(password_hash),
        )?;

        info!(username, "password changed");
        Ok(())
    }

    pub fn delete_credentials(&self, username: &str) -> Result<(), AuthxError> {
        require_id("username", username)?;
        self.providers.credentials.delete(username)?;
        info!(username, "credentials deleted");
        Ok(())
    }

    /// Check the password and issue a token pair.
    ///
    /// Unknown users and wrong passwords are indistinguishable to the caller.
    pub async fn login_with_basic_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<TokenPair, AuthxError> {
        require_id("username", username)?;
        require("password", password)?;

        let credentials = match self.providers.credentials.get(username) {
            Ok(credentials) => credentials,
            Err(StoreError::NotFound(_)) => {
                return Err(AuthxError::unauthenticated("invalid credentials"))
            }
            Err(e) => return Err(e.into()),
        };
        self.password
            .verify_blocking(credentials.password_hash.clone(), password.to_string())
            .await?;

        let role = self
            .providers
            .roles
            .get(&credentials.organization_id, &credentials.role_id)?;
        let pair = self.user_tokens.generate(PersonalClaim {
            user_id: credentials.username,
            role_name: role.name,
            primitives: role.primitives,
            organization_id: credentials.organization_id,
        })?;

        info!(username, "user logged in");
        Ok(pair)
    }

    pub fn refresh_token(&self, token: &str, refresh_token: &str) -> Result<TokenPair, AuthxError> {
        require("token", token)?;
        require("refresh_token", refresh_token)?;
        self.user_tokens.refresh(token, refresh_token)
    }
}
