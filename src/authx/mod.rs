// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authx Core
//!
//! Orchestrates credentials, roles, device groups and devices on top of the
//! providers and the two token managers.
//!
//! Operations validate their inputs first (`InvalidArgument`), then consult
//! the providers. Store failures other than `NotFound` / `AlreadyExists`
//! surface as `Internal`.

mod devices;
mod roles;
mod users;

pub use devices::DeviceGroupUpdate;

use crate::error::AuthxError;
use crate::password::Password;
use crate::storage::Providers;
use crate::token::{DeviceTokenManager, UserTokenManager};

/// Tunables of the core.
#[derive(Clone)]
pub struct AuthxSettings {
    /// Process-wide signing secret of user tokens.
    pub jwt_secret: String,
    pub expiration_secs: i64,
    pub device_expiration_secs: i64,
    pub password: Password,
}

#[derive(Clone)]
pub struct Authx {
    providers: Providers,
    password: Password,
    user_tokens: UserTokenManager,
    device_tokens: DeviceTokenManager,
}

impl Authx {
    pub fn new(providers: Providers, settings: AuthxSettings) -> Self {
        let user_tokens = UserTokenManager::new(
            providers.user_tokens.clone(),
            settings.jwt_secret.as_bytes(),
            settings.expiration_secs,
        );
        let device_tokens = DeviceTokenManager::new(
            providers.device_tokens.clone(),
            providers.device_groups.clone(),
            settings.device_expiration_secs,
        );
        Self {
            providers,
            password: settings.password,
            user_tokens,
            device_tokens,
        }
    }

    pub fn providers(&self) -> &Providers {
        &self.providers
    }

    pub fn user_tokens(&self) -> &UserTokenManager {
        &self.user_tokens
    }

    pub fn device_tokens(&self) -> &DeviceTokenManager {
        &self.device_tokens
    }

    /// Forget every stored refresh token. Test harness only.
    pub fn clean_tokens(&self) -> Result<(), AuthxError> {
        self.user_tokens.clean()?;
        self.device_tokens.clean()
    }
}

/// Reject empty values.
pub(crate) fn require(field: &str, value: &str) -> Result<(), AuthxError> {
    if value.trim().is_empty() {
        return Err(AuthxError::invalid_argument(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Reject empty identifiers and identifiers with control characters.
///
/// Identifiers become parts of composite store keys; the key separator is a
/// control character and must never appear inside a part.
pub(crate) fn require_id(field: &str, value: &str) -> Result<(), AuthxError> {
    require(field, value)?;
    if value.chars().any(char::is_control) {
        return Err(AuthxError::invalid_argument(format!(
            "{field} must not contain control characters"
        )));
    }
    Ok(())
}
