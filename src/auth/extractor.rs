// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for callers admitted by an interceptor.
//!
//! ```rust,ignore
//! async fn deploy(user: UserContext) -> impl IntoResponse {
//!     // user.organization_id, user.primitives
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::claims::{DeviceClaim, UserClaim};
use super::Primitive;
use crate::error::AuthxError;

/// Identity of a user admitted by [`super::interceptor::user_interceptor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    pub user_id: String,
    pub organization_id: String,
    pub role_name: String,
    pub primitives: Vec<Primitive>,
}

impl UserContext {
    pub fn has(&self, primitive: Primitive) -> bool {
        self.primitives.contains(&primitive)
    }
}

impl From<UserClaim> for UserContext {
    fn from(claim: UserClaim) -> Self {
        Self {
            user_id: claim.personal.user_id,
            organization_id: claim.personal.organization_id,
            role_name: claim.personal.role_name,
            primitives: claim.personal.primitives,
        }
    }
}

/// Identity of a device admitted by [`super::interceptor::device_interceptor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceContext {
    pub organization_id: String,
    pub device_group_id: String,
    pub device_id: String,
    pub primitives: Vec<Primitive>,
}

impl From<DeviceClaim> for DeviceContext {
    fn from(claim: DeviceClaim) -> Self {
        Self {
            organization_id: claim.device.organization_id,
            device_group_id: claim.device.device_group_id,
            device_id: claim.device.device_id,
            primitives: claim.device.primitives,
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for UserContext {
    type Rejection = AuthxError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UserContext>()
            .cloned()
            .ok_or_else(|| AuthxError::unauthenticated("request carries no user identity"))
    }
}

impl<S: Send + Sync> FromRequestParts<S> for DeviceContext {
    type Rejection = AuthxError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<DeviceContext>()
            .cloned()
            .ok_or_else(|| AuthxError::unauthenticated("request carries no device identity"))
    }
}
