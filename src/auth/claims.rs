// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims for user and device principals.
//!
//! Both claim types embed the same [`StandardClaims`] block and flatten it
//! next to their personal payload, so the signed JSON is one flat object:
//!
//! ```json
//! {"iss":"authx","jti":"…","iat":1,"nbf":1,"exp":2,
//!  "user_id":"alice","role_name":"admin","primitives":["ORG"],"organization_id":"org1"}
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Primitive;

/// Issuer stamped on every token.
pub const ISSUER: &str = "authx";

/// Registered claims shared by every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardClaims {
    pub iss: String,
    /// Token id; keys the matching refresh-token record.
    pub jti: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

impl StandardClaims {
    /// Fresh `jti`, valid from `now` for `ttl_secs`.
    pub fn issue(now: i64, ttl_secs: i64) -> Self {
        Self {
            iss: ISSUER.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now,
            nbf: now,
            exp: now + ttl_secs,
        }
    }
}

/// User identity carried in the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalClaim {
    pub user_id: String,
    pub role_name: String,
    pub primitives: Vec<Primitive>,
    pub organization_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaim {
    #[serde(flatten)]
    pub standard: StandardClaims,
    #[serde(flatten)]
    pub personal: PersonalClaim,
}

impl UserClaim {
    pub fn new(personal: PersonalClaim, now: i64, ttl_secs: i64) -> Self {
        Self {
            standard: StandardClaims::issue(now, ttl_secs),
            personal,
        }
    }
}

/// Device identity carried in the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevicePersonalClaim {
    pub organization_id: String,
    pub device_group_id: String,
    pub device_id: String,
    pub primitives: Vec<Primitive>,
}

impl DevicePersonalClaim {
    /// Device tokens always start out with the `DEVICE` primitive only.
    pub fn new(
        organization_id: impl Into<String>,
        device_group_id: impl Into<String>,
        device_id: impl Into<String>,
    ) -> Self {
        Self {
            organization_id: organization_id.into(),
            device_group_id: device_group_id.into(),
            device_id: device_id.into(),
            primitives: vec![Primitive::Device],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceClaim {
    #[serde(flatten)]
    pub standard: StandardClaims,
    #[serde(flatten)]
    pub device: DevicePersonalClaim,
}

impl DeviceClaim {
    pub fn new(device: DevicePersonalClaim, now: i64, ttl_secs: i64) -> Self {
        Self {
            standard: StandardClaims::issue(now, ttl_secs),
            device,
        }
    }
}
