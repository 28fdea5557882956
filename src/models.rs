// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and reply bodies of the RPC surface. All types derive `Serialize`,
//! `Deserialize` and `ToSchema` for JSON handling and OpenAPI documentation.
//!
//! ## Model Categories
//!
//! - **User**: basic credentials, login and refresh
//! - **Role**: roles and role assignment
//! - **Device**: device groups, devices, device login and group secrets
//! - **Inventory**: edge-controller join tokens
//! - **Certificates**: edge-controller certificates

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::{DeviceCredentials, Role};

/// Empty reply of operations that only succeed or fail.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Success {}

// =============================================================================
// User Models
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddBasicCredentialsRequest {
    pub username: String,
    pub organization_id: String,
    pub role_id: String,
    /// At least 6 characters.
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub username: String,
    /// Current password.
    pub password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UsernameRequest {
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Access token and refresh token to trade for a new pair.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RefreshTokenRequest {
    pub token: String,
    pub refresh_token: String,
}

// =============================================================================
// Role Models
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EditUserRoleRequest {
    pub username: String,
    pub new_role_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrganizationRequest {
    pub organization_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoleList {
    pub roles: Vec<Role>,
}

/// Looks a user up by email, which is also the username.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserRoleRequest {
    pub organization_id: String,
    pub email: String,
}

// =============================================================================
// Device Models
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddDeviceGroupRequest {
    pub organization_id: String,
    pub device_group_id: String,
    pub enabled: bool,
    /// Initial `enabled` of devices added to the group.
    pub default_device_connectivity: bool,
}

/// Each `update_*` flag selects whether the matching value is applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateDeviceGroupRequest {
    pub organization_id: String,
    pub device_group_id: String,
    #[serde(default)]
    pub update_enabled: bool,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub update_device_connectivity: bool,
    #[serde(default)]
    pub default_device_connectivity: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeviceGroupIdRequest {
    pub organization_id: String,
    pub device_group_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeviceGroupLoginRequest {
    pub organization_id: String,
    pub device_group_api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeviceIdRequest {
    pub organization_id: String,
    pub device_group_id: String,
    pub device_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateDeviceRequest {
    pub organization_id: String,
    pub device_group_id: String,
    pub device_id: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeviceList {
    pub devices: Vec<DeviceCredentials>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeviceLoginRequest {
    pub organization_id: String,
    pub device_api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct DeviceGroupSecret {
    pub organization_id: String,
    pub device_group_id: String,
    pub secret: String,
}

// =============================================================================
// Inventory Models
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JoinTokenRequest {
    pub organization_id: String,
    pub token_id: String,
}

// =============================================================================
// Certificate Models
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateControllerCertRequest {
    pub organization_id: String,
    pub edge_controller_id: String,
    /// Common name of the certificate.
    pub name: String,
    /// IP subject alternative names; at least one.
    pub ips: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_flags_default_to_false() {
        let request: UpdateDeviceGroupRequest =
            serde_json::from_str(r#"{"organization_id":"o","device_group_id":"g"}"#).unwrap();
        assert!(!request.update_enabled);
        assert!(!request.update_device_connectivity);
    }

    #[test]
    fn success_is_an_empty_object() {
        assert_eq!(serde_json::to_string(&Success {}).unwrap(), "{}");
    }
}
