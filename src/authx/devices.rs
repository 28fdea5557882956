// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use tracing::{info, warn};
use uuid::Uuid;

use super::{require, require_id, Authx};
use crate::auth::claims::DevicePersonalClaim;
use crate::error::AuthxError;
use crate::storage::{
    DeviceCredentials, DeviceGroupCredentials, EditDeviceCredentials,
    EditDeviceGroupCredentials, StoreError,
};
use crate::token::TokenPair;

/// Length of a generated group secret, in bytes.
const GROUP_SECRET_BYTES: usize = 32;

fn new_api_key() -> String {
    Uuid::new_v4().to_string()
}

fn new_group_secret() -> String {
    hex::encode(rand::random::<[u8; GROUP_SECRET_BYTES]>())
}

/// Partial update of a device group; `None` leaves a field unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceGroupUpdate {
    pub enabled: Option<bool>,
    pub default_device_connectivity: Option<bool>,
}

impl Authx {
    /// Create a group with a fresh API key and signing secret.
    pub fn add_device_group_credentials(
        &self,
        organization_id: &str,
        device_group_id: &str,
        enabled: bool,
        default_device_connectivity: bool,
    ) -> Result<DeviceGroupCredentials, AuthxError> {
        require_id("organization_id", organization_id)?;
        require_id("device_group_id", device_group_id)?;

        let group = DeviceGroupCredentials {
            organization_id: organization_id.to_string(),
            device_group_id: device_group_id.to_string(),
            device_group_api_key: new_api_key(),
            enabled,
            default_device_connectivity,
            secret: new_group_secret(),
        };
        self.providers.device_groups.add(group.clone())?;

        info!(organization_id, device_group_id, enabled, "device group added");
        Ok(group)
    }

    pub fn update_device_group_credentials(
        &self,
        organization_id: &str,
        device_group_id: &str,
        update: DeviceGroupUpdate,
    ) -> Result<(), AuthxError> {
        require_id("organization_id", organization_id)?;
        require_id("device_group_id", device_group_id)?;

        self.providers.device_groups.edit(
            organization_id,
            device_group_id,
            EditDeviceGroupCredentials {
                enabled: update.enabled,
                default_device_connectivity: update.default_device_connectivity,
            },
        )?;
        info!(organization_id, device_group_id, ?update, "device group updated");
        Ok(())
    }

    pub fn get_device_group_credentials(
        &self,
        organization_id: &str,
        device_group_id: &str,
    ) -> Result<DeviceGroupCredentials, AuthxError> {
        require_id("organization_id", organization_id)?;
        require_id("device_group_id", device_group_id)?;
        Ok(self
            .providers
            .device_groups
            .get(organization_id, device_group_id)?)
    }

    /// Remove a group and every device in it.
    pub fn remove_device_group_credentials(
        &self,
        organization_id: &str,
        device_group_id: &str,
    ) -> Result<(), AuthxError> {
        require_id("organization_id", organization_id)?;
        require_id("device_group_id", device_group_id)?;

        if !self
            .providers
            .device_groups
            .exists(organization_id, device_group_id)?
        {
            return Err(AuthxError::not_found(format!(
                "device group {organization_id}/{device_group_id}"
            )));
        }
        let devices = self.providers.devices.list(organization_id, device_group_id)?;
        for device in &devices {
            match self
                .providers
                .devices
                .delete(organization_id, device_group_id, &device.device_id)
            {
                Ok(()) | Err(StoreError::NotFound(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }
        self.providers
            .device_groups
            .delete(organization_id, device_group_id)?;

        info!(
            organization_id,
            device_group_id,
            devices = devices.len(),
            "device group removed"
        );
        Ok(())
    }

    /// Check a group API key. Issues no token.
    pub fn device_group_login(
        &self,
        organization_id: &str,
        device_group_api_key: &str,
    ) -> Result<(), AuthxError> {
        require_id("organization_id", organization_id)?;
        require_id("device_group_api_key", device_group_api_key)?;

        let group = match self.providers.device_groups.get_by_api_key(device_group_api_key) {
            Ok(group) => group,
            Err(StoreError::NotFound(_)) => {
                return Err(AuthxError::unauthenticated("invalid device group api key"))
            }
            Err(e) => return Err(e.into()),
        };
        if group.organization_id != organization_id {
            warn!(organization_id, "device group api key presented for another organization");
            return Err(AuthxError::unauthenticated("invalid device group api key"));
        }
        if !group.enabled {
            return Err(AuthxError::permission_denied("device group is disabled"));
        }
        Ok(())
    }

    /// Enroll a device. The group must exist and be enabled; the device
    /// starts with the group's default connectivity.
    pub fn add_device_credentials(
        &self,
        organization_id: &str,
        device_group_id: &str,
        device_id: &str,
    ) -> Result<DeviceCredentials, AuthxError> {
        require_id("organization_id", organization_id)?;
        require_id("device_group_id", device_group_id)?;
        require_id("device_id", device_id)?;

        let group = self
            .providers
            .device_groups
            .get(organization_id, device_group_id)?;
        if !group.enabled {
            return Err(AuthxError::permission_denied(format!(
                "device group {organization_id}/{device_group_id} is disabled"
            )));
        }

        let device = DeviceCredentials {
            organization_id: organization_id.to_string(),
            device_group_id: device_group_id.to_string(),
            device_id: device_id.to_string(),
            device_api_key: new_api_key(),
            enabled: group.default_device_connectivity,
        };
        self.providers.devices.add(device.clone())?;

        info!(organization_id, device_group_id, device_id, enabled = device.enabled, "device added");
        Ok(device)
    }

    pub fn update_device_credentials(
        &self,
        organization_id: &str,
        device_group_id: &str,
        device_id: &str,
        enabled: bool,
    ) -> Result<(), AuthxError> {
        require_id("organization_id", organization_id)?;
        require_id("device_group_id", device_group_id)?;
        require_id("device_id", device_id)?;

        self.providers.devices.edit(
            organization_id,
            device_group_id,
            device_id,
            EditDeviceCredentials {
                enabled: Some(enabled),
            },
        )?;
        info!(organization_id, device_group_id, device_id, enabled, "device updated");
        Ok(())
    }

    pub fn get_device_credentials(
        &self,
        organization_id: &str,
        device_group_id: &str,
        device_id: &str,
    ) -> Result<DeviceCredentials, AuthxError> {
        require_id("organization_id", organization_id)?;
        require_id("device_group_id", device_group_id)?;
        require_id("device_id", device_id)?;
        Ok(self
            .providers
            .devices
            .get(organization_id, device_group_id, device_id)?)
    }

    pub fn remove_device_credentials(
        &self,
        organization_id: &str,
        device_group_id: &str,
        device_id: &str,
    ) -> Result<(), AuthxError> {
        require_id("organization_id", organization_id)?;
        require_id("device_group_id", device_group_id)?;
        require_id("device_id", device_id)?;

        self.providers
            .devices
            .delete(organization_id, device_group_id, device_id)?;
        info!(organization_id, device_group_id, device_id, "device removed");
        Ok(())
    }

    pub fn list_device_credentials(
        &self,
        organization_id: &str,
        device_group_id: &str,
    ) -> Result<Vec<DeviceCredentials>, AuthxError> {
        require_id("organization_id", organization_id)?;
        require_id("device_group_id", device_group_id)?;
        Ok(self.providers.devices.list(organization_id, device_group_id)?)
    }

    /// Issue a device token pair signed with the group secret.
    pub fn device_login(
        &self,
        organization_id: &str,
        device_api_key: &str,
    ) -> Result<TokenPair, AuthxError> {
        require_id("organization_id", organization_id)?;
        require_id("device_api_key", device_api_key)?;

        let device = match self.providers.devices.get_by_api_key(device_api_key) {
            Ok(device) => device,
            Err(StoreError::NotFound(_)) => {
                return Err(AuthxError::unauthenticated("invalid device api key"))
            }
            Err(e) => return Err(e.into()),
        };
        if device.organization_id != organization_id {
            warn!(organization_id, "device api key presented for another organization");
            return Err(AuthxError::unauthenticated("invalid device api key"));
        }
        let group = self
            .providers
            .device_groups
            .get(&device.organization_id, &device.device_group_id)?;
        if !group.enabled {
            return Err(AuthxError::permission_denied("device group is disabled"));
        }
        if !device.enabled {
            return Err(AuthxError::permission_denied("device is disabled"));
        }

        let pair = self.device_tokens.generate(
            DevicePersonalClaim::new(
                &device.organization_id,
                &device.device_group_id,
                &device.device_id,
            ),
            &group.secret,
        )?;
        info!(
            organization_id,
            device_group_id = %device.device_group_id,
            device_id = %device.device_id,
            "device logged in"
        );
        Ok(pair)
    }

    pub fn refresh_device_token(
        &self,
        token: &str,
        refresh_token: &str,
    ) -> Result<TokenPair, AuthxError> {
        require("token", token)?;
        require("refresh_token", refresh_token)?;
        self.device_tokens.refresh(token, refresh_token)
    }

    /// Signing secret of a group, for services verifying device tokens.
    pub fn get_device_group_secret(
        &self,
        organization_id: &str,
        device_group_id: &str,
    ) -> Result<String, AuthxError> {
        Ok(self
            .get_device_group_credentials(organization_id, device_group_id)?
            .secret)
    }
}
