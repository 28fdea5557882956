// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Device credentials.
//!
//! Primary key `(organization_id, device_group_id, device_id)`;
//! `device_api_key` is a unique alternate key.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::{composite_key, key_prefix, Backend, StoreError, StoreResult, Table};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DeviceCredentials {
    pub organization_id: String,
    pub device_group_id: String,
    pub device_id: String,
    pub device_api_key: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Default)]
pub struct EditDeviceCredentials {
    pub enabled: Option<bool>,
}

#[derive(Clone)]
pub struct DeviceProvider {
    devices: Arc<dyn Table<DeviceCredentials>>,
    api_keys: Arc<dyn Table<String>>,
}

fn device_key(organization_id: &str, device_group_id: &str, device_id: &str) -> String {
    composite_key(&[organization_id, device_group_id, device_id])
}

fn not_found(organization_id: &str, device_group_id: &str, device_id: &str) -> StoreError {
    StoreError::NotFound(format!(
        "device {organization_id}/{device_group_id}/{device_id}"
    ))
}

impl DeviceProvider {
    pub fn new(backend: &Backend) -> StoreResult<Self> {
        Ok(Self {
            devices: backend.table("devices")?,
            api_keys: backend.table("device_api_keys")?,
        })
    }

    pub fn add(&self, device: DeviceCredentials) -> StoreResult<()> {
        let key = device_key(
            &device.organization_id,
            &device.device_group_id,
            &device.device_id,
        );
        self.devices.insert(&key, &device)?;
        if let Err(e) = self.api_keys.insert(&device.device_api_key, &key) {
            self.devices.remove(&key)?;
            return Err(e);
        }
        Ok(())
    }

    pub fn get(
        &self,
        organization_id: &str,
        device_group_id: &str,
        device_id: &str,
    ) -> StoreResult<DeviceCredentials> {
        self.devices
            .get(&device_key(organization_id, device_group_id, device_id))?
            .ok_or_else(|| not_found(organization_id, device_group_id, device_id))
    }

    pub fn get_by_api_key(&self, api_key: &str) -> StoreResult<DeviceCredentials> {
        let key = self
            .api_keys
            .get(api_key)?
            .ok_or_else(|| StoreError::NotFound("device api key".to_string()))?;
        self.devices
            .get(&key)?
            .ok_or_else(|| StoreError::NotFound("device api key".to_string()))
    }

    pub fn exists(
        &self,
        organization_id: &str,
        device_group_id: &str,
        device_id: &str,
    ) -> StoreResult<bool> {
        Ok(self
            .devices
            .get(&device_key(organization_id, device_group_id, device_id))?
            .is_some())
    }

    pub fn edit(
        &self,
        organization_id: &str,
        device_group_id: &str,
        device_id: &str,
        edit: EditDeviceCredentials,
    ) -> StoreResult<()> {
        let mut device = self.get(organization_id, device_group_id, device_id)?;
        if let Some(enabled) = edit.enabled {
            device.enabled = enabled;
        }
        self.devices.replace(
            &device_key(organization_id, device_group_id, device_id),
            &device,
        )
    }

    pub fn delete(
        &self,
        organization_id: &str,
        device_group_id: &str,
        device_id: &str,
    ) -> StoreResult<()> {
        let removed = self
            .devices
            .remove(&device_key(organization_id, device_group_id, device_id))?
            .ok_or_else(|| not_found(organization_id, device_group_id, device_id))?;
        self.api_keys.remove(&removed.device_api_key)?;
        Ok(())
    }

    /// Every device of one group.
    pub fn list(&self, organization_id: &str, device_group_id: &str) -> StoreResult<Vec<DeviceCredentials>> {
        self.devices
            .scan_prefix(&key_prefix(&[organization_id, device_group_id]))
    }

    pub fn truncate(&self) -> StoreResult<()> {
        self.devices.clear()?;
        self.api_keys.clear()
    }
}
