// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Device group credentials.
//!
//! Primary key `(organization_id, device_group_id)`; `device_group_api_key`
//! is a unique alternate key kept in a side table.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::{composite_key, key_prefix, Backend, StoreError, StoreResult, Table};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DeviceGroupCredentials {
    pub organization_id: String,
    pub device_group_id: String,
    pub device_group_api_key: String,
    pub enabled: bool,
    /// Initial `enabled` of devices added to this group.
    pub default_device_connectivity: bool,
    /// HMAC signing key for every device token of this group.
    pub secret: String,
}

/// Narrow mutation of a device group.
#[derive(Debug, Clone, Default)]
pub struct EditDeviceGroupCredentials {
    pub enabled: Option<bool>,
    pub default_device_connectivity: Option<bool>,
}

#[derive(Clone)]
pub struct DeviceGroupProvider {
    groups: Arc<dyn Table<DeviceGroupCredentials>>,
    api_keys: Arc<dyn Table<String>>,
}

fn group_key(organization_id: &str, device_group_id: &str) -> String {
    composite_key(&[organization_id, device_group_id])
}

fn not_found(organization_id: &str, device_group_id: &str) -> StoreError {
    StoreError::NotFound(format!("device group {organization_id}/{device_group_id}"))
}

impl DeviceGroupProvider {
    pub fn new(backend: &Backend) -> StoreResult<Self> {
        Ok(Self {
            groups: backend.table("device_groups")?,
            api_keys: backend.table("device_group_api_keys")?,
        })
    }

    pub fn add(&self, group: DeviceGroupCredentials) -> StoreResult<()> {
        let key = group_key(&group.organization_id, &group.device_group_id);
        self.groups.insert(&key, &group)?;
        if let Err(e) = self.api_keys.insert(&group.device_group_api_key, &key) {
            self.groups.remove(&key)?;
            return Err(e);
        }
        Ok(())
    }

    pub fn get(&self, organization_id: &str, device_group_id: &str) -> StoreResult<DeviceGroupCredentials> {
        self.groups
            .get(&group_key(organization_id, device_group_id))?
            .ok_or_else(|| not_found(organization_id, device_group_id))
    }

    pub fn get_by_api_key(&self, api_key: &str) -> StoreResult<DeviceGroupCredentials> {
        let key = self
            .api_keys
            .get(api_key)?
            .ok_or_else(|| StoreError::NotFound("device group api key".to_string()))?;
        self.groups
            .get(&key)?
            .ok_or_else(|| StoreError::NotFound("device group api key".to_string()))
    }

    pub fn exists(&self, organization_id: &str, device_group_id: &str) -> StoreResult<bool> {
        Ok(self
            .groups
            .get(&group_key(organization_id, device_group_id))?
            .is_some())
    }

    pub fn edit(
        &self,
        organization_id: &str,
        device_group_id: &str,
        edit: EditDeviceGroupCredentials,
    ) -> StoreResult<()> {
        let mut group = self.get(organization_id, device_group_id)?;
        if let Some(enabled) = edit.enabled {
            group.enabled = enabled;
        }
        if let Some(connectivity) = edit.default_device_connectivity {
            group.default_device_connectivity = connectivity;
        }
        self.groups
            .replace(&group_key(organization_id, device_group_id), &group)
    }

    pub fn delete(&self, organization_id: &str, device_group_id: &str) -> StoreResult<()> {
        let removed = self
            .groups
            .remove(&group_key(organization_id, device_group_id))?
            .ok_or_else(|| not_found(organization_id, device_group_id))?;
        self.api_keys.remove(&removed.device_group_api_key)?;
        Ok(())
    }

    pub fn list(&self, organization_id: &str) -> StoreResult<Vec<DeviceGroupCredentials>> {
        self.groups.scan_prefix(&key_prefix(&[organization_id]))
    }

    pub fn truncate(&self) -> StoreResult<()> {
        self.groups.clear()?;
        self.api_keys.clear()
    }
}
