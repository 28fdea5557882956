// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Typed entity providers.
//!
//! Each provider exposes a narrow Add / Get / Exists / Edit / Delete / List /
//! Truncate surface over one entity and is backed by whichever [`Backend`]
//! was selected at startup. Token providers additionally treat rows whose
//! `expires_at` lies in the past as absent.

pub mod credentials;
pub mod device_groups;
pub mod device_tokens;
pub mod devices;
pub mod join_tokens;
pub mod roles;
pub mod user_tokens;

pub use credentials::{BasicCredentials, CredentialsProvider, EditBasicCredentials};
pub use device_groups::{DeviceGroupCredentials, DeviceGroupProvider, EditDeviceGroupCredentials};
pub use device_tokens::{DeviceTokenProvider, DeviceTokenRecord};
pub use devices::{DeviceCredentials, DeviceProvider, EditDeviceCredentials};
pub use join_tokens::{JoinTokenProvider, JoinTokenRecord};
pub use roles::{EditRole, Role, RoleProvider};
pub use user_tokens::{UserTokenProvider, UserTokenRecord};

use super::{Backend, StoreResult};

/// Current time in unix seconds.
pub(crate) fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// A token row is gone once the clock passes its expiry.
pub(crate) fn is_expired(expires_at: i64, now: i64) -> bool {
    now > expires_at
}

/// Every provider of the service, built on one backend.
#[derive(Clone)]
pub struct Providers {
    pub backend: Backend,
    pub credentials: CredentialsProvider,
    pub roles: RoleProvider,
    pub device_groups: DeviceGroupProvider,
    pub devices: DeviceProvider,
    pub user_tokens: UserTokenProvider,
    pub device_tokens: DeviceTokenProvider,
    pub join_tokens: JoinTokenProvider,
}

impl Providers {
    pub fn new(backend: Backend) -> StoreResult<Self> {
        Ok(Self {
            credentials: CredentialsProvider::new(&backend)?,
            roles: RoleProvider::new(&backend)?,
            device_groups: DeviceGroupProvider::new(&backend)?,
            devices: DeviceProvider::new(&backend)?,
            user_tokens: UserTokenProvider::new(&backend)?,
            device_tokens: DeviceTokenProvider::new(&backend)?,
            join_tokens: JoinTokenProvider::new(&backend)?,
            backend,
        })
    }

    /// Empty every table. Test harness only.
    pub fn truncate_all(&self) -> StoreResult<()> {
        self.credentials.truncate()?;
        self.roles.truncate()?;
        self.device_groups.truncate()?;
        self.devices.truncate()?;
        self.user_tokens.truncate()?;
        self.device_tokens.truncate()?;
        self.join_tokens.truncate()?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn in_memory() -> Providers {
    Providers::new(Backend::memory()).expect("memory providers")
}

/// Both backends, for running the same provider checks twice.
///
/// The temp dir must outlive the persistent backend.
#[cfg(test)]
pub(crate) fn test_backends() -> Vec<(Backend, Option<tempfile::TempDir>)> {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let persistent =
        Backend::open_persistent(&dir.path().join("authx.redb")).expect("persistent backend");
    vec![(Backend::memory(), None), (persistent, Some(dir))]
}
