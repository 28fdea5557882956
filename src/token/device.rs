// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Device access tokens, signed with the secret of the device's group.

use tracing::{debug, warn};

use super::{new_refresh_token, peek, refresh_token_matches, sign, verify, Expiry, TokenPair};
use crate::auth::claims::{DeviceClaim, DevicePersonalClaim};
use crate::error::AuthxError;
use crate::storage::providers::{is_expired, unix_now};
use crate::storage::{DeviceGroupProvider, DeviceTokenProvider, DeviceTokenRecord, StoreError};

#[derive(Clone)]
pub struct DeviceTokenManager {
    tokens: DeviceTokenProvider,
    groups: DeviceGroupProvider,
    ttl_secs: i64,
}

impl DeviceTokenManager {
    pub fn new(tokens: DeviceTokenProvider, groups: DeviceGroupProvider, ttl_secs: i64) -> Self {
        Self {
            tokens,
            groups,
            ttl_secs,
        }
    }

    /// Mint a token pair signed with `secret` and record the refresh token.
    pub fn generate(
        &self,
        device: DevicePersonalClaim,
        secret: &str,
    ) -> Result<TokenPair, AuthxError> {
        let claim = DeviceClaim::new(device, unix_now(), self.ttl_secs);
        let token = sign(&claim, secret.as_bytes())?;
        let refresh_token = new_refresh_token();

        self.tokens
            .add(DeviceTokenRecord {
                device_id: claim.device.device_id.clone(),
                token_id: claim.standard.jti.clone(),
                refresh_token: refresh_token.clone(),
                expires_at: claim.standard.exp,
                organization_id: claim.device.organization_id.clone(),
                device_group_id: claim.device.device_group_id.clone(),
            })
            .map_err(|e| {
                tracing::error!(error = %e, device_id = %claim.device.device_id, "failed to store device token");
                AuthxError::internal("failed to store device token")
            })?;

        debug!(
            organization_id = %claim.device.organization_id,
            device_group_id = %claim.device.device_group_id,
            device_id = %claim.device.device_id,
            "device token issued"
        );
        Ok(TokenPair {
            token,
            refresh_token,
        })
    }

    /// Verify a device token against its group secret, enforcing expiry.
    pub fn verify(&self, token: &str, secret: &str) -> Result<DeviceClaim, AuthxError> {
        verify(token, secret.as_bytes(), Expiry::Enforce)
    }

    /// Trade a device token pair for a new one.
    ///
    /// The group must still exist and be enabled; the stored record must
    /// belong to the same organization and group as the token.
    pub fn refresh(&self, old_token: &str, refresh_token: &str) -> Result<TokenPair, AuthxError> {
        let unverified: DeviceClaim = peek(old_token)?;
        let group = match self.groups.get(
            &unverified.device.organization_id,
            &unverified.device.device_group_id,
        ) {
            Ok(group) => group,
            Err(StoreError::NotFound(_)) => {
                return Err(AuthxError::unauthenticated("unknown device group"))
            }
            Err(e) => return Err(e.into()),
        };
        let claim: DeviceClaim = verify(old_token, group.secret.as_bytes(), Expiry::Ignore)?;

        let record = match self.tokens.get_by_refresh_token(refresh_token) {
            Ok(record) => record,
            Err(StoreError::NotFound(_)) => {
                return Err(AuthxError::unauthenticated("refresh token expired or unknown"))
            }
            Err(e) => return Err(e.into()),
        };
        if record.device_id != claim.device.device_id
            || record.token_id != claim.standard.jti
            || !refresh_token_matches(&record.refresh_token, refresh_token)
        {
            return Err(AuthxError::unauthenticated("refresh token does not match token"));
        }
        if is_expired(record.expires_at, unix_now()) {
            return Err(AuthxError::unauthenticated("refresh token expired"));
        }
        if record.organization_id != claim.device.organization_id
            || record.device_group_id != claim.device.device_group_id
        {
            return Err(AuthxError::unauthenticated("refresh token belongs to another group"));
        }
        if !group.enabled {
            return Err(AuthxError::permission_denied("device group is disabled"));
        }

        let pair = self.generate(claim.device.clone(), &group.secret)?;
        if let Err(e) = self.tokens.delete(&record.device_id, &record.token_id) {
            warn!(
                error = %e,
                device_id = %record.device_id,
                token_id = %record.token_id,
                "failed to drop consumed device token"
            );
        }
        Ok(pair)
    }

    /// Drop every stored device refresh token.
    pub fn clean(&self) -> Result<(), AuthxError> {
        self.tokens.truncate().map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::providers::in_memory;
    use crate::storage::{DeviceGroupCredentials, EditDeviceGroupCredentials, Providers};

    fn add_group(providers: &Providers, group_id: &str, secret: &str) {
        providers
            .device_groups
            .add(DeviceGroupCredentials {
                organization_id: "orgX".into(),
                device_group_id: group_id.into(),
                device_group_api_key: format!("key-{group_id}"),
                enabled: true,
                default_device_connectivity: true,
                secret: secret.into(),
            })
            .unwrap();
    }

    fn setup() -> (Providers, DeviceTokenManager) {
        let providers = in_memory();
        add_group(&providers, "gY", "secret-gY");
        add_group(&providers, "gW", "secret-gW");
        let manager = DeviceTokenManager::new(
            providers.device_tokens.clone(),
            providers.device_groups.clone(),
            60,
        );
        (providers, manager)
    }

    #[test]
    fn device_token_only_verifies_under_its_group_secret() {
        let (_providers, manager) = setup();
        let pair = manager
            .generate(DevicePersonalClaim::new("orgX", "gY", "dZ"), "secret-gY")
            .unwrap();

        assert_eq!(
            manager.verify(&pair.token, "secret-gY").unwrap().device.device_id,
            "dZ"
        );
        assert!(matches!(
            manager.verify(&pair.token, "secret-gW"),
            Err(AuthxError::Unauthenticated(_))
        ));
    }

    #[test]
    fn refresh_is_single_use() {
        let (_providers, manager) = setup();
        let first = manager
            .generate(DevicePersonalClaim::new("orgX", "gY", "dZ"), "secret-gY")
            .unwrap();
        let second = manager.refresh(&first.token, &first.refresh_token).unwrap();
        assert_ne!(first, second);

        assert!(matches!(
            manager.refresh(&first.token, &first.refresh_token),
            Err(AuthxError::Unauthenticated(_))
        ));
    }

    #[test]
    fn refresh_token_of_another_device_is_rejected() {
        let (_providers, manager) = setup();
        let ours = manager
            .generate(DevicePersonalClaim::new("orgX", "gY", "d1"), "secret-gY")
            .unwrap();
        let theirs = manager
            .generate(DevicePersonalClaim::new("orgX", "gY", "d2"), "secret-gY")
            .unwrap();

        assert!(matches!(
            manager.refresh(&ours.token, &theirs.refresh_token),
            Err(AuthxError::Unauthenticated(_))
        ));
    }

    #[test]
    fn token_signed_for_another_group_is_rejected() {
        let (_providers, manager) = setup();
        // Claims group gY but signed with gW's secret.
        let forged = manager
            .generate(DevicePersonalClaim::new("orgX", "gY", "dZ"), "secret-gW")
            .unwrap();

        assert!(matches!(
            manager.refresh(&forged.token, &forged.refresh_token),
            Err(AuthxError::Unauthenticated(_))
        ));
    }

    #[test]
    fn disabled_group_refuses_refresh() {
        let (providers, manager) = setup();
        let pair = manager
            .generate(DevicePersonalClaim::new("orgX", "gY", "dZ"), "secret-gY")
            .unwrap();
        providers
            .device_groups
            .edit(
                "orgX",
                "gY",
                EditDeviceGroupCredentials {
                    enabled: Some(false),
                    default_device_connectivity: None,
                },
            )
            .unwrap();

        assert!(matches!(
            manager.refresh(&pair.token, &pair.refresh_token),
            Err(AuthxError::PermissionDenied(_))
        ));
    }

    #[test]
    fn removed_group_cannot_refresh() {
        let (providers, manager) = setup();
        let pair = manager
            .generate(DevicePersonalClaim::new("orgX", "gY", "dZ"), "secret-gY")
            .unwrap();
        providers.device_groups.delete("orgX", "gY").unwrap();

        assert!(matches!(
            manager.refresh(&pair.token, &pair.refresh_token),
            Err(AuthxError::Unauthenticated(_))
        ));
    }
}
