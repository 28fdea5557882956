// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Edge-controller join tokens.
//!
//! A join token lets an edge controller register itself into an organization.
//! It is valid until `expires_on`; validation does not consume it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authx::require_id;
use crate::error::AuthxError;
use crate::storage::providers::unix_now;
use crate::storage::{JoinTokenProvider, JoinTokenRecord, StoreError};

/// Issued join token with the management-cluster CA the controller should trust.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct JoinToken {
    pub organization_id: String,
    pub token_id: String,
    /// PEM CA of the management cluster.
    pub cacert: String,
    /// Unix seconds.
    pub expires_on: i64,
}

#[derive(Clone)]
pub struct JoinTokenService {
    provider: JoinTokenProvider,
    ca_cert_pem: Arc<str>,
    ttl_secs: i64,
}

impl JoinTokenService {
    pub fn new(provider: JoinTokenProvider, ca_cert_pem: impl Into<Arc<str>>, ttl_secs: i64) -> Self {
        Self {
            provider,
            ca_cert_pem: ca_cert_pem.into(),
            ttl_secs,
        }
    }

    pub fn create(&self, organization_id: &str) -> Result<JoinToken, AuthxError> {
        require_id("organization_id", organization_id)?;

        let record = JoinTokenRecord {
            organization_id: organization_id.to_string(),
            token_id: Uuid::new_v4().to_string(),
            expires_at: unix_now() + self.ttl_secs,
        };
        self.provider.add(record.clone())?;

        tracing::info!(organization_id, token_id = %record.token_id, "join token created");
        Ok(JoinToken {
            organization_id: record.organization_id,
            token_id: record.token_id,
            cacert: self.ca_cert_pem.to_string(),
            expires_on: record.expires_at,
        })
    }

    /// Ok iff the token exists and has not expired.
    pub fn validate(&self, organization_id: &str, token_id: &str) -> Result<(), AuthxError> {
        require_id("organization_id", organization_id)?;
        require_id("token_id", token_id)?;

        let record = match self.provider.get(organization_id, token_id) {
            Ok(record) => record,
            Err(StoreError::NotFound(_)) => {
                return Err(AuthxError::unauthenticated("join token expired or unknown"))
            }
            Err(e) => return Err(e.into()),
        };
        if record.expires_at <= unix_now() {
            return Err(AuthxError::unauthenticated("join token expired"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::providers::in_memory;
    use std::time::Duration;

    #[test]
    fn created_token_validates_in_its_organization_only() {
        let service = JoinTokenService::new(in_memory().join_tokens, "CA PEM", 600);
        let token = service.create("orgA").unwrap();
        assert_eq!(token.cacert, "CA PEM");
        assert!(token.expires_on > unix_now());

        service.validate("orgA", &token.token_id).unwrap();
        // Not consumed.
        service.validate("orgA", &token.token_id).unwrap();

        assert!(matches!(
            service.validate("orgB", &token.token_id),
            Err(AuthxError::Unauthenticated(_))
        ));
        assert!(matches!(
            service.validate("orgA", "unknown"),
            Err(AuthxError::Unauthenticated(_))
        ));
    }

    #[test]
    fn join_token_ids_cannot_cross_organizations_through_the_key_separator() {
        for (backend, _dir) in crate::storage::providers::test_backends() {
            let providers = crate::storage::Providers::new(backend).unwrap();
            let service = JoinTokenService::new(providers.join_tokens, "CA PEM", 600);
            let token = service.create("a").unwrap();

            assert!(matches!(
                service.create("a\u{1f}b"),
                Err(AuthxError::InvalidArgument(_))
            ));
            // "a" + "b\u{1f}<id>" and "a\u{1f}b" + "<id>" would share one key.
            assert!(matches!(
                service.validate("a", &format!("b\u{1f}{}", token.token_id)),
                Err(AuthxError::InvalidArgument(_))
            ));
            assert!(matches!(
                service.validate("a\u{1f}b", &token.token_id),
                Err(AuthxError::InvalidArgument(_))
            ));
            service.validate("a", &token.token_id).unwrap();
        }
    }

    #[tokio::test]
    async fn token_expires() {
        let service = JoinTokenService::new(in_memory().join_tokens, "CA PEM", 1);
        let token = service.create("orgA").unwrap();
        service.validate("orgA", &token.token_id).unwrap();

        while unix_now() <= token.expires_on {
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        assert!(matches!(
            service.validate("orgA", &token.token_id),
            Err(AuthxError::Unauthenticated(_))
        ));
    }

    #[test]
    fn empty_organization_is_invalid() {
        let service = JoinTokenService::new(in_memory().join_tokens, "CA PEM", 60);
        assert!(matches!(
            service.create(""),
            Err(AuthxError::InvalidArgument(_))
        ));
    }
}
