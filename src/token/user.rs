// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User access tokens, signed with the process-wide secret.

use std::sync::Arc;

use tracing::{debug, warn};

use super::{new_refresh_token, refresh_token_matches, sign, verify, Expiry, TokenPair};
use crate::auth::claims::{PersonalClaim, UserClaim};
use crate::error::AuthxError;
use crate::storage::providers::unix_now;
use crate::storage::{StoreError, UserTokenProvider, UserTokenRecord};

#[derive(Clone)]
pub struct UserTokenManager {
    provider: UserTokenProvider,
    secret: Arc<[u8]>,
    ttl_secs: i64,
}

impl UserTokenManager {
    pub fn new(provider: UserTokenProvider, secret: impl AsRef<[u8]>, ttl_secs: i64) -> Self {
        Self {
            provider,
            secret: Arc::from(secret.as_ref()),
            ttl_secs,
        }
    }

    /// Mint a token pair and record the refresh token.
    pub fn generate(&self, personal: PersonalClaim) -> Result<TokenPair, AuthxError> {
        let claim = UserClaim::new(personal, unix_now(), self.ttl_secs);
        let token = sign(&claim, &self.secret)?;
        let refresh_token = new_refresh_token();

        self.provider
            .add(UserTokenRecord {
                username: claim.personal.user_id.clone(),
                token_id: claim.standard.jti.clone(),
                refresh_token: refresh_token.clone(),
                expires_at: claim.standard.exp,
            })
            .map_err(|e| {
                tracing::error!(error = %e, user_id = %claim.personal.user_id, "failed to store user token");
                AuthxError::internal("failed to store user token")
            })?;

        debug!(user_id = %claim.personal.user_id, token_id = %claim.standard.jti, "user token issued");
        Ok(TokenPair {
            token,
            refresh_token,
        })
    }

    /// Verify an access token, enforcing expiry.
    pub fn verify(&self, token: &str) -> Result<UserClaim, AuthxError> {
        verify(token, &self.secret, Expiry::Enforce)
    }

    /// Trade a token pair for a new one. Each refresh token works once.
    pub fn refresh(&self, old_token: &str, refresh_token: &str) -> Result<TokenPair, AuthxError> {
        let claim: UserClaim = verify(old_token, &self.secret, Expiry::Ignore)?;
        let username = &claim.personal.user_id;
        let token_id = &claim.standard.jti;

        let record = match self.provider.get(username, token_id) {
            Ok(record) => record,
            Err(StoreError::NotFound(_)) => {
                return Err(AuthxError::unauthenticated("refresh token expired or unknown"))
            }
            Err(e) => return Err(e.into()),
        };
        if !refresh_token_matches(&record.refresh_token, refresh_token) {
            return Err(AuthxError::unauthenticated("refresh token mismatch"));
        }

        let pair = self.generate(claim.personal.clone())?;
        if let Err(e) = self.provider.delete(username, token_id) {
            warn!(error = %e, user_id = %username, token_id = %token_id, "failed to drop consumed user token");
        }
        Ok(pair)
    }

    /// Drop every stored refresh token.
    pub fn clean(&self) -> Result<(), AuthxError> {
        self.provider.truncate().map_err(Into::into)
    }
}
