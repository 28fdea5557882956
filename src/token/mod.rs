// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Token Lifecycle
//!
//! Signing, verification and one-shot refresh of bearer tokens.
//!
//! Access tokens are compact JWTs signed with HMAC-SHA256. User tokens share a
//! single process-wide secret; device tokens are signed with the secret of the
//! device group they belong to.
//!
//! Every access token is paired with an opaque refresh token stored next to
//! the token's `jti`. A refresh consumes the record: the new pair is stored,
//! then the old record is removed. The two writes are not atomic.

pub mod device;
pub mod user;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub use device::DeviceTokenManager;
pub use user::UserTokenManager;

use crate::auth::claims::ISSUER;
use crate::error::AuthxError;

/// Access token plus its single-use refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    pub token: String,
    pub refresh_token: String,
}

/// Sign `claims` with HS256.
pub fn sign<C: Serialize>(claims: &C, secret: &[u8]) -> Result<String, AuthxError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| {
        tracing::error!(error = %e, "token signing failed");
        AuthxError::internal("token signing failed")
    })
}

/// Whether verification also enforces `exp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    Enforce,
    /// Refresh accepts access tokens that have already expired.
    Ignore,
}

/// Verify signature, issuer and (optionally) expiry.
pub fn verify<C: DeserializeOwned>(
    token: &str,
    secret: &[u8],
    expiry: Expiry,
) -> Result<C, AuthxError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_issuer(&[ISSUER]);
    validation.validate_nbf = true;
    validation.validate_exp = expiry == Expiry::Enforce;

    decode::<C>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            use jsonwebtoken::errors::ErrorKind;
            let reason = match e.kind() {
                ErrorKind::ExpiredSignature => "token expired",
                ErrorKind::InvalidSignature => "invalid token signature",
                ErrorKind::ImmatureSignature => "token not yet valid",
                ErrorKind::InvalidIssuer => "invalid token issuer",
                _ => "malformed token",
            };
            tracing::debug!(error = %e, reason, "token rejected");
            AuthxError::unauthenticated(reason)
        })
}

/// Decode the payload without checking the signature.
///
/// Only for routing decisions (which secret to verify with); never trust the
/// result before a real [`verify`].
pub fn peek<C: DeserializeOwned>(token: &str) -> Result<C, AuthxError> {
    jsonwebtoken::dangerous::insecure_decode::<C>(token)
        .map(|data| data.claims)
        .map_err(|_| AuthxError::unauthenticated("malformed token"))
}

pub(crate) fn new_refresh_token() -> String {
    Uuid::new_v4().to_string()
}

/// Constant-time comparison of refresh tokens.
pub(crate) fn refresh_token_matches(stored: &str, presented: &str) -> bool {
    ring::constant_time::verify_slices_are_equal(stored.as_bytes(), presented.as_bytes()).is_ok()
}
