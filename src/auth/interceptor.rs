// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request interceptors for protected services.
//!
//! ## Flow
//!
//! 1. Look the request path up in the authorization config. Unlisted methods
//!    pass only when `allows_all` is set.
//! 2. Read the raw token from the configured header (default
//!    `authorization`, no `Bearer ` prefix).
//! 3. Verify it: user tokens with the process secret, device tokens with the
//!    secret of the group named in the (unverified) claim, via [`SecretAccess`].
//! 4. Check the method's [`Permission`] against the claim's primitives.
//! 5. Stamp identity headers and a context extension, then call the handler.
//!
//! A failed capability check is `UNAUTHENTICATED` on the user path and
//! `PERMISSION_DENIED` on the device path.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route("/apps/Deploy", post(deploy))
//!     .layer(axum::middleware::from_fn_with_state(interceptor, user_interceptor));
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::claims::{DeviceClaim, UserClaim};
use super::extractor::{DeviceContext, UserContext};
use super::permission::{AuthorizationConfig, Permission};
use super::secret_access::SecretAccess;
use super::Primitive;
use crate::client::DEFAULT_AUTH_HEADER;
use crate::error::AuthxError;
use crate::token::{peek, verify, Expiry};

pub const USER_ID_HEADER: &str = "user_id";
pub const ORGANIZATION_ID_HEADER: &str = "organization_id";
pub const DEVICE_GROUP_ID_HEADER: &str = "device_group_id";
pub const DEVICE_ID_HEADER: &str = "device_id";

/// Authorization config plus the header the token travels in.
#[derive(Clone)]
struct Guard {
    authorization: Arc<AuthorizationConfig>,
    header: HeaderName,
}

impl Guard {
    fn new(authorization: AuthorizationConfig) -> Self {
        Self {
            authorization: Arc::new(authorization),
            header: HeaderName::from_static(DEFAULT_AUTH_HEADER),
        }
    }

    fn with_header(mut self, header: &str) -> Result<Self, AuthxError> {
        self.header = HeaderName::from_bytes(header.to_ascii_lowercase().as_bytes())
            .map_err(|_| AuthxError::invalid_argument(format!("invalid header name: {header}")))?;
        Ok(self)
    }

    /// `None` when the method is unlisted and `allows_all` admits it.
    fn permission(&self, method: &str) -> Result<Option<&Permission>, AuthxError> {
        match self.authorization.permission(method) {
            Some(permission) => Ok(Some(permission)),
            None if self.authorization.allows_all => Ok(None),
            None => Err(AuthxError::unauthenticated(format!(
                "method {method} is not allowed"
            ))),
        }
    }

    fn token<'h>(&self, headers: &'h HeaderMap) -> Result<&'h str, AuthxError> {
        headers
            .get(&self.header)
            .ok_or_else(|| AuthxError::unauthenticated("missing token"))?
            .to_str()
            .map_err(|_| AuthxError::unauthenticated("unreadable token header"))
    }
}

// ============================================================================
// User path
// ============================================================================

#[derive(Clone)]
pub struct UserInterceptor {
    guard: Guard,
    secret: Arc<[u8]>,
}

impl UserInterceptor {
    pub fn new(authorization: AuthorizationConfig, secret: impl AsRef<[u8]>) -> Self {
        Self {
            guard: Guard::new(authorization),
            secret: Arc::from(secret.as_ref()),
        }
    }

    /// Read the token from another header.
    pub fn with_header(mut self, header: &str) -> Result<Self, AuthxError> {
        self.guard = self.guard.with_header(header)?;
        Ok(self)
    }

    /// Decide on one call. `Ok(None)` admits an unlisted method.
    pub fn authorize(
        &self,
        method: &str,
        headers: &HeaderMap,
    ) -> Result<Option<UserContext>, AuthxError> {
        let Some(permission) = self.guard.permission(method)? else {
            return Ok(None);
        };
        let token = self.guard.token(headers)?;
        let claim: UserClaim = verify(token, &self.secret, Expiry::Enforce)?;
        if !permission.valid(&claim.personal.primitives) {
            debug!(method, user_id = %claim.personal.user_id, "user lacks primitives");
            return Err(AuthxError::unauthenticated("insufficient primitives"));
        }
        Ok(Some(UserContext::from(claim)))
    }
}

/// Axum middleware for user tokens.
pub async fn user_interceptor(
    State(interceptor): State<UserInterceptor>,
    mut request: Request,
    next: Next,
) -> Response {
    strip_identity_headers(request.headers_mut());
    let method = request.uri().path().to_string();

    match interceptor.authorize(&method, request.headers()) {
        Ok(Some(context)) => {
            if let Err(e) = stamp_user(request.headers_mut(), &context) {
                return e.into_response();
            }
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        Ok(None) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}

// ============================================================================
// Device path
// ============================================================================

#[derive(Clone)]
pub struct DeviceInterceptor {
    guard: Guard,
    secrets: Arc<dyn SecretAccess>,
}

impl DeviceInterceptor {
    pub fn new(authorization: AuthorizationConfig, secrets: Arc<dyn SecretAccess>) -> Self {
        Self {
            guard: Guard::new(authorization),
            secrets,
        }
    }

    pub fn with_header(mut self, header: &str) -> Result<Self, AuthxError> {
        self.guard = self.guard.with_header(header)?;
        Ok(self)
    }

    pub async fn authorize(
        &self,
        method: &str,
        headers: &HeaderMap,
    ) -> Result<Option<DeviceContext>, AuthxError> {
        let Some(permission) = self.guard.permission(method)? else {
            return Ok(None);
        };
        let token = self.guard.token(headers)?;

        let unverified: DeviceClaim = peek(token)?;
        let secret = self
            .secrets
            .retrieve_secret(
                &unverified.device.organization_id,
                &unverified.device.device_group_id,
            )
            .await
            .map_err(|e| match e {
                AuthxError::NotFound(_) => AuthxError::unauthenticated("unknown device group"),
                other => other,
            })?;
        let claim: DeviceClaim = verify(token, secret.as_bytes(), Expiry::Enforce)?;

        if !permission.valid(&claim.device.primitives) {
            debug!(method, device_id = %claim.device.device_id, "device lacks primitives");
            return Err(AuthxError::permission_denied("insufficient primitives"));
        }
        Ok(Some(DeviceContext::from(claim)))
    }
}

/// Axum middleware for device tokens.
pub async fn device_interceptor(
    State(interceptor): State<DeviceInterceptor>,
    mut request: Request,
    next: Next,
) -> Response {
    strip_identity_headers(request.headers_mut());
    let method = request.uri().path().to_string();

    match interceptor.authorize(&method, request.headers()).await {
        Ok(Some(context)) => {
            if let Err(e) = stamp_device(request.headers_mut(), &context) {
                return e.into_response();
            }
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        Ok(None) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}

// ============================================================================
// Metadata
// ============================================================================

/// Callers must not be able to pre-set identity headers.
fn strip_identity_headers(headers: &mut HeaderMap) {
    for name in [
        USER_ID_HEADER,
        ORGANIZATION_ID_HEADER,
        DEVICE_GROUP_ID_HEADER,
        DEVICE_ID_HEADER,
    ] {
        headers.remove(name);
    }
    for primitive in Primitive::ALL {
        headers.remove(primitive.metadata_key());
    }
}

fn insert(headers: &mut HeaderMap, name: &'static str, value: &str) -> Result<(), AuthxError> {
    let value = HeaderValue::from_str(value)
        .map_err(|_| AuthxError::invalid_argument(format!("{name} is not a valid header value")))?;
    headers.insert(HeaderName::from_static(name), value);
    Ok(())
}

fn stamp_primitives(headers: &mut HeaderMap, primitives: &[Primitive]) {
    for primitive in primitives {
        headers.insert(
            HeaderName::from_static(primitive.metadata_key()),
            HeaderValue::from_static("true"),
        );
    }
}

fn stamp_user(headers: &mut HeaderMap, context: &UserContext) -> Result<(), AuthxError> {
    insert(headers, USER_ID_HEADER, &context.user_id)?;
    insert(headers, ORGANIZATION_ID_HEADER, &context.organization_id)?;
    stamp_primitives(headers, &context.primitives);
    Ok(())
}

fn stamp_device(headers: &mut HeaderMap, context: &DeviceContext) -> Result<(), AuthxError> {
    insert(headers, ORGANIZATION_ID_HEADER, &context.organization_id)?;
    insert(headers, DEVICE_GROUP_ID_HEADER, &context.device_group_id)?;
    insert(headers, DEVICE_ID_HEADER, &context.device_id)?;
    stamp_primitives(headers, &context.primitives);
    Ok(())
}
