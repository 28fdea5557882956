// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authorization Module
//!
//! Claims, primitives and the interceptors protected services put in front
//! of their handlers.
//!
//! ## Tokens
//!
//! - **User tokens** are HS256 JWTs signed with the process secret. They carry
//!   the user's role name and the role's primitives.
//! - **Device tokens** are HS256 JWTs signed with the secret of the device's
//!   group. Verifiers fetch that secret through [`SecretAccess`].
//!
//! ## Authorization
//!
//! Each method has a [`Permission`] (`must`, `should`, `must_not` primitive
//! sets) in an [`AuthorizationConfig`]. Admitted requests gain identity
//! headers plus a [`UserContext`] or [`DeviceContext`] extension.

pub mod claims;
pub mod extractor;
pub mod interceptor;
pub mod permission;
pub mod primitives;
pub mod secret_access;

pub use claims::{DeviceClaim, DevicePersonalClaim, PersonalClaim, UserClaim};
pub use extractor::{DeviceContext, UserContext};
pub use interceptor::{device_interceptor, user_interceptor, DeviceInterceptor, UserInterceptor};
pub use permission::{AuthorizationConfig, AuthorizationConfigError, Permission};
pub use primitives::Primitive;
pub use secret_access::{
    ClusterApiSecretAccess, DeviceGroupSecretSource, DirectSecretAccess, SecretAccess,
};
