// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authx - Authentication & Authorization Service
//!
//! Issues, validates and refreshes bearer tokens for users and devices,
//! onboards edge controllers with join tokens and CA-signed certificates,
//! and ships the interceptors protected services put in front of their
//! handlers.
//!
//! ## Modules
//!
//! - `api` - RPC handlers (Axum)
//! - `auth` - Claims, primitives, permissions and interceptors
//! - `authx` - Credential, role and device orchestration
//! - `client` - HTTP client for the RPC surface
//! - `inventory` - Edge-controller join tokens and certificates
//! - `storage` - Providers over in-memory or redb tables
//! - `token` - Token signing, verification and refresh

pub mod api;
pub mod auth;
pub mod authx;
pub mod client;
pub mod config;
pub mod error;
pub mod inventory;
pub mod models;
pub mod password;
pub mod state;
pub mod storage;
pub mod token;
