// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Edge-controller onboarding: join tokens and certificates.

pub mod certificates;
pub mod join_token;

pub use certificates::{
    CaLoadError, CertificateMinter, ControllerCertRequest, ControllerCertificate,
};
pub use join_token::{JoinToken, JoinTokenService};
