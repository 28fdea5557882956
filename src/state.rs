// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::authx::Authx;
use crate::inventory::{CertificateMinter, JoinTokenService};
use crate::storage::Backend;

#[derive(Clone)]
pub struct AppState {
    pub authx: Authx,
    pub join_tokens: JoinTokenService,
    pub minter: Arc<CertificateMinter>,
}

impl AppState {
    pub fn new(authx: Authx, join_tokens: JoinTokenService, minter: CertificateMinter) -> Self {
        Self {
            authx,
            join_tokens,
            minter: Arc::new(minter),
        }
    }

    pub fn backend(&self) -> &Backend {
        &self.authx.providers().backend
    }
}
