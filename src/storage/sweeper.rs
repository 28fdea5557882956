// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # TTL Sweeper
//!
//! Background task that drops expired token rows.
//!
//! Token providers already treat expired rows as absent on read, so the sweeper
//! only bounds storage growth. Every `interval` (default 60 s) it purges:
//! 1. user refresh-token records,
//! 2. device refresh-token records and their refresh-token index,
//! 3. edge-controller join tokens.
//!
//! ## Shutdown
//!
//! Stops when its `tokio_util::sync::CancellationToken` is cancelled.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::providers::{unix_now, Providers};

/// Default interval between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Periodic purge of expired token rows.
pub struct TtlSweeper {
    providers: Providers,
    interval: Duration,
}

/// Rows removed by one sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub user_tokens: usize,
    pub device_tokens: usize,
    pub join_tokens: usize,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.user_tokens + self.device_tokens + self.join_tokens
    }
}

impl TtlSweeper {
    pub fn new(providers: Providers) -> Self {
        Self {
            providers,
            interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run until `shutdown` is cancelled.
    ///
    /// ```rust,ignore
    /// tokio::spawn(sweeper.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            backend = self.providers.backend.name(),
            "TTL sweeper starting"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("TTL sweeper shutting down");
                    return;
                }
            }

            let providers = self.providers.clone();
            match tokio::task::spawn_blocking(move || sweep(&providers, unix_now())).await {
                Ok(report) if report.total() > 0 => {
                    info!(
                        user_tokens = report.user_tokens,
                        device_tokens = report.device_tokens,
                        join_tokens = report.join_tokens,
                        "TTL sweeper purged expired rows"
                    );
                }
                Ok(_) => debug!("TTL sweeper found nothing to purge"),
                Err(e) => warn!(error = %e, "TTL sweeper task failed"),
            }
        }
    }
}

/// One purge pass. Failures on one table do not stop the others.
pub fn sweep(providers: &Providers, now: i64) -> SweepReport {
    let mut report = SweepReport::default();

    match providers.user_tokens.purge_expired(now) {
        Ok(n) => report.user_tokens = n,
        Err(e) => warn!(error = %e, "failed to purge user tokens"),
    }
    match providers.device_tokens.purge_expired(now) {
        Ok(n) => report.device_tokens = n,
        Err(e) => warn!(error = %e, "failed to purge device tokens"),
    }
    match providers.join_tokens.purge_expired(now) {
        Ok(n) => report.join_tokens = n,
        Err(e) => warn!(error = %e, "failed to purge join tokens"),
    }

    report
}
