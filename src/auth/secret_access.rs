// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Device-group secret lookup for the device interceptor.
//!
//! Device tokens are signed with the secret of their group, so a verifier
//! needs one secret per group it sees. [`SecretAccess`] resolves them:
//!
//! - [`DirectSecretAccess`] asks a [`DeviceGroupSecretSource`] (the in-process
//!   [`Authx`] core or an in-cluster [`AuthxClient`]).
//! - [`ClusterApiSecretAccess`] logs in with a service user and calls the
//!   cluster API with the resulting token, re-logging in once when the token
//!   is rejected.
//!
//! Both cache secrets in a bounded LRU. Entries never expire; eviction is
//! size-driven and `purge` / `purge_group` drop entries on demand.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lru::LruCache;
use tracing::{debug, info};

use crate::authx::Authx;
use crate::client::AuthxClient;
use crate::error::AuthxError;

/// Default number of cached group secrets.
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// Where group secrets come from on a cache miss.
#[async_trait]
pub trait DeviceGroupSecretSource: Send + Sync {
    async fn device_group_secret(
        &self,
        organization_id: &str,
        device_group_id: &str,
    ) -> Result<String, AuthxError>;
}

#[async_trait]
impl DeviceGroupSecretSource for Authx {
    async fn device_group_secret(
        &self,
        organization_id: &str,
        device_group_id: &str,
    ) -> Result<String, AuthxError> {
        self.get_device_group_secret(organization_id, device_group_id)
    }
}

/// Cached access to device-group secrets.
#[async_trait]
pub trait SecretAccess: Send + Sync {
    async fn retrieve_secret(
        &self,
        organization_id: &str,
        device_group_id: &str,
    ) -> Result<String, AuthxError>;

    /// Drop every cached secret.
    fn purge(&self);

    /// Drop the cached secret of one group.
    fn purge_group(&self, organization_id: &str, device_group_id: &str);
}

/// LRU of `(organization_id, device_group_id) -> secret`.
pub struct SecretCache {
    cache: Mutex<LruCache<(String, String), String>>,
}

impl SecretCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn get(&self, organization_id: &str, device_group_id: &str) -> Option<String> {
        let key = (organization_id.to_string(), device_group_id.to_string());
        self.cache.lock().ok()?.get(&key).cloned()
    }

    pub fn put(&self, organization_id: &str, device_group_id: &str, secret: String) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(
                (organization_id.to_string(), device_group_id.to_string()),
                secret,
            );
        }
    }

    pub fn remove(&self, organization_id: &str, device_group_id: &str) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.pop(&(organization_id.to_string(), device_group_id.to_string()));
        }
    }

    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Secret access backed by a direct source.
pub struct DirectSecretAccess {
    source: Arc<dyn DeviceGroupSecretSource>,
    cache: SecretCache,
}

impl DirectSecretAccess {
    pub fn new(source: Arc<dyn DeviceGroupSecretSource>) -> Self {
        Self::with_capacity(source, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(source: Arc<dyn DeviceGroupSecretSource>, capacity: usize) -> Self {
        Self {
            source,
            cache: SecretCache::new(capacity),
        }
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

#[async_trait]
impl SecretAccess for DirectSecretAccess {
    async fn retrieve_secret(
        &self,
        organization_id: &str,
        device_group_id: &str,
    ) -> Result<String, AuthxError> {
        if let Some(secret) = self.cache.get(organization_id, device_group_id) {
            return Ok(secret);
        }
        debug!(organization_id, device_group_id, "group secret cache miss");
        let secret = self
            .source
            .device_group_secret(organization_id, device_group_id)
            .await?;
        self.cache.put(organization_id, device_group_id, secret.clone());
        Ok(secret)
    }

    fn purge(&self) {
        self.cache.clear();
    }

    fn purge_group(&self, organization_id: &str, device_group_id: &str) {
        self.cache.remove(organization_id, device_group_id);
    }
}

/// Secret access from outside the management cluster.
pub struct ClusterApiSecretAccess {
    client: AuthxClient,
    username: String,
    password: String,
    token: tokio::sync::Mutex<Option<String>>,
    cache: SecretCache,
}

impl ClusterApiSecretAccess {
    pub fn new(client: AuthxClient, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::with_capacity(client, username, password, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(
        client: AuthxClient,
        username: impl Into<String>,
        password: impl Into<String>,
        capacity: usize,
    ) -> Self {
        Self {
            client,
            username: username.into(),
            password: password.into(),
            token: tokio::sync::Mutex::new(None),
            cache: SecretCache::new(capacity),
        }
    }

    async fn login(&self) -> Result<String, AuthxError> {
        let pair = self
            .client
            .login_with_basic_credentials(&self.username, &self.password)
            .await?;
        info!(username = %self.username, "cluster api login");
        Ok(pair.token)
    }

    async fn fetch(&self, organization_id: &str, device_group_id: &str) -> Result<String, AuthxError> {
        let mut token = self.token.lock().await;
        let current = match token.as_ref() {
            Some(current) => current.clone(),
            None => {
                let fresh = self.login().await?;
                *token = Some(fresh.clone());
                fresh
            }
        };

        match self
            .client
            .get_device_group_secret(organization_id, device_group_id, Some(&current))
            .await
        {
            Ok(reply) => Ok(reply.secret),
            Err(AuthxError::Unauthenticated(_)) => {
                debug!("cluster api token rejected, logging in again");
                let fresh = self.login().await?;
                *token = Some(fresh.clone());
                Ok(self
                    .client
                    .get_device_group_secret(organization_id, device_group_id, Some(&fresh))
                    .await?
                    .secret)
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl SecretAccess for ClusterApiSecretAccess {
    async fn retrieve_secret(
        &self,
        organization_id: &str,
        device_group_id: &str,
    ) -> Result<String, AuthxError> {
        if let Some(secret) = self.cache.get(organization_id, device_group_id) {
            return Ok(secret);
        }
        let secret = self.fetch(organization_id, device_group_id).await?;
        self.cache.put(organization_id, device_group_id, secret.clone());
        Ok(secret)
    }

    fn purge(&self) {
        self.cache.clear();
    }

    fn purge_group(&self, organization_id: &str, device_group_id: &str) {
        self.cache.remove(organization_id, device_group_id);
    }
}
