// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP client for the Authx RPC surface.
//!
//! Used by the secret-access implementations of protected services. Error
//! replies are mapped back onto [`AuthxError`] by their `error_code`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

use crate::auth::secret_access::DeviceGroupSecretSource;
use crate::error::{AuthxError, ErrorBody};
use crate::models::{DeviceGroupIdRequest, DeviceGroupSecret, LoginRequest, RefreshTokenRequest};
use crate::token::TokenPair;

/// Request deadline when the caller sets none.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Metadata header carrying the raw access token.
pub const DEFAULT_AUTH_HEADER: &str = "authorization";

#[derive(Clone)]
pub struct AuthxClient {
    base_url: Url,
    http: reqwest::Client,
    auth_header: String,
}

impl AuthxClient {
    pub fn new(base_url: &str) -> Result<Self, AuthxError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, AuthxError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AuthxError::invalid_argument(format!("invalid authx url {base_url}: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthxError::internal(format!("failed to build http client: {e}")))?;
        Ok(Self {
            base_url,
            http,
            auth_header: DEFAULT_AUTH_HEADER.to_string(),
        })
    }

    pub fn with_auth_header(mut self, header: impl Into<String>) -> Self {
        self.auth_header = header.into();
        self
    }

    /// POST `body` to `method` (e.g. `/authx/DeviceLogin`).
    pub async fn call<Req, Resp>(
        &self,
        method: &str,
        body: &Req,
        token: Option<&str>,
    ) -> Result<Resp, AuthxError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = self
            .base_url
            .join(method.trim_start_matches('/'))
            .map_err(|e| AuthxError::invalid_argument(format!("invalid method {method}: {e}")))?;

        let mut request = self.http.post(url).json(body);
        if let Some(token) = token {
            request = request.header(self.auth_header.as_str(), token);
        }
        let response = request.send().await.map_err(|e| {
            tracing::warn!(method, error = %e, "authx request failed");
            AuthxError::internal(format!("authx unreachable: {e}"))
        })?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<Resp>()
                .await
                .map_err(|e| AuthxError::internal(format!("invalid authx reply: {e}")));
        }

        match response.json::<ErrorBody>().await {
            Ok(body) => Err(AuthxError::from_code(&body.error_code, body.error)),
            Err(_) => Err(AuthxError::internal(format!("authx replied HTTP {status}"))),
        }
    }

    pub async fn login_with_basic_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<TokenPair, AuthxError> {
        self.call(
            "/authx/LoginWithBasicCredentials",
            &LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            },
            None,
        )
        .await
    }

    pub async fn refresh_token(&self, pair: &TokenPair) -> Result<TokenPair, AuthxError> {
        self.call(
            "/authx/RefreshToken",
            &RefreshTokenRequest {
                token: pair.token.clone(),
                refresh_token: pair.refresh_token.clone(),
            },
            None,
        )
        .await
    }

    pub async fn get_device_group_secret(
        &self,
        organization_id: &str,
        device_group_id: &str,
        token: Option<&str>,
    ) -> Result<DeviceGroupSecret, AuthxError> {
        self.call(
            "/authx/GetDeviceGroupSecret",
            &DeviceGroupIdRequest {
                organization_id: organization_id.to_string(),
                device_group_id: device_group_id.to_string(),
            },
            token,
        )
        .await
    }
}

/// In-cluster access: the Authx surface is reachable without a token.
#[async_trait]
impl DeviceGroupSecretSource for AuthxClient {
    async fn device_group_secret(
        &self,
        organization_id: &str,
        device_group_id: &str,
    ) -> Result<String, AuthxError> {
        Ok(self
            .get_device_group_secret(organization_id, device_group_id, None)
            .await?
            .secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_base_url() {
        assert!(matches!(
            AuthxClient::new("not a url"),
            Err(AuthxError::InvalidArgument(_))
        ));
        assert!(AuthxClient::new("http://authx:8810/").is_ok());
    }

    #[tokio::test]
    async fn unreachable_server_is_internal() {
        // Port 9 (discard) on localhost is expected to refuse connections.
        let client =
            AuthxClient::with_timeout("http://127.0.0.1:9/", Duration::from_secs(2)).unwrap();
        assert!(matches!(
            client.login_with_basic_credentials("alice", "secret1").await,
            Err(AuthxError::Internal(_))
        ));
    }
}
