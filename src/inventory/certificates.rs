// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Edge-controller certificate minting.
//!
//! Every request gets a fresh 2048-bit RSA key and a server certificate
//! signed by the preloaded issuing CA:
//!
//! - Subject `O=<organization_id>, OU=<edge_controller_id>, CN=<name>`
//! - IP subject alternative names
//! - valid for two years from issuance
//! - KeyUsage DigitalSignature + KeyEncipherment, ExtKeyUsage ServerAuth
//! - not a CA

use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;

use rcgen::{
    CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose, IsCa, Issuer, KeyPair,
    KeyUsagePurpose, SanType, SerialNumber,
};
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::RsaPrivateKey;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use utoipa::ToSchema;

use crate::error::AuthxError;

const RSA_KEY_BITS: usize = 2048;
const VALIDITY_DAYS: i64 = 730;

/// Failure to load the issuing CA.
#[derive(Debug, thiserror::Error)]
pub enum CaLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid CA private key: {0}")]
    Key(String),
    #[error("invalid CA certificate: {0}")]
    Certificate(String),
}

/// Input of one mint.
#[derive(Debug, Clone)]
pub struct ControllerCertRequest {
    pub organization_id: String,
    pub edge_controller_id: String,
    pub name: String,
    pub ips: Vec<String>,
}

/// Minted certificate and its private key, both PEM.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ControllerCertificate {
    pub organization_id: String,
    pub edge_controller_id: String,
    pub certificate: String,
    /// PKCS#1 RSA private key.
    pub private_key: String,
}

/// Signs edge-controller certificates with the issuing CA.
pub struct CertificateMinter {
    issuer: Issuer<'static, KeyPair>,
}

impl CertificateMinter {
    /// Load the CA from PEM text. RSA keys may be PKCS#1 or PKCS#8.
    pub fn from_pem(ca_cert_pem: &str, ca_key_pem: &str) -> Result<Self, CaLoadError> {
        let key_pem = normalize_key_pem(ca_key_pem)?;
        let key = KeyPair::from_pem(&key_pem).map_err(|e| CaLoadError::Key(e.to_string()))?;
        let issuer = Issuer::from_ca_cert_pem(ca_cert_pem, key)
            .map_err(|e| CaLoadError::Certificate(e.to_string()))?;
        Ok(Self { issuer })
    }

    pub fn from_files(cert_path: &Path, key_path: &Path) -> Result<Self, CaLoadError> {
        let cert = read(cert_path)?;
        let key = read(key_path)?;
        let minter = Self::from_pem(&cert, &key)?;
        tracing::info!(cert = %cert_path.display(), "loaded issuing CA");
        Ok(minter)
    }

    /// Mint a certificate for one edge controller.
    pub fn mint(&self, request: &ControllerCertRequest) -> Result<ControllerCertificate, AuthxError> {
        let ips = validate(request)?;

        let rsa_key = RsaPrivateKey::new(&mut rand::thread_rng(), RSA_KEY_BITS).map_err(|e| {
            tracing::error!(error = %e, "RSA key generation failed");
            AuthxError::internal("key generation failed")
        })?;
        let pkcs8 = rsa_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| internal("key encoding failed", e))?;
        let key_pair = KeyPair::from_pem(&pkcs8).map_err(|e| internal("key import failed", e))?;

        let mut params = CertificateParams::default();
        let mut subject = DistinguishedName::new();
        subject.push(DnType::OrganizationName, request.organization_id.as_str());
        subject.push(DnType::OrganizationalUnitName, request.edge_controller_id.as_str());
        subject.push(DnType::CommonName, request.name.as_str());
        params.distinguished_name = subject;
        params.subject_alt_names = ips.into_iter().map(SanType::IpAddress).collect();

        let now = OffsetDateTime::now_utc();
        params.not_before = now;
        params.not_after = now + Duration::days(VALIDITY_DAYS);
        params.key_usages = vec![
            KeyUsagePurpose::DigitalSignature,
            KeyUsagePurpose::KeyEncipherment,
        ];
        params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
        params.is_ca = IsCa::ExplicitNoCa;
        params.serial_number = Some(random_serial());

        let cert = params
            .signed_by(&key_pair, &self.issuer)
            .map_err(|e| internal("certificate signing failed", e))?;
        let private_key = rsa_key
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| internal("key encoding failed", e))?;

        tracing::info!(
            organization_id = %request.organization_id,
            edge_controller_id = %request.edge_controller_id,
            "controller certificate minted"
        );
        Ok(ControllerCertificate {
            organization_id: request.organization_id.clone(),
            edge_controller_id: request.edge_controller_id.clone(),
            certificate: cert.pem(),
            private_key: private_key.to_string(),
        })
    }

    /// [`mint`](Self::mint) on the blocking pool.
    pub async fn mint_blocking(
        self: &Arc<Self>,
        request: ControllerCertRequest,
    ) -> Result<ControllerCertificate, AuthxError> {
        let minter = Arc::clone(self);
        tokio::task::spawn_blocking(move || minter.mint(&request))
            .await
            .map_err(|e| AuthxError::internal(format!("minting task failed: {e}")))?
    }
}

fn validate(request: &ControllerCertRequest) -> Result<Vec<IpAddr>, AuthxError> {
    crate::authx::require_id("organization_id", &request.organization_id)?;
    crate::authx::require_id("edge_controller_id", &request.edge_controller_id)?;
    crate::authx::require("name", &request.name)?;

    let ips = request
        .ips
        .iter()
        .map(|ip| {
            ip.trim()
                .parse::<IpAddr>()
                .map_err(|_| AuthxError::invalid_argument(format!("invalid IP address: {ip}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if ips.is_empty() {
        return Err(AuthxError::invalid_argument("at least one IP address is required"));
    }
    Ok(ips)
}

// 63 bits so the DER integer stays positive without a padding byte.
// TODO: switch to 128-bit serials once downstream consumers accept them.
fn random_serial() -> SerialNumber {
    let serial = rand::random::<u64>() >> 1;
    SerialNumber::from_slice(&serial.to_be_bytes())
}

fn normalize_key_pem(key_pem: &str) -> Result<String, CaLoadError> {
    let parsed = pem::parse(key_pem).map_err(|e| CaLoadError::Key(e.to_string()))?;
    if parsed.tag() != "RSA PRIVATE KEY" {
        return Ok(key_pem.to_string());
    }
    let key = RsaPrivateKey::from_pkcs1_pem(key_pem).map_err(|e| CaLoadError::Key(e.to_string()))?;
    key.to_pkcs8_pem(LineEnding::LF)
        .map(|pem| pem.to_string())
        .map_err(|e| CaLoadError::Key(e.to_string()))
}

fn read(path: &Path) -> Result<String, CaLoadError> {
    std::fs::read_to_string(path).map_err(|source| CaLoadError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn internal(context: &'static str, e: impl std::fmt::Display) -> AuthxError {
    tracing::error!(error = %e, "{context}");
    AuthxError::internal(context)
}
