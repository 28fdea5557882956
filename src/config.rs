// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults and the validated [`Config`] loaded
//! at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8810` |
//! | `DEBUG` | Debug logging | `false` |
//! | `JWT_SECRET` | User-token secret, or `@<path>` to read it from a file | Required |
//! | `EXPIRATION_SECS` | User token TTL | `10800` |
//! | `DEVICE_EXPIRATION_SECS` | Device token TTL | `10800` |
//! | `EIC_JOIN_EXPIRATION_SECS` | Edge-controller join token TTL | `3600` |
//! | `PROVIDER_BACKEND` | `memory` or `persistent` | `memory` |
//! | `DATA_DIR` | Directory of the persistent database | `/data` |
//! | `MANAGEMENT_CLUSTER_CERT_PATH` | CA certificate handed to joining controllers | Required |
//! | `CA_CERT_PATH` | Issuing CA certificate | Required |
//! | `CA_PRIVATE_KEY_PATH` | Issuing CA private key | Required |
//! | `AUTHORIZATION_CONFIG_PATH` | Authorization config guarding the service | Unset |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | Serve over TLS | Unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const DEBUG_ENV: &str = "DEBUG";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const EXPIRATION_ENV: &str = "EXPIRATION_SECS";
pub const DEVICE_EXPIRATION_ENV: &str = "DEVICE_EXPIRATION_SECS";
pub const JOIN_EXPIRATION_ENV: &str = "EIC_JOIN_EXPIRATION_SECS";
pub const PROVIDER_BACKEND_ENV: &str = "PROVIDER_BACKEND";

/// Environment variable name for the persistent database directory.
///
/// # Default
/// `/data`
pub const DATA_DIR_ENV: &str = "DATA_DIR";

pub const MANAGEMENT_CLUSTER_CERT_ENV: &str = "MANAGEMENT_CLUSTER_CERT_PATH";
pub const CA_CERT_ENV: &str = "CA_CERT_PATH";
pub const CA_PRIVATE_KEY_ENV: &str = "CA_PRIVATE_KEY_PATH";
pub const AUTHORIZATION_CONFIG_ENV: &str = "AUTHORIZATION_CONFIG_PATH";
pub const TLS_CERT_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8810;
pub const DEFAULT_DATA_DIR: &str = "/data";

/// Longest accepted lifetime of any token (3h).
pub const MAX_TTL_SECS: i64 = 3 * 60 * 60;
pub const DEFAULT_EXPIRATION_SECS: i64 = MAX_TTL_SECS;
pub const DEFAULT_DEVICE_EXPIRATION_SECS: i64 = MAX_TTL_SECS;
pub const DEFAULT_JOIN_EXPIRATION_SECS: i64 = 60 * 60;

/// File name of the redb database inside `DATA_DIR`.
pub const DATABASE_FILE: &str = "authx.redb";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("failed to read secret file {path}: {source}")]
    SecretFile {
        path: String,
        source: std::io::Error,
    },
}

fn invalid(var: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        var,
        reason: reason.into(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderBackend {
    Memory,
    Persistent,
}

impl FromStr for ProviderBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "persistent" => Ok(Self::Persistent),
            other => Err(format!("unknown provider backend {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl LogFormat {
    /// Anything but `json` falls back to pretty output.
    pub fn from_env() -> Self {
        match std::env::var(LOG_FORMAT_ENV) {
            Ok(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Pretty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub debug: bool,
    pub jwt_secret: String,
    pub expiration_secs: i64,
    pub device_expiration_secs: i64,
    pub join_expiration_secs: i64,
    pub provider_backend: ProviderBackend,
    pub data_dir: PathBuf,
    pub management_cluster_cert_path: PathBuf,
    pub ca_cert_path: PathBuf,
    pub ca_private_key_path: PathBuf,
    pub authorization_config_path: Option<PathBuf>,
    pub tls: Option<TlsPaths>,
}

// The secret stays out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("debug", &self.debug)
            .field("jwt_secret", &"<redacted>")
            .field("expiration_secs", &self.expiration_secs)
            .field("device_expiration_secs", &self.device_expiration_secs)
            .field("join_expiration_secs", &self.join_expiration_secs)
            .field("provider_backend", &self.provider_backend)
            .field("data_dir", &self.data_dir)
            .field("management_cluster_cert_path", &self.management_cluster_cert_path)
            .field("ca_cert_path", &self.ca_cert_path)
            .field("ca_private_key_path", &self.ca_private_key_path)
            .field("authorization_config_path", &self.authorization_config_path)
            .field("tls", &self.tls)
            .finish()
    }
}

impl Config {
    /// Load and validate from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load and validate from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| var(name).ok_or(ConfigError::Missing(name));

        let port = match var(PORT_ENV) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| invalid(PORT_ENV, e.to_string()))?,
            None => DEFAULT_PORT,
        };
        let debug = match var(DEBUG_ENV) {
            Some(raw) => parse_bool(DEBUG_ENV, &raw)?,
            None => false,
        };
        let provider_backend = match var(PROVIDER_BACKEND_ENV) {
            Some(raw) => raw
                .parse()
                .map_err(|e: String| invalid(PROVIDER_BACKEND_ENV, e))?,
            None => ProviderBackend::Memory,
        };
        let tls = match (var(TLS_CERT_ENV), var(TLS_KEY_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            _ => {
                return Err(invalid(
                    TLS_CERT_ENV,
                    format!("{TLS_CERT_ENV} and {TLS_KEY_ENV} must be set together"),
                ))
            }
        };

        let config = Self {
            host: var(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            debug,
            jwt_secret: load_secret(&required(JWT_SECRET_ENV)?)?,
            expiration_secs: ttl(&var, EXPIRATION_ENV, DEFAULT_EXPIRATION_SECS)?,
            device_expiration_secs: ttl(&var, DEVICE_EXPIRATION_ENV, DEFAULT_DEVICE_EXPIRATION_SECS)?,
            join_expiration_secs: ttl(&var, JOIN_EXPIRATION_ENV, DEFAULT_JOIN_EXPIRATION_SECS)?,
            provider_backend,
            data_dir: var(DATA_DIR_ENV)
                .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())
                .into(),
            management_cluster_cert_path: required(MANAGEMENT_CLUSTER_CERT_ENV)?.into(),
            ca_cert_path: required(CA_CERT_ENV)?.into(),
            ca_private_key_path: required(CA_PRIVATE_KEY_ENV)?.into(),
            authorization_config_path: var(AUTHORIZATION_CONFIG_ENV).map(PathBuf::from),
            tls,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(invalid(PORT_ENV, "must be positive"));
        }
        if self.jwt_secret.is_empty() {
            return Err(invalid(JWT_SECRET_ENV, "must not be empty"));
        }
        for (var, value) in [
            (EXPIRATION_ENV, self.expiration_secs),
            (DEVICE_EXPIRATION_ENV, self.device_expiration_secs),
            (JOIN_EXPIRATION_ENV, self.join_expiration_secs),
        ] {
            if value <= 0 || value > MAX_TTL_SECS {
                return Err(invalid(
                    var,
                    format!("{value} is outside 1..={MAX_TTL_SECS} seconds"),
                ));
            }
        }
        for (var, path) in [
            (MANAGEMENT_CLUSTER_CERT_ENV, &self.management_cluster_cert_path),
            (CA_CERT_ENV, &self.ca_cert_path),
            (CA_PRIVATE_KEY_ENV, &self.ca_private_key_path),
        ] {
            if path.as_os_str().is_empty() {
                return Err(invalid(var, "path must not be empty"));
            }
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e: std::net::AddrParseError| invalid(HOST_ENV, e.to_string()))
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(invalid(var, format!("{other:?} is not a boolean"))),
    }
}

fn ttl(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: i64,
) -> Result<i64, ConfigError> {
    match var(name) {
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|e| invalid(name, e.to_string())),
        None => Ok(default),
    }
}

/// `@<path>` reads the secret from a file, anything else is the secret itself.
fn load_secret(raw: &str) -> Result<String, ConfigError> {
    match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .map(|s| s.trim().to_string())
            .map_err(|source| ConfigError::SecretFile {
                path: path.to_string(),
                source,
            }),
        None => Ok(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base() -> HashMap<&'static str, String> {
        HashMap::from([
            (JWT_SECRET_ENV, "s3cret".to_string()),
            (MANAGEMENT_CLUSTER_CERT_ENV, "/certs/mngt.pem".to_string()),
            (CA_CERT_ENV, "/certs/ca.crt".to_string()),
            (CA_PRIVATE_KEY_ENV, "/certs/ca.key".to_string()),
        ])
    }

    fn load(vars: &HashMap<&'static str, String>) -> Result<Config, ConfigError> {
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = load(&base()).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.host, DEFAULT_HOST);
        assert!(!config.debug);
        assert_eq!(config.expiration_secs, 10_800);
        assert_eq!(config.device_expiration_secs, 10_800);
        assert_eq!(config.join_expiration_secs, 3_600);
        assert_eq!(config.provider_backend, ProviderBackend::Memory);
        assert_eq!(config.database_path(), PathBuf::from("/data/authx.redb"));
        assert!(config.authorization_config_path.is_none());
        assert!(config.tls.is_none());
        assert_eq!(config.bind_addr().unwrap().port(), 8810);
    }

    #[test]
    fn required_variables_are_enforced() {
        for name in [
            JWT_SECRET_ENV,
            MANAGEMENT_CLUSTER_CERT_ENV,
            CA_CERT_ENV,
            CA_PRIVATE_KEY_ENV,
        ] {
            let mut vars = base();
            vars.remove(name);
            match load(&vars) {
                Err(ConfigError::Missing(missing)) => assert_eq!(missing, name),
                other => panic!("expected Missing({name}), got {other:?}"),
            }
        }
    }

    #[test]
    fn ttls_are_capped_at_three_hours() {
        let mut vars = base();
        vars.insert(EXPIRATION_ENV, "10801".into());
        assert!(matches!(load(&vars), Err(ConfigError::Invalid { var: EXPIRATION_ENV, .. })));

        let mut vars = base();
        vars.insert(JOIN_EXPIRATION_ENV, "0".into());
        assert!(load(&vars).is_err());

        let mut vars = base();
        vars.insert(DEVICE_EXPIRATION_ENV, "600".into());
        assert_eq!(load(&vars).unwrap().device_expiration_secs, 600);
    }

    #[test]
    fn port_zero_is_rejected() {
        let mut vars = base();
        vars.insert(PORT_ENV, "0".into());
        assert!(load(&vars).is_err());
        vars.insert(PORT_ENV, "not-a-port".into());
        assert!(load(&vars).is_err());
    }

    #[test]
    fn backend_and_flags_parse() {
        let mut vars = base();
        vars.insert(PROVIDER_BACKEND_ENV, "Persistent".into());
        vars.insert(DEBUG_ENV, "true".into());
        vars.insert(DATA_DIR_ENV, "/var/lib/authx".into());
        let config = load(&vars).unwrap();
        assert_eq!(config.provider_backend, ProviderBackend::Persistent);
        assert!(config.debug);
        assert_eq!(config.database_path(), PathBuf::from("/var/lib/authx/authx.redb"));

        vars.insert(PROVIDER_BACKEND_ENV, "scylla".into());
        assert!(load(&vars).is_err());
    }

    #[test]
    fn tls_paths_come_in_pairs() {
        let mut vars = base();
        vars.insert(TLS_CERT_ENV, "/tls/cert.pem".into());
        assert!(load(&vars).is_err());
        vars.insert(TLS_KEY_ENV, "/tls/key.pem".into());
        let tls = load(&vars).unwrap().tls.unwrap();
        assert_eq!(tls.key, PathBuf::from("/tls/key.pem"));
    }

    #[test]
    fn secret_can_be_read_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jwt");
        std::fs::write(&path, "from-file\n").unwrap();

        let mut vars = base();
        vars.insert(JWT_SECRET_ENV, format!("@{}", path.display()));
        assert_eq!(load(&vars).unwrap().jwt_secret, "from-file");

        vars.insert(JWT_SECRET_ENV, "@/nonexistent/jwt".into());
        assert!(matches!(load(&vars), Err(ConfigError::SecretFile { .. })));
    }

    #[test]
    fn debug_output_redacts_secret() {
        let rendered = format!("{:?}", load(&base()).unwrap());
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("<redacted>"));
    }
}
