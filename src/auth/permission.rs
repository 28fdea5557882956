// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-method capability requirements.
//!
//! The authorization document is JSON:
//!
//! ```json
//! {
//!   "allows_all": false,
//!   "permissions": {
//!     "/authx/AddRole": { "must": ["ORG"] },
//!     "/authx/GetDeviceGroupSecret": { "should": ["ORG", "APPCLUSTEROPS"] }
//!   }
//! }
//! ```

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::Primitive;

/// MUST / SHOULD / MUST_NOT requirement on a principal's primitives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    #[serde(default)]
    pub must: BTreeSet<Primitive>,
    #[serde(default)]
    pub should: BTreeSet<Primitive>,
    #[serde(default)]
    pub must_not: BTreeSet<Primitive>,
}

impl Permission {
    pub fn must(mut self, primitives: impl IntoIterator<Item = Primitive>) -> Self {
        self.must.extend(primitives);
        self
    }

    pub fn should(mut self, primitives: impl IntoIterator<Item = Primitive>) -> Self {
        self.should.extend(primitives);
        self
    }

    pub fn must_not(mut self, primitives: impl IntoIterator<Item = Primitive>) -> Self {
        self.must_not.extend(primitives);
        self
    }

    /// Holds iff every `must` is present, at least one `should` is present
    /// (when any are listed), and no `must_not` is present.
    pub fn valid(&self, primitives: &[Primitive]) -> bool {
        let held = |p: &Primitive| primitives.contains(p);
        self.must.iter().all(held)
            && (self.should.is_empty() || self.should.iter().any(held))
            && !self.must_not.iter().any(held)
    }

    /// First primitive listed under two requirements, with the two names.
    pub fn overlap(&self) -> Option<(Primitive, &'static str, &'static str)> {
        let sets = [
            ("must", &self.must),
            ("should", &self.should),
            ("must_not", &self.must_not),
        ];
        for (i, (left_name, left)) in sets.iter().enumerate() {
            for (right_name, right) in &sets[i + 1..] {
                if let Some(p) = left.intersection(right).next() {
                    return Some((*p, *left_name, *right_name));
                }
            }
        }
        None
    }
}

/// Interceptor configuration: which methods need what.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationConfig {
    /// Admit methods that have no entry in `permissions`.
    #[serde(default)]
    pub allows_all: bool,
    #[serde(default)]
    pub permissions: HashMap<String, Permission>,
}

/// Failure to load the authorization document.
#[derive(Debug, thiserror::Error)]
pub enum AuthorizationConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("invalid permission for {method} in {path}: {primitive} is in both {first} and {second}")]
    Overlap {
        path: String,
        method: String,
        primitive: Primitive,
        first: &'static str,
        second: &'static str,
    },
}

impl AuthorizationConfig {
    pub fn from_file(path: &Path) -> Result<Self, AuthorizationConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| AuthorizationConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self =
            serde_json::from_str(&raw).map_err(|source| AuthorizationConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        for (method, permission) in &config.permissions {
            if let Some((primitive, first, second)) = permission.overlap() {
                return Err(AuthorizationConfigError::Overlap {
                    path: path.display().to_string(),
                    method: method.clone(),
                    primitive,
                    first,
                    second,
                });
            }
        }
        tracing::info!(
            path = %path.display(),
            methods = config.permissions.len(),
            allows_all = config.allows_all,
            "loaded authorization config"
        );
        Ok(config)
    }

    pub fn with_permission(mut self, method: impl Into<String>, permission: Permission) -> Self {
        self.permissions.insert(method.into(), permission);
        self
    }

    pub fn allowing_all(mut self) -> Self {
        self.allows_all = true;
        self
    }

    pub fn permission(&self, method: &str) -> Option<&Permission> {
        self.permissions.get(method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Primitive::*;

    #[test]
    fn predicate_table() {
        // must=[P1], should=[P2,P3], must_not=[P4]
        let permission = Permission::default()
            .must([Org])
            .should([Apps, Resources])
            .must_not([Device]);

        let cases: &[(&[Primitive], bool)] = &[
            (&[Org, Apps], true),
            (&[Org, Device], false),
            (&[Org], false),
            (&[], false),
            (&[Org, Apps, Resources], true),
            (&[Org, Resources, Device], false),
            (&[Apps, Resources], false),
        ];
        for (held, expected) in cases {
            assert_eq!(permission.valid(held), *expected, "primitives {held:?}");
        }
    }

    #[test]
    fn empty_permission_admits_everyone() {
        assert!(Permission::default().valid(&[]));
        assert!(Permission::default().valid(&[Device]));
    }

    #[test]
    fn adding_primitives_is_monotone() {
        let must = Permission::default().must([Org]);
        assert!(!must.valid(&[Apps]));
        assert!(must.valid(&[Apps, Org]));

        let must_not = Permission::default().must_not([Device]);
        assert!(must_not.valid(&[Org]));
        assert!(!must_not.valid(&[Org, Device]));
    }

    #[test]
    fn config_parses_the_json_document() {
        let raw = r#"{
            "allows_all": false,
            "permissions": {
                "/authx/AddRole": { "must": ["ORG"] },
                "/authx/GetDeviceGroupSecret": { "should": ["ORG", "APPCLUSTEROPS"], "must_not": ["DEVICE"] }
            }
        }"#;
        let config: AuthorizationConfig = serde_json::from_str(raw).unwrap();

        assert!(!config.allows_all);
        assert_eq!(
            config.permission("/authx/AddRole"),
            Some(&Permission::default().must([Org]))
        );
        let secret = config.permission("/authx/GetDeviceGroupSecret").unwrap();
        assert!(secret.valid(&[AppClusterOps]));
        assert!(!secret.valid(&[AppClusterOps, Device]));
        assert!(config.permission("/authx/Unknown").is_none());
    }

    #[test]
    fn config_loads_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("authorization.json");
        std::fs::write(&path, r#"{"allows_all": true}"#).unwrap();

        let config = AuthorizationConfig::from_file(&path).unwrap();
        assert!(config.allows_all);
        assert!(config.permissions.is_empty());

        assert!(matches!(
            AuthorizationConfig::from_file(&dir.path().join("missing.json")),
            Err(AuthorizationConfigError::Io { .. })
        ));
    }

    #[test]
    fn overlapping_requirements_are_reported() {
        assert_eq!(Permission::default().must([Org]).should([Apps]).overlap(), None);
        assert_eq!(
            Permission::default().must([Org]).must_not([Org]).overlap(),
            Some((Org, "must", "must_not"))
        );
        assert_eq!(
            Permission::default()
                .should([Apps, Device])
                .must_not([Device])
                .overlap(),
            Some((Device, "should", "must_not"))
        );
    }

    #[test]
    fn config_with_contradictory_permission_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("authorization.json");
        std::fs::write(
            &path,
            r#"{"permissions": {
                "/authx/ListRoles": { "must": ["PROFILE"] },
                "/authx/AddRole": { "must": ["ORG"], "must_not": ["ORG"] }
            }}"#,
        )
        .unwrap();

        match AuthorizationConfig::from_file(&path) {
            Err(e @ AuthorizationConfigError::Overlap { .. }) => {
                let message = e.to_string();
                assert!(message.contains("/authx/AddRole"), "{message}");
                assert!(message.contains("ORG"), "{message}");
            }
            other => panic!("expected an overlap error, got {other:?}"),
        }
    }
}
