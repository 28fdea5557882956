// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Capability primitives granted by roles.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Capability tag checked by the interceptors.
///
/// The set is closed: a role can only ever grant these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Primitive {
    /// Organization administration
    Org,
    /// Application management
    Apps,
    /// Cluster and infrastructure resources
    Resources,
    /// Own profile
    Profile,
    /// Application-cluster operations
    AppClusterOps,
    /// Device principal
    Device,
}

impl Primitive {
    pub const ALL: [Primitive; 6] = [
        Primitive::Org,
        Primitive::Apps,
        Primitive::Resources,
        Primitive::Profile,
        Primitive::AppClusterOps,
        Primitive::Device,
    ];

    /// Wire name, e.g. `APPCLUSTEROPS`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Primitive::Org => "ORG",
            Primitive::Apps => "APPS",
            Primitive::Resources => "RESOURCES",
            Primitive::Profile => "PROFILE",
            Primitive::AppClusterOps => "APPCLUSTEROPS",
            Primitive::Device => "DEVICE",
        }
    }

    /// Name of the metadata flag stamped by the interceptors.
    pub fn metadata_key(&self) -> &'static str {
        match self {
            Primitive::Org => "org",
            Primitive::Apps => "apps",
            Primitive::Resources => "resources",
            Primitive::Profile => "profile",
            Primitive::AppClusterOps => "appclusterops",
            Primitive::Device => "device",
        }
    }
}

impl FromStr for Primitive {
    type Err = String;

    /// Case-insensitive parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Primitive::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown primitive: {s}"))
    }
}

impl std::fmt::Display for Primitive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_uppercase_names() {
        let json = serde_json::to_string(&Primitive::ALL).unwrap();
        assert_eq!(
            json,
            r#"["ORG","APPS","RESOURCES","PROFILE","APPCLUSTEROPS","DEVICE"]"#
        );
    }

    #[test]
    fn unknown_primitive_is_rejected() {
        let parsed: Result<Primitive, _> = serde_json::from_str(r#""ROOT""#);
        assert!(parsed.is_err());
        assert!("root".parse::<Primitive>().is_err());
    }

    #[test]
    fn from_str_is_case_insensitive() {
        assert_eq!("org".parse::<Primitive>(), Ok(Primitive::Org));
        assert_eq!("AppClusterOps".parse::<Primitive>(), Ok(Primitive::AppClusterOps));
    }
}
