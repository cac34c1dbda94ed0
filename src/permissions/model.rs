use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Resource type a capability grant applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Project,
    Workbook,
    Datasource,
    Flow,
    Metric,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 5] =
        [ObjectKind::Project, ObjectKind::Workbook, ObjectKind::Datasource, ObjectKind::Flow, ObjectKind::Metric];

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Project => "project",
            ObjectKind::Workbook => "workbook",
            ObjectKind::Datasource => "datasource",
            ObjectKind::Flow => "flow",
            ObjectKind::Metric => "metric",
        }
    }

    /// Plural path segment under `default-permissions/`.
    pub fn endpoint_segment(&self) -> String { format!("{}s", self.as_str()) }

    fn valid_set() -> String {
        Self::ALL.iter().map(|k| k.as_str()).collect::<Vec<_>>().join(", ")
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for ObjectKind {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ClientError::invalid_argument(format!("object kind '{}' must be one of {}", s, Self::valid_set())))
    }
}

/// Top-level partition of the permission map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GranteeType {
    Users,
    Groups,
}

impl GranteeType {
    pub const ALL: [GranteeType; 2] = [GranteeType::Users, GranteeType::Groups];

    /// Path segment and map key: "users" / "groups".
    pub fn as_str(&self) -> &'static str {
        match self {
            GranteeType::Users => "users",
            GranteeType::Groups => "groups",
        }
    }

    /// Element name of the grantee reference inside a capability block.
    pub fn element_name(&self) -> &'static str {
        match self {
            GranteeType::Users => "user",
            GranteeType::Groups => "group",
        }
    }
}

impl fmt::Display for GranteeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for GranteeType {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "users" => Ok(GranteeType::Users),
            "groups" => Ok(GranteeType::Groups),
            other => Err(ClientError::invalid_argument(format!("grantee type '{}' must be one of users, groups", other))),
        }
    }
}

/// Mode of a capability grant. Parsing is exact-case: "allow" is not "Allow".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CapabilityMode {
    Allow,
    Deny,
}

impl CapabilityMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityMode::Allow => "Allow",
            CapabilityMode::Deny => "Deny",
        }
    }
}

impl fmt::Display for CapabilityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for CapabilityMode {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Allow" => Ok(CapabilityMode::Allow),
            "Deny" => Ok(CapabilityMode::Deny),
            other => Err(ClientError::invalid_argument(format!("capability mode '{}' must be one of Allow, Deny", other))),
        }
    }
}

/// One grant confirmed by the service after a write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedGrant {
    pub grantee_type: GranteeType,
    pub grantee_id: String,
    pub capability: String,
    pub mode: CapabilityMode,
}
