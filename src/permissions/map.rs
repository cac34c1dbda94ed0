//! Four-level permission map:
//! grantee type -> grantee id -> object kind -> capability name -> mode.
//!
//! A missing entry means no explicit grant was observed, never an implicit Deny.
//! Intermediate levels are created on first write only.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::model::{CapabilityMode, GranteeType, ObjectKind};

pub type Capabilities = BTreeMap<String, CapabilityMode>;
pub type KindGrants = BTreeMap<ObjectKind, Capabilities>;
pub type GranteeGrants = BTreeMap<String, KindGrants>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionMap {
    #[serde(default)]
    users: GranteeGrants,
    #[serde(default)]
    groups: GranteeGrants,
}

/// Borrowed view of one leaf of the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrantRef<'a> {
    pub grantee_type: GranteeType,
    pub grantee_id: &'a str,
    pub kind: ObjectKind,
    pub capability: &'a str,
    pub mode: CapabilityMode,
}

impl PermissionMap {
    pub fn new() -> Self { Self::default() }

    pub fn grantees(&self, grantee_type: GranteeType) -> &GranteeGrants {
        match grantee_type {
            GranteeType::Users => &self.users,
            GranteeType::Groups => &self.groups,
        }
    }

    fn grantees_mut(&mut self, grantee_type: GranteeType) -> &mut GranteeGrants {
        match grantee_type {
            GranteeType::Users => &mut self.users,
            GranteeType::Groups => &mut self.groups,
        }
    }

    /// Capability bucket for (type, id, kind), created empty on first access.
    pub fn capabilities_mut(&mut self, grantee_type: GranteeType, grantee_id: &str, kind: ObjectKind) -> &mut Capabilities {
        self.grantees_mut(grantee_type)
            .entry(grantee_id.to_string())
            .or_default()
            .entry(kind)
            .or_default()
    }

    /// Last write wins; returns the mode that was replaced.
    pub fn insert(
        &mut self,
        grantee_type: GranteeType,
        grantee_id: &str,
        kind: ObjectKind,
        capability: &str,
        mode: CapabilityMode,
    ) -> Option<CapabilityMode> {
        self.capabilities_mut(grantee_type, grantee_id, kind).insert(capability.to_string(), mode)
    }

    pub fn capabilities(&self, grantee_type: GranteeType, grantee_id: &str, kind: ObjectKind) -> Option<&Capabilities> {
        self.grantees(grantee_type).get(grantee_id)?.get(&kind)
    }

    pub fn get(&self, grantee_type: GranteeType, grantee_id: &str, kind: ObjectKind, capability: &str) -> Option<CapabilityMode> {
        self.capabilities(grantee_type, grantee_id, kind)?.get(capability).copied()
    }

    /// Grantee ids holding at least one capability of `kind` in exactly `mode`.
    pub fn matching(&self, kind: ObjectKind, grantee_type: GranteeType, mode: CapabilityMode) -> BTreeSet<String> {
        self.grantees(grantee_type)
            .iter()
            .filter(|(_, kinds)| kinds.get(&kind).is_some_and(|caps| caps.values().any(|m| *m == mode)))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Grantee ids with at least one Allow under any kind, regardless of Denies elsewhere.
    pub fn allow_set(&self, grantee_type: GranteeType) -> BTreeSet<String> {
        self.grantees(grantee_type)
            .iter()
            .filter(|(_, kinds)| kinds.values().flat_map(|caps| caps.values()).any(|m| *m == CapabilityMode::Allow))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Every leaf, users first, then groups; ids, kinds and capabilities in sorted order.
    pub fn grants(&self) -> Vec<GrantRef<'_>> {
        let mut out = Vec::new();
        for grantee_type in GranteeType::ALL {
            for (id, kinds) in self.grantees(grantee_type) {
                for (kind, caps) in kinds {
                    for (cap, mode) in caps {
                        out.push(GrantRef { grantee_type, grantee_id: id, kind: *kind, capability: cap, mode: *mode });
                    }
                }
            }
        }
        out
    }

    /// Number of leaf grants.
    pub fn len(&self) -> usize {
        GranteeType::ALL
            .iter()
            .flat_map(|t| self.grantees(*t).values())
            .flat_map(|kinds| kinds.values())
            .map(|caps| caps.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}
