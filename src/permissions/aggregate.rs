//! Point-in-time snapshot of a project's permissions across all object kinds.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use super::map::PermissionMap;
use super::model::{CapabilityMode, GranteeType, ObjectKind};
use super::wire::parse_grantee_capabilities;
use crate::error::ClientResult;
use crate::session::Session;
use crate::xml::Element;

/// Built once per instance; there is no refresh. Fetch again to observe server changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefaultPermissions {
    project_id: String,
    permissions: PermissionMap,
    all_allow_users: BTreeSet<String>,
    all_allow_groups: BTreeSet<String>,
}

fn merge(map: &mut PermissionMap, kind: ObjectKind, doc: &Element, ns: &str) -> ClientResult<()> {
    for block in parse_grantee_capabilities(doc, ns)? {
        // a grantee only enters the map through an actual grant
        if block.capabilities.is_empty() { continue; }
        let caps = map.capabilities_mut(block.grantee_type, &block.grantee_id, kind);
        for (name, mode) in block.capabilities {
            caps.insert(name, mode);
        }
    }
    Ok(())
}

impl DefaultPermissions {
    /// One sequential read per object kind. Any failed read aborts the whole snapshot.
    pub async fn fetch(session: &Session, project_id: &str) -> ClientResult<Self> {
        let mut map = PermissionMap::new();
        for kind in ObjectKind::ALL {
            let url = session.urls().permissions(project_id, kind);
            let doc = session.get_xml(&url).await?;
            merge(&mut map, kind, &doc, session.xmlns())?;
        }
        let snapshot = Self::from_map(project_id, map);
        debug!(
            target: "tabula",
            "permissions snapshot project={} grants={} allow_users={} allow_groups={}",
            project_id,
            snapshot.permissions.len(),
            snapshot.all_allow_users.len(),
            snapshot.all_allow_groups.len()
        );
        Ok(snapshot)
    }

    /// Build from already-fetched response documents, one per object kind.
    pub fn from_documents<I>(project_id: &str, documents: I, ns: &str) -> ClientResult<Self>
    where
        I: IntoIterator<Item = (ObjectKind, Element)>,
    {
        let mut map = PermissionMap::new();
        for (kind, doc) in documents {
            merge(&mut map, kind, &doc, ns)?;
        }
        Ok(Self::from_map(project_id, map))
    }

    fn from_map(project_id: &str, permissions: PermissionMap) -> Self {
        let all_allow_users = permissions.allow_set(GranteeType::Users);
        let all_allow_groups = permissions.allow_set(GranteeType::Groups);
        Self { project_id: project_id.to_string(), permissions, all_allow_users, all_allow_groups }
    }

    pub fn project_id(&self) -> &str { &self.project_id }
    pub fn permissions(&self) -> &PermissionMap { &self.permissions }
    pub fn all_allow_users(&self) -> &BTreeSet<String> { &self.all_allow_users }
    pub fn all_allow_groups(&self) -> &BTreeSet<String> { &self.all_allow_groups }

    /// Grantees with at least one capability under `kind` whose mode is exactly `mode`.
    /// `kind` is validated against the five object kinds; no match yields an empty set.
    pub fn query_permissions(&self, kind: &str, grantee_type: GranteeType, mode: CapabilityMode) -> ClientResult<BTreeSet<String>> {
        let kind = kind.parse::<ObjectKind>()?;
        Ok(self.query(kind, grantee_type, mode))
    }

    pub fn query(&self, kind: ObjectKind, grantee_type: GranteeType, mode: CapabilityMode) -> BTreeSet<String> {
        self.permissions.matching(kind, grantee_type, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::xml;

    const NS: &str = "http://tableau.com/api";

    fn doc(blocks: &str) -> Element {
        xml::parse(&format!(
            r#"<tsResponse xmlns="http://tableau.com/api"><permissions>{}</permissions></tsResponse>"#,
            blocks
        ))
        .unwrap()
    }

    fn block(tag: &str, id: &str, caps: &[(&str, &str)]) -> String {
        let caps: String = caps.iter().map(|(n, m)| format!(r#"<capability name="{}" mode="{}"/>"#, n, m)).collect();
        format!(r#"<granteeCapabilities><{} id="{}"/><capabilities>{}</capabilities></granteeCapabilities>"#, tag, id, caps)
    }

    fn scenario() -> Vec<(ObjectKind, Element)> {
        ObjectKind::ALL
            .into_iter()
            .map(|k| {
                let body = match k {
                    ObjectKind::Project => block("user", "u1", &[("Read", "Allow")]),
                    ObjectKind::Workbook => block("group", "g1", &[("ExportData", "Deny")]),
                    _ => String::new(),
                };
                (k, doc(&body))
            })
            .collect()
    }

    #[test]
    fn merges_kinds_into_one_map() {
        let p = DefaultPermissions::from_documents("p1", scenario(), NS).unwrap();
        assert_eq!(
            serde_json::to_value(p.permissions()).unwrap(),
            serde_json::json!({
                "users": {"u1": {"project": {"Read": "Allow"}}},
                "groups": {"g1": {"workbook": {"ExportData": "Deny"}}}
            })
        );
        assert_eq!(p.all_allow_users(), &BTreeSet::from(["u1".to_string()]));
        assert!(p.all_allow_groups().is_empty());
    }

    #[test]
    fn iteration_order_does_not_change_result() {
        let forward = DefaultPermissions::from_documents("p1", scenario(), NS).unwrap();
        let mut docs = scenario();
        docs.reverse();
        let backward = DefaultPermissions::from_documents("p1", docs, NS).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn duplicate_grant_last_parsed_wins() {
        let body = format!("{}{}", block("user", "u1", &[("Read", "Deny")]), block("user", "u1", &[("Read", "Allow")]));
        let p = DefaultPermissions::from_documents("p1", [(ObjectKind::Flow, doc(&body))], NS).unwrap();
        assert_eq!(p.permissions().get(GranteeType::Users, "u1", ObjectKind::Flow, "Read"), Some(CapabilityMode::Allow));
    }

    #[test]
    fn query_by_kind_type_and_mode() {
        let p = DefaultPermissions::from_documents("p1", scenario(), NS).unwrap();
        assert_eq!(
            p.query_permissions("workbook", GranteeType::Groups, CapabilityMode::Deny).unwrap(),
            BTreeSet::from(["g1".to_string()])
        );
        assert!(p.query_permissions("workbook", GranteeType::Users, CapabilityMode::Deny).unwrap().is_empty());
        for kind in ObjectKind::ALL {
            // nobody holds a Deny under project, nor anything under the empty kinds
            if kind != ObjectKind::Workbook {
                assert!(p.query(kind, GranteeType::Groups, CapabilityMode::Deny).is_empty());
            }
        }
    }

    #[test]
    fn query_rejects_unknown_kind_for_every_type_and_mode() {
        let p = DefaultPermissions::from_documents("p1", scenario(), NS).unwrap();
        for t in GranteeType::ALL {
            for m in [CapabilityMode::Allow, CapabilityMode::Deny] {
                let err = p.query_permissions("view", t, m).unwrap_err();
                assert!(matches!(err, ClientError::InvalidArgument(_)));
            }
        }
    }
}
