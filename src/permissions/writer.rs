//! Additive and destructive permission writes for one (object kind, project).
//!
//! Deletion has no batch form: each (grantee, capability, mode) tuple is its own
//! DELETE with its own failure. A failure mid-way leaves earlier deletes applied and
//! nothing is rolled back, so callers re-fetch `DefaultPermissions` to see the result.

use reqwest::Method;
use tracing::{debug, info};

use super::map::PermissionMap;
use super::model::{CapabilityMode, ConfirmedGrant, GranteeType, ObjectKind};
use super::wire::{parse_grantee_capabilities, permissions_request, GranteeCapabilities};
use crate::error::{ClientError, ClientResult};
use crate::session::Session;

/// Three positionally aligned columns of grants for one grantee type.
/// Columns of unequal length are truncated to the shortest.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrantColumns<'a> {
    pub ids: &'a [&'a str],
    pub capabilities: &'a [&'a str],
    pub modes: &'a [CapabilityMode],
}

impl<'a> GrantColumns<'a> {
    pub fn new(ids: &'a [&'a str], capabilities: &'a [&'a str], modes: &'a [CapabilityMode]) -> Self {
        Self { ids, capabilities, modes }
    }

    fn rows(&self) -> impl Iterator<Item = (&'a str, &'a str, CapabilityMode)> {
        self.ids
            .iter()
            .zip(self.capabilities.iter())
            .zip(self.modes.iter())
            .map(|((id, cap), mode)| (*id, *cap, *mode))
    }
}

/// Sparse set of grants scoped to a single object kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionDelta {
    kind: ObjectKind,
    grants: PermissionMap,
}

impl PermissionDelta {
    pub fn new(kind: ObjectKind) -> Self { Self { kind, grants: PermissionMap::new() } }

    pub fn grant(&mut self, grantee_type: GranteeType, grantee_id: &str, capability: &str, mode: CapabilityMode) -> &mut Self {
        self.grants.insert(grantee_type, grantee_id, self.kind, capability, mode);
        self
    }

    pub fn kind(&self) -> ObjectKind { self.kind }
    pub fn grants(&self) -> &PermissionMap { &self.grants }
    pub fn len(&self) -> usize { self.grants.len() }
    pub fn is_empty(&self) -> bool { self.grants.is_empty() }

    /// One block per grantee: users first, then groups.
    pub fn blocks(&self) -> Vec<GranteeCapabilities> {
        let mut out = Vec::new();
        for grantee_type in GranteeType::ALL {
            for (id, kinds) in self.grants.grantees(grantee_type) {
                let Some(caps) = kinds.get(&self.kind) else { continue };
                if caps.is_empty() { continue; }
                out.push(GranteeCapabilities {
                    grantee_type,
                    grantee_id: id.clone(),
                    capabilities: caps.iter().map(|(n, m)| (n.clone(), *m)).collect(),
                });
            }
        }
        out
    }
}

async fn put_grants(
    session: &Session,
    project_id: &str,
    kind: ObjectKind,
    blocks: &[GranteeCapabilities],
) -> ClientResult<Vec<ConfirmedGrant>> {
    let url = session.urls().permissions(project_id, kind);
    let doc = session.call_xml(Method::PUT, &url, Some(&permissions_request(blocks)), 200).await?;
    let mut confirmed = Vec::new();
    for block in parse_grantee_capabilities(&doc, session.xmlns())? {
        for grant in block.confirmations() {
            info!(
                target: "tabula",
                "new {} {} permission: {} {} {}",
                kind, grant.grantee_type.element_name(), grant.grantee_id, grant.capability, grant.mode
            );
            confirmed.push(grant);
        }
    }
    Ok(confirmed)
}

async fn delete_grant(
    session: &Session,
    project_id: &str,
    kind: ObjectKind,
    grantee_type: GranteeType,
    grantee_id: &str,
    capability: &str,
    mode: CapabilityMode,
) -> ClientResult<()> {
    let url = session.urls().permission_grant(project_id, kind, grantee_type, grantee_id, capability, mode);
    session.call(Method::DELETE, &url, None, 204).await?;
    info!(
        target: "tabula",
        "{} {} {} {}={} permission deleted from {}",
        kind, grantee_type, grantee_id, capability, mode, project_id
    );
    Ok(())
}

#[derive(Debug, Clone)]
pub struct PermissionWriter<'s> {
    session: &'s Session,
    kind: ObjectKind,
    project_id: String,
}

impl<'s> PermissionWriter<'s> {
    /// Fails before any request when `kind` is not one of the five object kinds.
    pub fn new(session: &'s Session, kind: &str, project_id: impl Into<String>) -> ClientResult<Self> {
        let kind = kind.parse::<ObjectKind>()?;
        Ok(Self::for_kind(session, kind, project_id))
    }

    pub fn for_kind(session: &'s Session, kind: ObjectKind, project_id: impl Into<String>) -> Self {
        Self { session, kind, project_id: project_id.into() }
    }

    pub fn kind(&self) -> ObjectKind { self.kind }
    pub fn project_id(&self) -> &str { &self.project_id }

    pub fn build_delta(&self, users: GrantColumns<'_>, groups: GrantColumns<'_>) -> PermissionDelta {
        let mut delta = PermissionDelta::new(self.kind);
        for (id, cap, mode) in users.rows() {
            delta.grant(GranteeType::Users, id, cap, mode);
        }
        for (id, cap, mode) in groups.rows() {
            delta.grant(GranteeType::Groups, id, cap, mode);
        }
        delta
    }

    fn check_kind(&self, delta: &PermissionDelta) -> ClientResult<()> {
        if delta.kind() != self.kind {
            return Err(ClientError::invalid_argument(format!(
                "delta is scoped to '{}' but this writer handles '{}'",
                delta.kind(),
                self.kind
            )));
        }
        Ok(())
    }

    /// Single PUT of every block in the delta. Returns the grants the service confirmed,
    /// each paired with the grantee of its own response block.
    pub async fn add_permissions(&self, delta: &PermissionDelta) -> ClientResult<Vec<ConfirmedGrant>> {
        self.check_kind(delta)?;
        if delta.is_empty() {
            debug!(target: "tabula", "empty {} delta for project {}; nothing to add", self.kind, self.project_id);
            return Ok(Vec::new());
        }
        put_grants(self.session, &self.project_id, self.kind, &delta.blocks()).await
    }

    /// One DELETE per tuple, sequentially; stops at the first failure.
    /// Returns the number of grants deleted.
    pub async fn delete_permissions(&self, delta: &PermissionDelta) -> ClientResult<usize> {
        self.check_kind(delta)?;
        let mut deleted = 0usize;
        for g in delta.grants().grants() {
            delete_grant(self.session, &self.project_id, self.kind, g.grantee_type, g.grantee_id, g.capability, g.mode).await?;
            deleted += 1;
        }
        Ok(deleted)
    }
}

/// Grant one project capability to one user.
pub async fn add_user_permission_to_project(
    session: &Session,
    project_id: &str,
    user_id: &str,
    capability: &str,
    mode: CapabilityMode,
) -> ClientResult<Vec<ConfirmedGrant>> {
    let block = GranteeCapabilities {
        grantee_type: GranteeType::Users,
        grantee_id: user_id.to_string(),
        capabilities: vec![(capability.to_string(), mode)],
    };
    put_grants(session, project_id, ObjectKind::Project, &[block]).await
}

/// Remove one project capability from one user.
pub async fn delete_user_permission_from_project(
    session: &Session,
    project_id: &str,
    user_id: &str,
    capability: &str,
    mode: CapabilityMode,
) -> ClientResult<()> {
    delete_grant(session, project_id, ObjectKind::Project, GranteeType::Users, user_id, capability, mode).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;

    use CapabilityMode::{Allow, Deny};

    fn session() -> Session { Session::from_token(ClientConfig::default(), "tok", "s1").unwrap() }

    #[test]
    fn single_aligned_row_becomes_one_block() {
        let s = session();
        let w = PermissionWriter::new(&s, "project", "p1").unwrap();
        let delta = w.build_delta(GrantColumns::new(&["u1"], &["Read"], &[Allow]), GrantColumns::default());
        let blocks = delta.blocks();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].grantee_id, "u1");
        assert_eq!(blocks[0].capabilities, vec![("Read".to_string(), Allow)]);
        assert_eq!(
            permissions_request(&blocks).to_xml(),
            r#"<tsRequest><permissions><granteeCapabilities><user id="u1" /><capabilities><capability name="Read" mode="Allow" /></capabilities></granteeCapabilities></permissions></tsRequest>"#
        );
    }

    #[test]
    fn mismatched_columns_truncate_to_shortest() {
        let s = session();
        let w = PermissionWriter::for_kind(&s, ObjectKind::Workbook, "p1");
        let delta = w.build_delta(
            GrantColumns::new(&["u1", "u2", "u3"], &["Read", "Filter"], &[Allow, Deny, Allow]),
            GrantColumns::new(&["g1"], &["ExportData"], &[]),
        );
        assert_eq!(delta.len(), 2);
        assert_eq!(delta.grants().get(GranteeType::Users, "u2", ObjectKind::Workbook, "Filter"), Some(Deny));
        assert!(delta.grants().grantees(GranteeType::Groups).is_empty());
    }

    #[test]
    fn repeated_grantee_collects_capabilities_in_one_block() {
        let s = session();
        let w = PermissionWriter::for_kind(&s, ObjectKind::Datasource, "p1");
        let delta = w.build_delta(
            GrantColumns::default(),
            GrantColumns::new(&["g1", "g1"], &["Connect", "Read"], &[Allow, Allow]),
        );
        let blocks = delta.blocks();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].grantee_type, GranteeType::Groups);
        assert_eq!(blocks[0].capabilities.len(), 2);
    }

    #[test]
    fn writer_rejects_unknown_kind() {
        let s = session();
        let err = PermissionWriter::new(&s, "view", "p1").unwrap_err();
        assert!(matches!(err, ClientError::InvalidArgument(_)));
    }

    #[test]
    fn delta_kind_must_match_writer() {
        let s = session();
        let w = PermissionWriter::for_kind(&s, ObjectKind::Flow, "p1");
        let mut delta = PermissionDelta::new(ObjectKind::Metric);
        delta.grant(GranteeType::Users, "u1", "Read", Allow);
        assert!(w.check_kind(&delta).is_err());
    }
}
