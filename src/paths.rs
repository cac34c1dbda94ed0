//! REST endpoint URLs for one signed-in site.
//!
//! Caller-supplied path segments (ids, capability names, modes) are percent-encoded.

use urlencoding::encode;

use crate::permissions::{CapabilityMode, GranteeType, ObjectKind};

pub fn signin_url(api_root: &str) -> String { format!("{}/auth/signin", api_root) }

pub fn signout_url(api_root: &str) -> String { format!("{}/auth/signout", api_root) }

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteUrls {
    site: String,
}

impl SiteUrls {
    pub fn new(api_root: &str, site_id: &str) -> Self {
        Self { site: format!("{}/sites/{}", api_root.trim_end_matches('/'), encode(site_id)) }
    }

    pub fn site(&self) -> &str { &self.site }

    pub fn projects(&self) -> String { format!("{}/projects", self.site) }

    pub fn project(&self, project_id: &str) -> String { format!("{}/projects/{}", self.site, encode(project_id)) }

    pub fn workbooks(&self, page_size: u32) -> String { format!("{}/workbooks?pageSize={}", self.site, page_size) }

    pub fn workbook_content(&self, workbook_id: &str, include_extract: bool) -> String {
        format!("{}/workbooks/{}/content?includeExtract={}", self.site, encode(workbook_id), include_extract)
    }

    pub fn workbook_views(&self, workbook_id: &str) -> String {
        format!("{}/workbooks/{}/views", self.site, encode(workbook_id))
    }

    pub fn view_data(&self, view_id: &str) -> String { format!("{}/views/{}/data", self.site, encode(view_id)) }

    pub fn groups(&self) -> String { format!("{}/groups", self.site) }

    pub fn group(&self, group_id: &str) -> String { format!("{}/groups/{}", self.site, encode(group_id)) }

    pub fn group_users(&self, group_id: &str) -> String { format!("{}/users", self.group(group_id)) }

    pub fn group_user(&self, group_id: &str, user_id: &str) -> String {
        format!("{}/users/{}", self.group(group_id), encode(user_id))
    }

    pub fn users(&self) -> String { format!("{}/users", self.site) }

    pub fn users_paged(&self, page_size: u32) -> String { format!("{}/users?pageSize={}", self.site, page_size) }

    pub fn user(&self, user_id: &str) -> String { format!("{}/users/{}", self.site, encode(user_id)) }

    pub fn user_groups(&self, user_id: &str) -> String { format!("{}/groups", self.user(user_id)) }

    /// Read/write endpoint for one object kind of a project.
    /// `project` uses the project's own permissions; the other kinds use its default permissions.
    pub fn permissions(&self, project_id: &str, kind: ObjectKind) -> String {
        match kind {
            ObjectKind::Project => format!("{}/permissions", self.project(project_id)),
            other => format!("{}/default-permissions/{}", self.project(project_id), other.endpoint_segment()),
        }
    }

    /// Delete endpoint for a single (grantee, capability, mode) tuple.
    pub fn permission_grant(
        &self,
        project_id: &str,
        kind: ObjectKind,
        grantee_type: GranteeType,
        grantee_id: &str,
        capability: &str,
        mode: CapabilityMode,
    ) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.permissions(project_id, kind),
            grantee_type.as_str(),
            encode(grantee_id),
            encode(capability),
            mode.as_str()
        )
    }
}
