use serde::Serialize;

use super::{lookup, opt_attr, req_attr};
use crate::error::ClientResult;
use crate::session::Session;
use crate::xml::Element;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub parent_project_id: Option<String>,
    /// `LockedToProject`, `ManagedByOwner` or `LockedToProjectWithoutNested`
    pub content_permissions: Option<String>,
    pub controlling_permissions_project_id: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Project {
    pub(crate) fn from_element(el: &Element) -> ClientResult<Self> {
        Ok(Self {
            id: req_attr(el, "id")?,
            name: req_attr(el, "name")?,
            description: opt_attr(el, "description"),
            parent_project_id: opt_attr(el, "parentProjectId"),
            content_permissions: opt_attr(el, "contentPermissions"),
            controlling_permissions_project_id: opt_attr(el, "controllingPermissionsProjectId"),
            created_at: opt_attr(el, "createdAt"),
            updated_at: opt_attr(el, "updatedAt"),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Projects {
    projects: Vec<Project>,
}

impl Projects {
    /// `GET /sites/{site}/projects`
    pub async fn fetch(session: &Session) -> ClientResult<Self> {
        let doc = session.get_xml(&session.urls().projects()).await?;
        Self::from_document(&doc, session.xmlns())
    }

    pub fn from_document(doc: &Element, ns: &str) -> ClientResult<Self> {
        let projects = doc.find_all(ns, "project").into_iter().map(Project::from_element).collect::<ClientResult<_>>()?;
        Ok(Self { projects })
    }

    pub fn all(&self) -> &[Project] { &self.projects }
    pub fn names(&self) -> Vec<&str> { self.projects.iter().map(|p| p.name.as_str()).collect() }

    pub fn by_name(&self, name: &str) -> ClientResult<&Project> { lookup(&self.projects, name, |p| p.name.as_str()) }
    pub fn by_id(&self, id: &str) -> ClientResult<&Project> { lookup(&self.projects, id, |p| p.id.as_str()) }

    pub fn id_from_name(&self, name: &str) -> ClientResult<&str> { Ok(&self.by_name(name)?.id) }
    pub fn name_from_id(&self, id: &str) -> ClientResult<&str> { Ok(&self.by_id(id)?.name) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::xml;

    const NS: &str = "http://tableau.com/api";

    fn listing() -> Projects {
        let doc = xml::parse(
            r#"<tsResponse xmlns="http://tableau.com/api">
                <pagination pageNumber="1" pageSize="100" totalAvailable="2"/>
                <projects>
                  <project id="p1" name="Sales" description="Regional sales" contentPermissions="LockedToProject"
                           controllingPermissionsProjectId="p1" createdAt="2021-01-04T10:00:00Z" updatedAt="2021-02-01T09:30:00Z">
                    <owner id="o1"/>
                  </project>
                  <project id="p2" name="Finance" parentProjectId="p1" contentPermissions="ManagedByOwner"/>
                </projects>
            </tsResponse>"#,
        )
        .unwrap();
        Projects::from_document(&doc, NS).unwrap()
    }

    #[test]
    fn parses_all_fields() {
        let p = listing();
        assert_eq!(p.all().len(), 2);
        let sales = p.by_name("Sales").unwrap();
        assert_eq!(sales.description.as_deref(), Some("Regional sales"));
        assert_eq!(sales.controlling_permissions_project_id.as_deref(), Some("p1"));
        assert_eq!(sales.created_at.as_deref(), Some("2021-01-04T10:00:00Z"));
        assert_eq!(p.by_id("p2").unwrap().parent_project_id.as_deref(), Some("p1"));
        assert!(p.by_id("p2").unwrap().description.is_none());
    }

    #[test]
    fn name_id_lookups() {
        let p = listing();
        assert_eq!(p.id_from_name("Finance").unwrap(), "p2");
        assert_eq!(p.name_from_id("p1").unwrap(), "Sales");
        let err = p.id_from_name("Marketing").unwrap_err();
        assert!(matches!(err, ClientError::NotFound { .. }));
        assert!(err.to_string().contains("Sales, Finance"));
    }
}
