//! Administrative CRUD: groups, users, memberships and projects.
//!
//! Create and update calls return the record echoed back by the service.

use std::fmt;
use std::str::FromStr;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::directory::{Group, Project, User};
use crate::error::{ClientError, ClientResult};
use crate::session::Session;
use crate::xml::Element;

pub const DEFAULT_MINIMUM_SITE_ROLE: &str = "Viewer";

/// Whether a project's permissions are locked for its content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentPermissions {
    #[default]
    LockedToProject,
    ManagedByOwner,
    LockedToProjectWithoutNested,
}

impl ContentPermissions {
    pub const ALL: [ContentPermissions; 3] = [
        ContentPermissions::LockedToProject,
        ContentPermissions::ManagedByOwner,
        ContentPermissions::LockedToProjectWithoutNested,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentPermissions::LockedToProject => "LockedToProject",
            ContentPermissions::ManagedByOwner => "ManagedByOwner",
            ContentPermissions::LockedToProjectWithoutNested => "LockedToProjectWithoutNested",
        }
    }
}

impl fmt::Display for ContentPermissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for ContentPermissions {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|c| c.as_str() == s).ok_or_else(|| {
            ClientError::invalid_argument(format!(
                "content permissions '{}' must be LockedToProject, ManagedByOwner, or LockedToProjectWithoutNested",
                s
            ))
        })
    }
}

/// Fields to change on a user; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub site_role: Option<String>,
}

impl UserUpdate {
    fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.email.is_none() && self.password.is_none() && self.site_role.is_none()
    }

    fn to_request(&self) -> Element {
        let mut user = Element::new("user");
        for (key, value) in [
            ("fullName", &self.full_name),
            ("email", &self.email),
            ("password", &self.password),
            ("siteRole", &self.site_role),
        ] {
            if let Some(v) = value {
                user = user.with_attr(key, v.as_str());
            }
        }
        request(user)
    }
}

fn request(inner: Element) -> Element { Element::new("tsRequest").with_child(inner) }

/// First `<name>` element of a response, parsed with `parse`.
fn echoed<T>(doc: &Element, ns: &str, name: &str, parse: fn(&Element) -> ClientResult<T>) -> ClientResult<T> {
    let el = doc.find(ns, name).ok_or_else(|| ClientError::Xml(format!("response has no <{}>", name)))?;
    parse(el)
}

pub async fn add_group(session: &Session, name: &str, minimum_site_role: Option<&str>) -> ClientResult<Group> {
    let body = request(
        Element::new("group")
            .with_attr("name", name)
            .with_attr("minimumSiteRole", minimum_site_role.unwrap_or(DEFAULT_MINIMUM_SITE_ROLE)),
    );
    let doc = session.call_xml(Method::POST, &session.urls().groups(), Some(&body), 201).await?;
    let group = echoed(&doc, session.xmlns(), "group", Group::from_element)?;
    info!(target: "tabula", "group created: {} ({})", group.name, group.id);
    Ok(group)
}

pub async fn add_user(session: &Session, name: &str, site_role: &str) -> ClientResult<User> {
    let body = request(Element::new("user").with_attr("name", name).with_attr("siteRole", site_role));
    let doc = session.call_xml(Method::POST, &session.urls().users(), Some(&body), 201).await?;
    let user = echoed(&doc, session.xmlns(), "user", User::from_element)?;
    info!(target: "tabula", "user created: {} ({}, {:?})", user.name, user.id, user.site_role);
    Ok(user)
}

pub async fn add_user_to_group(session: &Session, group_id: &str, user_id: &str) -> ClientResult<User> {
    let body = request(Element::new("user").with_attr("id", user_id));
    let doc = session.call_xml(Method::POST, &session.urls().group_users(group_id), Some(&body), 200).await?;
    let user = echoed(&doc, session.xmlns(), "user", User::from_element)?;
    info!(target: "tabula", "user {} added to group {}", user.name, group_id);
    Ok(user)
}

pub async fn create_project(
    session: &Session,
    name: &str,
    description: &str,
    content_permissions: ContentPermissions,
) -> ClientResult<Project> {
    let body = request(
        Element::new("project")
            .with_attr("name", name)
            .with_attr("description", description)
            .with_attr("contentPermissions", content_permissions.as_str()),
    );
    let doc = session.call_xml(Method::POST, &session.urls().projects(), Some(&body), 201).await?;
    let project = echoed(&doc, session.xmlns(), "project", Project::from_element)?;
    info!(target: "tabula", "project created: {} ({})", project.name, project.id);
    Ok(project)
}

pub async fn update_project_name(session: &Session, project_id: &str, new_name: &str) -> ClientResult<Project> {
    let body = request(Element::new("project").with_attr("name", new_name));
    let doc = session.call_xml(Method::PUT, &session.urls().project(project_id), Some(&body), 200).await?;
    let project = echoed(&doc, session.xmlns(), "project", Project::from_element)?;
    info!(target: "tabula", "project {} renamed to {}", project_id, project.name);
    Ok(project)
}

/// `value` is checked before any request is made.
pub async fn update_project_content_permissions(session: &Session, project_id: &str, value: &str) -> ClientResult<Project> {
    let content_permissions = value.parse::<ContentPermissions>()?;
    let body = request(Element::new("project").with_attr("contentPermissions", content_permissions.as_str()));
    let doc = session.call_xml(Method::PUT, &session.urls().project(project_id), Some(&body), 200).await?;
    let project = echoed(&doc, session.xmlns(), "project", Project::from_element)?;
    info!(target: "tabula", "project {} content permissions updated to {}", project_id, content_permissions);
    Ok(project)
}

pub async fn delete_project(session: &Session, project_id: &str) -> ClientResult<()> {
    session.call(Method::DELETE, &session.urls().project(project_id), None, 204).await?;
    info!(target: "tabula", "project {} deleted", project_id);
    Ok(())
}

pub async fn delete_group(session: &Session, group_id: &str) -> ClientResult<()> {
    session.call(Method::DELETE, &session.urls().group(group_id), None, 204).await?;
    info!(target: "tabula", "group {} deleted", group_id);
    Ok(())
}

pub async fn delete_user(session: &Session, user_id: &str) -> ClientResult<()> {
    session.call(Method::DELETE, &session.urls().user(user_id), None, 204).await?;
    info!(target: "tabula", "user {} deleted", user_id);
    Ok(())
}

pub async fn remove_user_from_group(session: &Session, group_id: &str, user_id: &str) -> ClientResult<()> {
    session.call(Method::DELETE, &session.urls().group_user(group_id, user_id), None, 204).await?;
    info!(target: "tabula", "user {} removed from group {}", user_id, group_id);
    Ok(())
}

/// Sends only the fields that are set. An update with no fields is rejected.
pub async fn update_user(session: &Session, user_id: &str, update: &UserUpdate) -> ClientResult<()> {
    if update.is_empty() {
        return Err(ClientError::invalid_argument("user update carries no fields"));
    }
    session.call(Method::PUT, &session.urls().user(user_id), Some(&update.to_request()), 200).await?;
    info!(target: "tabula", "user {} updated", user_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_permissions_parse() {
        for c in ContentPermissions::ALL {
            assert_eq!(c.as_str().parse::<ContentPermissions>().unwrap(), c);
        }
        assert_eq!(ContentPermissions::default(), ContentPermissions::LockedToProject);
        let err = "Locked".parse::<ContentPermissions>().unwrap_err();
        assert!(matches!(err, ClientError::InvalidArgument(_)));
        assert!(err.to_string().contains("ManagedByOwner"));
    }

    #[test]
    fn user_update_sends_only_set_fields() {
        let u = UserUpdate { email: Some("a@example.com".into()), site_role: Some("Explorer".into()), ..Default::default() };
        assert_eq!(
            u.to_request().to_xml(),
            r#"<tsRequest><user email="a@example.com" siteRole="Explorer" /></tsRequest>"#
        );
        assert!(UserUpdate::default().is_empty());
    }
}
