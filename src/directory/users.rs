use serde::Serialize;

use super::{lookup, opt_attr, req_attr};
use crate::error::ClientResult;
use crate::session::Session;
use crate::xml::Element;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub site_role: Option<String>,
    pub last_login: Option<String>,
    pub external_auth_user_id: Option<String>,
    pub language: Option<String>,
    pub locale: Option<String>,
}

impl User {
    pub(crate) fn from_element(el: &Element) -> ClientResult<Self> {
        Ok(Self {
            id: req_attr(el, "id")?,
            name: req_attr(el, "name")?,
            site_role: opt_attr(el, "siteRole"),
            last_login: opt_attr(el, "lastLogin"),
            external_auth_user_id: opt_attr(el, "externalAuthUserId"),
            language: opt_attr(el, "language"),
            locale: opt_attr(el, "locale"),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Users {
    users: Vec<User>,
}

impl Users {
    /// `GET /sites/{site}/users?pageSize=N`, a single page.
    pub async fn fetch(session: &Session) -> ClientResult<Self> {
        let url = session.urls().users_paged(session.config().user_page_size);
        let doc = session.get_xml(&url).await?;
        Self::from_document(&doc, session.xmlns())
    }

    pub fn from_document(doc: &Element, ns: &str) -> ClientResult<Self> {
        let users = doc.find_all(ns, "user").into_iter().map(User::from_element).collect::<ClientResult<_>>()?;
        Ok(Self { users })
    }

    pub fn all(&self) -> &[User] { &self.users }

    pub fn by_name(&self, name: &str) -> ClientResult<&User> { lookup(&self.users, name, |u| u.name.as_str()) }
    pub fn by_id(&self, id: &str) -> ClientResult<&User> { lookup(&self.users, id, |u| u.id.as_str()) }

    pub fn id_from_name(&self, name: &str) -> ClientResult<&str> { Ok(&self.by_name(name)?.id) }
    pub fn name_from_id(&self, id: &str) -> ClientResult<&str> { Ok(&self.by_id(id)?.name) }
}

/// Names of the members of `group_id`.
pub async fn users_in_group(session: &Session, group_id: &str) -> ClientResult<Vec<String>> {
    let doc = session.get_xml(&session.urls().group_users(group_id)).await?;
    Ok(doc
        .find_all(session.xmlns(), "user")
        .into_iter()
        .filter_map(|u| u.attr("name"))
        .map(str::to_string)
        .collect())
}
