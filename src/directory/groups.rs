use serde::Serialize;

use super::{lookup, opt_attr, req_attr};
use crate::error::ClientResult;
use crate::session::Session;
use crate::xml::Element;

/// Implicit group every site user belongs to.
pub const ALL_USERS_GROUP: &str = "All Users";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub minimum_site_role: Option<String>,
}

impl Group {
    pub(crate) fn from_element(el: &Element) -> ClientResult<Self> {
        Ok(Self { id: req_attr(el, "id")?, name: req_attr(el, "name")?, minimum_site_role: opt_attr(el, "minimumSiteRole") })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Groups {
    groups: Vec<Group>,
}

impl Groups {
    pub async fn fetch(session: &Session) -> ClientResult<Self> {
        let doc = session.get_xml(&session.urls().groups()).await?;
        Self::from_document(&doc, session.xmlns())
    }

    pub fn from_document(doc: &Element, ns: &str) -> ClientResult<Self> {
        let groups = doc.find_all(ns, "group").into_iter().map(Group::from_element).collect::<ClientResult<_>>()?;
        Ok(Self { groups })
    }

    pub fn all(&self) -> &[Group] { &self.groups }

    pub fn by_name(&self, name: &str) -> ClientResult<&Group> { lookup(&self.groups, name, |g| g.name.as_str()) }
    pub fn by_id(&self, id: &str) -> ClientResult<&Group> { lookup(&self.groups, id, |g| g.id.as_str()) }

    pub fn id_from_name(&self, name: &str) -> ClientResult<&str> { Ok(&self.by_name(name)?.id) }
    pub fn name_from_id(&self, id: &str) -> ClientResult<&str> { Ok(&self.by_id(id)?.name) }
}

fn group_names(doc: &Element, ns: &str) -> Vec<String> {
    doc.find_all(ns, "group")
        .into_iter()
        .filter_map(|g| g.attr("name"))
        .filter(|name| *name != ALL_USERS_GROUP)
        .map(str::to_string)
        .collect()
}

/// Names of the groups `user_id` belongs to, without the implicit "All Users".
pub async fn groups_for_user(session: &Session, user_id: &str) -> ClientResult<Vec<String>> {
    let doc = session.get_xml(&session.urls().user_groups(user_id)).await?;
    Ok(group_names(&doc, session.xmlns()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml;

    const NS: &str = "http://tableau.com/api";

    #[test]
    fn group_listing() {
        let doc = xml::parse(
            r#"<tsResponse xmlns="http://tableau.com/api"><groups>
                <group id="g0" name="All Users" minimumSiteRole="Unlicensed"><domain name="local"/></group>
                <group id="g1" name="Analysts" minimumSiteRole="Explorer"/>
            </groups></tsResponse>"#,
        )
        .unwrap();
        let g = Groups::from_document(&doc, NS).unwrap();
        assert_eq!(g.all().len(), 2);
        assert_eq!(g.id_from_name("Analysts").unwrap(), "g1");
        assert_eq!(g.by_id("g1").unwrap().minimum_site_role.as_deref(), Some("Explorer"));
        assert_eq!(group_names(&doc, NS), vec!["Analysts"]);
    }
}
