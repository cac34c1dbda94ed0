use reqwest::Method;
use serde::Serialize;

use super::{lookup, opt_attr, req_attr};
use crate::error::ClientResult;
use crate::session::Session;
use crate::xml::Element;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct View {
    pub id: String,
    pub name: String,
    pub content_url: Option<String>,
}

/// Views of a single workbook.
#[derive(Debug, Clone, Default)]
pub struct WorkbookViews {
    workbook_id: String,
    views: Vec<View>,
}

impl WorkbookViews {
    pub async fn fetch(session: &Session, workbook_id: &str) -> ClientResult<Self> {
        let doc = session.get_xml(&session.urls().workbook_views(workbook_id)).await?;
        Self::from_document(workbook_id, &doc, session.xmlns())
    }

    pub fn from_document(workbook_id: &str, doc: &Element, ns: &str) -> ClientResult<Self> {
        let mut views = Vec::new();
        for el in doc.find_all(ns, "view") {
            views.push(View { id: req_attr(el, "id")?, name: req_attr(el, "name")?, content_url: opt_attr(el, "contentUrl") });
        }
        Ok(Self { workbook_id: workbook_id.to_string(), views })
    }

    pub fn workbook_id(&self) -> &str { &self.workbook_id }
    pub fn all(&self) -> &[View] { &self.views }

    pub fn by_name(&self, name: &str) -> ClientResult<&View> { lookup(&self.views, name, |v| v.name.as_str()) }
    pub fn by_id(&self, id: &str) -> ClientResult<&View> { lookup(&self.views, id, |v| v.id.as_str()) }

    pub fn id_from_name(&self, name: &str) -> ClientResult<&str> { Ok(&self.by_name(name)?.id) }
    pub fn name_from_id(&self, id: &str) -> ClientResult<&str> { Ok(&self.by_id(id)?.name) }
    pub fn content_url_from_id(&self, id: &str) -> ClientResult<Option<&str>> { Ok(self.by_id(id)?.content_url.as_deref()) }
}

/// `GET /sites/{site}/views/{id}/data`; the body is returned as text (CSV).
pub async fn query_view_data(session: &Session, view_id: &str) -> ClientResult<String> {
    let reply = session.call(Method::GET, &session.urls().view_data(view_id), None, 200).await?;
    Ok(reply.text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::xml;

    #[test]
    fn view_lookups() {
        let doc = xml::parse(
            r#"<tsResponse xmlns="http://tableau.com/api"><views>
                <view id="v1" name="Overview" contentUrl="Quarterly/sheets/Overview"/>
                <view id="v2" name="Detail"/>
            </views></tsResponse>"#,
        )
        .unwrap();
        let v = WorkbookViews::from_document("w1", &doc, "http://tableau.com/api").unwrap();
        assert_eq!(v.workbook_id(), "w1");
        assert_eq!(v.id_from_name("Detail").unwrap(), "v2");
        assert_eq!(v.content_url_from_id("v1").unwrap(), Some("Quarterly/sheets/Overview"));
        assert_eq!(v.content_url_from_id("v2").unwrap(), None);
        assert!(matches!(v.name_from_id("v3"), Err(ClientError::NotFound { .. })));
    }
}
