use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Method;
use serde::Serialize;
use tracing::info;

use super::{lookup, opt_attr, req_attr};
use crate::error::{ClientError, ClientResult};
use crate::session::Session;
use crate::xml::Element;

// Content-Disposition: name="tableau_workbook"; filename="Sales.twbx"
static FILENAME_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r#"filename="(.*)""#).ok());

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Workbook {
    pub id: String,
    pub name: String,
    pub content_url: Option<String>,
    /// Id of the owning project, from the nested `<project>` element
    pub project_id: Option<String>,
}

impl Workbook {
    fn from_element(el: &Element, ns: &str) -> ClientResult<Self> {
        Ok(Self {
            id: req_attr(el, "id")?,
            name: req_attr(el, "name")?,
            content_url: opt_attr(el, "contentUrl"),
            project_id: el.find(ns, "project").and_then(|p| opt_attr(p, "id")),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Workbooks {
    workbooks: Vec<Workbook>,
}

impl Workbooks {
    /// `GET /sites/{site}/workbooks?pageSize=N`, a single page.
    pub async fn fetch(session: &Session) -> ClientResult<Self> {
        let url = session.urls().workbooks(session.config().workbook_page_size);
        let doc = session.get_xml(&url).await?;
        Self::from_document(&doc, session.xmlns())
    }

    pub fn from_document(doc: &Element, ns: &str) -> ClientResult<Self> {
        let workbooks = doc
            .find_all(ns, "workbook")
            .into_iter()
            .map(|el| Workbook::from_element(el, ns))
            .collect::<ClientResult<_>>()?;
        Ok(Self { workbooks })
    }

    pub fn all(&self) -> &[Workbook] { &self.workbooks }

    pub fn by_name(&self, name: &str) -> ClientResult<&Workbook> { lookup(&self.workbooks, name, |w| w.name.as_str()) }
    pub fn by_id(&self, id: &str) -> ClientResult<&Workbook> { lookup(&self.workbooks, id, |w| w.id.as_str()) }

    pub fn id_from_name(&self, name: &str) -> ClientResult<&str> { Ok(&self.by_name(name)?.id) }
    pub fn name_from_id(&self, id: &str) -> ClientResult<&str> { Ok(&self.by_id(id)?.name) }

    /// Names of workbooks owned by `project_id`, in listing order.
    pub fn names_in_project(&self, project_id: &str) -> Vec<&str> {
        self.workbooks
            .iter()
            .filter(|w| w.project_id.as_deref() == Some(project_id))
            .map(|w| w.name.as_str())
            .collect()
    }
}

fn disposition_filename(header: &str) -> Option<String> {
    let re = FILENAME_RE.as_ref()?;
    let raw = re.captures(header)?.get(1)?.as_str();
    // keep only the final component so the server cannot steer the write location
    Path::new(raw).file_name().and_then(|f| f.to_str()).map(str::to_string)
}

/// `GET /sites/{site}/workbooks/{id}/content`; writes the file named by the
/// `Content-Disposition` header into `dest_dir` and returns its path.
pub async fn download_workbook(
    session: &Session,
    workbook_id: &str,
    include_extract: bool,
    dest_dir: &Path,
) -> ClientResult<PathBuf> {
    let url = session.urls().workbook_content(workbook_id, include_extract);
    let reply = session.call(Method::GET, &url, None, 200).await?;
    let filename = reply
        .header("content-disposition")
        .and_then(disposition_filename)
        .ok_or_else(|| ClientError::missing_attribute("Content-Disposition", "filename"))?;
    let path = dest_dir.join(filename);
    tokio::fs::write(&path, &reply.body).await?;
    info!(target: "tabula", "downloaded workbook {} to {} ({} bytes)", workbook_id, path.display(), reply.body.len());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml;

    const NS: &str = "http://tableau.com/api";

    fn listing() -> Workbooks {
        let doc = xml::parse(
            r#"<tsResponse xmlns="http://tableau.com/api"><workbooks>
                <workbook id="w1" name="Quarterly" contentUrl="Quarterly"><project id="p1" name="Sales"/><owner id="o1"/></workbook>
                <workbook id="w2" name="Pipeline" contentUrl="Pipeline"><project id="p1" name="Sales"/></workbook>
                <workbook id="w3" name="Budget"><project id="p2" name="Finance"/></workbook>
            </workbooks></tsResponse>"#,
        )
        .unwrap();
        Workbooks::from_document(&doc, NS).unwrap()
    }

    #[test]
    fn workbooks_grouped_by_project() {
        let w = listing();
        assert_eq!(w.names_in_project("p1"), vec!["Quarterly", "Pipeline"]);
        assert_eq!(w.names_in_project("p2"), vec!["Budget"]);
        assert!(w.names_in_project("p9").is_empty());
        assert_eq!(w.id_from_name("Budget").unwrap(), "w3");
        assert!(w.by_id("w3").unwrap().content_url.is_none());
    }

    #[test]
    fn filename_from_disposition() {
        assert_eq!(
            disposition_filename(r#"name="tableau_workbook"; filename="Sales Q1.twbx""#).as_deref(),
            Some("Sales Q1.twbx")
        );
        assert_eq!(disposition_filename(r#"attachment; filename="../../etc/passwd""#).as_deref(), Some("passwd"));
        assert!(disposition_filename("attachment").is_none());
    }
}
