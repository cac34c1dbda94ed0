//! HTTP transport: one `reqwest::Client` per session, auth header injection and
//! expected-status checking against the service's standard error document.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::xml::{self, Element};

pub const AUTH_HEADER: &str = "x-tableau-auth";

/// Raw response of a call that passed its status check.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn text(&self) -> String { String::from_utf8_lossy(&self.body).into_owned() }

    pub fn xml(&self) -> ClientResult<Element> { xml::parse(&self.text()) }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Build the protocol error for a response whose status did not match.
/// Missing pieces fall back to fixed placeholders so the caller always gets a triplet.
pub fn api_error(status: u16, body: &str, xmlns: &str) -> ClientError {
    let doc = xml::parse(body).ok();
    let error_el = doc.as_ref().and_then(|d| d.child(xmlns, "error"));
    let code = match error_el {
        Some(e) => e.attr("code").unwrap_or("unknown").to_string(),
        None => "unknown code".to_string(),
    };
    let summary = doc
        .as_ref()
        .and_then(|d| d.find(xmlns, "summary"))
        .map(|s| s.text.clone())
        .unwrap_or_else(|| "unknown summary".to_string());
    let detail = doc
        .as_ref()
        .and_then(|d| d.find(xmlns, "detail"))
        .map(|s| s.text.clone())
        .unwrap_or_else(|| "unknown detail".to_string());
    ClientError::ApiCall { status, code, summary, detail }
}

pub fn check_status(status: u16, expected: u16, body: &str, xmlns: &str) -> ClientResult<()> {
    if status != expected {
        return Err(api_error(status, body, xmlns));
    }
    Ok(())
}

#[derive(Clone)]
pub struct Transport {
    client: reqwest::Client,
    config: ClientConfig,
}

impl Transport {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig { &self.config }

    /// Issue one request and require `expected` as the response status.
    /// Connection and timeout failures surface as `ClientError::Transport`.
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        token: Option<&str>,
        body: Option<&Element>,
        expected: u16,
    ) -> ClientResult<Reply> {
        let mut headers = HeaderMap::new();
        if let Some(t) = token {
            let v = HeaderValue::from_str(t)
                .map_err(|_| ClientError::invalid_argument("auth token is not a valid header value"))?;
            headers.insert(AUTH_HEADER, v);
        }
        let mut req = self.client.request(method.clone(), url);
        if let Some(doc) = body {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/xml"));
            req = req.body(doc.to_xml());
        }
        let resp = req.headers(headers).send().await?;
        let status = resp.status().as_u16();
        let resp_headers = resp.headers().clone();
        let bytes = resp.bytes().await?;
        debug!(target: "tabula", "{} {} -> {} ({} bytes)", method, url, status, bytes.len());
        check_status(status, expected, &String::from_utf8_lossy(&bytes), &self.config.xmlns)?;
        Ok(Reply { status, headers: resp_headers, body: bytes.to_vec() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "http://tableau.com/api";

    #[test]
    fn error_document_fields_are_extracted() {
        let body = r#"<tsResponse xmlns="http://tableau.com/api">
            <error code="401002"><summary>Unauthorized Access</summary><detail>Invalid authentication credentials were provided.</detail></error>
        </tsResponse>"#;
        match api_error(401, body, NS) {
            ClientError::ApiCall { status, code, summary, detail } => {
                assert_eq!(status, 401);
                assert_eq!(code, "401002");
                assert_eq!(summary, "Unauthorized Access");
                assert_eq!(detail, "Invalid authentication credentials were provided.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn placeholders_when_document_is_incomplete() {
        let e = api_error(500, r#"<tsResponse xmlns="http://tableau.com/api"><error/></tsResponse>"#, NS);
        assert_eq!(e.to_string(), "unknown: unknown summary - unknown detail");
        let e = api_error(502, "<html>Bad Gateway</html>", NS);
        assert_eq!(e.to_string(), "unknown code: unknown summary - unknown detail");
        let e = api_error(502, "not xml at all", NS);
        assert_eq!(e.api_code(), Some("unknown code"));
    }

    #[test]
    fn check_status_passes_on_expected() {
        assert!(check_status(204, 204, "", NS).is_ok());
        assert!(matches!(check_status(200, 204, "", NS), Err(ClientError::ApiCall { status: 200, .. })));
    }
}
