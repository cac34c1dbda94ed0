//! Signed-in session: auth token, site id and the transport every call goes through.

use std::fmt;

use reqwest::Method;
use tracing::info;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::paths::{self, SiteUrls};
use crate::transport::{Reply, Transport};
use crate::xml::Element;

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    /// Site content URL; empty selects the default site
    pub site: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into(), site: String::new() }
    }

    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = site.into();
        self
    }

    fn to_request(&self) -> Element {
        Element::new("tsRequest").with_child(
            Element::new("credentials")
                .with_attr("name", self.username.as_str())
                .with_attr("password", self.password.as_str())
                .with_child(Element::new("site").with_attr("contentUrl", self.site.as_str())),
        )
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("site", &self.site)
            .finish()
    }
}

#[derive(Clone)]
pub struct Session {
    transport: Transport,
    urls: SiteUrls,
    token: String,
    site_id: String,
    user_id: Option<String>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("server", &self.transport.config().server)
            .field("site_id", &self.site_id)
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// `POST /auth/signin`; the response carries the token, site id and user id.
    pub async fn sign_in(config: ClientConfig, credentials: &Credentials) -> ClientResult<Self> {
        let transport = Transport::new(config)?;
        let api_root = transport.config().api_root();
        let reply = transport
            .send(Method::POST, &paths::signin_url(&api_root), None, Some(&credentials.to_request()), 200)
            .await?;
        let doc = reply.xml()?;
        let ns = transport.config().xmlns.clone();
        let creds = doc
            .child(&ns, "credentials")
            .ok_or_else(|| ClientError::Xml("sign-in response has no <credentials>".into()))?;
        let token = creds.required_attr("token")?.to_string();
        let site_id = doc
            .find(&ns, "site")
            .ok_or_else(|| ClientError::Xml("sign-in response has no <site>".into()))?
            .required_attr("id")?
            .to_string();
        let user_id = doc.find(&ns, "user").and_then(|u| u.attr("id")).map(str::to_string);
        info!(target: "tabula", "signed in as {} (site={}, user={:?})", credentials.username, site_id, user_id);
        Ok(Self { urls: SiteUrls::new(&api_root, &site_id), transport, token, site_id, user_id })
    }

    /// Adopt a token obtained elsewhere.
    pub fn from_token(config: ClientConfig, token: impl Into<String>, site_id: impl Into<String>) -> ClientResult<Self> {
        let transport = Transport::new(config)?;
        let site_id = site_id.into();
        let urls = SiteUrls::new(&transport.config().api_root(), &site_id);
        Ok(Self { transport, urls, token: token.into(), site_id, user_id: None })
    }

    /// `POST /auth/signout`; the token is unusable afterwards.
    pub async fn sign_out(self) -> ClientResult<()> {
        let url = paths::signout_url(&self.transport.config().api_root());
        self.transport.send(Method::POST, &url, Some(&self.token), None, 204).await?;
        info!(target: "tabula", "signed out (site={})", self.site_id);
        Ok(())
    }

    pub fn token(&self) -> &str { &self.token }
    pub fn site_id(&self) -> &str { &self.site_id }
    pub fn user_id(&self) -> Option<&str> { self.user_id.as_deref() }
    pub fn config(&self) -> &ClientConfig { self.transport.config() }
    pub fn urls(&self) -> &SiteUrls { &self.urls }
    pub fn xmlns(&self) -> &str { &self.transport.config().xmlns }

    /// Authenticated call returning the raw reply.
    pub async fn call(&self, method: Method, url: &str, body: Option<&Element>, expected: u16) -> ClientResult<Reply> {
        self.transport.send(method, url, Some(&self.token), body, expected).await
    }

    /// Authenticated call whose response body is an XML document.
    pub async fn call_xml(&self, method: Method, url: &str, body: Option<&Element>, expected: u16) -> ClientResult<Element> {
        self.call(method, url, body, expected).await?.xml()
    }

    pub async fn get_xml(&self, url: &str) -> ClientResult<Element> {
        self.call_xml(Method::GET, url, None, 200).await
    }
}
