//! Client configuration: connection target, API version, response namespace and
//! transport limits. Defaults are overlaid with `TABULA_*` environment variables.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_API_VERSION: &str = "3.11";
pub const DEFAULT_XMLNS: &str = "http://tableau.com/api";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Base server URL, e.g. `https://tableau.example.com`
    pub server: String,
    pub api_version: String,
    /// Namespace URI that response elements are bound to
    pub xmlns: String,
    /// Per-request timeout; always bounded
    pub timeout_ms: u64,
    pub accept_invalid_certs: bool,
    pub workbook_page_size: u32,
    pub user_page_size: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: "http://localhost".to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            xmlns: DEFAULT_XMLNS.to_string(),
            timeout_ms: 30_000,
            accept_invalid_certs: false,
            workbook_page_size: 300,
            user_page_size: 200,
        }
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl ClientConfig {
    pub fn new(server: impl Into<String>) -> Self {
        Self { server: server.into(), ..Default::default() }
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Self {
        Self::default().overlay(|k| std::env::var(k).ok())
    }

    /// Overlay values found through `lookup`. Unparseable values are logged and skipped.
    pub fn overlay<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("TABULA_SERVER") { self.server = v; }
        if let Some(v) = lookup("TABULA_API_VERSION") { self.api_version = v; }
        if let Some(v) = lookup("TABULA_XMLNS") { self.xmlns = v; }
        if let Some(v) = lookup("TABULA_TIMEOUT_MS") {
            match v.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => self.timeout_ms = ms,
                _ => warn!(target: "tabula", "ignoring TABULA_TIMEOUT_MS='{}'", v),
            }
        }
        if let Some(v) = lookup("TABULA_ACCEPT_INVALID_CERTS") {
            match parse_bool(&v) {
                Some(b) => self.accept_invalid_certs = b,
                None => warn!(target: "tabula", "ignoring TABULA_ACCEPT_INVALID_CERTS='{}'", v),
            }
        }
        if let Some(v) = lookup("TABULA_WORKBOOK_PAGE_SIZE") {
            match v.trim().parse::<u32>() {
                Ok(n) => self.workbook_page_size = n,
                Err(_) => warn!(target: "tabula", "ignoring TABULA_WORKBOOK_PAGE_SIZE='{}'", v),
            }
        }
        if let Some(v) = lookup("TABULA_USER_PAGE_SIZE") {
            match v.trim().parse::<u32>() {
                Ok(n) => self.user_page_size = n,
                Err(_) => warn!(target: "tabula", "ignoring TABULA_USER_PAGE_SIZE='{}'", v),
            }
        }
        self
    }

    pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_ms) }

    /// `{server}/api/{version}`
    pub fn api_root(&self) -> String {
        format!("{}/api/{}", self.server.trim_end_matches('/'), self.api_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn overlay_applies_known_keys() {
        let env: HashMap<&str, &str> = [
            ("TABULA_SERVER", "https://bi.example.com/"),
            ("TABULA_API_VERSION", "3.19"),
            ("TABULA_TIMEOUT_MS", "5000"),
            ("TABULA_ACCEPT_INVALID_CERTS", "yes"),
        ]
        .into_iter()
        .collect();
        let cfg = ClientConfig::default().overlay(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.api_root(), "https://bi.example.com/api/3.19");
        assert_eq!(cfg.timeout(), Duration::from_secs(5));
        assert!(cfg.accept_invalid_certs);
        assert_eq!(cfg.xmlns, DEFAULT_XMLNS);
        assert_eq!(cfg.user_page_size, 200);
    }

    #[test]
    fn overlay_skips_garbage_values() {
        let cfg = ClientConfig::default().overlay(|k| match k {
            "TABULA_TIMEOUT_MS" => Some("soon".into()),
            "TABULA_ACCEPT_INVALID_CERTS" => Some("maybe".into()),
            "TABULA_USER_PAGE_SIZE" => Some("-1".into()),
            _ => None,
        });
        assert_eq!(cfg, ClientConfig::default());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let cfg = ClientConfig::default().overlay(|k| (k == "TABULA_TIMEOUT_MS").then(|| "0".to_string()));
        assert_eq!(cfg.timeout_ms, 30_000);
    }

    #[test]
    fn deserialize_partial_uses_defaults() {
        let cfg: ClientConfig = serde_json::from_str(r#"{"server":"https://x"}"#).unwrap();
        assert_eq!(cfg.server, "https://x");
        assert_eq!(cfg.api_version, DEFAULT_API_VERSION);
        assert_eq!(cfg.workbook_page_size, 300);
    }
}
