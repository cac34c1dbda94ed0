//! Wire format of grantee capability blocks.
//!
//! Read: `.//granteeCapabilities` blocks, each naming one `user` or `group` by id and
//! listing `capability name=".." mode=".."` entries.
//! Write: `tsRequest > permissions > granteeCapabilities*`, one block per grantee.

use tracing::warn;

use super::model::{CapabilityMode, ConfirmedGrant, GranteeType};
use crate::error::{ClientError, ClientResult};
use crate::xml::Element;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GranteeCapabilities {
    pub grantee_type: GranteeType,
    pub grantee_id: String,
    pub capabilities: Vec<(String, CapabilityMode)>,
}

impl GranteeCapabilities {
    /// One confirmation per capability, tied to this block's own grantee.
    pub fn confirmations(&self) -> impl Iterator<Item = ConfirmedGrant> + '_ {
        self.capabilities.iter().map(move |(name, mode)| ConfirmedGrant {
            grantee_type: self.grantee_type,
            grantee_id: self.grantee_id.clone(),
            capability: name.clone(),
            mode: *mode,
        })
    }

    fn to_element(&self) -> Element {
        let mut caps = Element::new("capabilities");
        for (name, mode) in &self.capabilities {
            caps.push_child(Element::new("capability").with_attr("name", name.as_str()).with_attr("mode", mode.as_str()));
        }
        Element::new("granteeCapabilities")
            .with_child(Element::new(self.grantee_type.element_name()).with_attr("id", self.grantee_id.as_str()))
            .with_child(caps)
    }
}

fn parse_mode(raw: &str) -> ClientResult<CapabilityMode> {
    raw.parse::<CapabilityMode>()
        .map_err(|_| ClientError::Xml(format!("unexpected capability mode '{}'", raw)))
}

/// Every grantee capability block of a response, in document order.
/// Blocks without a grantee reference are skipped with a warning.
pub fn parse_grantee_capabilities(doc: &Element, ns: &str) -> ClientResult<Vec<GranteeCapabilities>> {
    let mut out = Vec::new();
    for block in doc.find_all(ns, "granteeCapabilities") {
        let (grantee_type, grantee) = match (block.find(ns, "user"), block.find(ns, "group")) {
            (Some(u), None) => (GranteeType::Users, u),
            (None, Some(g)) => (GranteeType::Groups, g),
            (Some(_), Some(_)) => {
                return Err(ClientError::Xml("granteeCapabilities names both a user and a group".into()));
            }
            (None, None) => {
                warn!(target: "tabula", "skipping granteeCapabilities block without a grantee");
                continue;
            }
        };
        let grantee_id = grantee.required_attr("id")?.to_string();
        let mut capabilities = Vec::new();
        for cap in block.find_all(ns, "capability") {
            let name = cap.required_attr("name")?.to_string();
            let mode = parse_mode(cap.required_attr("mode")?)?;
            capabilities.push((name, mode));
        }
        out.push(GranteeCapabilities { grantee_type, grantee_id, capabilities });
    }
    Ok(out)
}

/// Body of an additive permissions write.
pub fn permissions_request(blocks: &[GranteeCapabilities]) -> Element {
    let mut permissions = Element::new("permissions");
    for b in blocks {
        permissions.push_child(b.to_element());
    }
    Element::new("tsRequest").with_child(permissions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml;

    const NS: &str = "http://tableau.com/api";

    #[test]
    fn parses_user_and_group_blocks() {
        let doc = xml::parse(
            r#"<tsResponse xmlns="http://tableau.com/api"><permissions>
                <project id="p1" name="Sales"><owner id="o1"/></project>
                <granteeCapabilities><user id="u1"/><capabilities>
                    <capability name="Read" mode="Allow"/><capability name="Write" mode="Deny"/>
                </capabilities></granteeCapabilities>
                <granteeCapabilities><group id="g1"/><capabilities>
                    <capability name="Read" mode="Allow"/>
                </capabilities></granteeCapabilities>
            </permissions></tsResponse>"#,
        )
        .unwrap();
        let blocks = parse_grantee_capabilities(&doc, NS).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].grantee_type, GranteeType::Users);
        assert_eq!(blocks[0].grantee_id, "u1");
        assert_eq!(
            blocks[0].capabilities,
            vec![("Read".to_string(), CapabilityMode::Allow), ("Write".to_string(), CapabilityMode::Deny)]
        );
        assert_eq!(blocks[1].grantee_type, GranteeType::Groups);
        assert_eq!(blocks[1].capabilities.len(), 1);
    }

    #[test]
    fn unknown_mode_is_a_document_error() {
        let doc = xml::parse(
            r#"<r xmlns="http://tableau.com/api"><granteeCapabilities><user id="u1"/>
               <capabilities><capability name="Read" mode="allow"/></capabilities></granteeCapabilities></r>"#,
        )
        .unwrap();
        assert!(matches!(parse_grantee_capabilities(&doc, NS), Err(ClientError::Xml(_))));
    }

    #[test]
    fn grantee_less_block_is_skipped() {
        let doc = xml::parse(
            r#"<r xmlns="http://tableau.com/api"><granteeCapabilities><capabilities>
               <capability name="Read" mode="Allow"/></capabilities></granteeCapabilities></r>"#,
        )
        .unwrap();
        assert!(parse_grantee_capabilities(&doc, NS).unwrap().is_empty());
    }

    #[test]
    fn request_has_one_block_per_grantee() {
        let blocks = vec![GranteeCapabilities {
            grantee_type: GranteeType::Users,
            grantee_id: "u1".into(),
            capabilities: vec![("Read".into(), CapabilityMode::Allow)],
        }];
        assert_eq!(
            permissions_request(&blocks).to_xml(),
            r#"<tsRequest><permissions><granteeCapabilities><user id="u1" /><capabilities><capability name="Read" mode="Allow" /></capabilities></granteeCapabilities></permissions></tsRequest>"#
        );
    }

    #[test]
    fn confirmations_stay_with_their_block() {
        let b = GranteeCapabilities {
            grantee_type: GranteeType::Groups,
            grantee_id: "g7".into(),
            capabilities: vec![("Read".into(), CapabilityMode::Allow), ("Filter".into(), CapabilityMode::Deny)],
        };
        let c: Vec<_> = b.confirmations().collect();
        assert_eq!(c.len(), 2);
        assert!(c.iter().all(|g| g.grantee_id == "g7" && g.grantee_type == GranteeType::Groups));
        assert_eq!(c[1].capability, "Filter");
    }
}
