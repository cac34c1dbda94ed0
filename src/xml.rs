//! Minimal owned XML tree over `quick-xml`.
//!
//! Response documents are parsed with namespace resolution so lookups match on
//! (namespace URI, local name) the way `.//t:name` queries do against a
//! `{"t": xmlns}` mapping. Request documents are built un-namespaced and rendered
//! with escaping.

use std::fmt::Write as _;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Resolved namespace URI; `None` when the element is unbound
    pub namespace: Option<String>,
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
}

fn xml_err<E: std::fmt::Display>(e: E) -> ClientError { ClientError::Xml(e.to_string()) }

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((key.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn push_child(&mut self, child: Element) -> &mut Element {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Attribute that the caller cannot do without.
    pub fn required_attr(&self, key: &str) -> ClientResult<&str> {
        self.attr(key).ok_or_else(|| ClientError::missing_attribute(self.name.as_str(), key))
    }

    /// An empty `ns` matches unbound elements.
    pub fn is(&self, ns: &str, name: &str) -> bool {
        self.name == name && self.namespace.as_deref().unwrap_or("") == ns
    }

    /// First direct child with the given name.
    pub fn child(&self, ns: &str, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.is(ns, name))
    }

    /// First descendant (self excluded) in document order.
    pub fn find(&self, ns: &str, name: &str) -> Option<&Element> {
        for c in &self.children {
            if c.is(ns, name) { return Some(c); }
            if let Some(hit) = c.find(ns, name) { return Some(hit); }
        }
        None
    }

    /// All descendants (self excluded) in document order.
    pub fn find_all(&self, ns: &str, name: &str) -> Vec<&Element> {
        let mut out = Vec::new();
        self.collect_into(ns, name, &mut out);
        out
    }

    fn collect_into<'a>(&'a self, ns: &str, name: &str, out: &mut Vec<&'a Element>) {
        for c in &self.children {
            if c.is(ns, name) { out.push(c); }
            c.collect_into(ns, name, out);
        }
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_into(&mut out);
        out
    }

    fn write_into(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (k, v) in &self.attrs {
            let _ = write!(out, " {}=\"{}\"", k, quick_xml::escape::escape(v.as_str()));
        }
        if self.children.is_empty() && self.text.is_empty() {
            out.push_str(" />");
            return;
        }
        out.push('>');
        out.push_str(&quick_xml::escape::escape(self.text.as_str()));
        for c in &self.children { c.write_into(out); }
        let _ = write!(out, "</{}>", self.name);
    }
}

fn namespace_of(ns: &ResolveResult) -> Option<String> {
    match ns {
        ResolveResult::Bound(n) => Some(String::from_utf8_lossy(n.0).into_owned()),
        _ => None,
    }
}

fn open(namespace: Option<String>, start: &BytesStart) -> ClientResult<Element> {
    let mut el = Element {
        namespace,
        name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        ..Default::default()
    };
    for attr in start.attributes() {
        let attr = attr.map_err(xml_err)?;
        // xmlns declarations are consumed by the resolver
        if attr.key.as_namespace_binding().is_some() { continue; }
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value().map_err(xml_err)?.into_owned();
        el.attrs.push((key, value));
    }
    Ok(el)
}

fn attach(stack: &mut Vec<Element>, root: &mut Option<Element>, el: Element) -> ClientResult<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(el),
        None => {
            if root.is_some() { return Err(ClientError::Xml("multiple root elements".into())); }
            *root = Some(el);
        }
    }
    Ok(())
}

/// Parse a complete document into its root element.
pub fn parse(text: &str) -> ClientResult<Element> {
    let mut reader = NsReader::from_str(text);
    reader.config_mut().trim_text(true);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    loop {
        let (ns, event) = reader.read_resolved_event().map_err(xml_err)?;
        match event {
            Event::Start(e) => {
                let el = open(namespace_of(&ns), &e)?;
                stack.push(el);
            }
            Event::Empty(e) => {
                let el = open(namespace_of(&ns), &e)?;
                attach(&mut stack, &mut root, el)?;
            }
            Event::End(_) => {
                let el = stack.pop().ok_or_else(|| ClientError::Xml("unbalanced end tag".into()))?;
                attach(&mut stack, &mut root, el)?;
            }
            Event::Text(t) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&t.unescape().map_err(xml_err)?);
                }
            }
            Event::CData(c) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    if !stack.is_empty() {
        return Err(ClientError::Xml(format!("unclosed element <{}>", stack[stack.len() - 1].name)));
    }
    root.ok_or_else(|| ClientError::Xml("empty document".into()))
}
