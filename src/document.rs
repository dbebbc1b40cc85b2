//! Order-preserving XML tree for draw.io containers and page graphs.
//!
//! The container (`<mxfile>`) and decoded page payloads (`<mxGraphModel>`) are
//! both held as plain element trees. Attribute order and child order are
//! preserved so untouched pages round-trip; whitespace-only text nodes
//! (pretty-printing indentation) are dropped, non-whitespace text is kept
//! exactly as read. Global text trimming is deliberately avoided: encoded
//! `<diagram>` payloads are meaningful text content.

use indexmap::IndexMap;
use quick_xml::Reader;
use quick_xml::escape::{escape, partial_escape, resolve_predefined_entity};
use quick_xml::events::{BytesStart, Event};

use crate::error::{DiaglotError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    pub name: String,
    pub attrs: IndexMap<String, String>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attrs: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Tag name without any namespace prefix.
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        self.attrs.insert(name.to_string(), value.to_string());
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        self.attrs.shift_remove(name)
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn has_element_children(&self) -> bool {
        self.child_elements().next().is_some()
    }

    /// Concatenated text content of direct text children.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            if let XmlNode::Text(t) = child {
                out.push_str(t);
            }
        }
        out
    }

    /// Replace all children with a single text node.
    pub fn set_text(&mut self, text: String) {
        self.children = vec![XmlNode::Text(text)];
    }

    /// Serialize this element (and its subtree) without an XML declaration.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        write_element(self, &mut out);
        out
    }

    /// Serialize as a standalone document with an XML declaration.
    pub fn to_document(&self) -> String {
        format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}", self.to_xml())
    }
}

/// Parse a well-formed XML string into its root element.
///
/// Character data arrives fragmented: the reader reports entity and character
/// references as separate `GeneralRef` events between the literal text
/// pieces. Fragments are buffered and merged into one text node per run so
/// escaped payloads like `&lt;mxGraphModel&gt;` come out whole.
pub fn parse(xml: &str) -> Result<XmlElement> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;
    let mut pending = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                flush_text(&mut pending, &mut stack, &mut root)?;
                stack.push(element_from_start(&e)?);
            }
            Event::Empty(e) => {
                flush_text(&mut pending, &mut stack, &mut root)?;
                let el = element_from_start(&e)?;
                attach(&mut stack, &mut root, XmlNode::Element(el))?;
            }
            Event::End(_) => {
                flush_text(&mut pending, &mut stack, &mut root)?;
                let el = stack.pop().ok_or_else(|| {
                    DiaglotError::MalformedPayload("unbalanced end tag".to_string())
                })?;
                attach(&mut stack, &mut root, XmlNode::Element(el))?;
            }
            Event::Text(t) => pending.push_str(&t.decode()?),
            Event::CData(c) => pending.push_str(&c.decode()?),
            Event::GeneralRef(r) => {
                if let Some(ch) = r.resolve_char_ref()? {
                    pending.push(ch);
                } else {
                    let name = r.decode()?;
                    let resolved = resolve_predefined_entity(&name).ok_or_else(|| {
                        DiaglotError::MalformedPayload(format!(
                            "unresolvable entity reference: &{name};"
                        ))
                    })?;
                    pending.push_str(resolved);
                }
            }
            Event::Comment(c) => {
                flush_text(&mut pending, &mut stack, &mut root)?;
                let text = String::from_utf8_lossy(c.as_ref()).into_owned();
                attach(&mut stack, &mut root, XmlNode::Comment(text))?;
            }
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
            Event::Eof => break,
        }
    }

    if !stack.is_empty() {
        return Err(DiaglotError::MalformedPayload(
            "unclosed element at end of input".to_string(),
        ));
    }
    root.ok_or_else(|| DiaglotError::MalformedPayload("no root element".to_string()))
}

/// Attach the buffered character-data run as one text node; whitespace-only
/// runs are formatting and are dropped.
fn flush_text(
    pending: &mut String,
    stack: &mut Vec<XmlElement>,
    root: &mut Option<XmlElement>,
) -> Result<()> {
    if pending.trim().is_empty() {
        pending.clear();
        return Ok(());
    }
    let text = std::mem::take(pending);
    attach(stack, root, XmlNode::Text(text))
}

/// Collect mutable references to every descendant (or `el` itself) whose local
/// name is one of `locals`. Matching elements are not descended into.
pub fn collect_named_mut<'a>(
    el: &'a mut XmlElement,
    locals: &[&str],
    out: &mut Vec<&'a mut XmlElement>,
) {
    if locals.contains(&el.local_name()) {
        out.push(el);
        return;
    }
    for child in el.children.iter_mut() {
        if let XmlNode::Element(e) = child {
            collect_named_mut(e, locals, out);
        }
    }
}

fn element_from_start(e: &BytesStart<'_>) -> Result<XmlElement> {
    let name = std::str::from_utf8(e.name().as_ref())?.to_string();
    let mut attrs = IndexMap::new();
    for a in e.attributes() {
        let a = a?;
        let key = std::str::from_utf8(a.key.as_ref())?.to_string();
        let val = a.unescape_value()?.to_string();
        attrs.insert(key, val);
    }
    Ok(XmlElement {
        name,
        attrs,
        children: Vec::new(),
    })
}

fn attach(
    stack: &mut Vec<XmlElement>,
    root: &mut Option<XmlElement>,
    node: XmlNode,
) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return Ok(());
    }
    match node {
        XmlNode::Element(el) => {
            if root.is_some() {
                return Err(DiaglotError::MalformedPayload(
                    "multiple root elements".to_string(),
                ));
            }
            *root = Some(el);
        }
        // Stray text or comments outside the root carry no structure.
        XmlNode::Text(_) | XmlNode::Comment(_) => {}
    }
    Ok(())
}

fn write_element(el: &XmlElement, out: &mut String) {
    out.push('<');
    out.push_str(&el.name);
    for (key, value) in &el.attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape(value.as_str()));
        out.push('"');
    }
    if el.children.is_empty() {
        out.push_str(" />");
        return;
    }
    out.push('>');
    for child in &el.children {
        match child {
            XmlNode::Element(e) => write_element(e, out),
            // Text keeps quotes and apostrophes literal so encoded diagram
            // payloads round-trip byte-for-byte.
            XmlNode::Text(t) => out.push_str(&partial_escape(t.as_str())),
            XmlNode::Comment(c) => {
                out.push_str("<!--");
                out.push_str(c);
                out.push_str("-->");
            }
        }
    }
    out.push_str("</");
    out.push_str(&el.name);
    out.push('>');
}
