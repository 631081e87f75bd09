// src/ingest/xml.rs
//! Small read-only element tree built from `quick-xml` events.
//!
//! Feeds are queried by tag name the way a browser DOM would be: descendant
//! search in document order, text content concatenated across nested nodes.
//! Text and attribute values have HTML entities decoded, CDATA is kept raw.

use anyhow::{anyhow, bail, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    /// Qualified name as written, e.g. `item`, `media:thumbnail`.
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    fn from_start(e: &BytesStart<'_>) -> Self {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let attrs = e
            .attributes()
            .with_checks(false)
            .flatten()
            .map(|a| {
                let key = String::from_utf8_lossy(a.key.as_ref()).into_owned();
                let raw = String::from_utf8_lossy(&a.value);
                (key, html_escape::decode_html_entities(&raw).into_owned())
            })
            .collect();
        Self {
            name,
            attrs,
            children: Vec::new(),
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// Child elements only (direct).
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// First descendant (pre-order) with the given name.
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.find_where(&|e| e.is(name))
    }

    /// First descendant (pre-order) matching the predicate.
    pub fn find_where(&self, pred: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        for child in self.elements() {
            if pred(child) {
                return Some(child);
            }
            if let Some(hit) = child.find_where(pred) {
                return Some(hit);
            }
        }
        None
    }

    /// All descendants (pre-order) with the given name.
    pub fn find_all(&self, name: &str) -> Vec<&Element> {
        let mut out = Vec::new();
        self.collect_named(name, &mut out);
        out
    }

    fn collect_named<'a>(&'a self, name: &str, out: &mut Vec<&'a Element>) {
        for child in self.elements() {
            if child.is(name) {
                out.push(child);
            }
            child.collect_named(name, out);
        }
    }

    /// Concatenated text of this element and all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.push_text(&mut out);
        out
    }

    fn push_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => e.push_text(out),
            }
        }
    }
}

/// Parse a whole document. The returned element is a synthetic root
/// (`name == ""`) whose children are the document's top-level nodes.
///
/// Any reader error, unbalanced tag, or a document without elements is an error.
pub fn parse_document(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = vec![Element::default()];

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => stack.push(Element::from_start(&e)),
            Ok(Event::Empty(e)) => push_child(&mut stack, Node::Element(Element::from_start(&e)))?,
            Ok(Event::End(_)) => {
                if stack.len() < 2 {
                    bail!("unbalanced end tag at byte {}", reader.buffer_position());
                }
                let done = stack
                    .pop()
                    .ok_or_else(|| anyhow!("element stack underflow"))?;
                push_child(&mut stack, Node::Element(done))?;
            }
            Ok(Event::Text(t)) => {
                let raw = String::from_utf8_lossy(&t);
                let text = html_escape::decode_html_entities(&raw).into_owned();
                push_child(&mut stack, Node::Text(text))?;
            }
            Ok(Event::CData(c)) => {
                let text = String::from_utf8_lossy(&c).into_owned();
                push_child(&mut stack, Node::Text(text))?;
            }
            Ok(Event::Eof) => break,
            Err(e) => bail!(
                "xml error at byte {}: {}",
                reader.buffer_position(),
                e
            ),
            // declarations, comments, processing instructions, doctype
            Ok(_) => {}
        }
    }

    if stack.len() != 1 {
        bail!("unexpected end of document: {} unclosed element(s)", stack.len() - 1);
    }
    let root = stack
        .pop()
        .ok_or_else(|| anyhow!("element stack underflow"))?;
    if root.elements().next().is_none() {
        bail!("document has no root element");
    }
    Ok(root)
}

fn push_child(stack: &mut [Element], node: Node) -> Result<()> {
    let parent = stack
        .last_mut()
        .ok_or_else(|| anyhow!("element stack underflow"))?;
    parent.children.push(node);
    Ok(())
}
