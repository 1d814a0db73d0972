//! Owned XML element tree over quick-xml events.
//!
//! Parts that the assembler edits (slides, layouts, relationships, content
//! types) are parsed into this tree, mutated, and written back. Cloning an
//! element deep-copies it, so a copied shape never shares state with its
//! source.

use deck_core::{Error, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// A node in the tree: an element or a run of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// An XML element with its qualified name, attributes in document order and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    /// Create an empty element with the given qualified name (e.g. `p:sp`).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder-style child appender.
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.push(child);
        self
    }

    /// The name without its namespace prefix.
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Whether this element's local name is `name`.
    pub fn is(&self, name: &str) -> bool {
        self.local_name() == name
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, key: &str) -> Option<String> {
        let pos = self.attributes.iter().position(|(k, _)| k == key)?;
        Some(self.attributes.remove(pos).1)
    }

    /// Namespace declarations (`xmlns:prefix="uri"`) on this element.
    pub fn namespaces(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().filter_map(|(k, v)| {
            k.strip_prefix("xmlns:")
                .map(|prefix| (prefix, v.as_str()))
        })
    }

    /// Prefixes bound to `uri` on this element.
    pub fn prefixes_for(&self, uri: &str) -> Vec<String> {
        self.namespaces()
            .filter(|(_, u)| *u == uri)
            .map(|(p, _)| p.to_string())
            .collect()
    }

    /// Child elements in order.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|n| match n {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// Mutable child elements in order.
    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|n| match n {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// First child element with the given local name.
    pub fn child(&self, local: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.is(local))
    }

    pub fn child_mut(&mut self, local: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|e| e.is(local))
    }

    /// Follow a path of local names from this element.
    pub fn find(&self, path: &[&str]) -> Option<&XmlElement> {
        path.iter().try_fold(self, |el, name| el.child(name))
    }

    pub fn find_mut(&mut self, path: &[&str]) -> Option<&mut XmlElement> {
        let mut current = self;
        for name in path {
            current = current.child_mut(name)?;
        }
        Some(current)
    }

    pub fn push(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    /// Position (in `children`) of the first child element with this local name.
    pub fn child_position(&self, local: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|n| matches!(n, XmlNode::Element(e) if e.is(local)))
    }

    /// Insert a child before the first child named `before`, or append.
    pub fn insert_before(&mut self, child: XmlElement, before: &str) {
        match self.child_position(before) {
            Some(pos) => self.children.insert(pos, XmlNode::Element(child)),
            None => self.push(child),
        }
    }

    /// Remove child elements matching `pred`, returning them in order.
    pub fn take_children_where<F>(&mut self, mut pred: F) -> Vec<XmlElement>
    where
        F: FnMut(&XmlElement) -> bool,
    {
        let mut taken = Vec::new();
        let mut kept = Vec::with_capacity(self.children.len());
        for node in self.children.drain(..) {
            match node {
                XmlNode::Element(e) if pred(&e) => taken.push(e),
                other => kept.push(other),
            }
        }
        self.children = kept;
        taken
    }

    /// Concatenated text of this element and all descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                XmlNode::Text(t) => out.push_str(t),
                XmlNode::Element(e) => e.collect_text(out),
            }
        }
    }

    /// Whether this element or any descendant satisfies `pred`.
    pub fn any<F>(&self, pred: &F) -> bool
    where
        F: Fn(&XmlElement) -> bool,
    {
        pred(self) || self.elements().any(|e| e.any(pred))
    }

    /// Visit this element and every descendant, depth first.
    pub fn visit<F>(&self, f: &mut F)
    where
        F: FnMut(&XmlElement),
    {
        f(self);
        for child in self.elements() {
            child.visit(f);
        }
    }

    /// Visit this element and every descendant mutably; stops at the first error.
    pub fn try_visit_mut<F>(&mut self, f: &mut F) -> Result<()>
    where
        F: FnMut(&mut XmlElement) -> Result<()>,
    {
        f(self)?;
        for child in self.elements_mut() {
            child.try_visit_mut(f)?;
        }
        Ok(())
    }

    /// Parse a complete document and return its root element.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(bytes);
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => stack.push(Self::from_start(e)?),
                Ok(Event::Empty(ref e)) => {
                    let element = Self::from_start(e)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::XmlError("Unbalanced end tag".to_string()))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::Text(ref e)) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = e.unescape().map_err(xml_error)?;
                        parent.children.push(XmlNode::Text(text.into_owned()));
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                        parent.children.push(XmlNode::Text(text));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "{} at position {}",
                        e,
                        reader.buffer_position()
                    )));
                }
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(Error::XmlError("Unexpected end of document".to_string()));
        }
        root.ok_or_else(|| Error::XmlError("Document has no root element".to_string()))
    }

    fn from_start(e: &BytesStart<'_>) -> Result<Self> {
        let mut element = Self::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
        for attr in e.attributes() {
            let attr = attr.map_err(|e| Error::XmlError(format!("Bad attribute: {}", e)))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(xml_error)?.into_owned();
            element.attributes.push((key, value));
        }
        Ok(element)
    }

    /// Serialize as a standalone document with an XML declaration.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .map_err(xml_error)?;
        writer
            .write_event(Event::Text(BytesText::from_escaped("\n")))
            .map_err(xml_error)?;
        self.write_into(&mut writer).map_err(xml_error)?;
        Ok(writer.into_inner())
    }

    fn write_into(&self, writer: &mut Writer<Vec<u8>>) -> quick_xml::Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.children.is_empty() {
            return writer.write_event(Event::Empty(start));
        }

        writer.write_event(Event::Start(start))?;
        for node in &self.children {
            match node {
                XmlNode::Element(e) => e.write_into(writer)?,
                XmlNode::Text(t) => writer.write_event(Event::Text(BytesText::new(t)))?,
            }
        }
        writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))
    }
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(Error::XmlError("Multiple root elements".to_string())),
    }
    Ok(())
}

fn xml_error(e: quick_xml::Error) -> Error {
    Error::XmlError(e.to_string())
}

/// Extract the local name from a potentially namespaced XML name.
pub fn local_name(name: &str) -> &str {
    match name.find(':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}
