//! `[Content_Types].xml` handling.

use crate::package::extension;
use crate::xml::XmlElement;
use deck_core::{Error, Result};

const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

pub const SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
pub const SLIDE_LAYOUT: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";

/// Content types by extension (defaults) and by part name (overrides).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentTypes {
    defaults: Vec<(String, String)>,
    overrides: Vec<(String, String)>,
}

impl ContentTypes {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let root = XmlElement::parse(bytes)?;
        if !root.is("Types") {
            return Err(Error::XmlError(format!("Expected <Types>, found <{}>", root.name)));
        }

        let mut types = Self::default();
        for el in root.elements() {
            match (el.local_name(), el.attr("ContentType")) {
                ("Default", Some(ct)) => {
                    if let Some(ext) = el.attr("Extension") {
                        types.defaults.push((ext.to_ascii_lowercase(), ct.to_string()));
                    }
                }
                ("Override", Some(ct)) => {
                    if let Some(part) = el.attr("PartName") {
                        types
                            .overrides
                            .push((part.trim_start_matches('/').to_string(), ct.to_string()));
                    }
                }
                _ => {}
            }
        }
        Ok(types)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut root = XmlElement::new("Types").with_attr("xmlns", CONTENT_TYPES_NS);
        for (ext, ct) in &self.defaults {
            root.push(
                XmlElement::new("Default")
                    .with_attr("Extension", ext.as_str())
                    .with_attr("ContentType", ct.as_str()),
            );
        }
        for (part, ct) in &self.overrides {
            root.push(
                XmlElement::new("Override")
                    .with_attr("PartName", format!("/{}", part))
                    .with_attr("ContentType", ct.as_str()),
            );
        }
        root.to_bytes()
    }

    /// Content type of a part: its override, else the default for its extension.
    pub fn content_type(&self, part: &str) -> Option<&str> {
        self.overrides
            .iter()
            .find(|(p, _)| p == part)
            .or_else(|| {
                let ext = extension(part);
                self.defaults.iter().find(|(e, _)| *e == ext)
            })
            .map(|(_, ct)| ct.as_str())
    }

    /// Register (or replace) the override for a part.
    pub fn set_override(&mut self, part: &str, content_type: &str) {
        match self.overrides.iter_mut().find(|(p, _)| p == part) {
            Some(slot) => slot.1 = content_type.to_string(),
            None => self
                .overrides
                .push((part.to_string(), content_type.to_string())),
        }
    }

    pub fn remove_override(&mut self, part: &str) {
        self.overrides.retain(|(p, _)| p != part);
    }

    /// Make sure a part with this extension gets `content_type`.
    ///
    /// Adds a default when the extension is unknown; falls back to an
    /// override when the extension's default says something else.
    pub fn ensure(&mut self, part: &str, content_type: &str) {
        let ext = extension(part);
        match self.defaults.iter().find(|(e, _)| *e == ext) {
            Some((_, ct)) if ct == content_type => {}
            Some(_) => self.set_override(part, content_type),
            None if !ext.is_empty() => self.defaults.push((ext, content_type.to_string())),
            None => self.set_override(part, content_type),
        }
    }
}
