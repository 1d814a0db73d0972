//! Relationship remapping across documents.
//!
//! A [`ResourceTable`] captures, for one source part, what each of its
//! relationship ids actually points at: the bytes of an internal part, or an
//! external URL. A [`RelationshipRemapper`] then rewrites copied XML so that
//! every relationship id refers to an equivalent relationship in the target
//! part, importing resources as needed. The source id string is never
//! written into the target.

use crate::package::{self, relative_target};
use crate::presentation::Presentation;
use crate::rels::{Relationship, Relationships, ResourceClass};
use crate::xml::XmlElement;
use deck_core::{Error, Result};
use std::collections::HashMap;

/// What a relationship resolves to, detached from its document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    /// Image or media bytes, shared between slides with identical content.
    Part {
        bytes: Vec<u8>,
        extension: String,
        content_type: String,
    },
    /// A part with relationships of its own, copied as a new part.
    Embedded(EmbeddedPart),
    External {
        url: String,
    },
}

/// A non-media part (chart, diagram data, OLE object, ...) and the
/// resources behind its relationships.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedPart {
    /// Part name in the source package; its stem names the copy.
    pub name: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
    /// Source relationships, ids unchanged, with what they point at.
    pub relationships: Vec<(Relationship, Resource)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEntry {
    pub reltype: String,
    pub class: ResourceClass,
    pub resource: Resource,
}

/// Source relationship id → owned resource, for one part.
#[derive(Debug, Clone, Default)]
pub struct ResourceTable {
    entries: HashMap<String, ResourceEntry>,
    /// Ids that cannot leave the source document, with the reason.
    unportable: HashMap<String, String>,
}

impl ResourceTable {
    /// Collect everything the relationships of `part` point at.
    pub fn collect(doc: &Presentation, part: &str) -> Result<Self> {
        let mut table = Self::default();

        for rel in doc.relationships(part)?.iter() {
            let mut visiting = vec![part.to_string()];
            match resolve(doc, part, rel, &mut visiting) {
                Ok(resource) => {
                    table.entries.insert(
                        rel.id.clone(),
                        ResourceEntry {
                            reltype: rel.reltype.clone(),
                            class: rel.class(),
                            resource,
                        },
                    );
                }
                Err(reason) => {
                    table.unportable.insert(rel.id.clone(), reason);
                }
            }
        }

        Ok(table)
    }

    pub fn get(&self, id: &str) -> Option<&ResourceEntry> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn check(&self, id: &str) -> Result<&ResourceEntry> {
        if let Some(entry) = self.entries.get(id) {
            return Ok(entry);
        }
        Err(Error::RelationshipError(match self.unportable.get(id) {
            Some(reason) => reason.clone(),
            None => format!("'{}' does not resolve", id),
        }))
    }

    /// Remove references under `element` that cannot be carried to another
    /// document.
    ///
    /// A hyperlink element (`a:hlinkClick`, `a:hlinkHover`, ...) holding such
    /// a reference is removed whole; any other reference attribute is removed
    /// from its element. Returns the reasons, without repeats.
    pub fn strip_unportable(&self, element: &mut XmlElement, prefixes: &[String]) -> Vec<String> {
        let mut reasons = Vec::new();
        self.strip_into(element, prefixes, &mut reasons);
        reasons
    }

    fn strip_into(&self, el: &mut XmlElement, prefixes: &[String], reasons: &mut Vec<String>) {
        let blocked = |attrs: &[(String, String)]| -> Vec<String> {
            attrs
                .iter()
                .filter(|(key, value)| is_reference(key, prefixes) && !value.is_empty())
                .filter_map(|(_, value)| self.check(value).err())
                .map(|e| e.to_string())
                .collect()
        };

        let links = el.take_children_where(|child| {
            child.local_name().starts_with("hlink") && !blocked(child.attributes.as_slice()).is_empty()
        });
        for link in &links {
            push_unique(reasons, blocked(link.attributes.as_slice()));
        }

        let keys: Vec<String> = el
            .attributes
            .iter()
            .filter(|(key, value)| {
                is_reference(key, prefixes) && !value.is_empty() && self.check(value).is_err()
            })
            .map(|(key, _)| key.clone())
            .collect();
        for key in keys {
            if let Some(id) = el.remove_attr(&key) {
                if let Err(e) = self.check(&id) {
                    push_unique(reasons, vec![e.to_string()]);
                }
            }
        }

        for child in el.elements_mut() {
            self.strip_into(child, prefixes, reasons);
        }
    }
}

fn push_unique(reasons: &mut Vec<String>, found: Vec<String>) {
    for reason in found {
        if !reasons.contains(&reason) {
            reasons.push(reason);
        }
    }
}

/// What `rel` of `from_part` points at, or why it cannot be copied.
///
/// `visiting` holds the embedded parts on the current path and stops
/// relationship cycles.
fn resolve(
    doc: &Presentation,
    from_part: &str,
    rel: &Relationship,
    visiting: &mut Vec<String>,
) -> std::result::Result<Resource, String> {
    let class = rel.class();
    if class == ResourceClass::Structural {
        return Err(format!(
            "'{}' is a {} relationship, which cannot be copied",
            rel.id,
            rel.reltype.rsplit('/').next().unwrap_or(&rel.reltype)
        ));
    }
    if rel.external {
        return Ok(Resource::External {
            url: rel.target.clone(),
        });
    }

    let source = package::resolve_target(from_part, &rel.target);
    let bytes = doc
        .part(&source)
        .map_err(|_| format!("'{}' points at missing part {}", rel.id, source))?;
    let extension = package::extension(&source);
    let content_type = doc
        .content_type(&source)
        .map(str::to_string)
        .unwrap_or_else(|| guess_content_type(&extension));

    if class != ResourceClass::Other {
        return Ok(Resource::Part {
            bytes: bytes.to_vec(),
            extension,
            content_type,
        });
    }

    if visiting.contains(&source) {
        return Err(format!("'{}' points back at {}", rel.id, source));
    }
    visiting.push(source.clone());

    let mut relationships = Vec::new();
    for inner in doc.relationships(&source).map_err(|e| e.to_string())?.iter() {
        match resolve(doc, &source, inner, visiting) {
            Ok(resource) => relationships.push((inner.clone(), resource)),
            Err(reason) => log::warn!("{}: {}", source, reason),
        }
    }
    visiting.pop();

    Ok(Resource::Embedded(EmbeddedPart {
        name: source,
        bytes: bytes.to_vec(),
        content_type,
        relationships,
    }))
}

/// Rewrites relationship ids for one target part.
pub struct RelationshipRemapper<'a> {
    source: &'a ResourceTable,
    target_part: String,
    rels: Relationships,
    minted: HashMap<String, String>,
}

impl<'a> RelationshipRemapper<'a> {
    /// `rels` is the current relationship table of `target_part`.
    pub fn new(source: &'a ResourceTable, target_part: &str, rels: Relationships) -> Self {
        Self {
            source,
            target_part: target_part.to_string(),
            rels,
            minted: HashMap::new(),
        }
    }

    /// Target id for a source id, minting the relationship on first use.
    pub fn remap_id(&mut self, target: &mut Presentation, source_id: &str) -> Result<String> {
        if let Some(id) = self.minted.get(source_id) {
            return Ok(id.clone());
        }

        let entry = self.source.check(source_id)?;
        let id = match &entry.resource {
            Resource::External { url } => self.rels.get_or_add_external(&entry.reltype, url),
            Resource::Part {
                bytes,
                extension,
                content_type,
            } => {
                let part = target.import_media(bytes, extension, content_type)?;
                let relative = relative_target(&self.target_part, &part);
                self.rels.get_or_add(&entry.reltype, &relative)
            }
            Resource::Embedded(embedded) => {
                let part = target.import_embedded(embedded)?;
                let relative = relative_target(&self.target_part, &part);
                self.rels.get_or_add(&entry.reltype, &relative)
            }
        };

        log::debug!("Remapped {} -> {} for {}", source_id, id, self.target_part);
        self.minted.insert(source_id.to_string(), id.clone());
        Ok(id)
    }

    /// Rewrite every relationship attribute under `element`.
    ///
    /// `prefixes` are the prefixes bound to the relationships namespace in
    /// the source document. Either every reference resolves and is rewritten,
    /// or the element is left untouched and an error returned.
    pub fn remap_element(
        &mut self,
        target: &mut Presentation,
        element: &mut XmlElement,
        prefixes: &[String],
    ) -> Result<usize> {
        let mut ids: Vec<String> = Vec::new();
        element.visit(&mut |el| {
            for (key, value) in &el.attributes {
                if is_reference(key, prefixes) && !value.is_empty() && !ids.contains(value) {
                    ids.push(value.clone());
                }
            }
        });

        for id in &ids {
            self.source.check(id)?;
        }

        let mut mapping = HashMap::with_capacity(ids.len());
        for id in &ids {
            mapping.insert(id.clone(), self.remap_id(target, id)?);
        }

        let mut rewritten = 0;
        element.try_visit_mut(&mut |el| {
            for (key, value) in el.attributes.iter_mut() {
                if !is_reference(key, prefixes) {
                    continue;
                }
                if let Some(new_id) = mapping.get(value.as_str()) {
                    *value = new_id.clone();
                    rewritten += 1;
                }
            }
            Ok(())
        })?;
        Ok(rewritten)
    }

    /// The target part's relationship table with everything minted so far.
    pub fn into_relationships(self) -> Relationships {
        self.rels
    }
}

/// Whether an attribute name is `prefix:anything` for a relationships prefix.
fn is_reference(key: &str, prefixes: &[String]) -> bool {
    match key.split_once(':') {
        Some((prefix, _)) => prefix != "xmlns" && prefixes.iter().any(|p| p == prefix),
        None => false,
    }
}

pub(crate) fn guess_content_type(extension: &str) -> String {
    match extension {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        "emf" => "image/x-emf",
        "wmf" => "image/x-wmf",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "wmv" => "video/x-ms-wmv",
        "mp3" => "audio/mpeg",
        "xml" => "application/xml",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "bin" => "application/vnd.openxmlformats-officedocument.oleObject",
        "wav" => "audio/wav",
        _ => "application/octet-stream",
    }
    .to_string()
}
