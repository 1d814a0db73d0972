//! Relationship tables.
//!
//! Each part of a package owns a relationship table mapping document-scoped
//! ids (`rId1`, `rId2`, ...) to targets. The same id means different things
//! in different parts and in different packages; ids are never copied across
//! a document boundary without going through this table.

use crate::xml::XmlElement;
use deck_core::{Error, Result};

const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Relationship type URIs used by the assembler.
pub mod reltype {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
    pub const SLIDE_LAYOUT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
    pub const SLIDE_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
    pub const THEME: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
    pub const IMAGE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    pub const HYPERLINK: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
    pub const MEDIA: &str = "http://schemas.microsoft.com/office/2007/relationships/media";
    pub const CHART: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart";
    pub const PACKAGE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/package";
}

/// A single relationship from a source part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub reltype: String,
    pub target: String,
    pub external: bool,
}

/// The kind of resource a relationship type points at, for copy purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceClass {
    Image,
    Media,
    Hyperlink,
    /// Deck structure (slides, layouts, masters, notes, theme). Meaningful
    /// only inside its own package.
    Structural,
    /// Any other part (chart, diagram data, OLE object, tags, ...), copied
    /// together with its own relationships.
    Other,
}

/// Relationship type tails that tie a part to the deck structure.
const STRUCTURAL_TYPES: &[&str] = &[
    "officeDocument",
    "slide",
    "slideLayout",
    "slideMaster",
    "notesSlide",
    "notesMaster",
    "handoutMaster",
    "theme",
    "presProps",
    "viewProps",
    "tableStyles",
    "commentAuthors",
    "comments",
];

impl Relationship {
    /// Classify by relationship type URI.
    pub fn class(&self) -> ResourceClass {
        let tail = self.reltype.rsplit('/').next().unwrap_or_default();
        match tail {
            _ if STRUCTURAL_TYPES.contains(&tail) => ResourceClass::Structural,
            "image" => ResourceClass::Image,
            "media" | "video" | "audio" => ResourceClass::Media,
            "hyperlink" => ResourceClass::Hyperlink,
            _ if self.reltype.contains("image") => ResourceClass::Image,
            _ if self.reltype.contains("media") => ResourceClass::Media,
            _ => ResourceClass::Other,
        }
    }
}

/// Ordered relationship table of one part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relationships {
    rels: Vec<Relationship>,
}

impl Relationships {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `.rels` part.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let root = XmlElement::parse(bytes)?;
        if !root.is("Relationships") {
            return Err(Error::XmlError(format!(
                "Expected <Relationships>, found <{}>",
                root.name
            )));
        }

        let mut rels = Vec::new();
        for el in root.elements().filter(|e| e.is("Relationship")) {
            let (Some(id), Some(reltype), Some(target)) =
                (el.attr("Id"), el.attr("Type"), el.attr("Target"))
            else {
                log::warn!("Skipping incomplete relationship entry");
                continue;
            };
            rels.push(Relationship {
                id: id.to_string(),
                reltype: reltype.to_string(),
                target: target.to_string(),
                external: el.attr("TargetMode") == Some("External"),
            });
        }

        Ok(Self { rels })
    }

    /// Serialize as a `.rels` part.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut root = XmlElement::new("Relationships").with_attr("xmlns", RELATIONSHIPS_NS);
        for rel in &self.rels {
            let mut el = XmlElement::new("Relationship")
                .with_attr("Id", rel.id.as_str())
                .with_attr("Type", rel.reltype.as_str())
                .with_attr("Target", rel.target.as_str());
            if rel.external {
                el.set_attr("TargetMode", "External");
            }
            root.push(el);
        }
        root.to_bytes()
    }

    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.rels.iter().find(|r| r.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.rels.iter()
    }

    pub fn len(&self) -> usize {
        self.rels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    /// Relationships of the given type.
    pub fn of_type<'a>(&'a self, reltype: &'a str) -> impl Iterator<Item = &'a Relationship> {
        self.rels.iter().filter(move |r| r.reltype == reltype)
    }

    /// The single relationship of a type, or an error.
    pub fn first_of_type(&self, reltype: &str) -> Result<&Relationship> {
        self.rels.iter().find(|r| r.reltype == reltype).ok_or_else(|| {
            Error::RelationshipError(format!("No relationship of type '{}'", reltype))
        })
    }

    /// Add a relationship under its own id, replacing any entry with that id.
    pub fn insert(&mut self, rel: Relationship) {
        match self.rels.iter_mut().find(|r| r.id == rel.id) {
            Some(slot) => *slot = rel,
            None => self.rels.push(rel),
        }
    }

    /// Id of an internal relationship to `target`, created if missing.
    pub fn get_or_add(&mut self, reltype: &str, target: &str) -> String {
        self.find_or_insert(reltype, target, false)
    }

    /// Id of an external relationship to `target`, created if missing.
    pub fn get_or_add_external(&mut self, reltype: &str, target: &str) -> String {
        self.find_or_insert(reltype, target, true)
    }

    fn find_or_insert(&mut self, reltype: &str, target: &str, external: bool) -> String {
        if let Some(rel) = self
            .rels
            .iter()
            .find(|r| r.reltype == reltype && r.target == target && r.external == external)
        {
            return rel.id.clone();
        }

        let id = self.next_id();
        self.rels.push(Relationship {
            id: id.clone(),
            reltype: reltype.to_string(),
            target: target.to_string(),
            external,
        });
        id
    }

    /// Remove a relationship by id.
    pub fn remove(&mut self, id: &str) -> Option<Relationship> {
        let pos = self.rels.iter().position(|r| r.id == id)?;
        Some(self.rels.remove(pos))
    }

    /// The lowest unused `rIdN`, filling gaps.
    pub fn next_id(&self) -> String {
        let mut used: Vec<u32> = self
            .rels
            .iter()
            .filter_map(|r| r.id.strip_prefix("rId"))
            .filter_map(|n| n.parse().ok())
            .collect();
        used.sort_unstable();

        let mut next = 1u32;
        for n in used {
            match n.cmp(&next) {
                std::cmp::Ordering::Equal => next += 1,
                std::cmp::Ordering::Greater => break,
                std::cmp::Ordering::Less => {}
            }
        }
        format!("rId{}", next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLIDE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout2.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image1.png"/><Relationship Id="rId4" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/" TargetMode="External"/></Relationships>"#;

    #[test]
    fn test_parse_slide_rels() {
        let rels = Relationships::parse(SLIDE_RELS.as_bytes()).unwrap();
        assert_eq!(rels.len(), 3);

        let image = rels.get("rId3").unwrap();
        assert_eq!(image.target, "../media/image1.png");
        assert_eq!(image.class(), ResourceClass::Image);
        assert!(!image.external);

        let link = rels.get("rId4").unwrap();
        assert!(link.external);
        assert_eq!(link.class(), ResourceClass::Hyperlink);

        assert_eq!(rels.get("rId1").unwrap().class(), ResourceClass::Structural);
        assert_eq!(
            rels.first_of_type(reltype::SLIDE_LAYOUT).unwrap().target,
            "../slideLayouts/slideLayout2.xml"
        );
    }

    #[test]
    fn test_first_of_type_outlives_type_argument() {
        let rels = Relationships::parse(SLIDE_RELS.as_bytes()).unwrap();
        let layout = {
            let wanted = reltype::SLIDE_LAYOUT.to_string();
            rels.first_of_type(&wanted).unwrap()
        };
        assert_eq!(layout.id, "rId1");
        assert!(rels.first_of_type(reltype::SLIDE_MASTER).is_err());
    }

    #[test]
    fn test_next_id_fills_gaps() {
        let rels = Relationships::parse(SLIDE_RELS.as_bytes()).unwrap();
        assert_eq!(rels.next_id(), "rId2");
        assert_eq!(Relationships::new().next_id(), "rId1");
    }

    #[test]
    fn test_get_or_add_reuses_matching_relationship() {
        let mut rels = Relationships::parse(SLIDE_RELS.as_bytes()).unwrap();

        assert_eq!(rels.get_or_add(reltype::IMAGE, "../media/image1.png"), "rId3");

        let new_id = rels.get_or_add(reltype::IMAGE, "../media/image2.png");
        assert_eq!(new_id, "rId2");
        assert_eq!(rels.len(), 4);

        // Same URL but internal vs external are different relationships
        assert_eq!(
            rels.get_or_add_external(reltype::HYPERLINK, "https://example.com/"),
            "rId4"
        );
        assert_eq!(rels.get_or_add(reltype::HYPERLINK, "https://example.com/"), "rId5");
    }

    #[test]
    fn test_media_classes() {
        let rel = |t: &str| Relationship {
            id: "rId1".to_string(),
            reltype: t.to_string(),
            target: "x".to_string(),
            external: false,
        };
        assert_eq!(rel(reltype::MEDIA).class(), ResourceClass::Media);
        assert_eq!(
            rel("http://schemas.openxmlformats.org/officeDocument/2006/relationships/video").class(),
            ResourceClass::Media
        );
        assert_eq!(rel(reltype::SLIDE_MASTER).class(), ResourceClass::Structural);
        assert_eq!(rel(reltype::SLIDE).class(), ResourceClass::Structural);
        assert_eq!(rel(reltype::CHART).class(), ResourceClass::Other);
        assert_eq!(rel(reltype::PACKAGE).class(), ResourceClass::Other);
    }

    #[test]
    fn test_round_trip() {
        let rels = Relationships::parse(SLIDE_RELS.as_bytes()).unwrap();
        let bytes = rels.to_bytes().unwrap();
        assert_eq!(Relationships::parse(&bytes).unwrap(), rels);
    }

    #[test]
    fn test_insert_keeps_id() {
        let mut rels = Relationships::new();
        rels.insert(Relationship {
            id: "rId7".to_string(),
            reltype: reltype::PACKAGE.to_string(),
            target: "../embeddings/book1.xlsx".to_string(),
            external: false,
        });
        assert_eq!(rels.get("rId7").unwrap().target, "../embeddings/book1.xlsx");
        assert_eq!(rels.next_id(), "rId1");
    }

    #[test]
    fn test_remove() {
        let mut rels = Relationships::parse(SLIDE_RELS.as_bytes()).unwrap();
        assert!(rels.remove("rId3").is_some());
        assert!(rels.get("rId3").is_none());
        assert!(rels.remove("rId3").is_none());
    }
}
