//! Slide, layout and master trees.
//!
//! All three part kinds share the `p:cSld` structure: an optional `p:bg`
//! background followed by the `p:spTree` shape tree.

use crate::xml::XmlElement;
use deck_core::{Error, Result};

pub const NS_DRAWING: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub const NS_RELATIONSHIPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub const NS_PRESENTATION: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";

/// Local names of the elements that count as shapes inside `p:spTree`.
const SHAPE_ELEMENTS: &[&str] = &["sp", "grpSp", "graphicFrame", "cxnSp", "pic", "contentPart"];

/// A parsed slide, slide layout or slide master part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideTree {
    root: XmlElement,
}

impl SlideTree {
    /// Parse a part that has a `p:cSld/p:spTree`.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        Self::from_root(XmlElement::parse(bytes)?)
    }

    pub fn from_root(root: XmlElement) -> Result<Self> {
        if root.find(&["cSld", "spTree"]).is_none() {
            return Err(Error::CorruptedFile(format!(
                "<{}> has no shape tree",
                root.name
            )));
        }
        Ok(Self { root })
    }

    /// An empty slide with the standard namespace bindings.
    pub fn empty_slide() -> Self {
        let group_properties = XmlElement::new("p:nvGrpSpPr")
            .with_child(
                XmlElement::new("p:cNvPr")
                    .with_attr("id", "1")
                    .with_attr("name", ""),
            )
            .with_child(XmlElement::new("p:cNvGrpSpPr"))
            .with_child(XmlElement::new("p:nvPr"));

        let transform = XmlElement::new("a:xfrm")
            .with_child(XmlElement::new("a:off").with_attr("x", "0").with_attr("y", "0"))
            .with_child(XmlElement::new("a:ext").with_attr("cx", "0").with_attr("cy", "0"))
            .with_child(XmlElement::new("a:chOff").with_attr("x", "0").with_attr("y", "0"))
            .with_child(XmlElement::new("a:chExt").with_attr("cx", "0").with_attr("cy", "0"));

        let root = XmlElement::new("p:sld")
            .with_attr("xmlns:a", NS_DRAWING)
            .with_attr("xmlns:r", NS_RELATIONSHIPS)
            .with_attr("xmlns:p", NS_PRESENTATION)
            .with_child(
                XmlElement::new("p:cSld").with_child(
                    XmlElement::new("p:spTree")
                        .with_child(group_properties)
                        .with_child(XmlElement::new("p:grpSpPr").with_child(transform)),
                ),
            )
            .with_child(
                XmlElement::new("p:clrMapOvr").with_child(XmlElement::new("a:masterClrMapping")),
            );

        Self { root }
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.root.to_bytes()
    }

    /// The `name` attribute of `p:cSld` (layout and master names live here).
    pub fn name(&self) -> Option<&str> {
        self.root.child("cSld").and_then(|c| c.attr("name"))
    }

    fn sp_tree_mut(&mut self) -> Result<&mut XmlElement> {
        self.root
            .find_mut(&["cSld", "spTree"])
            .ok_or_else(|| Error::CorruptedFile("Shape tree missing".to_string()))
    }

    /// Shapes in z-order.
    pub fn shapes(&self) -> impl Iterator<Item = &XmlElement> {
        self.root
            .find(&["cSld", "spTree"])
            .into_iter()
            .flat_map(|tree| tree.elements())
            .filter(|e| is_shape(e))
    }

    pub fn shape_count(&self) -> usize {
        self.shapes().count()
    }

    /// Placeholder shapes (those carrying `p:nvPr/p:ph`).
    pub fn placeholders(&self) -> impl Iterator<Item = &XmlElement> {
        self.shapes().filter(|e| is_placeholder(e))
    }

    /// Remove every shape, returning how many were removed.
    pub fn clear_shapes(&mut self) -> Result<usize> {
        Ok(self.sp_tree_mut()?.take_children_where(is_shape).len())
    }

    /// Append a shape at the top of the z-order (before any `p:extLst`).
    pub fn push_shape(&mut self, shape: XmlElement) -> Result<()> {
        self.sp_tree_mut()?.insert_before(shape, "extLst");
        Ok(())
    }

    /// The explicit `p:bg` of this part, if any.
    pub fn background(&self) -> Option<&XmlElement> {
        self.root.find(&["cSld", "bg"])
    }

    /// Replace the background; `None` removes it so the part inherits again.
    pub fn set_background(&mut self, background: Option<XmlElement>) -> Result<()> {
        let c_sld = self
            .root
            .child_mut("cSld")
            .ok_or_else(|| Error::CorruptedFile("cSld missing".to_string()))?;
        c_sld.take_children_where(|e| e.is("bg"));
        if let Some(bg) = background {
            c_sld.insert_before(bg, "spTree");
        }
        Ok(())
    }

    /// Paragraph text of every shape, one string per shape, empty shapes skipped.
    pub fn texts(&self) -> Vec<String> {
        self.shapes()
            .map(shape_text)
            .filter(|t| !t.trim().is_empty())
            .collect()
    }

    /// Prefixes bound to the relationships namespace on the root.
    pub fn relationship_prefixes(&self) -> Vec<String> {
        let mut prefixes = self.root.prefixes_for(NS_RELATIONSHIPS);
        if prefixes.is_empty() {
            prefixes.push("r".to_string());
        }
        prefixes
    }

    /// Declare on `element` every namespace of `source_root` that this tree's
    /// root does not already bind the same way, so the element stays valid
    /// once inserted here.
    pub fn carry_namespaces(&self, source_root: &XmlElement, element: &mut XmlElement) {
        for (prefix, uri) in source_root.namespaces() {
            let bound_here = self
                .root
                .namespaces()
                .any(|(p, u)| p == prefix && u == uri);
            let key = format!("xmlns:{}", prefix);
            if !bound_here && element.attr(&key).is_none() {
                element.set_attr(&key, uri);
            }
        }
    }
}

/// Whether an spTree child is a shape.
pub fn is_shape(element: &XmlElement) -> bool {
    SHAPE_ELEMENTS.contains(&element.local_name())
}

/// Whether a shape is a layout-driven placeholder.
pub fn is_placeholder(shape: &XmlElement) -> bool {
    shape
        .elements()
        .next()
        .and_then(|nv| nv.child("nvPr"))
        .and_then(|nv_pr| nv_pr.child("ph"))
        .is_some()
}

/// A fresh, empty placeholder shape for a layout placeholder.
///
/// Keeps the layout's non-visual properties (id, name, `p:ph` type/idx) so
/// the placeholder inherits position and formatting from the layout.
pub fn placeholder_stub(layout_shape: &XmlElement) -> Option<XmlElement> {
    if !layout_shape.is("sp") || !is_placeholder(layout_shape) {
        return None;
    }
    let nv = layout_shape.child("nvSpPr")?.clone();
    Some(
        XmlElement::new("p:sp")
            .with_child(nv)
            .with_child(XmlElement::new("p:spPr")),
    )
}

/// Text of a shape, paragraphs joined by newlines.
pub fn shape_text(shape: &XmlElement) -> String {
    let mut paragraphs: Vec<String> = Vec::new();
    shape.visit(&mut |el| {
        if el.is("p") {
            let mut text = String::new();
            el.visit(&mut |inner| {
                if inner.is("t") {
                    text.push_str(&inner.text());
                }
            });
            paragraphs.push(text);
        }
    });
    paragraphs.join("\n").trim().to_string()
}
