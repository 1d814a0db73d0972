//! Cross-document slide copy.
//!
//! A copy is built as a fold over the source slide's shapes: each shape is
//! deep-copied and has its relationship ids remapped into the target.
//! Images, media, links and embedded parts such as charts travel with the
//! shape. A reference into the source deck's own structure (a jump to
//! another slide) has nothing to point at in the target; it is dropped from
//! the shape with a [`CopyWarning`] and the shape is kept. Only problems that
//! leave no slide to return are errors.

use crate::presentation::Presentation;
use crate::resources::{RelationshipRemapper, ResourceTable};
use crate::slide::SlideTree;
use crate::xml::XmlElement;
use deck_core::{Error, Result};
use std::fmt;

/// Something that could not be carried over; the slide was still copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyWarning {
    /// The source layout could not be matched or imported.
    LayoutFallback { layout: String, reason: String },
    /// A reference was removed from a copied shape.
    ReferenceDropped {
        position: usize,
        name: String,
        reason: String,
    },
    /// The background was left out of the copy.
    BackgroundSkipped { reason: String },
}

impl fmt::Display for CopyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LayoutFallback { layout, reason } => {
                write!(f, "layout '{}' replaced by target's first layout: {}", layout, reason)
            }
            Self::ReferenceDropped {
                position,
                name,
                reason,
            } => write!(f, "shape {} ('{}'): reference dropped: {}", position, name, reason),
            Self::BackgroundSkipped { reason } => write!(f, "background skipped: {}", reason),
        }
    }
}

/// Result of copying one slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopiedSlide {
    /// Index of the new slide in the target (always the last slide).
    pub index: usize,
    pub shapes: usize,
    pub warnings: Vec<CopyWarning>,
}

/// A background detached from its document, with everything needed to
/// re-create it elsewhere.
#[derive(Debug, Clone)]
pub struct BackgroundSnapshot {
    element: XmlElement,
    resources: ResourceTable,
    source_root: XmlElement,
    prefixes: Vec<String>,
}

impl BackgroundSnapshot {
    /// The background slide `index` of `doc` displays, inherited or not.
    pub fn effective(doc: &Presentation, index: usize) -> Result<Option<Self>> {
        let Some((part, element)) = doc.effective_background(index)? else {
            return Ok(None);
        };
        let tree = doc.tree(&part)?;
        Ok(Some(Self {
            element,
            resources: ResourceTable::collect(doc, &part)?,
            prefixes: tree.relationship_prefixes(),
            source_root: namespace_carrier(tree.root()),
        }))
    }

    /// Overwrite the background of slide `index` in `target`.
    ///
    /// A background that cannot be remapped leaves the slide as it was and
    /// comes back as a warning.
    pub fn apply(&self, target: &mut Presentation, index: usize) -> Result<Option<CopyWarning>> {
        let part = target.slide_part(index)?;
        let mut tree = target.slide(index)?;
        let mut remapper =
            RelationshipRemapper::new(&self.resources, &part, target.relationships(&part)?);

        let mut bg = self.element.clone();
        if let Err(e) = remapper.remap_element(target, &mut bg, &self.prefixes) {
            let warning = CopyWarning::BackgroundSkipped {
                reason: e.to_string(),
            };
            log::warn!("Slide {}: {}", index + 1, warning);
            return Ok(Some(warning));
        }
        tree.carry_namespaces(&self.source_root, &mut bg);
        tree.set_background(Some(bg))?;

        target.set_relationships(&part, &remapper.into_relationships())?;
        target.set_slide(index, &tree)?;
        Ok(None)
    }
}

/// Copy slide `index` of `source` to the end of `target`.
pub fn copy_slide(source: &Presentation, index: usize, target: &mut Presentation) -> Result<CopiedSlide> {
    let source_part = source.slide_part(index)?;
    let source_tree = source.slide(index)?;
    let resources = ResourceTable::collect(source, &source_part)?;
    let prefixes = source_tree.relationship_prefixes();

    let mut warnings = Vec::new();
    let layout = match resolve_layout(source, &source_part, target) {
        Ok(layout) => layout,
        Err(reason) => {
            let fallback = target
                .layouts()?
                .into_iter()
                .next()
                .ok_or_else(|| Error::CorruptedFile("Target presentation has no slide layouts".to_string()))?;
            warnings.push(CopyWarning::LayoutFallback {
                layout: source.layout_of(&source_part).unwrap_or_default(),
                reason: reason.to_string(),
            });
            fallback
        }
    };

    let new_index = target.add_slide(&layout)?;
    let new_part = target.slide_part(new_index)?;
    let mut new_tree = target.slide(new_index)?;
    let cleared = new_tree.clear_shapes()?;
    log::debug!("Cleared {} layout placeholders from {}", cleared, new_part);

    let mut remapper = RelationshipRemapper::new(&resources, &new_part, target.relationships(&new_part)?);

    let mut shapes = 0;
    for (position, shape) in source_tree.shapes().enumerate() {
        let mut copy = shape.clone();
        for reason in resources.strip_unportable(&mut copy, &prefixes) {
            warnings.push(CopyWarning::ReferenceDropped {
                position,
                name: shape_name(shape),
                reason,
            });
        }
        remapper.remap_element(target, &mut copy, &prefixes)?;
        new_tree.carry_namespaces(source_tree.root(), &mut copy);
        new_tree.push_shape(copy)?;
        shapes += 1;
    }

    if let Some(bg) = source_tree.background() {
        let mut copy = bg.clone();
        match remapper.remap_element(target, &mut copy, &prefixes) {
            Ok(_) => {
                new_tree.carry_namespaces(source_tree.root(), &mut copy);
                new_tree.set_background(Some(copy))?;
            }
            Err(e) => warnings.push(CopyWarning::BackgroundSkipped {
                reason: e.to_string(),
            }),
        }
    }

    target.set_relationships(&new_part, &remapper.into_relationships())?;
    target.set_slide(new_index, &new_tree)?;

    for warning in &warnings {
        log::warn!("Copying slide {}: {}", index + 1, warning);
    }
    log::debug!(
        "Copied slide {} as slide {} ({} shapes)",
        index + 1,
        new_index + 1,
        shapes
    );

    Ok(CopiedSlide {
        index: new_index,
        shapes,
        warnings,
    })
}

/// Find or create the target layout for a source slide.
///
/// A target layout with the same name is reused; otherwise the source
/// layout is imported under the target's first master.
fn resolve_layout(source: &Presentation, source_part: &str, target: &mut Presentation) -> Result<String> {
    let source_layout = source.layout_of(source_part)?;

    if let Some(name) = source.layout_name(&source_layout)? {
        if let Some(existing) = target.find_layout_by_name(&name)? {
            return Ok(existing);
        }
    }

    let imported = import_layout(source, &source_layout, target)?;
    log::info!("Imported layout {} as {}", source_layout, imported);
    Ok(imported)
}

/// Copy a layout part, with its images, into `target`.
pub fn import_layout(source: &Presentation, source_layout: &str, target: &mut Presentation) -> Result<String> {
    let tree = source.tree(source_layout)?;
    let resources = ResourceTable::collect(source, source_layout)?;
    let part = target.next_layout_part();

    let mut remapper = RelationshipRemapper::new(&resources, &part, Default::default());
    let prefixes = tree.relationship_prefixes();
    let mut root = tree.root().clone();
    for reason in resources.strip_unportable(&mut root, &prefixes) {
        log::warn!("Layout {}: reference dropped: {}", source_layout, reason);
    }
    remapper.remap_element(target, &mut root, &prefixes)?;

    target.add_layout(&part, &SlideTree::from_root(root)?, remapper.into_relationships())?;
    Ok(part)
}

fn shape_name(shape: &XmlElement) -> String {
    shape
        .elements()
        .next()
        .and_then(|nv| nv.child("cNvPr"))
        .and_then(|c| c.attr("name"))
        .unwrap_or_default()
        .to_string()
}

/// An element carrying only the namespace declarations of `root`.
fn namespace_carrier(root: &XmlElement) -> XmlElement {
    let mut carrier = XmlElement::new(root.name.as_str());
    for (prefix, uri) in root.namespaces() {
        carrier.set_attr(&format!("xmlns:{}", prefix), uri);
    }
    carrier
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{DeckBuilder, FixtureSlide, PNG_BLUE, PNG_RED, WORKBOOK};
    use crate::package;
    use crate::rels::reltype;

    fn image_bytes(doc: &Presentation, index: usize) -> Vec<Vec<u8>> {
        let part = doc.slide_part(index).unwrap();
        let rels = doc.relationships(&part).unwrap();
        let tree = doc.slide(index).unwrap();

        let mut out = Vec::new();
        tree.root().visit(&mut |el| {
            if el.is("blip") {
                let id = el.attr("r:embed").unwrap();
                let rel = rels.get(id).unwrap();
                let media = package::resolve_target(&part, &rel.target);
                out.push(doc.part(&media).unwrap().to_vec());
            }
        });
        out
    }

    #[test]
    fn test_copy_into_fresh_document_keeps_shape_count() {
        let source = DeckBuilder::new()
            .slide(FixtureSlide::text("Intro"))
            .slide(FixtureSlide::text("Logo").with_image(PNG_RED).with_link("https://example.com/"))
            .presentation();
        let mut target = DeckBuilder::new().presentation();
        assert_eq!(target.slide_count(), 0);

        let copied = copy_slide(&source, 1, &mut target).unwrap();
        assert_eq!(copied.index, 0);
        assert!(copied.warnings.is_empty());
        assert_eq!(target.slide_count(), 1);
        assert_eq!(
            target.slide(0).unwrap().shape_count(),
            source.slide(1).unwrap().shape_count()
        );
        assert_eq!(target.slide_texts(0).unwrap(), vec!["Logo".to_string()]);
    }

    #[test]
    fn test_copied_reference_resolves_to_source_image() {
        // Both decks use rId2 for their own, different image.
        let source = DeckBuilder::new()
            .slide(FixtureSlide::text("red").with_image(PNG_RED))
            .presentation();
        let mut target = DeckBuilder::new()
            .slide(FixtureSlide::text("blue").with_image(PNG_BLUE))
            .presentation();

        let copied = copy_slide(&source, 0, &mut target).unwrap();

        assert_eq!(image_bytes(&target, copied.index), vec![PNG_RED.to_vec()]);
        // the existing slide still shows its own image
        assert_eq!(image_bytes(&target, 0), vec![PNG_BLUE.to_vec()]);
    }

    #[test]
    fn test_repeated_copies_are_separate_slides() {
        let source = DeckBuilder::new()
            .slide(FixtureSlide::text("Original").with_image(PNG_RED))
            .presentation();
        let mut target = DeckBuilder::new().slide(FixtureSlide::text("x")).presentation();

        let first = copy_slide(&source, 0, &mut target).unwrap();
        let second = copy_slide(&source, 0, &mut target).unwrap();

        assert_eq!((first.index, second.index), (1, 2));
        assert_ne!(
            target.slide_part(first.index).unwrap(),
            target.slide_part(second.index).unwrap()
        );
        assert_eq!(target.slide_texts(2).unwrap(), vec!["Original".to_string()]);
        // identical image bytes are stored once
        assert_eq!(
            target.content_types().content_type("ppt/media/image1.png"),
            Some("image/png")
        );
        assert!(target.part("ppt/media/image1.png").is_ok());
        assert!(target.part("ppt/media/image2.png").is_err());
    }

    #[test]
    fn test_slide_jump_dropped_and_shape_kept() {
        let source = DeckBuilder::new()
            .slide(
                FixtureSlide::text("Deck")
                    .with_image(PNG_RED)
                    .with_slide_jump(),
            )
            .presentation();
        let mut target = DeckBuilder::new().slide(FixtureSlide::text("x")).presentation();

        let copied = copy_slide(&source, 0, &mut target).unwrap();
        assert_eq!(copied.shapes, 2);
        assert_eq!(copied.warnings.len(), 1);
        assert!(matches!(
            &copied.warnings[0],
            CopyWarning::ReferenceDropped { position: 0, .. }
        ));
        assert_eq!(target.slide_texts(copied.index).unwrap(), vec!["Deck".to_string()]);
        assert_eq!(image_bytes(&target, copied.index), vec![PNG_RED.to_vec()]);

        let mut links = 0;
        target.slide(copied.index).unwrap().root().visit(&mut |el| {
            if el.is("hlinkClick") {
                links += 1;
            }
        });
        assert_eq!(links, 0);
        let part = target.slide_part(copied.index).unwrap();
        let rels = target.relationships(&part).unwrap();
        assert_eq!(rels.of_type(reltype::SLIDE).count(), 0);
    }

    #[test]
    fn test_chart_copied_with_its_workbook() {
        let source = DeckBuilder::new()
            .slide(FixtureSlide::text("Throughput").with_chart())
            .presentation();
        let mut target = DeckBuilder::new().slide(FixtureSlide::text("x")).presentation();

        let copied = copy_slide(&source, 0, &mut target).unwrap();
        assert!(copied.warnings.is_empty());
        assert_eq!(copied.shapes, 2);

        let part = target.slide_part(copied.index).unwrap();
        let rels = target.relationships(&part).unwrap();
        let chart_rel = rels.first_of_type(reltype::CHART).unwrap();
        let chart = package::resolve_target(&part, &chart_rel.target);
        assert_eq!(chart, "ppt/charts/chart1.xml");
        assert_eq!(
            target.part(&chart).unwrap(),
            source.part("ppt/charts/chart1.xml").unwrap()
        );
        assert_eq!(
            target.content_type(&chart),
            Some("application/vnd.openxmlformats-officedocument.drawingml.chart+xml")
        );

        let chart_rels = target.relationships(&chart).unwrap();
        let workbook_rel = chart_rels.get("rId1").unwrap();
        assert_eq!(workbook_rel.reltype, reltype::PACKAGE);
        let workbook = package::resolve_target(&chart, &workbook_rel.target);
        assert_eq!(target.part(&workbook).unwrap(), WORKBOOK);

        let frame_id = target
            .slide(copied.index)
            .unwrap()
            .shapes()
            .find_map(|shape| {
                let mut id = None;
                shape.visit(&mut |el| {
                    if el.is("chart") {
                        id = el.attr("r:id").map(str::to_string);
                    }
                });
                id
            })
            .unwrap();
        assert_eq!(frame_id, chart_rel.id);

        // each copy owns its chart
        copy_slide(&source, 0, &mut target).unwrap();
        assert!(target.part("ppt/charts/chart2.xml").is_ok());
    }

    #[test]
    fn test_layout_reused_by_name() {
        let source = DeckBuilder::new()
            .slide(FixtureSlide::text("blank").on_layout(1))
            .presentation();
        let mut target = DeckBuilder::new().slide(FixtureSlide::text("x")).presentation();
        let layouts_before = target.layouts().unwrap();

        let copied = copy_slide(&source, 0, &mut target).unwrap();
        let part = target.slide_part(copied.index).unwrap();
        assert_eq!(target.layouts().unwrap(), layouts_before);
        assert_eq!(target.layout_of(&part).unwrap(), layouts_before[1]);
    }

    #[test]
    fn test_unknown_layout_is_imported() {
        let source = DeckBuilder::new()
            .layout_names(&["Section Header", "Blank"])
            .slide(FixtureSlide::text("section"))
            .presentation();
        let mut target = DeckBuilder::new().slide(FixtureSlide::text("x")).presentation();

        let copied = copy_slide(&source, 0, &mut target).unwrap();
        assert!(copied.warnings.is_empty());

        let part = target.slide_part(copied.index).unwrap();
        let layout = target.layout_of(&part).unwrap();
        assert_eq!(target.layout_name(&layout).unwrap().as_deref(), Some("Section Header"));
        assert!(target.layouts().unwrap().contains(&layout));
        assert_eq!(
            target.master_of(&layout).unwrap(),
            "ppt/slideMasters/slideMaster1.xml"
        );

        // second copy reuses the imported layout
        let again = copy_slide(&source, 0, &mut target).unwrap();
        let part = target.slide_part(again.index).unwrap();
        assert_eq!(target.layout_of(&part).unwrap(), layout);
    }

    #[test]
    fn test_background_fill_and_image_copied() {
        let source = DeckBuilder::new()
            .slide(FixtureSlide::text("filled").with_fill("123456"))
            .slide(FixtureSlide::text("pictured").with_background_image(PNG_RED))
            .presentation();
        let mut target = DeckBuilder::new().slide(FixtureSlide::text("x")).presentation();

        let filled = copy_slide(&source, 0, &mut target).unwrap();
        let bg = target.slide(filled.index).unwrap().background().cloned().unwrap();
        assert!(format!("{:?}", bg).contains("123456"));

        let pictured = copy_slide(&source, 1, &mut target).unwrap();
        assert!(pictured.warnings.is_empty());
        assert_eq!(image_bytes(&target, pictured.index), vec![PNG_RED.to_vec()]);
    }

    #[test]
    fn test_background_snapshot_overwrites() {
        let themed = DeckBuilder::new()
            .slide(FixtureSlide::text("cover").with_background_image(PNG_BLUE))
            .slide(FixtureSlide::text("filler").with_fill("FFFFFF"))
            .presentation();
        let mut doc = themed.clone();

        let snapshot = BackgroundSnapshot::effective(&doc, 0).unwrap().unwrap();
        assert!(snapshot.apply(&mut doc, 1).unwrap().is_none());

        assert_eq!(image_bytes(&doc, 1), vec![PNG_BLUE.to_vec()]);
        let rels = doc.relationships("ppt/slides/slide2.xml").unwrap();
        assert_eq!(rels.of_type(reltype::IMAGE).count(), 1);
    }

    #[test]
    fn test_background_snapshot_failure_is_a_warning() {
        let mut doc = DeckBuilder::new()
            .slide(FixtureSlide::text("a"))
            .slide(FixtureSlide::text("b"))
            .presentation();
        let snapshot = BackgroundSnapshot {
            element: XmlElement::new("p:bg").with_child(
                XmlElement::new("a:blip").with_attr("r:embed", "rId7"),
            ),
            resources: ResourceTable::default(),
            source_root: XmlElement::new("p:sld"),
            prefixes: vec!["r".to_string()],
        };

        let warning = snapshot.apply(&mut doc, 1).unwrap();
        assert!(matches!(warning, Some(CopyWarning::BackgroundSkipped { .. })));
        assert!(doc.slide(1).unwrap().background().is_none());
    }

    #[test]
    fn test_source_index_out_of_range() {
        let source = DeckBuilder::new().slide(FixtureSlide::text("a")).presentation();
        let mut target = DeckBuilder::new().presentation();
        assert!(matches!(
            copy_slide(&source, 3, &mut target),
            Err(Error::SlideOutOfRange { index: 3, count: 1 })
        ));
        assert_eq!(target.slide_count(), 0);
    }
}
