//! Presentation document: slide sequence, layouts, masters and media.

use crate::content_types::{self, ContentTypes};
use crate::package::{self, Package, CONTENT_TYPES_PART};
use crate::rels::{reltype, Relationship, Relationships};
use crate::resources::{EmbeddedPart, Resource};
use crate::slide::{placeholder_stub, SlideTree, NS_RELATIONSHIPS};
use crate::xml::XmlElement;
use deck_core::{apply_moves, Error, PendingMove, Result};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Smallest id PowerPoint accepts for a slide in `p:sldIdLst`.
const MIN_SLIDE_ID: u32 = 256;
/// Slide master and layout ids share one space starting here.
const MIN_LAYOUT_ID: u32 = 2_147_483_648;

/// An opened `.pptx` document.
///
/// The main part, its relationships and the content types are kept parsed
/// and written back to the package after every edit; slides, layouts and
/// masters are parsed on demand.
#[derive(Debug, Clone)]
pub struct Presentation {
    package: Package,
    content_types: ContentTypes,
    main_part: String,
    main: XmlElement,
    main_rels: Relationships,
}

impl Presentation {
    /// Open a presentation from disk.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        Self::from_package(Package::read(reader)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    fn from_package(package: Package) -> Result<Self> {
        let content_types = ContentTypes::parse(package.require(CONTENT_TYPES_PART)?)?;

        let root_rels = Relationships::parse(package.require("_rels/.rels")?)?;
        let main_target = &root_rels.first_of_type(reltype::OFFICE_DOCUMENT)?.target;
        let main_part = package::resolve_target("", main_target);

        let main = XmlElement::parse(package.require(&main_part)?)?;
        if !main.is("presentation") {
            return Err(Error::CorruptedFile(format!(
                "'{}' is not a presentation part",
                main_part
            )));
        }

        let main_rels = match package.get(&package::rels_part_name(&main_part)) {
            Some(bytes) => Relationships::parse(bytes)?,
            None => Relationships::new(),
        };

        Ok(Self {
            package,
            content_types,
            main_part,
            main,
            main_rels,
        })
    }

    /// Serialize the whole package.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.package.to_bytes()
    }

    /// Write the presentation to `path` through a scratch file in the same
    /// directory, so `path` is replaced only once the archive is complete.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        let mut scratch = NamedTempFile::new_in(dir)?;
        scratch.write_all(&self.to_bytes()?)?;
        scratch.flush()?;
        scratch.persist(path).map_err(|e| Error::IoError(e.error))?;

        log::debug!("Saved presentation to {}", path.display());
        Ok(())
    }

    pub fn main_part(&self) -> &str {
        &self.main_part
    }

    pub fn content_types(&self) -> &ContentTypes {
        &self.content_types
    }

    // ---- slides -----------------------------------------------------------

    pub fn slide_count(&self) -> usize {
        self.main
            .child("sldIdLst")
            .map(|list| list.elements().filter(|e| e.is("sldId")).count())
            .unwrap_or(0)
    }

    /// Part names of all slides in presentation order.
    pub fn slide_parts(&self) -> Result<Vec<String>> {
        let Some(list) = self.main.child("sldIdLst") else {
            return Ok(Vec::new());
        };
        list.elements()
            .filter(|e| e.is("sldId"))
            .map(|entry| self.resolve_main_reference(entry))
            .collect()
    }

    /// Part name of the slide at `index`.
    pub fn slide_part(&self, index: usize) -> Result<String> {
        let count = self.slide_count();
        let entry = self
            .main
            .child("sldIdLst")
            .and_then(|list| list.elements().filter(|e| e.is("sldId")).nth(index))
            .ok_or(Error::SlideOutOfRange { index, count })?;
        self.resolve_main_reference(entry)
    }

    pub fn slide(&self, index: usize) -> Result<SlideTree> {
        self.tree(&self.slide_part(index)?)
    }

    pub fn set_slide(&mut self, index: usize, tree: &SlideTree) -> Result<()> {
        let part = self.slide_part(index)?;
        self.set_tree(&part, tree)
    }

    /// Text of every non-empty shape on a slide.
    pub fn slide_texts(&self, index: usize) -> Result<Vec<String>> {
        Ok(self.slide(index)?.texts())
    }

    /// Append an empty slide based on `layout_part`, returning its index.
    ///
    /// The slide gets one empty placeholder per placeholder of the layout,
    /// like PowerPoint's "New Slide".
    pub fn add_slide(&mut self, layout_part: &str) -> Result<usize> {
        let layout = self.tree(layout_part)?;
        let next_id = match self
            .main
            .child("sldIdLst")
            .into_iter()
            .flat_map(|list| list.elements())
            .filter_map(|e| e.attr("id").and_then(|id| id.parse::<u32>().ok()))
            .max()
        {
            Some(max) => max
                .checked_add(1)
                .ok_or_else(|| Error::CorruptedFile("Slide id space exhausted".to_string()))?
                .max(MIN_SLIDE_ID),
            None => MIN_SLIDE_ID,
        };
        let part = self.package.next_part_name("ppt/slides/slide", "xml");

        let mut tree = SlideTree::empty_slide();
        for stub in layout.placeholders().filter_map(placeholder_stub) {
            tree.push_shape(stub)?;
        }
        self.set_tree(&part, &tree)?;

        let mut rels = Relationships::new();
        rels.get_or_add(reltype::SLIDE_LAYOUT, &package::relative_target(&part, layout_part));
        self.set_relationships(&part, &rels)?;

        self.content_types.set_override(&part, content_types::SLIDE);
        self.store_content_types()?;

        let rel_id = self.main_rels.get_or_add(
            reltype::SLIDE,
            &package::relative_target(&self.main_part, &part),
        );

        let rel_key = self.main_rel_key();
        let entry = XmlElement::new(self.main_name("sldId"))
            .with_attr("id", next_id.to_string())
            .with_attr(&rel_key, rel_id);
        self.slide_list_mut()?.push(entry);
        self.store_main()?;

        log::debug!("Added slide {} using {}", part, layout_part);
        Ok(self.slide_count() - 1)
    }

    /// Remove the slide at `index` together with its part and relationships.
    pub fn remove_slide(&mut self, index: usize) -> Result<()> {
        let part = self.slide_part(index)?;
        let rel_key = self.main_rel_key();

        let list = self.slide_list_mut()?;
        let mut position = 0;
        let removed = list.take_children_where(|e| {
            let hit = e.is("sldId") && position == index;
            if e.is("sldId") {
                position += 1;
            }
            hit
        });
        if let Some(rel_id) = removed.first().and_then(|e| e.attr(&rel_key)) {
            self.main_rels.remove(rel_id);
        }

        self.package.remove(&part);
        self.package.remove(&package::rels_part_name(&part));
        self.content_types.remove_override(&part);
        self.store_content_types()?;
        self.store_main()
    }

    /// Reorder the slide sequence; returns how many moves were applied.
    pub fn move_slides(&mut self, moves: &[PendingMove]) -> Result<usize> {
        if moves.is_empty() {
            return Ok(0);
        }
        let list = self.slide_list_mut()?;
        let mut entries = list.take_children_where(|e| e.is("sldId"));
        let applied = apply_moves(&mut entries, moves);
        for entry in entries {
            list.insert_before(entry, "extLst");
        }
        self.store_main()?;
        Ok(applied)
    }

    // ---- layouts and masters ----------------------------------------------

    /// Slide master part names in `p:sldMasterIdLst` order.
    pub fn masters(&self) -> Result<Vec<String>> {
        let Some(list) = self.main.child("sldMasterIdLst") else {
            return Ok(Vec::new());
        };
        list.elements()
            .filter(|e| e.is("sldMasterId"))
            .map(|entry| self.resolve_main_reference(entry))
            .collect()
    }

    /// All layout part names, master by master in layout-list order.
    pub fn layouts(&self) -> Result<Vec<String>> {
        let mut layouts = Vec::new();
        for master in self.masters()? {
            let root = XmlElement::parse(self.part(&master)?)?;
            let rels = self.relationships(&master)?;
            let keys = rel_keys(&root);

            for entry in root
                .child("sldLayoutIdLst")
                .into_iter()
                .flat_map(|list| list.elements())
            {
                let rel = keys
                    .iter()
                    .find_map(|k| entry.attr(k))
                    .and_then(|id| rels.get(id));
                if let Some(rel) = rel {
                    layouts.push(package::resolve_target(&master, &rel.target));
                }
            }
        }
        Ok(layouts)
    }

    /// The layout a slide (given by part name) is based on.
    pub fn layout_of(&self, slide_part: &str) -> Result<String> {
        let rels = self.relationships(slide_part)?;
        let rel = rels.first_of_type(reltype::SLIDE_LAYOUT)?;
        Ok(package::resolve_target(slide_part, &rel.target))
    }

    /// The master a layout is based on.
    pub fn master_of(&self, layout_part: &str) -> Result<String> {
        let rels = self.relationships(layout_part)?;
        let rel = rels.first_of_type(reltype::SLIDE_MASTER)?;
        Ok(package::resolve_target(layout_part, &rel.target))
    }

    pub fn layout_name(&self, layout_part: &str) -> Result<Option<String>> {
        Ok(self.tree(layout_part)?.name().map(str::to_string))
    }

    /// First layout whose `cSld@name` is `name`.
    pub fn find_layout_by_name(&self, name: &str) -> Result<Option<String>> {
        for layout in self.layouts()? {
            if self.layout_name(&layout)?.as_deref() == Some(name) {
                return Ok(Some(layout));
            }
        }
        Ok(None)
    }

    /// Register a new layout part under the first slide master.
    ///
    /// `rels` carries the layout's already remapped resource relationships;
    /// the master relationship is added here.
    pub fn add_layout(&mut self, part: &str, tree: &SlideTree, mut rels: Relationships) -> Result<()> {
        let master = self
            .masters()?
            .into_iter()
            .next()
            .ok_or_else(|| Error::CorruptedFile("Presentation has no slide master".to_string()))?;

        rels.get_or_add(reltype::SLIDE_MASTER, &package::relative_target(part, &master));
        self.set_tree(part, tree)?;
        self.set_relationships(part, &rels)?;

        let mut master_rels = self.relationships(&master)?;
        let rel_id = master_rels.get_or_add(reltype::SLIDE_LAYOUT, &package::relative_target(&master, part));
        self.set_relationships(&master, &master_rels)?;

        let layout_id = self.next_layout_id()?;
        let mut root = XmlElement::parse(self.part(&master)?)?;
        let rel_key = rel_keys(&root).remove(0);
        let entry = XmlElement::new(qualified(&root, "sldLayoutId"))
            .with_attr("id", layout_id.to_string())
            .with_attr(&rel_key, rel_id);

        match root.child_mut("sldLayoutIdLst") {
            Some(list) => list.push(entry),
            None => {
                let list = XmlElement::new(qualified(&root, "sldLayoutIdLst")).with_child(entry);
                insert_before_any(&mut root, list, &["transition", "timing", "hf", "txStyles", "extLst"]);
            }
        }
        self.package.insert(master.clone(), root.to_bytes()?);

        self.content_types.set_override(part, content_types::SLIDE_LAYOUT);
        self.store_content_types()?;

        log::debug!("Registered layout {} under {}", part, master);
        Ok(())
    }

    /// A fresh layout part name.
    pub fn next_layout_part(&self) -> String {
        self.package.next_part_name("ppt/slideLayouts/slideLayout", "xml")
    }

    fn next_layout_id(&self) -> Result<u32> {
        let mut max = MIN_LAYOUT_ID - 1;
        let mut consider = |el: &XmlElement| {
            if let Some(id) = el.attr("id").and_then(|id| id.parse::<u32>().ok()) {
                max = max.max(id);
            }
        };

        for entry in self.main.child("sldMasterIdLst").into_iter().flat_map(|l| l.elements()) {
            consider(entry);
        }
        for master in self.masters()? {
            let root = XmlElement::parse(self.part(&master)?)?;
            for entry in root.child("sldLayoutIdLst").into_iter().flat_map(|l| l.elements()) {
                consider(entry);
            }
        }

        max.checked_add(1)
            .ok_or_else(|| Error::CorruptedFile("Layout id space exhausted".to_string()))
    }

    /// The background a slide shows: its own, else its layout's, else its
    /// master's. Returns the part the background was found in.
    pub fn effective_background(&self, index: usize) -> Result<Option<(String, XmlElement)>> {
        let slide_part = self.slide_part(index)?;
        let mut candidates = vec![slide_part.clone()];
        if let Ok(layout) = self.layout_of(&slide_part) {
            let master = self.master_of(&layout).ok();
            candidates.push(layout);
            candidates.extend(master);
        }

        for part in candidates {
            if let Some(bg) = self.tree(&part)?.background() {
                return Ok(Some((part, bg.clone())));
            }
        }
        Ok(None)
    }

    // ---- parts ------------------------------------------------------------

    pub fn part(&self, name: &str) -> Result<&[u8]> {
        self.package.require(name)
    }

    pub fn tree(&self, part: &str) -> Result<SlideTree> {
        SlideTree::parse(self.part(part)?)
    }

    pub fn set_tree(&mut self, part: &str, tree: &SlideTree) -> Result<()> {
        self.package.insert(part, tree.to_bytes()?);
        Ok(())
    }

    /// Relationships of a part; empty when it has none.
    pub fn relationships(&self, part: &str) -> Result<Relationships> {
        match self.package.get(&package::rels_part_name(part)) {
            Some(bytes) => Relationships::parse(bytes),
            None => Ok(Relationships::new()),
        }
    }

    pub fn set_relationships(&mut self, part: &str, rels: &Relationships) -> Result<()> {
        if part == self.main_part {
            self.main_rels = rels.clone();
        }
        self.package.insert(package::rels_part_name(part), rels.to_bytes()?);
        Ok(())
    }

    /// Content type of a part as declared by `[Content_Types].xml`.
    pub fn content_type(&self, part: &str) -> Option<&str> {
        self.content_types.content_type(part)
    }

    /// Store a media part, reusing an existing part with identical bytes.
    pub fn import_media(&mut self, bytes: &[u8], ext: &str, content_type: &str) -> Result<String> {
        let existing = self
            .package
            .parts_under("ppt/media/")
            .find(|(name, data)| package::extension(name) == ext && *data == bytes)
            .map(|(name, _)| name.to_string());
        if let Some(name) = existing {
            return Ok(name);
        }

        let stem = if content_type.starts_with("image/") {
            "ppt/media/image"
        } else {
            "ppt/media/media"
        };
        let part = self.package.next_part_name(stem, ext);
        self.package.insert(part.clone(), bytes.to_vec());
        self.content_types.ensure(&part, content_type);
        self.store_content_types()?;

        log::debug!("Imported {} ({} bytes)", part, bytes.len());
        Ok(part)
    }

    /// Store a copy of a part that has relationships of its own (a chart and
    /// its workbook, diagram data, an OLE object). The copy gets a fresh
    /// name next to the source's; its relationships keep their ids, with
    /// every target imported in turn.
    pub fn import_embedded(&mut self, embedded: &EmbeddedPart) -> Result<String> {
        let (base, ext) = match package::extension(&embedded.name) {
            ext if ext.is_empty() => (embedded.name.as_str(), "bin".to_string()),
            ext => {
                let base = embedded
                    .name
                    .rsplit_once('.')
                    .map_or(embedded.name.as_str(), |(base, _)| base);
                (base, ext)
            }
        };
        let stem = base.trim_end_matches(|c: char| c.is_ascii_digit());
        let part = self.package.next_part_name(stem, &ext);
        self.package.insert(part.clone(), embedded.bytes.clone());
        if ext == "xml" {
            self.content_types.set_override(&part, &embedded.content_type);
        } else {
            self.content_types.ensure(&part, &embedded.content_type);
        }
        self.store_content_types()?;

        let mut rels = Relationships::new();
        for (rel, resource) in &embedded.relationships {
            let (target, external) = match resource {
                Resource::External { url } => (url.clone(), true),
                Resource::Part {
                    bytes,
                    extension,
                    content_type,
                } => {
                    let media = self.import_media(bytes, extension, content_type)?;
                    (package::relative_target(&part, &media), false)
                }
                Resource::Embedded(inner) => {
                    let copied = self.import_embedded(inner)?;
                    (package::relative_target(&part, &copied), false)
                }
            };
            rels.insert(Relationship {
                id: rel.id.clone(),
                reltype: rel.reltype.clone(),
                target,
                external,
            });
        }
        if !rels.is_empty() {
            self.set_relationships(&part, &rels)?;
        }

        log::debug!("Imported {} as {}", embedded.name, part);
        Ok(part)
    }

    // ---- main part helpers ------------------------------------------------

    fn resolve_main_reference(&self, entry: &XmlElement) -> Result<String> {
        let keys = rel_keys(&self.main);
        let id = keys
            .iter()
            .find_map(|k| entry.attr(k))
            .ok_or_else(|| Error::CorruptedFile(format!("<{}> has no relationship id", entry.name)))?;
        let rel = self.main_rels.get(id).ok_or_else(|| {
            Error::RelationshipError(format!("'{}' not found in {}", id, self.main_part))
        })?;
        Ok(package::resolve_target(&self.main_part, &rel.target))
    }

    fn main_rel_key(&self) -> String {
        rel_keys(&self.main).remove(0)
    }

    fn main_name(&self, local: &str) -> String {
        qualified(&self.main, local)
    }

    fn slide_list_mut(&mut self) -> Result<&mut XmlElement> {
        if self.main.child("sldIdLst").is_none() {
            let list = XmlElement::new(self.main_name("sldIdLst"));
            insert_before_any(&mut self.main, list, &["sldSz", "notesSz", "extLst"]);
        }
        self.main
            .child_mut("sldIdLst")
            .ok_or_else(|| Error::CorruptedFile("Slide list missing".to_string()))
    }

    fn store_main(&mut self) -> Result<()> {
        self.package.insert(self.main_part.clone(), self.main.to_bytes()?);
        self.package.insert(
            package::rels_part_name(&self.main_part),
            self.main_rels.to_bytes()?,
        );
        Ok(())
    }

    fn store_content_types(&mut self) -> Result<()> {
        self.package.insert(CONTENT_TYPES_PART, self.content_types.to_bytes()?);
        Ok(())
    }
}

/// `prefix:id` attribute names that hold relationship ids on `root`'s document.
fn rel_keys(root: &XmlElement) -> Vec<String> {
    let mut prefixes = root.prefixes_for(NS_RELATIONSHIPS);
    if prefixes.is_empty() {
        prefixes.push("r".to_string());
    }
    prefixes.into_iter().map(|p| format!("{}:id", p)).collect()
}

/// `local` qualified with the prefix of `root`'s own name.
fn qualified(root: &XmlElement, local: &str) -> String {
    match root.name.split_once(':') {
        Some((prefix, _)) => format!("{}:{}", prefix, local),
        None => local.to_string(),
    }
}

fn insert_before_any(parent: &mut XmlElement, child: XmlElement, before: &[&str]) {
    match before.iter().find(|name| parent.child(name).is_some()) {
        Some(name) => parent.insert_before(child, name),
        None => parent.push(child),
    }
}
