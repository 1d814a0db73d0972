//! ZIP package I/O and part-name arithmetic.
//!
//! Part names are stored the way they appear in the archive, without a
//! leading slash (`ppt/slides/slide1.xml`).

use deck_core::{Error, Result};
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Seek, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Name of the content types part.
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// Raw parts of an OOXML package.
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: BTreeMap<String, Vec<u8>>,
}

impl Package {
    /// Read every file entry of a ZIP archive.
    pub fn read<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut parts = BTreeMap::new();
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| Error::ZipError(format!("Failed to read entry {}: {}", i, e)))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().trim_start_matches('/').to_string();
            let mut bytes = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut bytes)
                .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", name, e)))?;
            parts.insert(name, bytes);
        }

        Ok(Self { parts })
    }

    /// Write all parts to a ZIP archive, content types first.
    pub fn write<W: Write + Seek>(&self, writer: W) -> Result<W> {
        let mut zip = ZipWriter::new(writer);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        let ordered = self
            .parts
            .get_key_value(CONTENT_TYPES_PART)
            .into_iter()
            .chain(self.parts.iter().filter(|(name, _)| name.as_str() != CONTENT_TYPES_PART));

        for (name, bytes) in ordered {
            zip.start_file(name.as_str(), options)
                .map_err(|e| Error::ZipError(format!("Failed to start '{}': {}", name, e)))?;
            zip.write_all(bytes)?;
        }

        zip.finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish archive: {}", e)))
    }

    /// Serialize the package into an in-memory archive.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.write(Cursor::new(Vec::new()))?.into_inner())
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.parts.get(name).map(|b| b.as_slice())
    }

    /// Part bytes, or `MissingPart`.
    pub fn require(&self, name: &str) -> Result<&[u8]> {
        self.get(name)
            .ok_or_else(|| Error::MissingPart(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parts.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.parts.insert(name.into(), bytes);
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<u8>> {
        self.parts.remove(name)
    }

    /// Part names in archive order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(|k| k.as_str())
    }

    /// Parts whose name starts with `prefix`.
    pub fn parts_under<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a [u8])> {
        self.parts
            .iter()
            .filter(move |(name, _)| name.starts_with(prefix))
            .map(|(name, bytes)| (name.as_str(), bytes.as_slice()))
    }

    /// First unused numbered part name, e.g. `ppt/slides/slide7.xml` for
    /// `("ppt/slides/slide", "xml")`.
    pub fn next_part_name(&self, stem: &str, ext: &str) -> String {
        let used = self
            .parts
            .keys()
            .filter_map(|name| name.strip_prefix(stem))
            .filter_map(|rest| rest.strip_suffix(ext).and_then(|n| n.strip_suffix('.')))
            .filter_map(|n| n.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        format!("{}{}.{}", stem, used + 1, ext)
    }
}

/// Name of the relationships part belonging to `part`.
///
/// `ppt/slides/slide1.xml` → `ppt/slides/_rels/slide1.xml.rels`
pub fn rels_part_name(part: &str) -> String {
    let (dir, file) = split_part(part);
    if dir.is_empty() {
        format!("_rels/{}.rels", file)
    } else {
        format!("{}/_rels/{}.rels", dir, file)
    }
}

/// Resolve a relationship target against the part that owns the relationship.
///
/// `("ppt/slides/slide1.xml", "../media/image1.png")` → `ppt/media/image1.png`
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return normalize(absolute);
    }
    let (dir, _) = split_part(source_part);
    if dir.is_empty() {
        normalize(target)
    } else {
        normalize(&format!("{}/{}", dir, target))
    }
}

/// Relative reference from `from_part`'s directory to `to_part`.
///
/// `("ppt/slides/slide1.xml", "ppt/media/image1.png")` → `../media/image1.png`
pub fn relative_target(from_part: &str, to_part: &str) -> String {
    let (from_dir, _) = split_part(from_part);
    let from: Vec<&str> = from_dir.split('/').filter(|s| !s.is_empty()).collect();
    let to: Vec<&str> = to_part.split('/').filter(|s| !s.is_empty()).collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count()
        .min(to.len().saturating_sub(1));

    let mut segments: Vec<&str> = std::iter::repeat("..").take(from.len() - common).collect();
    segments.extend(&to[common..]);
    segments.join("/")
}

/// File extension of a part name, lowercased.
pub fn extension(part: &str) -> String {
    let (_, file) = split_part(part);
    file.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

fn split_part(part: &str) -> (&str, &str) {
    match part.rfind('/') {
        Some(pos) => (&part[..pos], &part[pos + 1..]),
        None => ("", part),
    }
}

fn normalize(path: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            s => out.push(s),
        }
    }
    out.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rels_part_name() {
        assert_eq!(
            rels_part_name("ppt/slides/slide1.xml"),
            "ppt/slides/_rels/slide1.xml.rels"
        );
        assert_eq!(
            rels_part_name("ppt/presentation.xml"),
            "ppt/_rels/presentation.xml.rels"
        );
        assert_eq!(rels_part_name(""), "_rels/.rels");
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(
            resolve_target("ppt/slides/slide1.xml", "../media/image1.png"),
            "ppt/media/image1.png"
        );
        assert_eq!(
            resolve_target("ppt/presentation.xml", "slides/slide2.xml"),
            "ppt/slides/slide2.xml"
        );
        assert_eq!(
            resolve_target("ppt/slides/slide1.xml", "/ppt/media/image3.jpeg"),
            "ppt/media/image3.jpeg"
        );
        assert_eq!(resolve_target("", "ppt/presentation.xml"), "ppt/presentation.xml");
    }

    #[test]
    fn test_relative_target() {
        assert_eq!(
            relative_target("ppt/slides/slide1.xml", "ppt/media/image1.png"),
            "../media/image1.png"
        );
        assert_eq!(
            relative_target("ppt/presentation.xml", "ppt/slides/slide2.xml"),
            "slides/slide2.xml"
        );
        assert_eq!(
            relative_target("ppt/slideLayouts/slideLayout3.xml", "ppt/slideLayouts/slideLayout1.xml"),
            "slideLayout1.xml"
        );
    }

    #[test]
    fn test_relative_and_resolve_agree() {
        let from = "ppt/slideLayouts/slideLayout2.xml";
        let to = "ppt/slideMasters/slideMaster1.xml";
        assert_eq!(resolve_target(from, &relative_target(from, to)), to);
    }

    #[test]
    fn test_next_part_name() {
        let mut package = Package::default();
        assert_eq!(package.next_part_name("ppt/slides/slide", "xml"), "ppt/slides/slide1.xml");

        package.insert("ppt/slides/slide1.xml", Vec::new());
        package.insert("ppt/slides/slide4.xml", Vec::new());
        package.insert("ppt/slides/_rels/slide4.xml.rels", Vec::new());
        assert_eq!(package.next_part_name("ppt/slides/slide", "xml"), "ppt/slides/slide5.xml");
        assert_eq!(package.next_part_name("ppt/media/image", "png"), "ppt/media/image1.png");
    }

    #[test]
    fn test_zip_round_trip_puts_content_types_first() {
        let mut package = Package::default();
        package.insert("ppt/presentation.xml", b"<p/>".to_vec());
        package.insert(CONTENT_TYPES_PART, b"<Types/>".to_vec());

        let bytes = package.to_bytes().unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes.clone())).unwrap();
        assert_eq!(archive.by_index(0).unwrap().name(), CONTENT_TYPES_PART);

        let back = Package::read(Cursor::new(bytes)).unwrap();
        assert_eq!(back.get("ppt/presentation.xml"), Some(&b"<p/>"[..]));
        assert!(back.contains(CONTENT_TYPES_PART));
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("ppt/media/image1.PNG"), "png");
        assert_eq!(extension("ppt/media/noext"), "");
    }
}
