//! Insertion policy constants for deck assembly.
//!
//! Which reference slides are inserted, and where, is data: the deployment
//! category table and the fixed sub-ranges of the general reference deck.

use crate::deployment::DeploymentMethod;
use std::ops::Range;

/// File name of the architecture-deployment reference deck.
pub const ARCHITECTURE_DECK_FILE: &str = "System_architecture.pptx";

/// File names tried, in order, for the general reference deck.
pub const GENERAL_DECK_FILES: &[&str] = &["AvailableSlide11.pptx", "Available _Slide.pptx"];

/// Deployment category → slide index (0-based) in the architecture deck.
///
/// `None` marks categories that intentionally have no template slide.
const ARCHITECTURE_SLIDES: &[(&str, Option<usize>)] = &[
    ("cloud", Some(1)),
    ("on-premise", Some(2)),
    ("on-prem", Some(2)),
    ("hybrid", Some(3)),
    ("hybrid-training-on-prem", Some(4)),
    ("hybrid-training-onprem", Some(4)),
    ("4g-vpn-bridge", None),
    ("vimov", None),
];

/// Outcome of looking a deployment method up in the architecture table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateLookup {
    /// The category has a template slide at this index.
    Slide(usize),
    /// The category is known but has no template slide.
    NoTemplate,
    /// The key is not in the table at all.
    Unknown,
}

/// Lookup table from deployment category key to architecture slide index.
#[derive(Debug, Clone, Copy)]
pub struct ArchitectureTable {
    entries: &'static [(&'static str, Option<usize>)],
}

impl ArchitectureTable {
    /// Look up a normalized deployment method.
    pub fn lookup(&self, method: &DeploymentMethod) -> TemplateLookup {
        self.lookup_key(method.key())
    }

    /// Look up a raw table key.
    pub fn lookup_key(&self, key: &str) -> TemplateLookup {
        match self.entries.iter().find(|(k, _)| *k == key) {
            Some((_, Some(index))) => TemplateLookup::Slide(*index),
            Some((_, None)) => TemplateLookup::NoTemplate,
            None => TemplateLookup::Unknown,
        }
    }
}

impl Default for ArchitectureTable {
    fn default() -> Self {
        Self {
            entries: ARCHITECTURE_SLIDES,
        }
    }
}

/// A contiguous block of slides taken from the general reference deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceBlock {
    /// 0-based, half-open range of source slide indices.
    pub slides: Range<usize>,
}

impl ReferenceBlock {
    /// Minimum number of slides the source deck needs for this block.
    ///
    /// A block is inserted whole or not at all.
    pub fn required_slides(&self) -> usize {
        self.slides.end
    }

    /// Whether a deck with `slide_count` slides can supply the whole block.
    pub fn is_available(&self, slide_count: usize) -> bool {
        slide_count >= self.required_slides()
    }

    /// Number of slides in the block.
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    /// Whether the block is empty.
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }
}

/// The complete insertion policy used by the deck assembler.
#[derive(Debug, Clone)]
pub struct InsertionPolicy {
    /// Deployment category → architecture template slide.
    pub architecture_table: ArchitectureTable,
    /// Case-insensitive text that identifies the architecture diagram slide.
    pub architecture_keyword: &'static str,
    /// Anchor index used when no slide mentions the keyword.
    pub default_architecture_anchor: usize,
    /// Block inserted right after the first generated slide.
    pub early_block: ReferenceBlock,
    /// Block appended after all other slides, restyled with the deck's background.
    pub late_block: ReferenceBlock,
}

impl Default for InsertionPolicy {
    fn default() -> Self {
        Self {
            architecture_table: ArchitectureTable::default(),
            architecture_keyword: "architecture",
            // The generated template places the architecture slide 4th.
            default_architecture_anchor: 3,
            early_block: ReferenceBlock { slides: 1..10 },
            late_block: ReferenceBlock { slides: 10..25 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_lookups() {
        let table = ArchitectureTable::default();

        assert_eq!(table.lookup_key("cloud"), TemplateLookup::Slide(1));
        assert_eq!(table.lookup_key("on-premise"), TemplateLookup::Slide(2));
        assert_eq!(table.lookup_key("on-prem"), TemplateLookup::Slide(2));
        assert_eq!(table.lookup_key("hybrid"), TemplateLookup::Slide(3));
        assert_eq!(
            table.lookup_key("hybrid-training-on-prem"),
            TemplateLookup::Slide(4)
        );
        assert_eq!(
            table.lookup_key("hybrid-training-onprem"),
            TemplateLookup::Slide(4)
        );
        assert_eq!(table.lookup_key("4g-vpn-bridge"), TemplateLookup::NoTemplate);
        assert_eq!(table.lookup_key("vimov"), TemplateLookup::NoTemplate);
        assert_eq!(table.lookup_key("lorawan mesh"), TemplateLookup::Unknown);
    }

    #[test]
    fn test_normalized_methods_resolve() {
        let table = ArchitectureTable::default();

        let hybrid = DeploymentMethod::normalize("Hybrid (Training On-Prem)").unwrap();
        assert_eq!(table.lookup(&hybrid), TemplateLookup::Slide(4));

        let cloud = DeploymentMethod::normalize("Fully Managed Cloud").unwrap();
        assert_eq!(table.lookup(&cloud), TemplateLookup::Slide(1));

        let mesh = DeploymentMethod::normalize("LoRaWAN Mesh").unwrap();
        assert_eq!(table.lookup(&mesh), TemplateLookup::Unknown);
    }

    #[test]
    fn test_default_blocks() {
        let policy = InsertionPolicy::default();

        assert_eq!(policy.early_block.len(), 9);
        assert_eq!(policy.early_block.required_slides(), 10);
        assert!(!policy.early_block.is_available(9));
        assert!(policy.early_block.is_available(10));

        assert_eq!(policy.late_block.len(), 15);
        assert_eq!(policy.late_block.required_slides(), 25);
        assert!(!policy.late_block.is_available(24));
        assert!(policy.late_block.is_available(25));
    }
}
