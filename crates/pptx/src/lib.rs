//! PPTX (Office Open XML) deck assembly.
//!
//! Opens .pptx files (ZIP archives of XML parts), copies slides between
//! presentations with their images, media and backgrounds, and inserts
//! reference slides into a generated deck.

pub mod assembler;
pub mod content_types;
pub mod copier;
pub mod package;
pub mod presentation;
pub mod rels;
pub mod resources;
pub mod slide;
pub mod xml;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use assembler::{AssemblyReport, DeckAssembler, ReferenceDecks, SkipReason, StepOutcome};
pub use copier::{copy_slide, BackgroundSnapshot, CopiedSlide, CopyWarning};
pub use presentation::Presentation;
pub use resources::{RelationshipRemapper, ResourceTable};
pub use slide::SlideTree;
