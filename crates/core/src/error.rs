//! Error types for slide plan building and deck assembly.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building a slide plan or assembling a deck.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open, read or write a file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing or writing error (for PPTX parts).
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// The package is structurally invalid (missing main part, bad relationship, ...).
    #[error("Invalid or corrupted presentation: {0}")]
    CorruptedFile(String),

    /// A part referenced by the package is not present in the archive.
    #[error("Part not found in package: {0}")]
    MissingPart(String),

    /// A slide index outside the presentation's slide sequence.
    #[error("Slide index {index} out of range (presentation has {count} slides)")]
    SlideOutOfRange { index: usize, count: usize },

    /// A relationship id could not be resolved or re-minted.
    #[error("Relationship error: {0}")]
    RelationshipError(String),

    /// A required field is absent from the proposal source.
    #[error("Required field '{field}' not found in {location}")]
    MissingField { field: String, location: String },

    /// A module in the proposal lacks one or more required fields.
    #[error("Required fields missing for module '{module}' (slide {slide}): {}", .fields.join(", "))]
    MissingModuleFields {
        module: String,
        slide: usize,
        fields: Vec<String>,
    },

    /// The project-info record could not be read.
    #[error("Project info error: {0}")]
    ProjectInfoError(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
