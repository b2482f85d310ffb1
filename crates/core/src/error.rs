//! Error types for terralux

use thiserror::Error;

/// Main error type for terralux operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unrecognized spectral index: {name}")]
    UnknownSpectralIndex { name: String },

    #[error("Band not found: {name}")]
    BandNotFound { name: String },

    #[error("Duplicate band name: {name}")]
    DuplicateBand { name: String },

    #[error("Grid shape mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    ShapeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Invalid grid dimensions: {rows}x{cols}")]
    InvalidDimensions { rows: usize, cols: usize },

    #[error("Degenerate footprint: {0}")]
    DegenerateFootprint(String),

    #[error("Image has no footprint")]
    MissingFootprint,

    #[error("Dataset does not support the {0} transformation")]
    UnsupportedTransform(&'static str),

    #[error("Cannot compute {0} over an empty image sequence")]
    EmptySequence(&'static str),

    #[error("Date out of range: {0}")]
    DateOutOfRange(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for terralux operations
pub type Result<T> = std::result::Result<T, Error>;
