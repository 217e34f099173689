//! Error types for coverage export.

use thiserror::Error;

use crate::coverage_json::AxisName;

/// Errors that can occur while building or writing a coverage.
///
/// Every variant aborts the current export; nothing is defaulted.
#[derive(Error, Debug)]
pub enum CoverageError {
    /// A requested variable does not exist in the dataset.
    #[error("variable not found: {0}")]
    VariableNotFound(String),

    /// Coordinates or metadata for a present axis could not be read.
    #[error("failed to extract axis '{axis}': {reason}")]
    AxisExtraction { axis: AxisName, reason: String },

    /// Tile shape does not fit the array being tiled.
    #[error("tile shape mismatch: {0}")]
    TileShapeMismatch(String),

    /// A pre-rendered JSON fragment was not valid JSON on its own.
    #[error("serialization integrity error: {0}")]
    SerializationIntegrity(String),

    /// Any other lookup failure reported by the dataset reader.
    #[error("dataset read error: {0}")]
    Reader(String),

    /// Invalid export options.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Output I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoverageError {
    /// Create a VariableNotFound error.
    pub fn variable_not_found(name: impl Into<String>) -> Self {
        Self::VariableNotFound(name.into())
    }

    /// Create an AxisExtraction error.
    pub fn axis_extraction(axis: AxisName, reason: impl Into<String>) -> Self {
        Self::AxisExtraction {
            axis,
            reason: reason.into(),
        }
    }

    /// Create a TileShapeMismatch error.
    pub fn tile_shape_mismatch(msg: impl Into<String>) -> Self {
        Self::TileShapeMismatch(msg.into())
    }

    /// Create a Reader error.
    pub fn reader(msg: impl Into<String>) -> Self {
        Self::Reader(msg.into())
    }
}

/// Result type for coverage operations.
pub type Result<T> = std::result::Result<T, CoverageError>;
