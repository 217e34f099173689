//! Error types for NetCDF reading.

use covjson::CoverageError;
use thiserror::Error;

/// Result type for NetCDF parser operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF reading.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Requested variable is not in the file
    #[error("Variable not found: {0}")]
    MissingVariable(String),

    /// Missing required dimension or attribute
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Unparseable CF time units or unsupported calendar
    #[error("Invalid time units '{units}': {reason}")]
    InvalidTimeUnits { units: String, reason: String },
}

impl NetCdfError {
    pub fn invalid_time_units(units: &str, reason: impl Into<String>) -> Self {
        Self::InvalidTimeUnits {
            units: units.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<NetCdfError> for CoverageError {
    fn from(err: NetCdfError) -> Self {
        match err {
            NetCdfError::IoError(e) => CoverageError::Io(e),
            NetCdfError::MissingVariable(name) => CoverageError::VariableNotFound(name),
            other => CoverageError::Reader(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_variable_maps_to_not_found() {
        let err: CoverageError = NetCdfError::MissingVariable("SST".to_string()).into();
        assert!(matches!(err, CoverageError::VariableNotFound(name) if name == "SST"));
    }

    #[test]
    fn test_other_errors_map_to_reader() {
        let err: CoverageError = NetCdfError::invalid_time_units("fortnights", "bad unit").into();
        assert!(matches!(err, CoverageError::Reader(msg) if msg.contains("fortnights")));
    }
}
