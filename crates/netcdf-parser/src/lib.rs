//! NetCDF reader for CoverageJSON export.
//!
//! This crate reads CF-convention NetCDF files and exposes them through
//! [`covjson::DatasetReader`].
//!
//! # Implementation Notes
//!
//! File access needs libnetcdf and libhdf5 on the host and is behind the
//! `native` feature. The CF helpers ([`axes`], [`time`]) are pure Rust and
//! always available.
//!
//! # CF conventions handled
//!
//! - Axis discovery from the `axis`, `standard_name`, `units` and `positive`
//!   attributes, falling back to conventional names (`lon`, `lat`, `depth`,
//!   `time`, ...)
//! - `_FillValue` and `missing_value` become missing values
//! - `scale_factor` and `add_offset` are applied
//! - `"<unit> since <epoch>"` time coordinates decode to ISO-8601 UTC

pub mod axes;
pub mod error;
pub mod time;

#[cfg(feature = "native")]
pub mod native;

pub use axes::{classify, CoordinateHints};
pub use error::{NetCdfError, NetCdfResult};
pub use time::{CfTimeUnits, TimeUnit};

#[cfg(feature = "native")]
pub use native::{silence_hdf5_errors, NetCdfDataset};
