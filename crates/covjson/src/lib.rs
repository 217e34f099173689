//! CoverageJSON export for gridded datasets.
//!
//! Reads axes and variables through a [`DatasetReader`], assembles a typed
//! [`CoverageJson`] document and writes it with numeric arrays compacted onto
//! single lines. Ranges can be split into tiles, each written to its own file.
//!
//! # Architecture
//!
//! ```text
//! DatasetReader
//!      │
//!      ▼
//! CoverageBuilder::build(variables)
//!      │
//!      ├─► select_reference_systems(present axes)
//!      │
//!      ├─► Domain (x, y, z?, t?)
//!      │
//!      └─► per variable: Parameter + NdArray | TiledNdArray
//!               │
//!               ▼
//! CoverageWriter::write
//!      │
//!      ├─► tiles (lazy, row-major) ─► one NdArray document each
//!      │
//!      └─► coverage document ─► SelectiveSerializer
//! ```
//!
//! # Example
//!
//! ```
//! use covjson::{AxisName, ArrayValues, CoverageWriter, ExportOptions, MemoryDataset, MemoryVariable};
//!
//! let dataset = MemoryDataset::new()
//!     .with_axis(AxisName::X, vec![0.0, 1.0])
//!     .with_axis(AxisName::Y, vec![0.0])
//!     .with_variable(
//!         "T",
//!         MemoryVariable::new(vec![AxisName::Y, AxisName::X], ArrayValues::Float(vec![Some(1.5), None])),
//!     );
//!
//! let dir = tempfile::tempdir()?;
//! let writer = CoverageWriter::new(ExportOptions::default())?;
//! writer.export(&dataset, &["T"], &dir.path().join("t.covjson"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builder;
pub mod config;
pub mod coverage_json;
pub mod error;
pub mod parameters;
pub mod reader;
pub mod referencing;
pub mod serializer;
pub mod tiling;
pub mod writer;

pub use builder::{Coverage, CoverageBuilder, TileSource};
pub use config::{resolve_template, resolve_tile_path, ExportOptions, TILE_PLACEHOLDER, VARIABLE_PLACEHOLDER};
pub use coverage_json::{
    ArrayValues, Axis, AxisName, AxisSet, AxisValue, CoverageJson, DataType, Domain, NdArray,
    Range, ReferenceSystem, ReferenceSystemConnection, TileSet, TiledNdArray,
};
pub use error::{CoverageError, Result};
pub use parameters::{LocalizedText, ObservedProperty, Parameter, Unit};
pub use reader::{DatasetReader, MemoryDataset, MemoryVariable};
pub use referencing::{select_reference_systems, ReferenceSystemDescriptor};
pub use serializer::{CompactPaths, CompactStyle, JsonTree, PathPattern, SelectiveSerializer};
pub use tiling::{reassemble, tile, tile_count, Tile, TileBound, Tiles};
pub use writer::{CoverageWriter, ExportSummary};
