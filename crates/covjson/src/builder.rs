//! Coverage assembly.
//!
//! The builder reads axes and variables from a [`DatasetReader`], picks the
//! reference systems, and produces a [`Coverage`]: the finished document
//! plus, for tiled exports, the sources the writer pulls tiles from.

use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::ExportOptions;
use crate::coverage_json::{
    ArrayValues, AxisName, AxisSet, AxisValue, CoverageJson, DataType, Domain, NdArray, Range,
    TileSet, TiledNdArray,
};
use crate::error::{CoverageError, Result};
use crate::parameters::{Parameter, Unit};
use crate::reader::DatasetReader;
use crate::referencing::{select_reference_systems, ReferenceSystemDescriptor};
use crate::tiling::{self, ValueTiles};

/// Values of one tiled variable, kept until the writer streams its tiles.
#[derive(Debug, Clone)]
pub struct TileSource {
    pub variable: String,
    pub data_type: DataType,
    pub axis_names: Vec<String>,
    pub shape: Vec<usize>,
    pub tile_shape: Vec<usize>,
    pub values: ArrayValues,
}

impl TileSource {
    /// Lazily produce this variable's tiles in row-major order.
    pub fn tiles(&self) -> Result<ValueTiles<'_>> {
        self.values.tiles(&self.shape, &self.tile_shape)
    }

    pub fn tile_count(&self) -> Result<usize> {
        tiling::tile_count(&self.shape, &self.tile_shape)
    }

    /// Standalone `NdArray` range for one tile.
    pub fn tile_range(&self, tile: tiling::Tile<ArrayValues>) -> Range {
        Range::NdArray(NdArray {
            data_type: self.data_type,
            axis_names: self.axis_names.clone(),
            shape: tile.shape(),
            values: tile.values,
        })
    }
}

/// A built coverage.
#[derive(Debug, Clone)]
pub struct Coverage {
    pub document: CoverageJson,
    /// Reference systems in document order.
    pub reference_systems: Vec<ReferenceSystemDescriptor>,
    /// One entry per tiled range, in request order. Empty when untiled.
    pub tile_sources: Vec<TileSource>,
}

impl Coverage {
    pub fn is_tiled(&self) -> bool {
        !self.tile_sources.is_empty()
    }

    pub fn tile_source(&self, variable: &str) -> Option<&TileSource> {
        self.tile_sources.iter().find(|s| s.variable == variable)
    }

    /// Tiles of one tiled variable.
    pub fn tiles(&self, variable: &str) -> Result<ValueTiles<'_>> {
        self.tile_source(variable)
            .ok_or_else(|| CoverageError::variable_not_found(variable))?
            .tiles()
    }
}

/// Builds coverages from a dataset.
pub struct CoverageBuilder<'a, R: DatasetReader + ?Sized> {
    reader: &'a R,
    options: &'a ExportOptions,
}

impl<'a, R: DatasetReader + ?Sized> CoverageBuilder<'a, R> {
    pub fn new(reader: &'a R, options: &'a ExportOptions) -> Self {
        Self { reader, options }
    }

    /// Build a coverage of the given variables, in order.
    ///
    /// All variables must exist and be named once; a missing or repeated
    /// name fails the build before any values are read. Every dimension of
    /// a variable must match the length of its axis in the domain.
    pub fn build<S: AsRef<str>>(&self, variables: &[S]) -> Result<Coverage> {
        let start = Instant::now();

        if variables.is_empty() {
            return Err(CoverageError::InvalidConfig(
                "no variables requested".to_string(),
            ));
        }
        let mut seen = HashSet::with_capacity(variables.len());
        for name in variables {
            let name = name.as_ref();
            if !seen.insert(name) {
                return Err(CoverageError::InvalidConfig(format!(
                    "variable '{}' requested more than once",
                    name
                )));
            }
            if !self.reader.has_variable(name) {
                return Err(CoverageError::variable_not_found(name));
            }
        }
        self.options.validate(variables.len())?;

        let axes = self.reader.present_axes()?;
        let reference_systems = select_reference_systems(&axes);
        debug!(axes = ?axes, referencing = ?reference_systems, "Selected reference systems");

        let domain = self.build_domain(&axes, &reference_systems)?;
        let mut document = CoverageJson::new(domain);
        let mut tile_sources = Vec::new();

        for name in variables {
            let name = name.as_ref();
            let parameter = self.build_parameter(name)?;
            let (range, source) = self.build_range(name, &document.domain)?;
            document = document.with_variable(name, parameter, range);
            tile_sources.extend(source);
        }

        info!(
            variables = variables.len(),
            axes = axes.len(),
            tiled = self.options.tiled,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Built coverage"
        );

        Ok(Coverage {
            document,
            reference_systems,
            tile_sources,
        })
    }

    fn extract_axis(&self, axis: AxisName) -> Result<Vec<AxisValue>> {
        self.reader.coordinates(axis).map_err(|e| match e {
            CoverageError::AxisExtraction { .. } => e,
            other => CoverageError::axis_extraction(axis, other.to_string()),
        })
    }

    fn build_domain(
        &self,
        axes: &AxisSet,
        reference_systems: &[ReferenceSystemDescriptor],
    ) -> Result<Domain> {
        let x = self.extract_axis(AxisName::X)?;
        let y = self.extract_axis(AxisName::Y)?;
        let z = if axes.contains(AxisName::Z) {
            Some(self.extract_axis(AxisName::Z)?)
        } else {
            None
        };
        let t = if axes.contains(AxisName::T) {
            Some(self.extract_axis(AxisName::T)?)
        } else {
            None
        };

        let referencing = reference_systems
            .iter()
            .map(ReferenceSystemDescriptor::to_connection)
            .collect();

        Ok(Domain::grid(x, y, z, t, referencing))
    }

    fn build_parameter(&self, name: &str) -> Result<Parameter> {
        let standard_name = self.reader.standard_name(name)?;
        let units = self.reader.units(name)?;
        let long_name = self.reader.long_name(name)?;

        let mut parameter = Parameter::new(long_name.unwrap_or_else(|| name.to_string()));
        if let Some(std_name) = standard_name {
            parameter = parameter
                .with_description(std_name.clone())
                .with_standard_name(&std_name);
        }
        if let Some(units) = units {
            parameter = parameter.with_unit(Unit::from_symbol(units));
        }
        Ok(parameter)
    }

    fn build_range(&self, name: &str, domain: &Domain) -> Result<(Range, Option<TileSource>)> {
        let data_type = self.reader.data_type(name)?;
        let shape = self.reader.shape(name)?;
        let axis_order = self.reader.axis_order(name)?;

        if axis_order.len() != shape.len() {
            return Err(CoverageError::reader(format!(
                "variable '{}' has {} dimensions but {} axis names",
                name,
                shape.len(),
                axis_order.len()
            )));
        }
        for (axis, &len) in axis_order.iter().zip(&shape) {
            match domain.axis(*axis) {
                None => {
                    return Err(CoverageError::reader(format!(
                        "variable '{}' uses axis '{}' which is not in the domain",
                        name, axis
                    )))
                }
                Some(a) if a.len() != len => {
                    return Err(CoverageError::reader(format!(
                        "variable '{}' has {} values along axis '{}' but the axis has {} coordinates",
                        name,
                        len,
                        axis,
                        a.len()
                    )))
                }
                Some(_) => {}
            }
        }

        let values = self.reader.values(name)?;
        let expected: usize = shape.iter().product();
        if values.len() != expected {
            return Err(CoverageError::reader(format!(
                "variable '{}' has shape {:?} ({} values) but {} values were read",
                name,
                shape,
                expected,
                values.len()
            )));
        }
        if values.data_type() != data_type {
            debug!(
                variable = name,
                declared = %data_type,
                actual = %values.data_type(),
                "Using data type of the values read"
            );
        }
        let data_type = values.data_type();
        let axis_names: Vec<String> = axis_order.iter().map(|a| a.as_str().to_string()).collect();

        if !self.options.tiled {
            debug!(variable = name, shape = ?shape, "Built NdArray range");
            let range = Range::NdArray(NdArray {
                data_type,
                axis_names,
                shape,
                values,
            });
            return Ok((range, None));
        }

        let tile_shape = self.options.tile_shape.clone();
        let count = tiling::tile_count(&shape, &tile_shape)?;
        debug!(
            variable = name,
            shape = ?shape,
            tile_shape = ?tile_shape,
            tiles = count,
            "Built TiledNdArray range"
        );

        let range = Range::TiledNdArray(TiledNdArray {
            data_type,
            axis_names: axis_names.clone(),
            shape: shape.clone(),
            tile_sets: vec![TileSet::new(&shape, &tile_shape, self.options.url_template.clone())],
        });
        let source = TileSource {
            variable: name.to_string(),
            data_type,
            axis_names,
            shape,
            tile_shape,
            values,
        };
        Ok((range, Some(source)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{MemoryDataset, MemoryVariable};
    use crate::referencing::ReferenceSystemDescriptor::*;

    fn grid_2d() -> MemoryDataset {
        MemoryDataset::new()
            .with_axis(AxisName::X, vec![0.0, 1.0, 2.0])
            .with_axis(AxisName::Y, vec![50.0, 51.0])
            .with_variable(
                "ICEC",
                MemoryVariable::new(
                    vec![AxisName::Y, AxisName::X],
                    ArrayValues::Float((0..6).map(|v| Some(v as f64)).collect()),
                )
                .with_standard_name("sea_ice_area_fraction")
                .with_units("1")
                .with_long_name("Sea ice concentration"),
            )
    }

    #[test]
    fn test_untiled_2d() {
        let opts = ExportOptions::default();
        let cov = CoverageBuilder::new(&grid_2d(), &opts).build(&["ICEC"]).unwrap();

        assert_eq!(cov.reference_systems, vec![Spatial2D]);
        assert!(!cov.is_tiled());

        let doc = &cov.document;
        assert_eq!(doc.domain.axes.keys().collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(doc.domain.referencing.len(), 1);

        let range = &doc.ranges["ICEC"];
        assert_eq!(range.type_name(), "NdArray");
        assert_eq!(range.shape(), &[2, 3]);
        assert_eq!(range.axis_names(), &["y".to_string(), "x".to_string()]);

        let param = &doc.parameters["ICEC"];
        assert_eq!(param.observed_property.label.text(), "Sea ice concentration");
        assert_eq!(param.unit.as_ref().and_then(|u| u.symbol.as_deref()), Some("1"));
        assert_eq!(param.description.as_ref().map(|d| d.text()), Some("sea_ice_area_fraction"));
    }

    #[test]
    fn test_missing_variable_fails_first() {
        let ds = grid_2d().with_unreadable_axis(AxisName::Z);
        let opts = ExportOptions::default();
        let err = CoverageBuilder::new(&ds, &opts).build(&["ICEC", "SST"]).unwrap_err();
        assert!(matches!(err, CoverageError::VariableNotFound(v) if v == "SST"));
    }

    #[test]
    fn test_unreadable_axis_fails() {
        let ds = grid_2d().with_unreadable_axis(AxisName::T);
        let opts = ExportOptions::default();
        let err = CoverageBuilder::new(&ds, &opts).build(&["ICEC"]).unwrap_err();
        assert!(matches!(err, CoverageError::AxisExtraction { axis: AxisName::T, .. }));
    }

    #[test]
    fn test_missing_x_axis_fails() {
        let ds = MemoryDataset::new()
            .with_axis(AxisName::Y, vec![0.0])
            .with_variable(
                "V",
                MemoryVariable::new(vec![AxisName::Y], ArrayValues::Integer(vec![Some(1)])),
            );
        let opts = ExportOptions::default();
        let err = CoverageBuilder::new(&ds, &opts).build(&["V"]).unwrap_err();
        assert!(matches!(err, CoverageError::AxisExtraction { axis: AxisName::X, .. }));
    }

    #[test]
    fn test_no_variables_requested() {
        let opts = ExportOptions::default();
        let none: [&str; 0] = [];
        assert!(CoverageBuilder::new(&grid_2d(), &opts).build(&none).is_err());
    }

    #[test]
    fn test_tiled_range_records_tile_set() {
        let opts = ExportOptions::tiled(vec![1, 2]).with_url_template("tiles/{tile}.covjson");
        let cov = CoverageBuilder::new(&grid_2d(), &opts).build(&["ICEC"]).unwrap();

        match &cov.document.ranges["ICEC"] {
            Range::TiledNdArray(tiled) => {
                assert_eq!(tiled.shape, vec![2, 3]);
                assert_eq!(tiled.tile_sets.len(), 1);
                assert_eq!(tiled.tile_sets[0].tile_shape, vec![Some(1), Some(2)]);
                assert_eq!(tiled.tile_sets[0].url_template, "tiles/{tile}.covjson");
            }
            other => panic!("expected TiledNdArray, got {:?}", other),
        }

        assert!(cov.is_tiled());
        assert_eq!(cov.tile_sources.len(), 1);
        let source = &cov.tile_sources[0];
        assert_eq!(source.tile_count().unwrap(), 4);
        let shapes: Vec<_> = source.tiles().unwrap().map(|t| t.shape()).collect();
        assert_eq!(shapes, vec![vec![1, 2], vec![1, 1], vec![1, 2], vec![1, 1]]);
    }

    #[test]
    fn test_tile_rank_mismatch_fails_at_build() {
        let opts = ExportOptions::tiled(vec![1, 1, 1]);
        let err = CoverageBuilder::new(&grid_2d(), &opts).build(&["ICEC"]).unwrap_err();
        assert!(matches!(err, CoverageError::TileShapeMismatch(_)));
    }

    #[test]
    fn test_multiple_variables_keep_request_order() {
        let ds = grid_2d().with_variable(
            "MASK",
            MemoryVariable::new(
                vec![AxisName::Y, AxisName::X],
                ArrayValues::Integer(vec![Some(1); 6]),
            ),
        );
        let opts = ExportOptions::default();
        let cov = CoverageBuilder::new(&ds, &opts).build(&["MASK", "ICEC"]).unwrap();

        let names: Vec<_> = cov.document.ranges.keys().collect();
        assert_eq!(names, vec!["MASK", "ICEC"]);
        let params: Vec<_> = cov.document.parameters.keys().collect();
        assert_eq!(params, vec!["MASK", "ICEC"]);
        assert_eq!(cov.document.ranges["MASK"].data_type(), DataType::Integer);
        // No long name: the variable name labels the property.
        assert_eq!(cov.document.parameters["MASK"].observed_property.label.text(), "MASK");
    }

    #[test]
    fn test_variable_on_unknown_axis_fails() {
        let ds = grid_2d().with_variable(
            "PROFILE",
            MemoryVariable::new(vec![AxisName::Z], ArrayValues::Float(Vec::new())),
        );
        let opts = ExportOptions::default();
        let err = CoverageBuilder::new(&ds, &opts).build(&["PROFILE"]).unwrap_err();
        assert!(matches!(err, CoverageError::Reader(_)));
    }

    #[test]
    fn test_repeated_variable_rejected_before_reading() {
        let ds = grid_2d().with_unreadable_axis(AxisName::T);
        let opts = ExportOptions::tiled(vec![1, 3]);
        let err = CoverageBuilder::new(&ds, &opts).build(&["ICEC", "ICEC"]).unwrap_err();
        assert!(matches!(err, CoverageError::InvalidConfig(msg) if msg.contains("'ICEC'")));
    }

    #[test]
    fn test_dimension_longer_than_axis_fails() {
        let ds = grid_2d().with_variable(
            "WIDE",
            MemoryVariable::new(
                vec![AxisName::Y, AxisName::X],
                ArrayValues::Float(vec![Some(0.0); 8]),
            )
            .with_shape(vec![2, 4]),
        );
        let opts = ExportOptions::default();
        let err = CoverageBuilder::new(&ds, &opts).build(&["WIDE"]).unwrap_err();
        match err {
            CoverageError::Reader(msg) => {
                assert!(msg.contains("axis 'x'"));
                assert!(msg.contains("3 coordinates"));
            }
            other => panic!("expected reader error, got {:?}", other),
        }
    }
}
