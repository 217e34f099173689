//! NetCDF file reading using the netcdf library.
//!
//! [`NetCdfDataset`] exposes a CF-convention NetCDF file through the
//! [`DatasetReader`] trait. Coordinate axes are discovered once at open time;
//! variable values are read on demand.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Once;

use covjson::{ArrayValues, AxisName, AxisSet, AxisValue, CoverageError, DataType, DatasetReader};
use tracing::{debug, warn};

use crate::axes::{classify, CoordinateHints};
use crate::error::{NetCdfError, NetCdfResult};
use crate::time::CfTimeUnits;

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when errors
/// are handled gracefully by the Rust code (e.g., when checking for optional
/// attributes that don't exist). This creates confusing log spam like:
///
/// ```text
/// HDF5-DIAG: Error detected in HDF5 (1.10.8) thread 3:
///   #003: ../../../src/H5Adense.c line 397 in H5A__dense_open(): can't locate attribute in name index
/// ```
///
/// It only needs to be called once per process, but is safe to call multiple
/// times. [`NetCdfDataset::open`] calls it before touching the file.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// A coordinate variable and the dimension it indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CoordinateVariable {
    variable: String,
    dimension: String,
}

/// An open NetCDF file.
pub struct NetCdfDataset {
    file: netcdf::File,
    path: PathBuf,
    axes: BTreeMap<AxisName, CoordinateVariable>,
    /// Values decoded by the last `data_type` call, handed to `values`.
    decoded: RefCell<Option<(String, ArrayValues)>>,
}

impl std::fmt::Debug for NetCdfDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetCdfDataset")
            .field("path", &self.path)
            .field("axes", &self.axes)
            .finish()
    }
}

impl NetCdfDataset {
    /// Open a file and discover its coordinate axes.
    pub fn open<P: AsRef<Path>>(path: P) -> NetCdfResult<Self> {
        silence_hdf5_errors();

        let path = path.as_ref().to_path_buf();
        let file = netcdf::open(&path)
            .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to open NetCDF: {}", e)))?;

        let dataset = Self {
            axes: discover_axes(&file),
            file,
            path,
            decoded: RefCell::new(None),
        };
        debug!(
            path = %dataset.path.display(),
            axes = ?dataset.coordinate_variables().collect::<Vec<_>>(),
            "Opened NetCDF file"
        );
        Ok(dataset)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of the coordinate variables backing each axis.
    pub fn coordinate_variables(&self) -> impl Iterator<Item = (AxisName, &str)> {
        self.axes.iter().map(|(axis, c)| (*axis, c.variable.as_str()))
    }

    fn variable(&self, name: &str) -> NetCdfResult<netcdf::Variable<'_>> {
        self.file
            .variable(name)
            .ok_or_else(|| NetCdfError::MissingVariable(name.to_string()))
    }

    fn read_axis(&self, axis: AxisName) -> NetCdfResult<Vec<AxisValue>> {
        let coord = self
            .axes
            .get(&axis)
            .ok_or_else(|| NetCdfError::MissingData(format!("no coordinate variable for axis {}", axis)))?;
        let var = self.variable(&coord.variable)?;
        let raw = read_f64(&var)?;
        let packing = Packing::from_variable(&var);

        let mut values = Vec::with_capacity(raw.len());
        for (i, &v) in raw.iter().enumerate() {
            let v = packing.unpack(v).ok_or_else(|| {
                NetCdfError::InvalidFormat(format!(
                    "missing value at index {} of coordinate '{}'",
                    i, coord.variable
                ))
            })?;
            values.push(v);
        }

        if axis != AxisName::T {
            return Ok(values.into_iter().map(AxisValue::Float).collect());
        }

        let units = get_string_attr(&var, "units").ok_or_else(|| {
            NetCdfError::MissingData(format!("units attribute of time variable '{}'", coord.variable))
        })?;
        let calendar = get_string_attr(&var, "calendar");
        let time_units = CfTimeUnits::with_calendar(&units, calendar.as_deref())?;
        values
            .into_iter()
            .map(|v| time_units.decode_iso(v).map(AxisValue::String))
            .collect()
    }

    fn decode_values(&self, name: &str) -> NetCdfResult<ArrayValues> {
        let var = self.variable(name)?;
        let raw = read_f64(&var)?;
        let packing = Packing::from_variable(&var);
        let unpacked: Vec<Option<f64>> = raw.iter().map(|&v| packing.unpack(v)).collect();

        let integral = !packing.is_scaled()
            && unpacked
                .iter()
                .flatten()
                .all(|v| v.fract() == 0.0 && v.abs() < i64::MAX as f64);

        let missing = unpacked.iter().filter(|v| v.is_none()).count();
        debug!(variable = name, values = unpacked.len(), missing, integral, "Decoded variable");

        Ok(if integral {
            ArrayValues::Integer(unpacked.into_iter().map(|v| v.map(|v| v as i64)).collect())
        } else {
            ArrayValues::Float(unpacked)
        })
    }

    fn string_attr(&self, variable: &str, attr: &str) -> NetCdfResult<Option<String>> {
        Ok(get_string_attr(&self.variable(variable)?, attr))
    }
}

impl DatasetReader for NetCdfDataset {
    fn present_axes(&self) -> covjson::Result<AxisSet> {
        Ok(self.axes.keys().copied().collect())
    }

    fn coordinates(&self, axis: AxisName) -> covjson::Result<Vec<AxisValue>> {
        self.read_axis(axis)
            .map_err(|e| CoverageError::axis_extraction(axis, e.to_string()))
    }

    fn has_variable(&self, variable: &str) -> bool {
        self.file.variable(variable).is_some()
    }

    fn shape(&self, variable: &str) -> covjson::Result<Vec<usize>> {
        Ok(self
            .variable(variable)?
            .dimensions()
            .iter()
            .map(|d| d.len())
            .collect())
    }

    fn data_type(&self, variable: &str) -> covjson::Result<DataType> {
        let values = self.decode_values(variable)?;
        let data_type = values.data_type();
        *self.decoded.borrow_mut() = Some((variable.to_string(), values));
        Ok(data_type)
    }

    fn values(&self, variable: &str) -> covjson::Result<ArrayValues> {
        let cached = self.decoded.borrow_mut().take();
        match cached {
            Some((name, values)) if name == variable => Ok(values),
            _ => Ok(self.decode_values(variable)?),
        }
    }

    fn standard_name(&self, variable: &str) -> covjson::Result<Option<String>> {
        Ok(self.string_attr(variable, "standard_name")?)
    }

    fn units(&self, variable: &str) -> covjson::Result<Option<String>> {
        Ok(self.string_attr(variable, "units")?)
    }

    fn long_name(&self, variable: &str) -> covjson::Result<Option<String>> {
        Ok(self.string_attr(variable, "long_name")?)
    }

    fn axis_order(&self, variable: &str) -> covjson::Result<Vec<AxisName>> {
        let var = self.variable(variable)?;
        let mut order = Vec::new();
        for dim in var.dimensions() {
            let dim_name = dim.name();
            let axis = self
                .axes
                .iter()
                .find(|(_, c)| c.dimension == dim_name)
                .map(|(axis, _)| *axis)
                .ok_or_else(|| {
                    CoverageError::reader(format!(
                        "dimension '{}' of '{}' has no coordinate axis",
                        dim_name, variable
                    ))
                })?;
            order.push(axis);
        }
        Ok(order)
    }
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Find the coordinate variable for each axis.
///
/// Only one-dimensional variables are candidates. When several claim the
/// same axis, a CF coordinate variable (named after its dimension) wins over
/// an auxiliary one; otherwise the first in file order is kept.
fn discover_axes(file: &netcdf::File) -> BTreeMap<AxisName, CoordinateVariable> {
    let mut axes: BTreeMap<AxisName, CoordinateVariable> = BTreeMap::new();

    for var in file.variables() {
        let dims = var.dimensions();
        if dims.len() != 1 {
            continue;
        }
        let name = var.name();
        let dimension = dims[0].name();

        let axis_attr = get_string_attr(&var, "axis");
        let standard_name = get_string_attr(&var, "standard_name");
        let units = get_string_attr(&var, "units");
        let positive = get_string_attr(&var, "positive");
        let hints = CoordinateHints {
            name: &name,
            axis: axis_attr.as_deref(),
            standard_name: standard_name.as_deref(),
            units: units.as_deref(),
            positive: positive.as_deref(),
        };
        let Some(axis) = classify(&hints) else {
            continue;
        };

        let candidate = CoordinateVariable {
            variable: name.clone(),
            dimension,
        };
        let replace = match axes.get(&axis) {
            None => true,
            Some(existing) => {
                let replace =
                    existing.variable != existing.dimension && name == candidate.dimension;
                warn!(
                    axis = %axis,
                    kept = if replace { name.as_str() } else { existing.variable.as_str() },
                    ignored = if replace { existing.variable.as_str() } else { name.as_str() },
                    "Several coordinate variables for one axis"
                );
                replace
            }
        };
        if replace {
            axes.insert(axis, candidate);
        }
    }

    axes
}

/// CF packing and missing-value attributes of a variable.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Packing {
    fill_value: Option<f64>,
    missing_value: Option<f64>,
    scale_factor: Option<f64>,
    add_offset: Option<f64>,
}

impl Packing {
    fn from_variable(var: &netcdf::Variable) -> Self {
        Self {
            fill_value: get_f64_attr(var, "_FillValue"),
            missing_value: get_f64_attr(var, "missing_value"),
            scale_factor: get_f64_attr(var, "scale_factor"),
            add_offset: get_f64_attr(var, "add_offset"),
        }
    }

    fn is_scaled(&self) -> bool {
        self.scale_factor.is_some() || self.add_offset.is_some()
    }

    /// Physical value of a stored value, or `None` if it marks missing data.
    fn unpack(&self, raw: f64) -> Option<f64> {
        if raw.is_nan() || Some(raw) == self.fill_value || Some(raw) == self.missing_value {
            return None;
        }
        Some(raw * self.scale_factor.unwrap_or(1.0) + self.add_offset.unwrap_or(0.0))
    }
}

fn read_f64(var: &netcdf::Variable) -> NetCdfResult<Vec<f64>> {
    var.get_values::<f64, _>(..)
        .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to read '{}': {}", var.name(), e)))
}

/// Attribute value, or `None` when absent or unreadable.
///
/// Presence is checked by listing first; asking libnetcdf for a missing
/// attribute makes HDF5 print an error stack.
fn attr(var: &netcdf::Variable, name: &str) -> Option<netcdf::AttributeValue> {
    var.attributes()
        .find(|a| a.name() == name)
        .and_then(|a| a.value().ok())
}

fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    attr(var, name).and_then(|v| f64::try_from(v).ok())
}

fn get_string_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    match attr(var, name)? {
        netcdf::AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use covjson::{CoverageWriter, ExportOptions};

    /// Write a small CF file: time(2) x lat(2) x lon(3) packed shorts with
    /// one fill value, plus an unpacked integer mask.
    fn write_sample(path: &Path) {
        let mut file = netcdf::create(path).unwrap();
        file.add_dimension("time", 2).unwrap();
        file.add_dimension("lat", 2).unwrap();
        file.add_dimension("lon", 3).unwrap();

        let mut time = file.add_variable::<f64>("time", &["time"]).unwrap();
        time.put_attribute("units", "hours since 2024-01-15 12:00:00").unwrap();
        time.put_attribute("calendar", "gregorian").unwrap();
        time.put_values(&[0.0, 6.0], ..).unwrap();

        let mut lat = file.add_variable::<f64>("lat", &["lat"]).unwrap();
        lat.put_attribute("units", "degrees_north").unwrap();
        lat.put_values(&[50.0, 51.0], ..).unwrap();

        let mut lon = file.add_variable::<f64>("lon", &["lon"]).unwrap();
        lon.put_attribute("standard_name", "longitude").unwrap();
        lon.put_values(&[-1.0, 0.0, 1.0], ..).unwrap();

        let mut sst = file.add_variable::<i16>("sst", &["time", "lat", "lon"]).unwrap();
        sst.put_attribute("standard_name", "sea_surface_temperature").unwrap();
        sst.put_attribute("long_name", "Sea surface temperature").unwrap();
        sst.put_attribute("units", "K").unwrap();
        sst.put_attribute("_FillValue", -999i16).unwrap();
        sst.put_attribute("scale_factor", 0.5f64).unwrap();
        sst.put_attribute("add_offset", 270.0f64).unwrap();
        sst.put_values(&[0i16, 2, 4, -999, 8, 10, 12, 14, 16, 18, 20, 22], ..)
            .unwrap();

        let mut mask = file.add_variable::<i32>("mask", &["lat", "lon"]).unwrap();
        mask.put_values(&[0i32, 1, 1, 0, 0, 1], ..).unwrap();
    }

    fn sample() -> (tempfile::TempDir, NetCdfDataset) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.nc");
        write_sample(&path);
        let ds = NetCdfDataset::open(&path).unwrap();
        (dir, ds)
    }

    #[test]
    fn test_discovers_axes() {
        let (_dir, ds) = sample();
        let axes: Vec<_> = ds.present_axes().unwrap().iter().collect();
        assert_eq!(axes, vec![AxisName::X, AxisName::Y, AxisName::T]);
        assert_eq!(ds.axis_order("sst").unwrap(), vec![AxisName::T, AxisName::Y, AxisName::X]);
    }

    #[test]
    fn test_coordinate_variables_by_axis() {
        let (_dir, ds) = sample();
        let vars: Vec<_> = ds.coordinate_variables().collect();
        assert_eq!(
            vars,
            vec![(AxisName::X, "lon"), (AxisName::Y, "lat"), (AxisName::T, "time")]
        );
    }

    #[test]
    fn test_time_coordinates_decoded() {
        let (_dir, ds) = sample();
        assert_eq!(
            ds.coordinates(AxisName::T).unwrap(),
            vec![
                AxisValue::String("2024-01-15T12:00:00Z".to_string()),
                AxisValue::String("2024-01-15T18:00:00Z".to_string()),
            ]
        );
    }

    #[test]
    fn test_packed_values_unpacked() {
        let (_dir, ds) = sample();
        assert_eq!(ds.data_type("sst").unwrap(), DataType::Float);
        let values = ds.values("sst").unwrap();
        match values {
            ArrayValues::Float(v) => {
                assert_eq!(v.len(), 12);
                assert_eq!(v[0], Some(270.0));
                assert_eq!(v[3], None);
                assert_eq!(v[11], Some(281.0));
            }
            other => panic!("expected float values, got {:?}", other),
        }
    }

    #[test]
    fn test_integer_variable() {
        let (_dir, ds) = sample();
        assert_eq!(ds.data_type("mask").unwrap(), DataType::Integer);
        assert_eq!(ds.shape("mask").unwrap(), vec![2, 3]);
    }

    #[test]
    fn test_missing_variable() {
        let (_dir, ds) = sample();
        assert!(!ds.has_variable("chl"));
        assert!(matches!(
            ds.shape("chl").unwrap_err(),
            CoverageError::VariableNotFound(_)
        ));
    }

    #[test]
    fn test_export_from_netcdf() {
        let (dir, ds) = sample();
        let out = dir.path().join("sst.covjson");
        let writer = CoverageWriter::new(ExportOptions::tiled(vec![1, 2, 3])).unwrap();

        let summary = writer.export(&ds, &["sst"], &out).unwrap();
        assert_eq!(summary.tile_files.len(), 2);

        let doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(doc["parameters"]["sst"]["unit"]["symbol"], "K");
        assert_eq!(doc["domain"]["axes"]["t"]["values"][1], "2024-01-15T18:00:00Z");
    }

    #[test]
    fn test_sample_file_if_present() {
        let path = test_utils::require_test_file!("sst_sample.nc");
        let ds = NetCdfDataset::open(&path).unwrap();
        assert!(ds.present_axes().unwrap().contains(AxisName::X));
    }
}
