//! CoverageJSON document types.
//!
//! A coverage is made of a domain (axes plus the reference systems that
//! give them meaning), one parameter per exported variable, and one range
//! per exported variable holding the data values.
//!
//! See: <https://covjson.org/>

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::parameters::Parameter;

/// Name of a spatiotemporal axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisName {
    X,
    Y,
    Z,
    T,
}

impl AxisName {
    /// All axes in document order.
    pub const ALL: [AxisName; 4] = [AxisName::X, AxisName::Y, AxisName::Z, AxisName::T];

    pub fn as_str(&self) -> &'static str {
        match self {
            AxisName::X => "x",
            AxisName::Y => "y",
            AxisName::Z => "z",
            AxisName::T => "t",
        }
    }
}

impl fmt::Display for AxisName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AxisName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" => Ok(AxisName::X),
            "y" => Ok(AxisName::Y),
            "z" => Ok(AxisName::Z),
            "t" => Ok(AxisName::T),
            other => Err(format!("unknown axis '{}'", other)),
        }
    }
}

/// The set of axes present in a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AxisSet {
    axes: BTreeSet<AxisName>,
}

impl AxisSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, axis: AxisName) -> bool {
        self.axes.insert(axis)
    }

    pub fn contains(&self, axis: AxisName) -> bool {
        self.axes.contains(&axis)
    }

    pub fn len(&self) -> usize {
        self.axes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    /// Axes in x, y, z, t order.
    pub fn iter(&self) -> impl Iterator<Item = AxisName> + '_ {
        self.axes.iter().copied()
    }
}

impl FromIterator<AxisName> for AxisSet {
    fn from_iter<I: IntoIterator<Item = AxisName>>(iter: I) -> Self {
        Self {
            axes: iter.into_iter().collect(),
        }
    }
}

/// String-keyed map that serializes in insertion order.
pub type OrderedMap<V> = IndexMap<String, V>;

/// Top-level `Coverage` object.
///
/// `parameters` and `ranges` share keys and keep the order variables were
/// added in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoverageJson {
    #[serde(rename = "type")]
    pub kind: CoverageKind,
    pub domain: Domain,
    pub parameters: OrderedMap<Parameter>,
    pub ranges: OrderedMap<Range>,
}

impl CoverageJson {
    pub fn new(domain: Domain) -> Self {
        Self {
            kind: CoverageKind::Coverage,
            domain,
            parameters: OrderedMap::new(),
            ranges: OrderedMap::new(),
        }
    }

    /// Register `name` in both `parameters` and `ranges`.
    pub fn with_variable(mut self, name: &str, parameter: Parameter, range: Range) -> Self {
        self.parameters.insert(name.to_string(), parameter);
        self.ranges.insert(name.to_string(), range);
        self
    }

    /// Variable names in document order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.ranges.keys().map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum CoverageKind {
    #[default]
    Coverage,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum DomainKind {
    #[default]
    Domain,
}

/// `Grid` domain: explicit axis values plus referencing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Domain {
    #[serde(rename = "type")]
    pub kind: DomainKind,

    #[serde(rename = "domainType")]
    pub domain_type: DomainType,

    /// Keyed `x`, `y`, then `z` and `t` when present.
    pub axes: OrderedMap<Axis>,

    pub referencing: Vec<ReferenceSystemConnection>,
}

impl Domain {
    /// Assemble a grid. The optional axes are left out of `axes` entirely
    /// when `None`.
    pub fn grid(
        x: Vec<AxisValue>,
        y: Vec<AxisValue>,
        z: Option<Vec<AxisValue>>,
        t: Option<Vec<AxisValue>>,
        referencing: Vec<ReferenceSystemConnection>,
    ) -> Self {
        let axes = [(AxisName::X, Some(x)), (AxisName::Y, Some(y)), (AxisName::Z, z), (AxisName::T, t)]
            .into_iter()
            .filter_map(|(name, values)| values.map(|v| (name, Axis::new(v))))
            .fold(OrderedMap::new(), |mut axes, (name, axis)| {
                axes.insert(name.as_str().to_string(), axis);
                axes
            });

        Self {
            kind: DomainKind::Domain,
            domain_type: DomainType::Grid,
            axes,
            referencing,
        }
    }

    pub fn axis(&self, name: AxisName) -> Option<&Axis> {
        self.axes.get(name.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DomainType {
    Grid,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Axis {
    pub values: Vec<AxisValue>,
}

impl Axis {
    pub fn new(values: Vec<AxisValue>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Coordinate value. Spatial axes hold numbers, decoded time axes hold
/// ISO-8601 strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AxisValue {
    Float(f64),
    String(String),
}

impl From<f64> for AxisValue {
    fn from(v: f64) -> Self {
        AxisValue::Float(v)
    }
}

impl From<String> for AxisValue {
    fn from(v: String) -> Self {
        AxisValue::String(v)
    }
}

/// Binds a reference system to the axis names it covers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceSystemConnection {
    pub coordinates: Vec<String>,
    pub system: ReferenceSystem,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ReferenceSystem {
    #[serde(rename = "GeographicCRS")]
    Geographic { id: String },

    #[serde(rename = "TemporalRS")]
    Temporal { calendar: String },
}

/// CoverageJSON element data type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Float,
    Integer,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Float => f.write_str("float"),
            DataType::Integer => f.write_str("integer"),
        }
    }
}

/// Flattened row-major array values. `None` is a missing value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ArrayValues {
    Integer(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
}

impl ArrayValues {
    pub fn len(&self) -> usize {
        match self {
            ArrayValues::Integer(v) => v.len(),
            ArrayValues::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The CoverageJSON data type these values serialize as.
    pub fn data_type(&self) -> DataType {
        match self {
            ArrayValues::Integer(_) => DataType::Integer,
            ArrayValues::Float(_) => DataType::Float,
        }
    }
}

/// A range: the data values of one variable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Range {
    /// All values inline.
    NdArray(NdArray),
    /// Values split into tiles stored in separate documents.
    TiledNdArray(TiledNdArray),
}

impl Range {
    pub fn data_type(&self) -> DataType {
        match self {
            Range::NdArray(a) => a.data_type,
            Range::TiledNdArray(a) => a.data_type,
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            Range::NdArray(a) => &a.shape,
            Range::TiledNdArray(a) => &a.shape,
        }
    }

    pub fn axis_names(&self) -> &[String] {
        match self {
            Range::NdArray(a) => &a.axis_names,
            Range::TiledNdArray(a) => &a.axis_names,
        }
    }

    /// The range type tag as written in the document.
    pub fn type_name(&self) -> &'static str {
        match self {
            Range::NdArray(_) => "NdArray",
            Range::TiledNdArray(_) => "TiledNdArray",
        }
    }
}

/// Inline range. `values` is flattened row-major over `axis_names`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NdArray {
    pub data_type: DataType,
    pub axis_names: Vec<String>,
    pub shape: Vec<usize>,
    pub values: ArrayValues,
}

impl NdArray {
    pub fn new(values: ArrayValues, shape: Vec<usize>, axis_names: Vec<String>) -> Self {
        Self {
            data_type: values.data_type(),
            axis_names,
            shape,
            values,
        }
    }
}

/// Range whose values are stored in separate tile documents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TiledNdArray {
    pub data_type: DataType,
    pub axis_names: Vec<String>,
    /// Untiled shape.
    pub shape: Vec<usize>,
    pub tile_sets: Vec<TileSet>,
}

/// One tiling of a `TiledNdArray`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TileSet {
    /// `None` where an axis is not split.
    pub tile_shape: Vec<Option<usize>>,
    /// Still contains the tile placeholder.
    pub url_template: String,
}

impl TileSet {
    /// Build a tile set from a concrete tile shape. Dimensions whose tile
    /// length covers the whole axis are recorded as `None`.
    pub fn new(shape: &[usize], tile_shape: &[usize], url_template: impl Into<String>) -> Self {
        let tile_shape = shape
            .iter()
            .zip(tile_shape)
            .map(|(&extent, &len)| if len >= extent { None } else { Some(len) })
            .collect();
        Self {
            tile_shape,
            url_template: url_template.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::Unit;

    fn floats(values: &[f64]) -> Vec<AxisValue> {
        values.iter().copied().map(AxisValue::Float).collect()
    }

    #[test]
    fn test_axis_name_parse_and_display() {
        assert_eq!("x".parse::<AxisName>().unwrap(), AxisName::X);
        assert_eq!(" T ".parse::<AxisName>().unwrap(), AxisName::T);
        assert!("w".parse::<AxisName>().is_err());
        assert_eq!(AxisName::Z.to_string(), "z");
    }

    #[test]
    fn test_axis_set_iterates_in_document_order() {
        let set: AxisSet = [AxisName::T, AxisName::X, AxisName::Z].into_iter().collect();
        let order: Vec<_> = set.iter().collect();
        assert_eq!(order, vec![AxisName::X, AxisName::Z, AxisName::T]);
        assert!(!set.contains(AxisName::Y));
    }

    #[test]
    fn test_ordered_map_keeps_insertion_order() {
        let mut map = OrderedMap::new();
        for (key, value) in [("zeta", 1), ("alpha", 2), ("mid", 3)] {
            map.insert(key.to_string(), value);
        }
        assert_eq!(map.insert("alpha".to_string(), 20), Some(2));

        let keys: Vec<_> = map.keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
        assert_eq!(map["alpha"], 20);

        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"zeta":1,"alpha":20,"mid":3}"#);

        let parsed: OrderedMap<i32> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.keys().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_grid_without_vertical_or_time() {
        let domain = Domain::grid(floats(&[10.0, 10.5, 11.0]), floats(&[-5.0, -4.5]), None, None, Vec::new());

        let names: Vec<_> = domain.axes.keys().collect();
        assert_eq!(names, vec!["x", "y"]);
        assert_eq!(domain.axis(AxisName::X).map(Axis::len), Some(3));
        assert!(domain.axis(AxisName::Z).is_none());

        let json = serde_json::to_value(&domain).unwrap();
        assert_eq!(json["type"], "Domain");
        assert_eq!(json["domainType"], "Grid");
    }

    #[test]
    fn test_grid_axis_order_is_fixed() {
        let times = vec![AxisValue::from("2020-01-01T00:00:00Z".to_string())];
        let domain = Domain::grid(floats(&[0.0]), floats(&[0.0]), Some(floats(&[5.0, 10.0])), Some(times), Vec::new());

        let names: Vec<_> = domain.axes.keys().collect();
        assert_eq!(names, vec!["x", "y", "z", "t"]);
    }

    #[test]
    fn test_reference_system_tags() {
        let crs = ReferenceSystem::Geographic {
            id: "http://www.opengis.net/def/crs/OGC/1.3/CRS84".to_string(),
        };
        assert_eq!(serde_json::to_value(&crs).unwrap()["type"], "GeographicCRS");

        let trs = serde_json::to_value(ReferenceSystem::Temporal {
            calendar: "Gregorian".to_string(),
        })
        .unwrap();
        assert_eq!(trs, serde_json::json!({"type": "TemporalRS", "calendar": "Gregorian"}));
    }

    #[test]
    fn test_ndarray_serialization() {
        let arr = NdArray::new(
            ArrayValues::Float(vec![Some(1.5), None, Some(3.0), Some(4.0)]),
            vec![2, 2],
            vec!["y".to_string(), "x".to_string()],
        );
        let json = serde_json::to_string(&Range::NdArray(arr)).unwrap();
        assert_eq!(
            json,
            r#"{"type":"NdArray","dataType":"float","axisNames":["y","x"],"shape":[2,2],"values":[1.5,null,3.0,4.0]}"#
        );
    }

    #[test]
    fn test_integer_ndarray() {
        let arr = NdArray::new(
            ArrayValues::Integer(vec![Some(1), Some(2), None]),
            vec![3],
            vec!["x".to_string()],
        );
        assert_eq!(arr.data_type, DataType::Integer);
        let json = serde_json::to_string(&arr).unwrap();
        assert!(json.contains(r#""dataType":"integer""#));
        assert!(json.contains("[1,2,null]"));
    }

    #[test]
    fn test_tile_set_marks_whole_axes() {
        let set = TileSet::new(&[4, 3, 10, 20], &[1, 1, 10, 25], "{tile}.covjson");
        assert_eq!(set.tile_shape, vec![Some(1), Some(1), None, None]);

        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(
            json,
            r#"{"tileShape":[1,1,null,null],"urlTemplate":"{tile}.covjson"}"#
        );
    }

    #[test]
    fn test_coverage_reads_back_unchanged() {
        let domain = Domain::grid(floats(&[0.0, 1.0]), floats(&[10.0]), None, None, Vec::new());
        let coverage = CoverageJson::new(domain)
            .with_variable(
                "ICEC",
                Parameter::new("Sea ice concentration").with_unit(Unit::from_symbol("%")),
                Range::NdArray(NdArray::new(
                    ArrayValues::Float(vec![Some(0.5), Some(0.75)]),
                    vec![1, 2],
                    vec!["y".to_string(), "x".to_string()],
                )),
            )
            .with_variable(
                "MASK",
                Parameter::new("MASK"),
                Range::NdArray(NdArray::new(
                    ArrayValues::Integer(vec![Some(1), None]),
                    vec![1, 2],
                    vec!["y".to_string(), "x".to_string()],
                )),
            );

        let text = serde_json::to_string(&coverage).unwrap();
        let back: CoverageJson = serde_json::from_str(&text).unwrap();

        assert_eq!(back, coverage);
        assert_eq!(back.variables().collect::<Vec<_>>(), vec!["ICEC", "MASK"]);
        assert_eq!(back.ranges["MASK"].data_type(), DataType::Integer);
    }
}
