//! Dataset access.
//!
//! The builder only talks to datasets through [`DatasetReader`]. File-backed
//! readers live in their own crates; [`MemoryDataset`] holds everything in
//! memory and is used for synthetic data and tests.

use std::collections::BTreeMap;

use crate::coverage_json::{ArrayValues, AxisName, AxisSet, AxisValue, DataType};
use crate::error::{CoverageError, Result};

/// Read access to a gridded dataset.
///
/// Implementations report lookups of unknown variables as
/// [`CoverageError::VariableNotFound`] and coordinate failures as
/// [`CoverageError::AxisExtraction`]; anything else may be reported as
/// [`CoverageError::Reader`].
pub trait DatasetReader {
    /// Axes present in the dataset.
    fn present_axes(&self) -> Result<AxisSet>;

    /// Coordinate values of an axis. Time axes are returned already decoded
    /// to ISO-8601 strings.
    fn coordinates(&self, axis: AxisName) -> Result<Vec<AxisValue>>;

    /// Whether the dataset contains a data variable with this name.
    fn has_variable(&self, variable: &str) -> bool;

    /// Dimension lengths of a variable, outermost first.
    fn shape(&self, variable: &str) -> Result<Vec<usize>>;

    fn data_type(&self, variable: &str) -> Result<DataType>;

    /// Row-major values of a variable with missing values as `None`.
    fn values(&self, variable: &str) -> Result<ArrayValues>;

    fn standard_name(&self, variable: &str) -> Result<Option<String>>;

    fn units(&self, variable: &str) -> Result<Option<String>>;

    fn long_name(&self, variable: &str) -> Result<Option<String>>;

    /// Axis of each dimension of a variable, outermost first.
    fn axis_order(&self, variable: &str) -> Result<Vec<AxisName>>;
}

impl<R: DatasetReader + ?Sized> DatasetReader for &R {
    fn present_axes(&self) -> Result<AxisSet> {
        (**self).present_axes()
    }

    fn coordinates(&self, axis: AxisName) -> Result<Vec<AxisValue>> {
        (**self).coordinates(axis)
    }

    fn has_variable(&self, variable: &str) -> bool {
        (**self).has_variable(variable)
    }

    fn shape(&self, variable: &str) -> Result<Vec<usize>> {
        (**self).shape(variable)
    }

    fn data_type(&self, variable: &str) -> Result<DataType> {
        (**self).data_type(variable)
    }

    fn values(&self, variable: &str) -> Result<ArrayValues> {
        (**self).values(variable)
    }

    fn standard_name(&self, variable: &str) -> Result<Option<String>> {
        (**self).standard_name(variable)
    }

    fn units(&self, variable: &str) -> Result<Option<String>> {
        (**self).units(variable)
    }

    fn long_name(&self, variable: &str) -> Result<Option<String>> {
        (**self).long_name(variable)
    }

    fn axis_order(&self, variable: &str) -> Result<Vec<AxisName>> {
        (**self).axis_order(variable)
    }
}

/// A data variable held by a [`MemoryDataset`].
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryVariable {
    pub axes: Vec<AxisName>,
    pub values: ArrayValues,
    pub standard_name: Option<String>,
    pub units: Option<String>,
    pub long_name: Option<String>,
    /// Overrides the shape taken from the axes.
    pub shape: Option<Vec<usize>>,
}

impl MemoryVariable {
    pub fn new(axes: Vec<AxisName>, values: ArrayValues) -> Self {
        Self {
            axes,
            values,
            standard_name: None,
            units: None,
            long_name: None,
            shape: None,
        }
    }

    pub fn with_standard_name(mut self, name: impl Into<String>) -> Self {
        self.standard_name = Some(name.into());
        self
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    pub fn with_long_name(mut self, name: impl Into<String>) -> Self {
        self.long_name = Some(name.into());
        self
    }

    /// Declare dimension lengths independently of the axis coordinates.
    pub fn with_shape(mut self, shape: Vec<usize>) -> Self {
        self.shape = Some(shape);
        self
    }
}

/// In-memory dataset.
///
/// Variable shapes are the lengths of their axes' coordinates unless set
/// with [`MemoryVariable::with_shape`].
#[derive(Debug, Clone, Default)]
pub struct MemoryDataset {
    axes: BTreeMap<AxisName, Option<Vec<AxisValue>>>,
    variables: BTreeMap<String, MemoryVariable>,
}

impl MemoryDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an axis with numeric coordinates.
    pub fn with_axis(mut self, axis: AxisName, values: Vec<f64>) -> Self {
        self.axes
            .insert(axis, Some(values.into_iter().map(AxisValue::Float).collect()));
        self
    }

    /// Add a time axis with already-decoded timestamps.
    pub fn with_time_axis<S: Into<String>>(mut self, times: Vec<S>) -> Self {
        self.axes.insert(
            AxisName::T,
            Some(times.into_iter().map(|t| AxisValue::String(t.into())).collect()),
        );
        self
    }

    /// Declare an axis as present whose coordinates cannot be read.
    pub fn with_unreadable_axis(mut self, axis: AxisName) -> Self {
        self.axes.insert(axis, None);
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, variable: MemoryVariable) -> Self {
        self.variables.insert(name.into(), variable);
        self
    }

    fn variable(&self, name: &str) -> Result<&MemoryVariable> {
        self.variables
            .get(name)
            .ok_or_else(|| CoverageError::variable_not_found(name))
    }
}

impl DatasetReader for MemoryDataset {
    fn present_axes(&self) -> Result<AxisSet> {
        Ok(self.axes.keys().copied().collect())
    }

    fn coordinates(&self, axis: AxisName) -> Result<Vec<AxisValue>> {
        match self.axes.get(&axis) {
            Some(Some(values)) => Ok(values.clone()),
            Some(None) => Err(CoverageError::axis_extraction(
                axis,
                "coordinate variable is unreadable",
            )),
            None => Err(CoverageError::axis_extraction(axis, "axis not present in dataset")),
        }
    }

    fn has_variable(&self, variable: &str) -> bool {
        self.variables.contains_key(variable)
    }

    fn shape(&self, variable: &str) -> Result<Vec<usize>> {
        let var = self.variable(variable)?;
        if let Some(shape) = &var.shape {
            return Ok(shape.clone());
        }
        var.axes
            .iter()
            .map(|&axis| match self.axes.get(&axis) {
                Some(Some(values)) => Ok(values.len()),
                _ => Err(CoverageError::reader(format!(
                    "variable '{}' uses axis '{}' which has no coordinates",
                    variable, axis
                ))),
            })
            .collect()
    }

    fn data_type(&self, variable: &str) -> Result<DataType> {
        Ok(self.variable(variable)?.values.data_type())
    }

    fn values(&self, variable: &str) -> Result<ArrayValues> {
        Ok(self.variable(variable)?.values.clone())
    }

    fn standard_name(&self, variable: &str) -> Result<Option<String>> {
        Ok(self.variable(variable)?.standard_name.clone())
    }

    fn units(&self, variable: &str) -> Result<Option<String>> {
        Ok(self.variable(variable)?.units.clone())
    }

    fn long_name(&self, variable: &str) -> Result<Option<String>> {
        Ok(self.variable(variable)?.long_name.clone())
    }

    fn axis_order(&self, variable: &str) -> Result<Vec<AxisName>> {
        Ok(self.variable(variable)?.axes.clone())
    }
}
