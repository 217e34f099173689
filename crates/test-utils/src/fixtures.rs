//! Common test fixtures for export tests.
//!
//! This module provides in-memory datasets for the scenarios the exporter is
//! expected to handle, plus a few shared constants.

use covjson::{AxisName, MemoryDataset, MemoryVariable};

use crate::generators::{create_temperature_grid, create_test_cube, float_values, integer_values, linspace, with_gaps};

/// Common time values for testing.
pub mod time {
    /// A fixed reference time for tests.
    pub const REFERENCE_TIME: &str = "2024-01-15T12:00:00Z";

    /// Four consecutive 6-hourly steps starting at the reference time.
    pub const SIX_HOURLY: [&str; 4] = [
        "2024-01-15T12:00:00Z",
        "2024-01-15T18:00:00Z",
        "2024-01-16T00:00:00Z",
        "2024-01-16T06:00:00Z",
    ];
}

/// Variable names used by the fixtures.
pub mod variables {
    /// Sea ice concentration, 2-D float with gaps.
    pub const ICEC: &str = "ICEC";

    /// Sea water temperature, 4-D float.
    pub const TEMP: &str = "TEMP";

    /// Land mask, 2-D integer.
    pub const MASK: &str = "MASK";
}

/// 2-D (y, x) dataset: 4 latitudes by 5 longitudes.
///
/// `ICEC` is a float field with two missing cells, `MASK` an integer field.
pub fn xy_dataset() -> MemoryDataset {
    let (width, height) = (5, 4);
    let icec = create_temperature_grid(width, height);

    MemoryDataset::new()
        .with_axis(AxisName::X, linspace(-10.0, 5.0, width))
        .with_axis(AxisName::Y, linspace(60.0, 1.0, height))
        .with_variable(
            variables::ICEC,
            MemoryVariable::new(vec![AxisName::Y, AxisName::X], with_gaps(&icec, &[0, 7]))
                .with_standard_name("sea_ice_area_fraction")
                .with_units("1")
                .with_long_name("Sea ice area fraction"),
        )
        .with_variable(
            variables::MASK,
            MemoryVariable::new(
                vec![AxisName::Y, AxisName::X],
                integer_values(&create_test_cube(&[height, width])),
            ),
        )
}

/// 4-D (t, z, y, x) dataset with `t` time steps, `z` depths and a 3 by 4
/// horizontal grid.
///
/// `TEMP` holds its own flat index as a float, so tile contents can be checked
/// against their bounds.
pub fn tzyx_dataset(t: usize, z: usize) -> MemoryDataset {
    let (y, x) = (3, 4);
    let shape = [t, z, y, x];
    let values: Vec<f64> = create_test_cube(&shape).into_iter().map(|v| v as f64).collect();
    let times: Vec<String> = (0..t)
        .map(|i| time::SIX_HOURLY[i % time::SIX_HOURLY.len()].to_string())
        .collect();

    MemoryDataset::new()
        .with_axis(AxisName::X, linspace(0.0, 0.25, x))
        .with_axis(AxisName::Y, linspace(45.0, 0.25, y))
        .with_axis(AxisName::Z, linspace(0.0, 10.0, z))
        .with_time_axis(times)
        .with_variable(
            variables::TEMP,
            MemoryVariable::new(
                vec![AxisName::T, AxisName::Z, AxisName::Y, AxisName::X],
                float_values(&values),
            )
            .with_standard_name("sea_water_temperature")
            .with_units("degC")
            .with_long_name("Sea water temperature"),
        )
}
