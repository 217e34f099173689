//! CF coordinate axis classification.
//!
//! A coordinate variable is assigned to an axis by, in order of precedence:
//! its `axis` attribute, its `standard_name`, its `units`, and finally its
//! variable name.

use covjson::AxisName;

/// Metadata used to classify one coordinate variable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoordinateHints<'a> {
    pub name: &'a str,
    pub axis: Option<&'a str>,
    pub standard_name: Option<&'a str>,
    pub units: Option<&'a str>,
    pub positive: Option<&'a str>,
}

const X_STANDARD_NAMES: [&str; 3] = ["longitude", "grid_longitude", "projection_x_coordinate"];
const Y_STANDARD_NAMES: [&str; 3] = ["latitude", "grid_latitude", "projection_y_coordinate"];
const Z_STANDARD_NAMES: [&str; 8] = [
    "depth",
    "height",
    "altitude",
    "air_pressure",
    "model_level_number",
    "ocean_sigma_coordinate",
    "ocean_s_coordinate",
    "atmosphere_sigma_coordinate",
];

const X_UNITS: [&str; 6] = [
    "degrees_east",
    "degree_east",
    "degree_e",
    "degrees_e",
    "degreee",
    "degreese",
];
const Y_UNITS: [&str; 6] = [
    "degrees_north",
    "degree_north",
    "degree_n",
    "degrees_n",
    "degreen",
    "degreesn",
];

const X_NAMES: [&str; 5] = ["x", "lon", "longitude", "nav_lon", "xc"];
const Y_NAMES: [&str; 5] = ["y", "lat", "latitude", "nav_lat", "yc"];
const Z_NAMES: [&str; 8] = ["z", "depth", "deptht", "lev", "level", "height", "altitude", "plev"];
const T_NAMES: [&str; 4] = ["t", "time", "time_counter", "valid_time"];

/// Classify a coordinate variable, or `None` if it is not a grid axis.
pub fn classify(hints: &CoordinateHints<'_>) -> Option<AxisName> {
    if let Some(axis) = hints.axis {
        match axis.trim().to_ascii_uppercase().as_str() {
            "X" => return Some(AxisName::X),
            "Y" => return Some(AxisName::Y),
            "Z" => return Some(AxisName::Z),
            "T" => return Some(AxisName::T),
            _ => {}
        }
    }

    if let Some(std_name) = hints.standard_name.map(str::to_ascii_lowercase) {
        let std_name = std_name.as_str();
        if X_STANDARD_NAMES.contains(&std_name) {
            return Some(AxisName::X);
        }
        if Y_STANDARD_NAMES.contains(&std_name) {
            return Some(AxisName::Y);
        }
        if Z_STANDARD_NAMES.contains(&std_name) {
            return Some(AxisName::Z);
        }
        if std_name == "time" {
            return Some(AxisName::T);
        }
    }

    if let Some(units) = hints.units.map(str::to_ascii_lowercase) {
        let units = units.trim();
        if X_UNITS.contains(&units) {
            return Some(AxisName::X);
        }
        if Y_UNITS.contains(&units) {
            return Some(AxisName::Y);
        }
        if units.contains(" since ") {
            return Some(AxisName::T);
        }
    }

    // A `positive` attribute marks a vertical coordinate.
    if hints.positive.is_some() {
        return Some(AxisName::Z);
    }

    let name = hints.name.to_ascii_lowercase();
    let name = name.as_str();
    if X_NAMES.contains(&name) {
        Some(AxisName::X)
    } else if Y_NAMES.contains(&name) {
        Some(AxisName::Y)
    } else if Z_NAMES.contains(&name) {
        Some(AxisName::Z)
    } else if T_NAMES.contains(&name) {
        Some(AxisName::T)
    } else {
        None
    }
}
