//! Synthetic value arrays.
//!
//! Patterns are chosen so a single value tells where in the array it came
//! from, which keeps tiling assertions short.

use covjson::ArrayValues;

/// Row-major array of `shape` whose values equal their flat index.
pub fn create_test_cube(shape: &[usize]) -> Vec<i64> {
    let len: usize = shape.iter().product();
    (0..len as i64).collect()
}

/// `height` x `width` Kelvin field rising from 250 K in the first cell
/// towards 310 K in the last.
pub fn create_temperature_grid(width: usize, height: usize) -> Vec<f64> {
    let (w, h) = (width.max(1) as f64, height.max(1) as f64);
    (0..height)
        .flat_map(|row| (0..width).map(move |col| (row, col)))
        .map(|(row, col)| 250.0 + 30.0 * (col as f64 / w) + 30.0 * (row as f64 / h))
        .collect()
}

/// Float values with the flat indices in `gaps` missing.
pub fn with_gaps(values: &[f64], gaps: &[usize]) -> ArrayValues {
    ArrayValues::Float(
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| (!gaps.contains(&i)).then_some(v))
            .collect(),
    )
}

pub fn float_values(values: &[f64]) -> ArrayValues {
    ArrayValues::Float(values.iter().copied().map(Some).collect())
}

pub fn integer_values(values: &[i64]) -> ArrayValues {
    ArrayValues::Integer(values.iter().copied().map(Some).collect())
}

/// `count` coordinates starting at `start`, `step` apart.
pub fn linspace(start: f64, step: f64, count: usize) -> Vec<f64> {
    (0..count).map(|i| start + step * i as f64).collect()
}
