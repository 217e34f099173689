//! Test helpers shared by the workspace crates.
//!
//! - [`fixtures`]: in-memory datasets for the export scenarios
//! - [`generators`]: value arrays with known layouts and gaps
//! - [`paths`]: lookup of optional on-disk sample files
//!
//! `covjson` may only use this crate from integration tests and benches;
//! its unit tests would otherwise link two copies of `covjson`.

pub mod fixtures;
pub mod generators;
pub mod paths;

pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Resolve a sample file via [`find_test_file`], or return from the
/// calling test with a note on stderr when it is not available.
///
/// ```ignore
/// #[test]
/// fn test_real_file() {
///     let path = test_utils::require_test_file!("sst_sample.nc");
///     // ...
/// }
/// ```
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        let Some(path) = $crate::find_test_file($name) else {
            eprintln!("skipping: sample file '{}' not found (set TEST_DATA_DIR)", $name);
            return;
        };
        path
    }};
}

/// Assert `|left - right| <= epsilon`, comparing as `f64`.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right, epsilon) = ($left as f64, $right as f64, $epsilon as f64);
        assert!(
            (left - right).abs() <= epsilon,
            "assertion failed: {} is not within {} of {}",
            left,
            epsilon,
            right
        );
    }};
}
