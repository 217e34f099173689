//! Locating optional sample files.
//!
//! Real NetCDF samples are not checked in. Tests that want one look in
//! `$TEST_DATA_DIR` first, then in the conventional `testdata/` folders.

use std::path::{Path, PathBuf};

/// Environment variable naming an extra sample directory.
pub const TEST_DATA_ENV: &str = "TEST_DATA_DIR";

/// Workspace root, two levels above this crate's manifest.
pub fn workspace_root() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest
        .ancestors()
        .nth(2)
        .unwrap_or(manifest)
        .to_path_buf()
}

/// `crates/<name>/testdata`.
pub fn crate_testdata_dir(crate_name: &str) -> PathBuf {
    workspace_root().join("crates").join(crate_name).join("testdata")
}

/// Directories searched by [`find_test_file`], in order.
pub fn search_dirs() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = std::env::var_os(TEST_DATA_ENV)
        .map(PathBuf::from)
        .into_iter()
        .collect();
    dirs.push(crate_testdata_dir("netcdf-parser"));
    dirs.push(workspace_root().join("testdata"));
    dirs
}

pub fn find_test_file(name: &str) -> Option<PathBuf> {
    search_dirs()
        .into_iter()
        .map(|dir| dir.join(name))
        .find(|path| path.is_file())
}

/// Scratch directory removed on drop.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("create temp dir")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_root_has_manifest() {
        assert!(workspace_root().join("Cargo.toml").is_file());
        assert!(workspace_root().join("crates").is_dir());
    }

    #[test]
    fn test_search_order_ends_with_workspace_testdata() {
        let dirs = search_dirs();
        assert_eq!(dirs.last(), Some(&workspace_root().join("testdata")));
        assert!(dirs.contains(&crate_testdata_dir("netcdf-parser")));
    }

    #[test]
    fn test_unknown_file_not_found() {
        assert!(find_test_file("no-such-sample.nc").is_none());
    }

    #[test]
    fn test_temp_dir_exists_until_dropped() {
        let dir = temp_test_dir();
        let path = dir.path().to_path_buf();
        assert!(path.is_dir());
        drop(dir);
        assert!(!path.exists());
    }
}
