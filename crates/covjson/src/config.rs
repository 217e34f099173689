//! Export options.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{CoverageError, Result};
use crate::serializer::{
    CompactPaths, CompactStyle, SelectiveSerializer, COVERAGE_COMPACT_PATHS, DEFAULT_INDENT,
};

/// Placeholder replaced by the 1-based tile number.
pub const TILE_PLACEHOLDER: &str = "{tile}";

/// Placeholder replaced by the variable name.
pub const VARIABLE_PLACEHOLDER: &str = "{variable}";

/// Options controlling how a coverage is built and written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Split ranges into tile documents.
    pub tiled: bool,

    /// Tile length per dimension of each variable.
    pub tile_shape: Vec<usize>,

    /// Tile location recorded in the coverage document.
    pub url_template: String,

    /// Tile file path relative to the output directory, if it differs from
    /// `url_template`.
    pub tile_path_template: Option<String>,

    /// Indent width for pretty-printed structure.
    pub indent: usize,

    /// Paths rendered without any whitespace.
    pub compact_paths: Vec<String>,

    /// Paths rendered on one line with spaced separators.
    pub single_line_paths: Vec<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            tiled: false,
            tile_shape: Vec::new(),
            url_template: format!("{}-{}.covjson", VARIABLE_PLACEHOLDER, TILE_PLACEHOLDER),
            tile_path_template: None,
            indent: DEFAULT_INDENT,
            compact_paths: default_compact_paths(),
            single_line_paths: Vec::new(),
        }
    }
}

fn default_compact_paths() -> Vec<String> {
    COVERAGE_COMPACT_PATHS.iter().map(|s| s.to_string()).collect()
}

impl ExportOptions {
    /// Options for a tiled export.
    pub fn tiled(tile_shape: Vec<usize>) -> Self {
        Self {
            tiled: true,
            tile_shape,
            ..Default::default()
        }
    }

    pub fn with_url_template(mut self, template: impl Into<String>) -> Self {
        self.url_template = template.into();
        self
    }

    /// Template used for tile file paths.
    pub fn tile_path_template(&self) -> &str {
        self.tile_path_template.as_deref().unwrap_or(&self.url_template)
    }

    /// Check the options for an export of `variable_count` variables.
    pub fn validate(&self, variable_count: usize) -> Result<()> {
        if !self.tiled {
            return Ok(());
        }
        if self.tile_shape.is_empty() {
            return Err(CoverageError::InvalidConfig(
                "tiled export needs a tile shape".to_string(),
            ));
        }
        for template in [self.url_template.as_str(), self.tile_path_template()] {
            if !template.contains(TILE_PLACEHOLDER) {
                return Err(CoverageError::InvalidConfig(format!(
                    "template '{}' must contain {}",
                    template, TILE_PLACEHOLDER
                )));
            }
            if variable_count > 1 && !template.contains(VARIABLE_PLACEHOLDER) {
                return Err(CoverageError::InvalidConfig(format!(
                    "template '{}' must contain {} when exporting several variables",
                    template, VARIABLE_PLACEHOLDER
                )));
            }
        }
        Ok(())
    }

    /// Serializer for the coverage document.
    pub fn serializer(&self) -> Result<SelectiveSerializer> {
        let mut paths = CompactPaths::from_patterns(&self.compact_paths, CompactStyle::Compact)?;
        for p in &self.single_line_paths {
            paths.add(p, CompactStyle::SingleLine)?;
        }
        Ok(SelectiveSerializer::new(paths, self.indent))
    }

    /// Serializer for tile documents.
    pub fn tile_serializer(&self) -> SelectiveSerializer {
        SelectiveSerializer::new(CompactPaths::tile_defaults(), self.indent)
    }
}

/// Relative file path of one tile.
///
/// The variable name becomes part of the path, so names with path
/// separators or that are `.`/`..` are rejected.
pub fn resolve_tile_path(template: &str, variable: &str, tile_index: usize) -> Result<PathBuf> {
    if template.contains(VARIABLE_PLACEHOLDER) && !is_plain_file_name(variable) {
        return Err(CoverageError::InvalidConfig(format!(
            "variable name '{}' cannot be used in a tile file path",
            variable
        )));
    }
    Ok(PathBuf::from(resolve_template(template, variable, tile_index)))
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(&['/', '\\'][..])
}

/// Substitute the tile and variable placeholders of a template.
pub fn resolve_template(template: &str, variable: &str, tile_index: usize) -> String {
    template
        .replace(TILE_PLACEHOLDER, &tile_index.to_string())
        .replace(VARIABLE_PLACEHOLDER, variable)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = ExportOptions::default();
        assert!(!opts.tiled);
        assert_eq!(opts.indent, 2);
        assert_eq!(opts.url_template, "{variable}-{tile}.covjson");
        assert_eq!(opts.tile_path_template(), "{variable}-{tile}.covjson");
        assert!(opts.validate(3).is_ok());
    }

    #[test]
    fn test_default_serializer_matches_builtin_paths() {
        let ser = ExportOptions::default().serializer().unwrap();
        assert_eq!(ser.compact_paths(), &CompactPaths::coverage_defaults());
    }

    #[test]
    fn test_tiled_validation() {
        assert!(ExportOptions::tiled(vec![1, 1, 10, 10]).validate(1).is_ok());
        assert!(ExportOptions::tiled(Vec::new()).validate(1).is_err());

        let no_tile = ExportOptions::tiled(vec![1]).with_url_template("data.covjson");
        assert!(matches!(no_tile.validate(1), Err(CoverageError::InvalidConfig(_))));

        let no_var = ExportOptions::tiled(vec![1]).with_url_template("{tile}.covjson");
        assert!(no_var.validate(1).is_ok());
        assert!(no_var.validate(2).is_err());
    }

    #[test]
    fn test_tile_path_template_override() {
        let mut opts = ExportOptions::tiled(vec![1])
            .with_url_template("http://localhost:8080/{variable}/{tile}.covjson");
        opts.tile_path_template = Some("tiles/{variable}/{tile}.covjson".to_string());
        assert_eq!(opts.tile_path_template(), "tiles/{variable}/{tile}.covjson");
        assert!(opts.validate(2).is_ok());
    }

    #[test]
    fn test_resolve_template() {
        assert_eq!(resolve_template("{variable}-{tile}.covjson", "SST", 12), "SST-12.covjson");
        assert_eq!(resolve_template("localhost:8080/{tile}.covjson", "SST", 1), "localhost:8080/1.covjson");
    }

    #[test]
    fn test_tile_path_rejects_unsafe_variable_names() {
        let template = "tiles/{variable}/{tile}.covjson";
        assert_eq!(
            resolve_tile_path(template, "SST", 3).unwrap(),
            PathBuf::from("tiles/SST/3.covjson")
        );
        for name in ["../up", "a/b", "a\\b", "..", ".", ""] {
            assert!(
                matches!(resolve_tile_path(template, name, 1), Err(CoverageError::InvalidConfig(_))),
                "{:?} accepted",
                name
            );
        }
        // Without {variable} the name never reaches the path.
        assert!(resolve_tile_path("{tile}.covjson", "a/b", 1).is_ok());
        assert!(resolve_tile_path(template, "..sst", 1).is_ok());
    }

    #[test]
    fn test_yaml_like_partial_config() {
        let opts: ExportOptions =
            serde_json::from_str(r#"{"tiled": true, "tile_shape": [1, 2], "indent": 4}"#).unwrap();
        assert!(opts.tiled);
        assert_eq!(opts.tile_shape, vec![1, 2]);
        assert_eq!(opts.indent, 4);
        assert_eq!(opts.compact_paths.len(), 6);
    }

    #[test]
    fn test_bad_compact_path() {
        let opts = ExportOptions {
            compact_paths: vec!["ranges..values".to_string()],
            ..Default::default()
        };
        assert!(opts.serializer().is_err());
    }
}
