//! Export configuration loading.
//!
//! Options come from an optional YAML file; command-line flags given
//! explicitly override the file.

use std::path::Path;

use anyhow::{Context, Result};
use covjson::ExportOptions;
use tracing::debug;

/// Command-line values that override the config file when set.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub tiled: bool,
    pub tile_shape: Option<Vec<usize>>,
    pub url_template: Option<String>,
    pub tile_path_template: Option<String>,
    pub indent: Option<usize>,
}

/// Load options from a YAML file.
pub fn load(path: &Path) -> Result<ExportOptions> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let options: ExportOptions = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    debug!(path = %path.display(), ?options, "Loaded export config");
    Ok(options)
}

/// Resolve the effective options from an optional file plus overrides.
pub fn resolve(path: Option<&Path>, overrides: Overrides) -> Result<ExportOptions> {
    let mut options = match path {
        Some(p) => load(p)?,
        None => ExportOptions::default(),
    };

    if let Some(shape) = overrides.tile_shape {
        options.tile_shape = shape;
        options.tiled = true;
    }
    if overrides.tiled {
        options.tiled = true;
    }
    if let Some(template) = overrides.url_template {
        options.url_template = template;
    }
    if let Some(template) = overrides.tile_path_template {
        options.tile_path_template = Some(template);
    }
    if let Some(indent) = overrides.indent {
        options.indent = indent;
    }

    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_config_with_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.yaml");
        std::fs::write(
            &path,
            "tiled: true\ntile_shape: [1, 10, 10]\nurl_template: \"tiles/{variable}-{tile}.covjson\"\nindent: 4\n",
        )
        .unwrap();

        let options = resolve(
            Some(&path),
            Overrides {
                tile_shape: Some(vec![2, 5, 5]),
                ..Default::default()
            },
        )
        .unwrap();

        assert!(options.tiled);
        assert_eq!(options.tile_shape, vec![2, 5, 5]);
        assert_eq!(options.url_template, "tiles/{variable}-{tile}.covjson");
        assert_eq!(options.indent, 4);
        assert_eq!(options.compact_paths.len(), 6);
    }

    #[test]
    fn test_example_config_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/export.example.yaml");
        let options = load(&path).unwrap();
        assert!(options.tiled);
        assert!(options.validate(2).is_ok());
    }

    #[test]
    fn test_missing_config_file() {
        let err = load(Path::new("/nonexistent/export.yaml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
