//! CoverageJSON writer.
//!
//! Converts variables of a gridded NetCDF file into a CoverageJSON document:
//! - Domain axes and reference systems from CF coordinate variables
//! - One parameter and range per requested variable
//! - Optional tiling, one NdArray document per tile
//! - Files replaced atomically, tiles before the main document

mod config;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use covjson::{CoverageWriter, DatasetReader};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::Overrides;

#[derive(Parser, Debug)]
#[command(name = "covjson-writer")]
#[command(about = "Export gridded NetCDF variables as CoverageJSON")]
struct Args {
    /// Input NetCDF file
    input: PathBuf,

    /// Variables to export, in order
    #[arg(short, long = "variable", required = true, value_delimiter = ',')]
    variables: Vec<String>,

    /// Output file (default: input with a .covjson extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write ranges as tiles
    #[arg(long)]
    tiled: bool,

    /// Tile shape, one length per variable dimension (implies --tiled)
    #[arg(long, value_delimiter = ',')]
    tile_shape: Option<Vec<usize>>,

    /// Tile URL template recorded in the document ({tile}, {variable})
    #[arg(long, env = "COVJSON_URL_TEMPLATE")]
    url_template: Option<String>,

    /// Tile file path template, relative to the output directory
    #[arg(long)]
    tile_path_template: Option<String>,

    /// Indent width
    #[arg(long)]
    indent: Option<usize>,

    /// YAML export config
    #[arg(short, long, env = "COVJSON_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log_level, args.json_logs)?;

    let start = Instant::now();
    let options = config::resolve(
        args.config.as_deref(),
        Overrides {
            tiled: args.tiled,
            tile_shape: args.tile_shape.clone(),
            url_template: args.url_template.clone(),
            tile_path_template: args.tile_path_template.clone(),
            indent: args.indent,
        },
    )?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.input));

    info!(
        input = %args.input.display(),
        output = %output.display(),
        variables = ?args.variables,
        tiled = options.tiled,
        "Starting CoverageJSON export"
    );

    let dataset = open_dataset(&args.input)?;
    let writer = CoverageWriter::new(options).context("Invalid export options")?;
    let summary = writer
        .export(&*dataset, &args.variables, &output)
        .with_context(|| format!("Failed to export {}", args.input.display()))?;

    info!(
        output = %summary.document.display(),
        tiles = summary.tile_files.len(),
        bytes = summary.bytes_written,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Export complete"
    );
    Ok(())
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn default_output(input: &Path) -> PathBuf {
    input.with_extension("covjson")
}

#[cfg(feature = "netcdf")]
fn open_dataset(path: &Path) -> Result<Box<dyn DatasetReader>> {
    let dataset = netcdf_parser::NetCdfDataset::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(Box::new(dataset))
}

#[cfg(not(feature = "netcdf"))]
fn open_dataset(path: &Path) -> Result<Box<dyn DatasetReader>> {
    anyhow::bail!(
        "cannot open {}: covjson-writer was built without NetCDF support (rebuild with --features netcdf)",
        path.display()
    )
}
