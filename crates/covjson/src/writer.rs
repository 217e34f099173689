//! Coverage output.
//!
//! Every file is written to a temporary file in its destination directory and
//! renamed into place after a successful flush. A failed export leaves no
//! partial JSON under a final name. Tile files go out before the coverage
//! document, so a document on disk always has its tiles.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::builder::{Coverage, CoverageBuilder, TileSource};
use crate::config::{resolve_tile_path, ExportOptions};
use crate::error::Result;
use crate::reader::DatasetReader;
use crate::serializer::SelectiveSerializer;

/// Mode requested for output files on Unix.
#[cfg(unix)]
const OUTPUT_FILE_MODE: u32 = 0o644;

/// Result of an export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    /// Path of the coverage document.
    pub document: PathBuf,
    /// Tile files in write order.
    pub tile_files: Vec<PathBuf>,
    /// Total bytes written across all files.
    pub bytes_written: u64,
}

/// Writes coverage documents and their tiles.
#[derive(Debug, Clone)]
pub struct CoverageWriter {
    options: ExportOptions,
    serializer: SelectiveSerializer,
    tile_serializer: SelectiveSerializer,
}

impl CoverageWriter {
    pub fn new(options: ExportOptions) -> Result<Self> {
        let serializer = options.serializer()?;
        let tile_serializer = options.tile_serializer();
        Ok(Self {
            options,
            serializer,
            tile_serializer,
        })
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Build a coverage of `variables` and write it to `output`.
    ///
    /// Nothing is written if the build fails.
    pub fn export<R, S>(&self, reader: &R, variables: &[S], output: &Path) -> Result<ExportSummary>
    where
        R: DatasetReader + ?Sized,
        S: AsRef<str>,
    {
        let start = Instant::now();
        info!(output = %output.display(), variables = variables.len(), "Converting to CoverageJSON");

        let coverage = CoverageBuilder::new(reader, &self.options).build(variables)?;
        let summary = self.write(&coverage, output)?;

        info!(
            output = %summary.document.display(),
            tiles = summary.tile_files.len(),
            bytes = summary.bytes_written,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Conversion complete"
        );
        Ok(summary)
    }

    /// Write a built coverage: tiles first, then the document.
    pub fn write(&self, coverage: &Coverage, output: &Path) -> Result<ExportSummary> {
        let mut tile_files = Vec::new();
        let mut bytes_written = 0;

        let out_dir = parent_dir(output);
        for source in &coverage.tile_sources {
            let (files, bytes) = self.write_tiles(source, &out_dir)?;
            tile_files.extend(files);
            bytes_written += bytes;
        }

        bytes_written += self.write_document(coverage, output)?;

        Ok(ExportSummary {
            document: output.to_path_buf(),
            tile_files,
            bytes_written,
        })
    }

    /// Write the coverage document to `path`. Returns the bytes written.
    pub fn write_document(&self, coverage: &Coverage, path: &Path) -> Result<u64> {
        let bytes = write_atomic(path, &self.serializer, &coverage.document)?;
        debug!(
            path = %path.display(),
            bytes,
            tiled = coverage.is_tiled(),
            "Wrote coverage document"
        );
        Ok(bytes)
    }

    /// Write every tile of one variable under `out_dir`.
    pub fn write_tiles(&self, source: &TileSource, out_dir: &Path) -> Result<(Vec<PathBuf>, u64)> {
        let template = self.options.tile_path_template();
        let mut files = Vec::with_capacity(source.tile_count()?);
        let mut bytes = 0;

        for tile in source.tiles()? {
            let path = out_dir.join(resolve_tile_path(template, &source.variable, tile.index)?);
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)?;
            }
            let range = source.tile_range(tile);
            bytes += write_atomic(&path, &self.tile_serializer, &range)?;
            files.push(path);
        }

        debug!(
            variable = %source.variable,
            tiles = files.len(),
            bytes,
            "Wrote tiles"
        );
        Ok((files, bytes))
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Serialize `value` into a temporary file next to `path`, then rename it.
fn write_atomic<T: Serialize + ?Sized>(
    path: &Path,
    serializer: &SelectiveSerializer,
    value: &T,
) -> Result<u64> {
    let tmp = temp_file_in(&parent_dir(path))?;

    let mut out = CountingWriter::new(BufWriter::new(tmp));
    serializer.to_writer(&mut out, value)?;
    out.write_all(b"\n")?;
    out.flush()?;

    let bytes = out.count;
    let tmp = out.inner.into_inner().map_err(|e| e.into_error())?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(bytes)
}

/// Temporary file that becomes world-readable (subject to umask) once
/// persisted, like a file created with `fs::write`.
fn temp_file_in(dir: &Path) -> std::io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".covjson-");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(OUTPUT_FILE_MODE));
    }
    builder.tempfile_in(dir)
}

struct CountingWriter<W> {
    inner: W,
    count: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, count: 0 }
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
