//! Splitting N-dimensional arrays into rectangular tiles.
//!
//! Each dimension is cut into consecutive blocks of the requested tile
//! length; the last block of a dimension is shorter when the extent is not
//! a multiple of the tile length. Tiles are produced lazily in row-major
//! block order (outermost dimension slowest) and numbered from 1.
//!
//! ```text
//! shape [5, 4], tile shape [2, 3]
//!
//!        x: 0 1 2 | 3
//!   y 0    [  1  ] [2]
//!     1    [     ] [ ]
//!     ----------------
//!     2    [  3  ] [4]
//!     3    [     ] [ ]
//!     ----------------
//!     4    [  5  ] [6]
//! ```

use serde::{Deserialize, Serialize};

use crate::coverage_json::ArrayValues;
use crate::error::{CoverageError, Result};

/// Extent of a tile along one dimension of the parent array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileBound {
    pub start: usize,
    pub len: usize,
}

impl TileBound {
    /// One past the last index covered.
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// A rectangular block of a parent array.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile<V> {
    /// 1-based position in emission order.
    pub index: usize,
    /// Per-dimension bounds within the parent array.
    pub bounds: Vec<TileBound>,
    /// The block's values in row-major order.
    pub values: V,
}

impl<V> Tile<V> {
    /// Actual shape of this tile (truncated at array edges).
    pub fn shape(&self) -> Vec<usize> {
        self.bounds.iter().map(|b| b.len).collect()
    }

    fn map_values<U>(self, f: impl FnOnce(V) -> U) -> Tile<U> {
        Tile {
            index: self.index,
            bounds: self.bounds,
            values: f(self.values),
        }
    }
}

/// Check that a tile shape can be applied to an array shape.
pub fn validate_tile_shape(shape: &[usize], tile_shape: &[usize]) -> Result<()> {
    if shape.len() != tile_shape.len() {
        return Err(CoverageError::tile_shape_mismatch(format!(
            "tile shape {:?} has rank {} but the array {:?} has rank {}",
            tile_shape,
            tile_shape.len(),
            shape,
            shape.len()
        )));
    }
    if let Some(dim) = tile_shape.iter().position(|&len| len == 0) {
        return Err(CoverageError::tile_shape_mismatch(format!(
            "tile shape {:?} has a non-positive length in dimension {}",
            tile_shape, dim
        )));
    }
    Ok(())
}

/// Number of tiles `tile` will produce.
pub fn tile_count(shape: &[usize], tile_shape: &[usize]) -> Result<usize> {
    validate_tile_shape(shape, tile_shape)?;
    Ok(block_counts(shape, tile_shape).iter().product())
}

fn block_counts(shape: &[usize], tile_shape: &[usize]) -> Vec<usize> {
    shape
        .iter()
        .zip(tile_shape)
        .map(|(&extent, &len)| extent.div_ceil(len))
        .collect()
}

/// Lazily split `values` (row-major, of the given `shape`) into tiles.
///
/// Fails if the tile rank differs from the array rank, if any tile length is
/// zero, or if `values` does not hold exactly `shape.iter().product()` items.
pub fn tile<'a, T: Clone>(
    values: &'a [T],
    shape: &[usize],
    tile_shape: &[usize],
) -> Result<Tiles<'a, T>> {
    validate_tile_shape(shape, tile_shape)?;

    let expected: usize = shape.iter().product();
    if values.len() != expected {
        return Err(CoverageError::tile_shape_mismatch(format!(
            "array shape {:?} needs {} values but {} were given",
            shape,
            expected,
            values.len()
        )));
    }

    let counts = block_counts(shape, tile_shape);
    let remaining = counts.iter().product();

    // Row-major strides: the last dimension is contiguous.
    let mut strides = vec![1; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }

    Ok(Tiles {
        values,
        shape: shape.to_vec(),
        tile_shape: tile_shape.to_vec(),
        strides,
        counts,
        block: vec![0; shape.len()],
        next_index: 1,
        remaining,
    })
}

/// Iterator over the tiles of an array, one tile materialized per step.
#[derive(Debug, Clone)]
pub struct Tiles<'a, T> {
    values: &'a [T],
    shape: Vec<usize>,
    tile_shape: Vec<usize>,
    strides: Vec<usize>,
    counts: Vec<usize>,
    block: Vec<usize>,
    next_index: usize,
    remaining: usize,
}

impl<'a, T: Clone> Tiles<'a, T> {
    fn current_bounds(&self) -> Vec<TileBound> {
        self.block
            .iter()
            .enumerate()
            .map(|(i, &b)| {
                let start = b * self.tile_shape[i];
                TileBound {
                    start,
                    len: self.tile_shape[i].min(self.shape[i] - start),
                }
            })
            .collect()
    }

    fn copy_block(&self, bounds: &[TileBound]) -> Vec<T> {
        let rank = bounds.len();
        if rank == 0 {
            return self.values.to_vec();
        }

        let len: usize = bounds.iter().map(|b| b.len).product();
        let mut out = Vec::with_capacity(len);
        let row = bounds[rank - 1];

        // Walk every index of the outer dimensions; copy the innermost run.
        let mut outer = vec![0; rank - 1];
        loop {
            let offset: usize = outer
                .iter()
                .enumerate()
                .map(|(i, &j)| (bounds[i].start + j) * self.strides[i])
                .sum::<usize>()
                + row.start;
            out.extend_from_slice(&self.values[offset..offset + row.len]);

            if !advance(&mut outer, |i| bounds[i].len) {
                break;
            }
        }
        out
    }
}

/// Row-major odometer step. Returns false once every position was visited.
fn advance(position: &mut [usize], extent: impl Fn(usize) -> usize) -> bool {
    for i in (0..position.len()).rev() {
        position[i] += 1;
        if position[i] < extent(i) {
            return true;
        }
        position[i] = 0;
    }
    false
}

impl<'a, T: Clone> Iterator for Tiles<'a, T> {
    type Item = Tile<Vec<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let bounds = self.current_bounds();
        let values = self.copy_block(&bounds);
        let tile = Tile {
            index: self.next_index,
            bounds,
            values,
        };

        self.remaining -= 1;
        self.next_index += 1;
        let counts = &self.counts;
        advance(&mut self.block, |i| counts[i]);

        Some(tile)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T: Clone> ExactSizeIterator for Tiles<'a, T> {}

/// Rebuild a row-major array of `shape` from its tiles.
///
/// Fails if a tile falls outside the array, if tiles overlap, or if any
/// element is left uncovered.
pub fn reassemble<T: Clone>(
    shape: &[usize],
    tiles: impl IntoIterator<Item = Tile<Vec<T>>>,
) -> Result<Vec<T>> {
    let total: usize = shape.iter().product();
    let mut out: Vec<Option<T>> = vec![None; total];

    let mut strides = vec![1; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }

    for tile in tiles {
        if tile.bounds.len() != shape.len()
            || tile.bounds.iter().zip(shape).any(|(b, &s)| b.end() > s)
        {
            return Err(CoverageError::tile_shape_mismatch(format!(
                "tile {} with bounds {:?} does not fit array shape {:?}",
                tile.index, tile.bounds, shape
            )));
        }
        let expected: usize = tile.bounds.iter().map(|b| b.len).product();
        if tile.values.len() != expected {
            return Err(CoverageError::tile_shape_mismatch(format!(
                "tile {} holds {} values but its bounds cover {}",
                tile.index,
                tile.values.len(),
                expected
            )));
        }

        let mut position = vec![0; shape.len()];
        for value in tile.values {
            let offset: usize = position
                .iter()
                .enumerate()
                .map(|(i, &j)| (tile.bounds[i].start + j) * strides[i])
                .sum();
            if out[offset].replace(value).is_some() {
                return Err(CoverageError::tile_shape_mismatch(format!(
                    "tile {} overlaps an earlier tile at offset {}",
                    tile.index, offset
                )));
            }
            advance(&mut position, |i| tile.bounds[i].len);
        }
    }

    out.into_iter()
        .enumerate()
        .map(|(offset, v)| {
            v.ok_or_else(|| {
                CoverageError::tile_shape_mismatch(format!("no tile covers offset {}", offset))
            })
        })
        .collect()
}

/// Tiles over either element type of [`ArrayValues`].
#[derive(Debug, Clone)]
pub enum ValueTiles<'a> {
    Integer(Tiles<'a, Option<i64>>),
    Float(Tiles<'a, Option<f64>>),
}

impl ArrayValues {
    /// Lazily split these values into tiles; see [`tile`].
    pub fn tiles(&self, shape: &[usize], tile_shape: &[usize]) -> Result<ValueTiles<'_>> {
        Ok(match self {
            ArrayValues::Integer(v) => ValueTiles::Integer(tile(v, shape, tile_shape)?),
            ArrayValues::Float(v) => ValueTiles::Float(tile(v, shape, tile_shape)?),
        })
    }
}

impl<'a> Iterator for ValueTiles<'a> {
    type Item = Tile<ArrayValues>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            ValueTiles::Integer(t) => t.next().map(|t| t.map_values(ArrayValues::Integer)),
            ValueTiles::Float(t) => t.next().map(|t| t.map_values(ArrayValues::Float)),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            ValueTiles::Integer(t) => t.size_hint(),
            ValueTiles::Float(t) => t.size_hint(),
        }
    }
}
