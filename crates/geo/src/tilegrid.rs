//! Mapping between the linear enumeration of the tiles in a [`TileRange`] and their position on the output canvas.
//!
//! Tiles are enumerated column-major: index 0 is the top-left tile, the index first runs down the column.
//! [`index_to_cell`] and [`cell_to_pixel`] are the only place where this mapping is computed,
//! both the work list and the paste offsets are derived from [`TileGrid`].

use crate::{Error, Result, Tile, TileRange};

/// Position of a tile in the grid, relative to the top-left tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCell {
    pub x: u32,
    pub y: u32,
}

/// Pixel offset of the top-left corner of a tile on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelOffset {
    pub x: u32,
    pub y: u32,
}

pub fn index_to_cell(index: usize, grid_height: u32) -> GridCell {
    let height = grid_height.max(1) as usize;
    GridCell {
        x: (index / height) as u32,
        y: (index % height) as u32,
    }
}

pub fn cell_to_pixel(cell: GridCell, tile_size: u32) -> PixelOffset {
    PixelOffset {
        x: cell.x * tile_size,
        y: cell.y * tile_size,
    }
}

/// One unit of work: the tile to fetch and where it ends up on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridEntry {
    pub index: usize,
    pub cell: GridCell,
    pub tile: Tile,
    pub offset: PixelOffset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    range: TileRange,
    tile_size: u32,
}

impl TileGrid {
    /// Fails when the resulting canvas would not be addressable with 32-bit pixel coordinates
    pub fn new(range: TileRange, tile_size: u32) -> Result<Self> {
        if tile_size == 0 {
            return Err(Error::InvalidArgument("Tile size must be greater than 0".to_string()));
        }

        if range.width().checked_mul(tile_size).is_none() || range.height().checked_mul(tile_size).is_none() {
            return Err(Error::InvalidArgument(format!(
                "Grid of {}x{} tiles of {tile_size} pixels exceeds the maximum image size",
                range.width(),
                range.height()
            )));
        }

        Ok(TileGrid { range, tile_size })
    }

    pub fn range(&self) -> &TileRange {
        &self.range
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn width(&self) -> u32 {
        self.range.width()
    }

    pub fn height(&self) -> u32 {
        self.range.height()
    }

    pub fn len(&self) -> usize {
        self.range.tile_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Canvas dimensions (width, height) in pixels
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.width() * self.tile_size, self.height() * self.tile_size)
    }

    pub fn entry(&self, index: usize) -> Option<GridEntry> {
        if index >= self.len() {
            return None;
        }

        let cell = index_to_cell(index, self.height());
        Some(GridEntry {
            index,
            cell,
            tile: Tile {
                x: self.range.x.lo + cell.x as i32,
                y: self.range.y.lo + cell.y as i32,
                z: self.range.zoom,
            },
            offset: cell_to_pixel(cell, self.tile_size),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = GridEntry> + '_ {
        (0..self.len()).filter_map(|index| self.entry(index))
    }
}
