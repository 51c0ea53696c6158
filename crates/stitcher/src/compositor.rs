use std::path::Path;

use geo::{PixelOffset, TileGrid};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

use crate::{Error, Result, TileImage};

/// Output image format for a path, based on the file extension. Paths without extension are written as png.
pub fn output_format(path: &Path) -> Result<ImageFormat> {
    match ImageFormat::from_path(path) {
        Ok(format) if format.writing_enabled() => Ok(format),
        Ok(format) => Err(Error::Config(format!(
            "Unsupported output format {format:?} for '{}'",
            path.to_string_lossy()
        ))),
        Err(_) if path.extension().is_none() => Ok(ImageFormat::Png),
        Err(e) => Err(Error::Config(format!(
            "Unsupported output format for '{}': {e}",
            path.to_string_lossy()
        ))),
    }
}

/// The output image the tiles are assembled on
///
/// The canvas is created once with the size of the full tile grid and filled with the background color.
/// Regions of tiles that are never placed keep the background color.
pub struct Canvas {
    image: RgbaImage,
    tile_size: u32,
}

impl Canvas {
    pub fn new(grid_width: u32, grid_height: u32, tile_size: u32, background: Rgba<u8>) -> Result<Canvas> {
        if grid_width == 0 || grid_height == 0 || tile_size == 0 {
            return Err(Error::Config(format!(
                "Invalid canvas dimensions: {grid_width}x{grid_height} tiles of {tile_size} pixels"
            )));
        }

        let (Some(width), Some(height)) = (grid_width.checked_mul(tile_size), grid_height.checked_mul(tile_size)) else {
            return Err(Error::Config(format!(
                "Canvas of {grid_width}x{grid_height} tiles of {tile_size} pixels exceeds the maximum image size"
            )));
        };

        log::debug!("Allocating {width}x{height} canvas");
        Ok(Canvas {
            image: RgbaImage::from_pixel(width, height, background),
            tile_size,
        })
    }

    pub fn for_grid(grid: &TileGrid, background: Rgba<u8>) -> Result<Canvas> {
        Canvas::new(grid.width(), grid.height(), grid.tile_size(), background)
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    /// Copies the tile to the `tile_size` square starting at `offset`
    pub fn place(&mut self, tile: &TileImage, offset: PixelOffset) -> Result {
        if tile.size() != self.tile_size {
            return Err(Error::Runtime(format!(
                "Tile size mismatch: expected {}, got {}",
                self.tile_size,
                tile.size()
            )));
        }

        if offset.x as u64 + self.tile_size as u64 > self.width() as u64
            || offset.y as u64 + self.tile_size as u64 > self.height() as u64
        {
            return Err(Error::Runtime(format!(
                "Tile at offset ({}, {}) does not fit on the {}x{} canvas",
                offset.x,
                offset.y,
                self.width(),
                self.height()
            )));
        }

        image::imageops::replace(&mut self.image, tile.as_image(), offset.x as i64, offset.y as i64);
        Ok(())
    }

    /// Encodes the canvas to `path`, the file only appears once it is completely written
    pub fn finalize(self, path: &Path) -> Result {
        let format = output_format(path)?;
        log::debug!("Writing {}x{} {format:?} image to {}", self.width(), self.height(), path.to_string_lossy());

        inf::fs::write_atomically::<Error>(path, |writer| {
            match format {
                // no alpha channel support
                ImageFormat::Jpeg => DynamicImage::ImageRgba8(self.image).to_rgb8().write_to(writer, format)?,
                _ => self.image.write_to(writer, format)?,
            }

            Ok(())
        })
    }
}
