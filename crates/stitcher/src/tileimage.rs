use image::RgbaImage;

use crate::FetchError;

/// A decoded tile, its width and height are both equal to the tile size
#[derive(Debug, Clone, PartialEq)]
pub struct TileImage {
    image: RgbaImage,
}

impl TileImage {
    /// Decodes encoded image data (png, jpeg), fails when the data is not a `tile_size` x `tile_size` image
    pub fn decode(data: &[u8], tile_size: u32) -> Result<Self, FetchError> {
        let image = image::load_from_memory(data).map_err(|e| FetchError::Decode(e.to_string()))?;
        TileImage::from_image(image.to_rgba8(), tile_size)
    }

    pub fn from_image(image: RgbaImage, tile_size: u32) -> Result<Self, FetchError> {
        if image.width() != tile_size || image.height() != tile_size {
            return Err(FetchError::Decode(format!(
                "Tile size mismatch: expected {tile_size}x{tile_size}, got {}x{}",
                image.width(),
                image.height()
            )));
        }

        Ok(TileImage { image })
    }

    /// Edge length in pixels
    pub fn size(&self) -> u32 {
        self.image.width()
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;
    use crate::testutils::encode_png;

    #[test]
    fn decode_png() {
        let data = encode_png(&RgbaImage::from_pixel(16, 16, Rgba([10, 20, 30, 255])));
        let tile = TileImage::decode(&data, 16).expect("valid tile");

        assert_eq!(tile.size(), 16);
        assert_eq!(*tile.as_image().get_pixel(15, 15), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn size_mismatch() {
        let data = encode_png(&RgbaImage::new(16, 8));
        assert!(matches!(TileImage::decode(&data, 16), Err(FetchError::Decode(_))));
        assert!(matches!(TileImage::decode(&data, 8), Err(FetchError::Decode(_))));
    }

    #[test]
    fn invalid_data() {
        assert!(matches!(TileImage::decode(b"<html>Not found</html>", 256), Err(FetchError::Decode(_))));
        assert!(matches!(TileImage::decode(&[], 256), Err(FetchError::Decode(_))));
    }
}
