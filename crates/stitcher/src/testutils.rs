use std::collections::HashMap;
use std::sync::Mutex;

use geo::Tile;
use image::{ImageFormat, Rgba, RgbaImage};

use crate::{FetchError, TileSource, TileTransport};

/// Deterministic test pattern for a tile, every tile has different content
pub fn tile_image(tile: Tile, tile_size: u32) -> RgbaImage {
    RgbaImage::from_fn(tile_size, tile_size, |px, py| {
        Rgba([
            (tile.x as u32 * 40 + px) as u8,
            (tile.y as u32 * 70 + py) as u8,
            (tile.z as u32 * 10) as u8,
            255,
        ])
    })
}

pub fn tile_color(tile: Tile) -> Rgba<u8> {
    *tile_image(tile, 1).get_pixel(0, 0)
}

pub fn encode_png(image: &RgbaImage) -> Vec<u8> {
    let mut data = std::io::Cursor::new(Vec::new());
    image.write_to(&mut data, ImageFormat::Png).expect("png encoding");
    data.into_inner()
}

pub fn tile_png(tile: Tile, tile_size: u32) -> Vec<u8> {
    encode_png(&tile_image(tile, tile_size))
}

/// In memory tile server, unknown urls result in a 404
#[derive(Default)]
pub struct MemoryTransport {
    responses: HashMap<String, Result<Vec<u8>, FetchError>>,
    requests: Mutex<Vec<String>>,
}

impl MemoryTransport {
    pub fn with_tiles(source: &TileSource, tiles: impl IntoIterator<Item = Tile>, tile_size: u32) -> Self {
        let mut transport = MemoryTransport::default();
        for tile in tiles {
            transport.insert(source.tile_url(tile), tile_png(tile, tile_size));
        }
        transport
    }

    pub fn insert(&mut self, url: String, data: Vec<u8>) {
        self.responses.insert(url, Ok(data));
    }

    pub fn fail(&mut self, url: String, error: FetchError) {
        self.responses.insert(url, Err(error));
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("poisoned").clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("poisoned").len()
    }
}

impl TileTransport for MemoryTransport {
    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.requests.lock().expect("poisoned").push(url.to_string());
        self.responses.get(url).cloned().unwrap_or(Err(FetchError::HttpStatus(404)))
    }
}
