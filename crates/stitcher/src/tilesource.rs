use geo::Tile;

use crate::{Error, Result};

pub const OPENSTREETMAP_URL_TEMPLATE: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.{ext}";

/// Location of the tiles of a slippy map tile server
///
/// The url template contains `{z}`, `{x}` and `{y}` placeholders and optionally `{ext}`
/// which is replaced by the file extension of the tiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSource {
    url_template: String,
    extension: String,
}

impl TileSource {
    pub fn new(url_template: impl Into<String>, extension: impl Into<String>) -> Result<Self> {
        let url_template = url_template.into();
        let extension = extension.into();

        for placeholder in ["{z}", "{x}", "{y}"] {
            if !url_template.contains(placeholder) {
                return Err(Error::Config(format!(
                    "Tile url template '{url_template}' is missing the {placeholder} placeholder"
                )));
            }
        }

        // The extension ends up in the cache file names
        if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::Config(format!("Invalid tile extension: '{extension}'")));
        }

        let source = TileSource { url_template, extension };
        let sample = source.tile_url(Tile::default());
        if let Err(e) = reqwest::Url::parse(&sample) {
            return Err(Error::Config(format!(
                "Tile url template '{}' does not produce a valid url ({sample}): {e}",
                source.url_template
            )));
        }

        Ok(source)
    }

    pub fn openstreetmap() -> Self {
        TileSource {
            url_template: OPENSTREETMAP_URL_TEMPLATE.to_string(),
            extension: "png".to_string(),
        }
    }

    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn tile_url(&self, tile: Tile) -> String {
        self.url_template
            .replace("{z}", &tile.z().to_string())
            .replace("{x}", &tile.x().to_string())
            .replace("{y}", &tile.y().to_string())
            .replace("{ext}", &self.extension)
    }
}

impl Default for TileSource {
    fn default() -> Self {
        TileSource::openstreetmap()
    }
}
