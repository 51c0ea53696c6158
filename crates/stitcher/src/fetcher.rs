use std::future::Future;

use geo::Tile;
use thiserror::Error;

use crate::{DirectoryTileCache, TileImage, TileSource, TileTransport};

/// Reasons a single tile could not be obtained, these never abort a stitch run
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request timed out")]
    Timeout,
    #[error("HTTP status {0}")]
    HttpStatus(u16),
    #[error("Invalid tile image: {0}")]
    Decode(String),
    #[error("Invalid tile url: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Failures that might succeed when the request is repeated
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Network(_) | FetchError::Timeout => true,
            FetchError::HttpStatus(status) => *status == 429 || *status >= 500,
            FetchError::Decode(_) | FetchError::InvalidUrl(_) => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileOrigin {
    Cache,
    Network,
}

#[derive(Debug, Clone)]
pub struct FetchedTile {
    pub image: TileImage,
    pub origin: TileOrigin,
}

/// Obtains the decoded image of a tile.
/// Implementations only return data, placing it on the canvas is up to the caller.
pub trait TileFetcher: Send + Sync {
    fn fetch(&self, tile: Tile) -> impl Future<Output = Result<FetchedTile, FetchError>> + Send;
}

/// Fetches tiles from a [`TileSource`], optionally reading through a [`DirectoryTileCache`]
pub struct SourceTileFetcher<T: TileTransport> {
    source: TileSource,
    transport: T,
    cache: Option<DirectoryTileCache>,
    tile_size: u32,
}

impl<T: TileTransport> SourceTileFetcher<T> {
    pub fn new(source: TileSource, transport: T, tile_size: u32) -> Self {
        SourceTileFetcher {
            source,
            transport,
            cache: None,
            tile_size,
        }
    }

    pub fn with_cache(mut self, cache: DirectoryTileCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn cached_tile(&self, cache: &DirectoryTileCache, tile: Tile) -> Option<TileImage> {
        let data = cache.get(tile).await?;
        match TileImage::decode(&data, self.tile_size) {
            Ok(image) => Some(image),
            Err(e) => {
                log::warn!("Ignoring invalid cached tile {tile}: {e}");
                None
            }
        }
    }
}

impl<T: TileTransport> TileFetcher for SourceTileFetcher<T> {
    async fn fetch(&self, tile: Tile) -> Result<FetchedTile, FetchError> {
        if let Some(cache) = &self.cache {
            if let Some(image) = self.cached_tile(cache, tile).await {
                log::trace!("Tile {tile} served from cache");
                return Ok(FetchedTile {
                    image,
                    origin: TileOrigin::Cache,
                });
            }
        }

        let url = self.source.tile_url(tile);
        log::debug!("Fetching tile {tile} from {url}");
        let data = self.transport.get(&url).await?;
        let image = TileImage::decode(&data, self.tile_size)?;

        if let Some(cache) = &self.cache {
            // caching is best effort, the tile itself is valid
            if let Err(e) = cache.put(tile, data).await {
                log::warn!("Failed to cache tile {tile}: {e}");
            }
        }

        Ok(FetchedTile {
            image,
            origin: TileOrigin::Network,
        })
    }
}
