use std::io::Write;
use std::path::PathBuf;

use geo::Tile;

use crate::{Error, Result};

/// Stores the encoded tile data in a flat directory, one `{z}_{x}_{y}.{ext}` file per tile
#[derive(Debug, Clone)]
pub struct DirectoryTileCache {
    dir: PathBuf,
    extension: String,
}

impl DirectoryTileCache {
    pub fn new(dir: impl Into<PathBuf>, extension: &str) -> Self {
        DirectoryTileCache {
            dir: dir.into(),
            extension: extension.to_string(),
        }
    }

    pub fn tile_path(&self, tile: Tile) -> PathBuf {
        self.dir
            .join(format!("{}_{}_{}.{}", tile.z(), tile.x(), tile.y(), self.extension))
    }

    /// Returns the cached data of the tile, `None` when the tile is not cached or cannot be read
    pub async fn get(&self, tile: Tile) -> Option<Vec<u8>> {
        let path = self.tile_path(tile);
        match tokio::fs::read(&path).await {
            Ok(data) => Some(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                log::warn!("Failed to read cached tile {}: {e}", path.to_string_lossy());
                None
            }
        }
    }

    /// Stores the tile data, an existing entry is replaced
    pub async fn put(&self, tile: Tile, data: Vec<u8>) -> Result {
        let path = self.tile_path(tile);
        tokio::task::spawn_blocking(move || {
            inf::fs::write_atomically::<Error>(&path, |writer| {
                writer.write_all(&data)?;
                Ok(())
            })
        })
        .await
        .map_err(|e| Error::Runtime(format!("Tile cache write task failed: {e}")))?
    }

    pub async fn remove(&self, tile: Tile) -> Result {
        match tokio::fs::remove_file(self.tile_path(tile)).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_paths() {
        let cache = DirectoryTileCache::new("downloaded_tiles", "png");
        assert_eq!(
            cache.tile_path(Tile { x: 65302, y: 47211, z: 17 }),
            std::path::Path::new("downloaded_tiles").join("17_65302_47211.png")
        );
    }

    #[test_log::test(tokio::test)]
    async fn store_and_retrieve() -> Result {
        let dir = tempfile::tempdir()?;
        let cache = DirectoryTileCache::new(dir.path().join("tiles"), "png");
        let tile = Tile { x: 1, y: 2, z: 3 };

        assert_eq!(cache.get(tile).await, None);

        cache.put(tile, vec![1, 2, 3]).await?;
        assert!(cache.tile_path(tile).exists());
        assert_eq!(cache.get(tile).await, Some(vec![1, 2, 3]));
        assert_eq!(cache.get(Tile { x: 2, y: 1, z: 3 }).await, None);

        cache.remove(tile).await?;
        assert_eq!(cache.get(tile).await, None);
        cache.remove(tile).await?;
        Ok(())
    }
}
