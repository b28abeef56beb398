//! On-disk layout of downloaded tiles.

use std::path::{Path, PathBuf};

use crate::coord::TileId;

/// Default tile file extension.
pub const DEFAULT_TILE_EXTENSION: &str = "png";

/// Maps tiles to `<root>/<zoom>/<x>/<y>.<extension>`.
///
/// The presence of a file at [`path_for`](Self::path_for) is the only marker
/// that a tile has been downloaded; no checksum or metadata files are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    root: PathBuf,
    extension: String,
}

impl StorageLayout {
    /// Creates a layout rooted at `root` using the default `png` extension.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_extension(root, DEFAULT_TILE_EXTENSION)
    }

    /// Creates a layout with a custom file extension (a leading `.` is ignored).
    #[must_use]
    pub fn with_extension(root: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            root: root.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Target file for `tile`.
    #[must_use]
    pub fn path_for(&self, tile: &TileId) -> PathBuf {
        self.root
            .join(tile.zoom.to_string())
            .join(tile.x.to_string())
            .join(format!("{}.{}", tile.y, self.extension))
    }
}

/// One planned unit of work: a tile and where it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileTask {
    tile: TileId,
    path: PathBuf,
}

impl TileTask {
    #[must_use]
    pub fn new(tile: TileId, layout: &StorageLayout) -> Self {
        Self {
            path: layout.path_for(&tile),
            tile,
        }
    }

    #[must_use]
    pub fn tile(&self) -> TileId {
        self.tile
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_for_uses_zoom_x_y_hierarchy() {
        let layout = StorageLayout::new("tiles");
        let path = layout.path_for(&TileId::new(6, 39, 24));
        assert_eq!(path, PathBuf::from("tiles").join("6").join("39").join("24.png"));
    }

    #[test]
    fn test_custom_extension_strips_leading_dot() {
        let layout = StorageLayout::with_extension("/data/tiles", ".jpg");
        assert_eq!(layout.extension(), "jpg");
        assert!(
            layout
                .path_for(&TileId::new(3, 1, 2))
                .to_string_lossy()
                .ends_with("2.jpg")
        );
    }

    #[test]
    fn test_task_carries_layout_path() {
        let layout = StorageLayout::new("out");
        let task = TileTask::new(TileId::new(1, 0, 1), &layout);
        assert_eq!(task.tile(), TileId::new(1, 0, 1));
        assert_eq!(task.path(), layout.path_for(&TileId::new(1, 0, 1)).as_path());
    }
}
