use std::path::PathBuf;

use glam::UVec2;

/// Index of a tile in the packed atlas.
///
/// Tiles are numbered row-major across every sheet of the tileset, in sheet
/// order: the first tile of sheet `n` follows the last tile of sheet `n - 1`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(pub u32);

/// Marker written by [`TileLayer::tile_offsets`](crate::TileLayer::tile_offsets)
/// for cells without a tile.
pub const EMPTY_TILE: u32 = u32::MAX;

/// Source image for a run of tiles.
#[derive(Debug, Clone, PartialEq)]
pub enum TileSheet {
    /// Image file decoded by the renderer when the atlas is first built.
    File(PathBuf),
    /// Straight-alpha RGBA8 pixels, `width * height * 4` bytes.
    Rgba {
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    },
}

/// Tileset table: every sheet shares one tile size and margin.
#[derive(Debug, Clone, PartialEq)]
pub struct Tileset {
    /// Cache key for the atlas texture. Worlds with the same name share one atlas.
    pub name: String,
    /// Tile size in pixels.
    pub tile_size: UVec2,
    /// Gap in pixels between neighbouring tiles inside a sheet.
    pub margin: u32,
    pub sheets: Vec<TileSheet>,
}

impl Tileset {
    pub fn new(name: impl Into<String>, tile_size: UVec2) -> Self {
        Self {
            name: name.into(),
            tile_size,
            margin: 0,
            sheets: Vec::new(),
        }
    }

    pub fn with_margin(mut self, margin: u32) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_sheet(mut self, sheet: TileSheet) -> Self {
        self.sheets.push(sheet);
        self
    }
}
