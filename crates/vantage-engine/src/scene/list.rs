use glam::{Mat4, UVec2};
use vantage_world::{GridRect, TileId};

use crate::device::{AtlasLayout, GeometryId, ProgramId, TextureId};
use crate::paint::Color;

use super::cmd::{DrawCmd, NoiseCmd, SpriteCmd, TilesCmd};

/// Atlas texture bound for the whole frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TilesetBinding {
    pub texture: TextureId,
    pub layout: AtlasLayout,
}

/// Recorded frame: clear, viewport, bound atlas, then commands in draw order.
///
/// Commands execute in push order (back-to-front). `clear()` keeps allocated
/// capacity, so a list owned by a render request stops allocating once warm.
#[derive(Debug, Default)]
pub struct DrawList {
    viewport: UVec2,
    clear_color: Color,
    tileset: Option<TilesetBinding>,
    items: Vec<DrawCmd>,
    /// Per-cell atlas indices for every `TilesCmd`, concatenated.
    tile_data: Vec<u32>,
}

impl DrawList {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new frame. Keeps allocated capacity for reuse.
    pub fn begin(&mut self, viewport: UVec2, clear_color: Color, tileset: Option<TilesetBinding>) {
        self.viewport = viewport;
        self.clear_color = clear_color;
        self.tileset = tileset;
        self.items.clear();
        self.tile_data.clear();
    }

    #[inline]
    pub fn viewport(&self) -> UVec2 {
        self.viewport
    }

    #[inline]
    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    #[inline]
    pub fn tileset(&self) -> Option<TilesetBinding> {
        self.tileset
    }

    #[inline]
    pub fn items(&self) -> &[DrawCmd] {
        &self.items
    }

    #[inline]
    pub fn tile_data(&self) -> &[u32] {
        &self.tile_data
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Records a tile-layer draw; `cells` must hold `grid.cell_count()` indices.
    pub fn push_tiles(
        &mut self,
        program: ProgramId,
        geometry: GeometryId,
        mvp: Mat4,
        grid: GridRect,
        cells: &[u32],
    ) {
        debug_assert_eq!(cells.len(), grid.cell_count(), "tile data does not match grid");
        let start = self.tile_data.len();
        self.tile_data.extend_from_slice(cells);
        self.items.push(DrawCmd::Tiles(TilesCmd {
            program,
            geometry,
            mvp,
            grid,
            cells: start..self.tile_data.len(),
        }));
    }

    pub fn push_sprite(&mut self, program: ProgramId, geometry: GeometryId, mvp: Mat4, tile: TileId) {
        self.items.push(DrawCmd::Sprite(SpriteCmd { program, geometry, mvp, tile }));
    }

    pub fn push_noise(&mut self, cmd: NoiseCmd) {
        self.items.push(DrawCmd::Noise(cmd));
    }

    /// Number of recorded commands per kind: `(tiles, sprites, noise)`.
    pub fn counts(&self) -> (usize, usize, usize) {
        self.items.iter().fold((0, 0, 0), |(t, s, n), cmd| match cmd {
            DrawCmd::Tiles(_) => (t + 1, s, n),
            DrawCmd::Sprite(_) => (t, s + 1, n),
            DrawCmd::Noise(_) => (t, s, n + 1),
        })
    }
}
