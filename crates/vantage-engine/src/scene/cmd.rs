use std::ops::Range;

use glam::Mat4;
use vantage_world::{GridRect, TileId};

use crate::device::{GeometryId, ProgramId};

/// One batched tile-layer draw over the whole grid view.
#[derive(Debug, Clone, PartialEq)]
pub struct TilesCmd {
    pub program: ProgramId,
    pub geometry: GeometryId,
    /// `projection * view * model`.
    pub mvp: Mat4,
    pub grid: GridRect,
    /// Range of per-cell atlas indices inside [`DrawList::tile_data`](super::DrawList::tile_data).
    pub cells: Range<usize>,
}

/// One object drawn as a single atlas tile.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteCmd {
    pub program: ProgramId,
    pub geometry: GeometryId,
    pub mvp: Mat4,
    pub tile: TileId,
}

/// Grain overlay covering the view.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseCmd {
    pub program: ProgramId,
    pub geometry: GeometryId,
    pub mvp: Mat4,
    pub time: f32,
    pub mean_offset: f32,
    /// Premultiplied overlay color.
    pub color: [f32; 4],
}

/// Device-agnostic draw command stream for one framebuffer.
///
/// Extending:
/// - add a command struct and variant here
/// - add a `ProgramKind` and a shader in `device/shaders`
/// - handle the variant in every `GraphicsDevice::execute`
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    Tiles(TilesCmd),
    Sprite(SpriteCmd),
    Noise(NoiseCmd),
}

impl DrawCmd {
    pub fn program(&self) -> ProgramId {
        match self {
            DrawCmd::Tiles(c) => c.program,
            DrawCmd::Sprite(c) => c.program,
            DrawCmd::Noise(c) => c.program,
        }
    }

    pub fn geometry(&self) -> GeometryId {
        match self {
            DrawCmd::Tiles(c) => c.geometry,
            DrawCmd::Sprite(c) => c.geometry,
            DrawCmd::Noise(c) => c.geometry,
        }
    }

    pub fn mvp(&self) -> Mat4 {
        match self {
            DrawCmd::Tiles(c) => c.mvp,
            DrawCmd::Sprite(c) => c.mvp,
            DrawCmd::Noise(c) => c.mvp,
        }
    }
}
