use bytemuck::{Pod, Zeroable};
use glam::UVec2;

slotmap::new_key_type! {
    /// Texture owned by a [`GraphicsDevice`](super::GraphicsDevice).
    pub struct TextureId;
    /// Compiled program (shader pipeline).
    pub struct ProgramId;
    /// Vertex/index geometry.
    pub struct GeometryId;
    /// Off-screen color target.
    pub struct FramebufferId;
}

/// The three programs the layer passes draw with.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    /// Batched tile grid; one draw per tile layer.
    Tiles,
    /// Single atlas tile on a quad; one draw per object.
    Sprite,
    /// Full-view grain overlay.
    Noise,
}

/// Geometry construction parameters; identical descriptors share one geometry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum GeometryDesc {
    /// Quad spanning `[-1, 1]²`.
    Quad,
    /// `cols × rows` cells spanning `[-0.5, 0.5]²`, one quad per cell.
    Grid { cols: u32, rows: u32 },
}

/// Straight-alpha RGBA8 pixels for a new texture.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl TextureData {
    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }
}

/// Where tiles live inside the atlas texture.
///
/// Uploaded as a uniform block for the tile and sprite programs; the layout
/// must match `struct Atlas` in `shaders/common.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct AtlasLayout {
    pub tile_size: [u32; 2],
    pub atlas_size: [u32; 2],
    /// Gap between neighbouring tiles.
    pub margin: u32,
    /// Padding between the atlas edge and the first row/column.
    pub border: u32,
    pub tiles_per_row: u32,
    pub tile_count: u32,
}

impl AtlasLayout {
    /// Top-left pixel of `tile`, or `None` when the atlas has no such tile.
    pub fn tile_origin(&self, tile: u32) -> Option<UVec2> {
        if tile >= self.tile_count || self.tiles_per_row == 0 {
            return None;
        }
        let col = tile % self.tiles_per_row;
        let row = tile / self.tiles_per_row;
        let stride = UVec2::from(self.tile_size) + UVec2::splat(self.margin);
        Some(UVec2::splat(self.border) + UVec2::new(col, row) * stride)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_origin_accounts_for_border_and_margin() {
        let layout = AtlasLayout {
            tile_size: [8, 8],
            atlas_size: [64, 64],
            margin: 2,
            border: 1,
            tiles_per_row: 4,
            tile_count: 6,
        };
        assert_eq!(layout.tile_origin(0), Some(UVec2::new(1, 1)));
        assert_eq!(layout.tile_origin(5), Some(UVec2::new(11, 11)));
        assert_eq!(layout.tile_origin(6), None);
    }
}
