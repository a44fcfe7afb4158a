use anyhow::Result;

use crate::coords::Resolution;
use crate::scene::DrawList;

use super::types::{
    FramebufferId, GeometryDesc, GeometryId, ProgramId, ProgramKind, TextureData, TextureId,
};

/// Low-level device seam used by the resource managers and render requests.
///
/// Implementations own their GPU objects in slot maps and hand out keys.
/// Callers never construct shared objects directly; they go through the
/// managers on [`Renderer`](crate::render::Renderer), which call into here on
/// cache misses only.
///
/// Every error returned from here is treated as fatal for the current
/// `init`/`draw` call: partial GPU state cannot be trusted afterwards.
pub trait GraphicsDevice {
    /// Human-readable backend name for logs.
    fn name(&self) -> &str;

    fn create_texture(&mut self, data: &TextureData) -> Result<TextureId>;
    fn destroy_texture(&mut self, id: TextureId);

    fn create_program(&mut self, kind: ProgramKind) -> Result<ProgramId>;
    fn destroy_program(&mut self, id: ProgramId);

    fn create_geometry(&mut self, desc: GeometryDesc) -> Result<GeometryId>;
    fn destroy_geometry(&mut self, id: GeometryId);

    fn create_framebuffer(&mut self, size: Resolution) -> Result<FramebufferId>;
    fn destroy_framebuffer(&mut self, id: FramebufferId);

    /// Clears `target` and replays `list` into it. Blocks until recorded.
    fn execute(&mut self, target: FramebufferId, list: &DrawList) -> Result<()>;

    /// Copies the color contents of `target` into `out`, one `u32` per pixel,
    /// premultiplied BGRA8 in little-endian byte order, row 0 at the top.
    ///
    /// `out.len()` must equal the framebuffer's pixel count.
    fn read_pixels(&mut self, target: FramebufferId, out: &mut [u32]) -> Result<()>;
}

/// Packs premultiplied 8-bit channels into the readback pixel format.
#[inline]
pub const fn pack_bgra(r: u8, g: u8, b: u8, a: u8) -> u32 {
    u32::from_le_bytes([b, g, r, a])
}
