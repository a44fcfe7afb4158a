//! CPU rasterizer implementing [`GraphicsDevice`].
//!
//! Replays the same [`DrawList`] the wgpu device consumes, one pixel at a
//! time: every pixel center inside a command's projected bounds is mapped back
//! into model space through the inverse transform, then shaded exactly like
//! the WGSL programs do. Used for tests and for hosts without a GPU.

use anyhow::{Context, Result};
use glam::{Mat4, Vec2, Vec3, Vec4};
use image::RgbaImage;
use slotmap::SlotMap;
use vantage_world::EMPTY_TILE;

use crate::coords::Resolution;
use crate::scene::{DrawCmd, DrawList, TilesetBinding};

use super::graphics::{pack_bgra, GraphicsDevice};
use super::types::{
    FramebufferId, GeometryDesc, GeometryId, ProgramId, ProgramKind, TextureData, TextureId,
};

/// Grain hash shared with `shaders/noise.wgsl`.
#[inline]
pub fn grain(p: Vec2, time: f32) -> f32 {
    let v = (p.dot(Vec2::new(12.9898, 78.233)) + time).sin() * 43758.5453;
    v - v.floor()
}

struct Canvas {
    width: u32,
    height: u32,
    /// Premultiplied RGBA, row 0 at the top.
    pixels: Vec<Vec4>,
}

impl Canvas {
    fn blend(&mut self, x: u32, y: u32, src: Vec4) {
        let i = y as usize * self.width as usize + x as usize;
        let dst = self.pixels[i];
        self.pixels[i] = src + dst * (1.0 - src.w);
    }
}

#[derive(Default)]
pub struct SoftwareDevice {
    textures: SlotMap<TextureId, RgbaImage>,
    programs: SlotMap<ProgramId, ProgramKind>,
    geometries: SlotMap<GeometryId, GeometryDesc>,
    framebuffers: SlotMap<FramebufferId, Canvas>,
}

impl SoftwareDevice {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GraphicsDevice for SoftwareDevice {
    fn name(&self) -> &str {
        "software"
    }

    fn create_texture(&mut self, data: &TextureData) -> Result<TextureId> {
        let image = RgbaImage::from_raw(data.width, data.height, data.pixels.clone())
            .with_context(|| {
                format!(
                    "texture data is {} bytes, expected {}x{} RGBA8",
                    data.pixels.len(),
                    data.width,
                    data.height
                )
            })?;
        Ok(self.textures.insert(image))
    }

    fn destroy_texture(&mut self, id: TextureId) {
        self.textures.remove(id);
    }

    fn create_program(&mut self, kind: ProgramKind) -> Result<ProgramId> {
        Ok(self.programs.insert(kind))
    }

    fn destroy_program(&mut self, id: ProgramId) {
        self.programs.remove(id);
    }

    fn create_geometry(&mut self, desc: GeometryDesc) -> Result<GeometryId> {
        if let GeometryDesc::Grid { cols, rows } = desc {
            anyhow::ensure!(cols > 0 && rows > 0, "grid geometry must have cells");
        }
        Ok(self.geometries.insert(desc))
    }

    fn destroy_geometry(&mut self, id: GeometryId) {
        self.geometries.remove(id);
    }

    fn create_framebuffer(&mut self, size: Resolution) -> Result<FramebufferId> {
        Ok(self.framebuffers.insert(Canvas {
            width: size.width(),
            height: size.height(),
            pixels: vec![Vec4::ZERO; size.area()],
        }))
    }

    fn destroy_framebuffer(&mut self, id: FramebufferId) {
        self.framebuffers.remove(id);
    }

    fn execute(&mut self, target: FramebufferId, list: &DrawList) -> Result<()> {
        let canvas = self.framebuffers.get_mut(target).context("unknown framebuffer")?;
        canvas.pixels.fill(Vec4::from(list.clear_color().to_array()));

        let atlas = match list.tileset() {
            Some(binding) => Some((
                self.textures
                    .get(binding.texture)
                    .context("draw list binds an unknown atlas texture")?,
                binding,
            )),
            None => None,
        };

        let viewport = (
            list.viewport().x.clamp(1, canvas.width),
            list.viewport().y.clamp(1, canvas.height),
        );

        for cmd in list.items() {
            let kind = *self
                .programs
                .get(cmd.program())
                .context("draw command uses an unknown program")?;
            let desc = *self
                .geometries
                .get(cmd.geometry())
                .context("draw command uses an unknown geometry")?;
            check_program(cmd, kind)?;

            let extent = match desc {
                GeometryDesc::Quad => 1.0,
                GeometryDesc::Grid { .. } => 0.5,
            };
            rasterize(canvas, viewport, cmd.mvp(), extent, |px, local| {
                shade(cmd, list, atlas, px, local)
            });
        }
        Ok(())
    }

    fn read_pixels(&mut self, target: FramebufferId, out: &mut [u32]) -> Result<()> {
        let canvas = self.framebuffers.get(target).context("unknown framebuffer")?;
        anyhow::ensure!(
            out.len() == canvas.pixels.len(),
            "readback buffer holds {} pixels, framebuffer has {}",
            out.len(),
            canvas.pixels.len()
        );
        for (dst, c) in out.iter_mut().zip(&canvas.pixels) {
            let q = (c.clamp(Vec4::ZERO, Vec4::ONE) * 255.0).round();
            *dst = pack_bgra(q.x as u8, q.y as u8, q.z as u8, q.w as u8);
        }
        Ok(())
    }
}

fn check_program(cmd: &DrawCmd, kind: ProgramKind) -> Result<()> {
    let expected = match cmd {
        DrawCmd::Tiles(_) => ProgramKind::Tiles,
        DrawCmd::Sprite(_) => ProgramKind::Sprite,
        DrawCmd::Noise(_) => ProgramKind::Noise,
    };
    anyhow::ensure!(kind == expected, "{expected:?} command bound to a {kind:?} program");
    Ok(())
}

/// Visits every pixel whose center falls inside the model-space square
/// `[-extent, extent)²` transformed by `mvp`. Primitives outside the `[0, 1]`
/// depth range are clipped like on the GPU.
fn rasterize(
    canvas: &mut Canvas,
    (vw, vh): (u32, u32),
    mvp: Mat4,
    extent: f32,
    mut shade: impl FnMut(Vec2, Vec2) -> Option<Vec4>,
) {
    if mvp.determinant().abs() <= f32::EPSILON {
        return;
    }
    let inv = mvp.inverse();
    let to_px = |ndc: Vec3| Vec2::new((ndc.x + 1.0) * 0.5 * vw as f32, (1.0 - ndc.y) * 0.5 * vh as f32);

    let (mut lo, mut hi) = (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY));
    for corner in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
        let p = to_px(mvp.project_point3(Vec3::new(corner.0 * extent, corner.1 * extent, 0.0)));
        lo = lo.min(p);
        hi = hi.max(p);
    }
    let x0 = lo.x.floor().max(0.0) as u32;
    let y0 = lo.y.floor().max(0.0) as u32;
    let x1 = (hi.x.ceil().max(0.0) as u32).min(vw);
    let y1 = (hi.y.ceil().max(0.0) as u32).min(vh);

    // Every primitive is parallel to the screen, so one depth clips it whole.
    let z_ndc = mvp.project_point3(Vec3::ZERO).z;
    if !(0.0..=1.0).contains(&z_ndc) {
        return;
    }
    for y in y0..y1 {
        for x in x0..x1 {
            let center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let ndc = Vec3::new(
                center.x / vw as f32 * 2.0 - 1.0,
                1.0 - center.y / vh as f32 * 2.0,
                z_ndc,
            );
            let local = inv.project_point3(ndc).truncate();
            if local.x < -extent || local.y < -extent || local.x >= extent || local.y >= extent {
                continue;
            }
            if let Some(src) = shade(center, local) {
                canvas.blend(x, y, src);
            }
        }
    }
}

/// Fragment stage. `None` discards.
fn shade(
    cmd: &DrawCmd,
    list: &DrawList,
    atlas: Option<(&RgbaImage, TilesetBinding)>,
    px: Vec2,
    local: Vec2,
) -> Option<Vec4> {
    match cmd {
        DrawCmd::Tiles(t) => {
            let dims = Vec2::new(t.grid.cols as f32, t.grid.rows as f32);
            let unit = (local + Vec2::splat(0.5)) * dims;
            let i = (unit.x.floor() as u32).min(t.grid.cols - 1);
            let j = (unit.y.floor() as u32).min(t.grid.rows - 1);
            let cell = list.tile_data()[t.cells.start + (j * t.grid.cols + i) as usize];
            if cell == EMPTY_TILE {
                return None;
            }
            let in_cell = unit - Vec2::new(i as f32, j as f32);
            sample_tile(atlas, cell, Vec2::new(in_cell.x, 1.0 - in_cell.y))
        }
        DrawCmd::Sprite(s) => {
            let unit = (local + Vec2::ONE) * 0.5;
            sample_tile(atlas, s.tile.0, Vec2::new(unit.x, 1.0 - unit.y))
        }
        DrawCmd::Noise(n) => {
            let a = (n.mean_offset + grain(px.floor(), n.time) - 0.5).clamp(0.0, 1.0);
            Some(Vec4::from(n.color) * a)
        }
    }
}

/// Nearest sample of `tile` at `uv` (origin top-left), premultiplied.
fn sample_tile(atlas: Option<(&RgbaImage, TilesetBinding)>, tile: u32, uv: Vec2) -> Option<Vec4> {
    let (image, binding) = atlas?;
    let layout = binding.layout;
    let origin = layout.tile_origin(tile)?.as_vec2();
    let size = Vec2::from(layout.tile_size.map(|v| v as f32));
    let texel = (origin + uv * size).clamp(origin + Vec2::splat(0.5), origin + size - Vec2::splat(0.5));

    let x = (texel.x.floor() as u32).min(image.width().saturating_sub(1));
    let y = (texel.y.floor() as u32).min(image.height().saturating_sub(1));
    let [r, g, b, a] = image.get_pixel(x, y).0;
    let c = Vec4::new(r as f32, g as f32, b as f32, a as f32) / 255.0;
    if c.w <= 0.0 {
        return None;
    }
    Some(Vec4::new(c.x * c.w, c.y * c.w, c.z * c.w, c.w))
}
