//! Layer passes: tiles, then objects, then the noise overlay.
//!
//! Each pass only records into the frame's [`DrawList`]; nothing here talks to
//! the device.

use glam::{Mat4, Quat, Vec3};
use vantage_world::{World, WorldObject};

use crate::coords::{GridRect, Rect};
use crate::device::{GeometryId, ProgramId};
use crate::scene::{DrawList, NoiseCmd};
use crate::time::NoiseClock;

use super::view::OBJECT_DEPTH;

/// Grain overlay configuration.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NoiseSettings {
    pub enabled: bool,
    /// Straight 8-bit RGBA.
    pub color: [u8; 4],
    /// Multiplier on the per-frame time step.
    pub speed: f32,
    /// Added to the grain before clamping; raises or lowers overall coverage.
    pub mean_offset: f32,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            color: [255, 255, 255, 255],
            speed: 1.0,
            mean_offset: 0.0,
        }
    }
}

/// Programs a request draws with, acquired once at init.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LayerPrograms {
    pub tiles: ProgramId,
    pub sprite: ProgramId,
    pub noise: ProgramId,
}

/// One batched draw per tile layer, in world order.
///
/// The unit grid geometry is scaled to `grid` and centered on it.
pub fn tile_pass(
    list: &mut DrawList,
    world: &World,
    program: ProgramId,
    grid_geometry: GeometryId,
    view_proj: Mat4,
    grid: GridRect,
    scratch: &mut Vec<u32>,
) {
    let model = Mat4::from_translation(grid.center().extend(0.0))
        * Mat4::from_scale(Vec3::new(grid.cols as f32, grid.rows as f32, 1.0));
    let mvp = view_proj * model;

    for layer in world.tile_layers() {
        layer.tile_offsets(grid, scratch);
        list.push_tiles(program, grid_geometry, mvp, grid, scratch);
    }
}

/// One sprite per object overlapping `view`, after every tile layer.
pub fn object_pass(
    list: &mut DrawList,
    world: &World,
    program: ProgramId,
    quad: GeometryId,
    view_proj: Mat4,
    view: Rect,
) {
    for layer in world.object_layers() {
        for object in layer.query(view) {
            list.push_sprite(program, quad, view_proj * object_model(object), object.tile());
        }
    }
}

/// `T(position, OBJECT_DEPTH) * R_z(facing) * S(half_size)` for the `[-1, 1]²`
/// quad. Objects without a facing are drawn unrotated.
pub fn object_model(object: &dyn WorldObject) -> Mat4 {
    let rotation = object
        .facing()
        .map_or(Quat::IDENTITY, |f| Quat::from_rotation_z(f.direction().angle()));
    let half = object.half_size();
    Mat4::from_scale_rotation_translation(
        Vec3::new(half, half, 1.0),
        rotation,
        object.position().extend(OBJECT_DEPTH),
    )
}

/// Noise overlay over the whole view. Advances `clock` only when enabled.
#[allow(clippy::too_many_arguments)]
pub fn effect_pass(
    list: &mut DrawList,
    program: ProgramId,
    quad: GeometryId,
    view_proj: Mat4,
    view: Rect,
    noise: &NoiseSettings,
    clock: &mut NoiseClock,
    color: [f32; 4],
) {
    if !noise.enabled {
        return;
    }
    let time = clock.tick(noise.speed);
    let half = view.size * 0.5;
    let model = Mat4::from_translation(view.center().extend(0.0))
        * Mat4::from_scale(Vec3::new(half.x, half.y, 1.0));

    list.push_noise(NoiseCmd {
        program,
        geometry: quad,
        mvp: view_proj * model,
        time,
        mean_offset: noise.mean_offset,
        color,
    });
}
