//! Camera transforms and the padded tile grid.

use glam::{Mat4, Vec2, Vec3};

use crate::coords::{GridRect, Rect};

pub const NEAR: f32 = 0.1;
pub const FAR: f32 = 100.0;
pub const FORWARD: Vec3 = Vec3::NEG_Z;
pub const UP: Vec3 = Vec3::Y;

/// Smallest accepted view extent in world units, per axis.
pub const MIN_VIEW_SIZE: f32 = 1e-3;
/// Largest accepted view extent in world units, per axis. Bounds the tile
/// grid geometry at 514×514 cells.
pub const MAX_VIEW_SIZE: f32 = 512.0;

/// Depth offset of object sprites above the tile plane.
pub const OBJECT_DEPTH: f32 = 0.01;

/// Camera altitudes that keep both the tile plane and object sprites inside
/// `[NEAR, FAR]`. Exclusive at both ends.
pub const ALTITUDE_RANGE: (f32, f32) = (NEAR + OBJECT_DEPTH, FAR);

/// Whether a camera at altitude `z` sees the tile plane and the sprites.
pub fn altitude_in_range(z: f32) -> bool {
    z > ALTITUDE_RANGE.0 && z < ALTITUDE_RANGE.1
}

/// Orthographic projection centered on the camera.
pub fn projection(size: Vec2) -> Mat4 {
    let half = size * 0.5;
    Mat4::orthographic_rh(-half.x, half.x, -half.y, half.y, NEAR, FAR)
}

/// Look-at view from `eye` down the forward axis.
pub fn view(eye: Vec3) -> Mat4 {
    Mat4::look_at_rh(eye, eye + FORWARD, UP)
}

/// World rectangle covered by a camera at `center` with extent `size`.
pub fn view_rect(center: Vec3, size: Vec2) -> Rect {
    Rect::from_center_size(center.truncate(), size)
}

/// Grid dimensions for a view size: even, with one tile of padding per side.
pub fn grid_dims(size: Vec2) -> (u32, u32) {
    let axis = |v: f32| ((v * 0.5).ceil() as u32).saturating_mul(2).saturating_add(2);
    (axis(size.x), axis(size.y))
}

/// Integer tile rectangle rendered this frame for a camera at `center`.
///
/// Anchored on the tile containing the camera, so it covers the view rect for
/// any fractional position.
pub fn grid_view(center: Vec3, (cols, rows): (u32, u32)) -> GridRect {
    let x = center.x.floor() as i32 - (cols / 2) as i32;
    let y = center.y.floor() as i32 - (rows / 2) as i32;
    GridRect::new(x, y, cols, rows)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::Vec4;

    use super::*;

    // ── transforms ──────────────────────────────────────────────────────────

    #[test]
    fn view_rect_corners_map_to_ndc_corners() {
        let eye = Vec3::new(3.5, -2.0, 10.0);
        let size = Vec2::new(8.0, 4.0);
        let vp = projection(size) * view(eye);

        let rect = view_rect(eye, size);
        let lo = vp * Vec4::new(rect.min().x, rect.min().y, 0.0, 1.0);
        let hi = vp * Vec4::new(rect.max().x, rect.max().y, 0.0, 1.0);

        assert_relative_eq!(lo.x / lo.w, -1.0, epsilon = 1e-5);
        assert_relative_eq!(lo.y / lo.w, -1.0, epsilon = 1e-5);
        assert_relative_eq!(hi.x / hi.w, 1.0, epsilon = 1e-5);
        assert_relative_eq!(hi.y / hi.w, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn tile_plane_is_inside_depth_range() {
        let eye = Vec3::new(0.0, 0.0, 10.0);
        let vp = projection(Vec2::splat(16.0)) * view(eye);
        let z = vp.project_point3(Vec3::ZERO).z;
        assert!((0.0..=1.0).contains(&z), "{z}");
        let z_obj = vp.project_point3(Vec3::new(0.0, 0.0, OBJECT_DEPTH)).z;
        assert!(z_obj < z, "objects sit closer to the camera");
    }

    #[test]
    fn altitude_bounds_match_the_clip_range() {
        for z in [ALTITUDE_RANGE.0 + 1e-3, 10.0, ALTITUDE_RANGE.1 - 1e-3] {
            assert!(altitude_in_range(z), "{z}");
            let vp = projection(Vec2::splat(16.0)) * view(Vec3::new(0.0, 0.0, z));
            let tiles = vp.project_point3(Vec3::ZERO).z;
            let sprites = vp.project_point3(Vec3::new(0.0, 0.0, OBJECT_DEPTH)).z;
            assert!((0.0..=1.0).contains(&tiles), "tiles at {z}: {tiles}");
            assert!((0.0..=1.0).contains(&sprites), "sprites at {z}: {sprites}");
        }
        for z in [NEAR, ALTITUDE_RANGE.0, FAR, 500.0, 0.0, -10.0] {
            assert!(!altitude_in_range(z), "{z}");
        }
    }

    // ── grid ────────────────────────────────────────────────────────────────

    #[test]
    fn grid_dims_are_even_and_padded() {
        assert_eq!(grid_dims(Vec2::new(16.0, 16.0)), (18, 18));
        assert_eq!(grid_dims(Vec2::new(5.0, 0.5)), (8, 4));
        assert_eq!(grid_dims(Vec2::splat(MIN_VIEW_SIZE)), (4, 4));
        assert_eq!(grid_dims(Vec2::splat(MAX_VIEW_SIZE)), (514, 514));
    }

    #[test]
    fn grid_dims_saturate_instead_of_overflowing() {
        assert_eq!(grid_dims(Vec2::splat(1e10)), (u32::MAX, u32::MAX));
    }

    #[test]
    fn grid_view_covers_view_at_fractional_positions() {
        let size = Vec2::new(7.0, 5.0);
        let dims = grid_dims(size);
        for i in 0..40 {
            let t = i as f32 * 0.37 - 7.0;
            let center = Vec3::new(t, -t * 0.6, 10.0);
            let grid = grid_view(center, dims).to_rect();
            let view = view_rect(center, size);
            assert!(grid.min().x <= view.min().x && grid.min().y <= view.min().y, "{center}");
            assert!(grid.max().x >= view.max().x && grid.max().y >= view.max().y, "{center}");
        }
    }
}
