use anyhow::{Context, Result};
use glam::{Mat4, Vec2, Vec3};
use vantage_world::World;

use crate::coords::{GridRect, Rect, Resolution};
use crate::device::{FramebufferId, GeometryDesc, GeometryId, ProgramKind};
use crate::error::ConfigError;
use crate::paint::Color;
use crate::scene::{DrawList, TilesetBinding};
use crate::time::NoiseClock;

use super::ctx::Renderer;
use super::dirty::{DirtyParameters, DirtyTracker, Parameter};
use super::passes::{self, LayerPrograms, NoiseSettings};
use super::view::{self, ALTITUDE_RANGE, MAX_VIEW_SIZE, MIN_VIEW_SIZE};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Lifecycle {
    Created,
    Ready,
    Disposed,
}

/// One virtual camera over a [`World`] with its own framebuffer.
///
/// Lifecycle:
/// - `new` → setters (optional) → `init` once
/// - any number of setters and `draw`s
/// - `dispose` exactly once, with the same renderer
///
/// Setters only record what changed. The next `draw` reconciles everything
/// pending in one go, so a batch of setters costs at most one rebuild per
/// resource kind.
pub struct RenderRequest {
    position: Vec3,
    size: Vec2,
    resolution: Resolution,
    gather_image: bool,
    noise: NoiseSettings,
    /// Premultiplied noise color, refreshed on `NOISE`.
    noise_color: [f32; 4],
    clock: NoiseClock,
    dirty: DirtyTracker,

    projection: Mat4,
    view_projection: Mat4,
    grid_dims: (u32, u32),

    /// Grows to the resolution area and never shrinks while gathering.
    image: Vec<u32>,
    list: DrawList,
    scratch: Vec<u32>,

    lifecycle: Lifecycle,
    atlas: Option<TilesetBinding>,
    programs: Option<LayerPrograms>,
    quad: Option<GeometryId>,
    grid: Option<GeometryId>,
    framebuffer: Option<FramebufferId>,
}

impl Default for RenderRequest {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderRequest {
    pub const DEFAULT_POSITION: Vec3 = Vec3::new(0.0, 0.0, 10.0);
    pub const DEFAULT_SIZE: Vec2 = Vec2::new(16.0, 16.0);

    pub fn new() -> Self {
        Self {
            position: Self::DEFAULT_POSITION,
            size: Self::DEFAULT_SIZE,
            resolution: Resolution::default(),
            gather_image: false,
            noise: NoiseSettings::default(),
            noise_color: [1.0; 4],
            clock: NoiseClock::new(),
            dirty: DirtyTracker::all(),
            projection: Mat4::IDENTITY,
            view_projection: Mat4::IDENTITY,
            grid_dims: (0, 0),
            image: Vec::new(),
            list: DrawList::new(),
            scratch: Vec::new(),
            lifecycle: Lifecycle::Created,
            atlas: None,
            programs: None,
            quad: None,
            grid: None,
            framebuffer: None,
        }
    }

    // ── setters ─────────────────────────────────────────────────────────────

    /// Camera center. `z` is the camera altitude above the tile plane and
    /// must lie inside [`ALTITUDE_RANGE`].
    pub fn set_position(&mut self, center: Vec3) -> Result<DirtyParameters, ConfigError> {
        if !center.is_finite() {
            return Err(ConfigError::NonFinitePosition);
        }
        if !view::altitude_in_range(center.z) {
            let (min, max) = ALTITUDE_RANGE;
            return Err(ConfigError::AltitudeOutOfRange { z: center.z, min, max });
        }
        self.position = center;
        Ok(self.dirty.mark(Parameter::Position))
    }

    /// World-space view extent. Each axis is clamped up to [`MIN_VIEW_SIZE`]
    /// and may not exceed [`MAX_VIEW_SIZE`].
    pub fn set_size(&mut self, size: Vec2) -> Result<DirtyParameters, ConfigError> {
        if !size.is_finite() {
            return Err(ConfigError::NonFiniteSize { width: size.x, height: size.y });
        }
        if size.max_element() > MAX_VIEW_SIZE {
            return Err(ConfigError::SizeTooLarge {
                width: size.x,
                height: size.y,
                max: MAX_VIEW_SIZE,
            });
        }
        self.size = size.max(Vec2::splat(MIN_VIEW_SIZE));
        Ok(self.dirty.mark(Parameter::Size))
    }

    pub fn set_resolution(&mut self, width: u32, height: u32) -> Result<DirtyParameters, ConfigError> {
        self.resolution = Resolution::new(width, height)?;
        Ok(self.dirty.mark(Parameter::Resolution))
    }

    /// Enables host readback after every `draw`.
    pub fn set_gather_image(&mut self, gather: bool) -> DirtyParameters {
        self.gather_image = gather;
        self.dirty.mark(Parameter::GatherImage)
    }

    pub fn set_noise(&mut self, noise: NoiseSettings) -> Result<DirtyParameters, ConfigError> {
        if !noise.speed.is_finite() || !noise.mean_offset.is_finite() {
            return Err(ConfigError::NonFiniteNoise {
                speed: noise.speed,
                mean_offset: noise.mean_offset,
            });
        }
        self.noise = noise;
        Ok(self.dirty.mark(Parameter::Noise))
    }

    // ── accessors ───────────────────────────────────────────────────────────

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.size
    }

    #[inline]
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    #[inline]
    pub fn gather_image(&self) -> bool {
        self.gather_image
    }

    #[inline]
    pub fn noise(&self) -> NoiseSettings {
        self.noise
    }

    /// World rectangle seen by the camera.
    #[inline]
    pub fn view(&self) -> Rect {
        view::view_rect(self.position, self.size)
    }

    /// Tile rectangle the next frame renders.
    pub fn grid_view(&self) -> GridRect {
        view::grid_view(self.position, view::grid_dims(self.size))
    }

    /// Pixels of the last drawn frame when gathering, otherwise empty.
    ///
    /// Premultiplied BGRA8 per `u32` (little-endian bytes `B, G, R, A`), rows
    /// top to bottom, exactly `width * height` entries.
    pub fn image(&self) -> &[u32] {
        if !self.gather_image {
            return &[];
        }
        self.image.get(..self.resolution.area()).unwrap_or(&[])
    }

    /// Flags waiting for the next reconciliation.
    #[inline]
    pub fn dirty(&self) -> DirtyParameters {
        self.dirty.pending()
    }

    /// `projection * view` used by the last `draw`.
    #[inline]
    pub fn view_projection(&self) -> Mat4 {
        self.view_projection
    }

    /// Accumulated noise time.
    #[inline]
    pub fn noise_time(&self) -> f64 {
        self.clock.elapsed()
    }

    /// Commands recorded by the last `draw`.
    #[inline]
    pub fn last_frame(&self) -> &DrawList {
        &self.list
    }

    // ── lifecycle ───────────────────────────────────────────────────────────

    /// Acquires the atlas, programs and quad, then builds everything else.
    ///
    /// The request counts as initialized from the first acquisition on. If
    /// `init` fails it cannot be retried: `dispose` the request to release
    /// whatever was acquired and create a new one.
    pub fn init(&mut self, renderer: &mut Renderer, world: &World) -> Result<()> {
        anyhow::ensure!(
            self.lifecycle == Lifecycle::Created,
            "render request is already initialized"
        );
        // Handles are stored as soon as they exist so `dispose` can release a
        // partially initialized request.
        self.lifecycle = Lifecycle::Ready;

        self.atlas = Some(
            renderer
                .acquire_atlas(world.tileset())
                .context("failed to load tileset atlas")?,
        );

        let tiles = renderer.acquire_program(ProgramKind::Tiles)?;
        let sprite = match renderer.acquire_program(ProgramKind::Sprite) {
            Ok(p) => p,
            Err(e) => {
                renderer.release_program(tiles);
                return Err(e);
            }
        };
        let noise = match renderer.acquire_program(ProgramKind::Noise) {
            Ok(p) => p,
            Err(e) => {
                renderer.release_program(tiles);
                renderer.release_program(sprite);
                return Err(e);
            }
        };
        self.programs = Some(LayerPrograms { tiles, sprite, noise });
        self.quad = Some(renderer.acquire_geometry(GeometryDesc::Quad)?);

        self.reconcile(renderer)?;
        log::debug!(
            "render request ready: {}x{} px over {}x{} tiles",
            self.resolution.width(),
            self.resolution.height(),
            self.size.x,
            self.size.y
        );
        Ok(())
    }

    /// Renders one frame into the framebuffer and, when gathering, into
    /// [`image`](Self::image).
    pub fn draw(&mut self, renderer: &mut Renderer, world: &World) -> Result<()> {
        anyhow::ensure!(
            self.lifecycle == Lifecycle::Ready,
            "render request must be initialized before drawing"
        );
        self.reconcile(renderer)?;

        let programs = self.programs.context("render request has no programs")?;
        let quad = self.quad.context("render request has no quad geometry")?;
        let grid_geometry = self.grid.context("render request has no grid geometry")?;
        let framebuffer = self.framebuffer.context("render request has no framebuffer")?;

        self.view_projection = self.projection * view::view(self.position);
        let view = self.view();
        let grid = view::grid_view(self.position, self.grid_dims);

        self.list.begin(self.resolution.as_uvec2(), Color::transparent(), self.atlas);
        passes::tile_pass(
            &mut self.list,
            world,
            programs.tiles,
            grid_geometry,
            self.view_projection,
            grid,
            &mut self.scratch,
        );
        passes::object_pass(
            &mut self.list,
            world,
            programs.sprite,
            quad,
            self.view_projection,
            view,
        );
        passes::effect_pass(
            &mut self.list,
            programs.noise,
            quad,
            self.view_projection,
            view,
            &self.noise,
            &mut self.clock,
            self.noise_color,
        );

        renderer.execute(framebuffer, &self.list)?;

        if self.gather_image {
            let area = self.resolution.area();
            let out = self
                .image
                .get_mut(..area)
                .context("image buffer smaller than resolution")?;
            renderer.read_pixels(framebuffer, out)?;
        }
        Ok(())
    }

    /// Releases every handle this request holds. Handles are taken, so a
    /// second call releases nothing.
    pub fn dispose(&mut self, renderer: &mut Renderer) {
        if let Some(fb) = self.framebuffer.take() {
            renderer.release_framebuffer(fb);
        }
        if let Some(grid) = self.grid.take() {
            renderer.release_geometry(grid);
        }
        if let Some(quad) = self.quad.take() {
            renderer.release_geometry(quad);
        }
        if let Some(p) = self.programs.take() {
            renderer.release_program(p.tiles);
            renderer.release_program(p.sprite);
            renderer.release_program(p.noise);
        }
        if let Some(atlas) = self.atlas.take() {
            renderer.release_texture(atlas.texture);
        }
        self.image = Vec::new();
        self.lifecycle = Lifecycle::Disposed;
    }

    /// Applies every pending flag once, then clears them.
    fn reconcile(&mut self, renderer: &mut Renderer) -> Result<()> {
        let dirty = self.dirty.pending();
        if dirty.is_empty() {
            return Ok(());
        }
        log::trace!("reconciling {dirty:?}");

        if dirty.contains(DirtyParameters::SIZE) {
            self.projection = view::projection(self.size);
            self.grid_dims = view::grid_dims(self.size);
            let (cols, rows) = self.grid_dims;
            // Acquire first: an unchanged grid keeps its geometry alive.
            let grid = renderer.acquire_geometry(GeometryDesc::Grid { cols, rows })?;
            if let Some(old) = self.grid.replace(grid) {
                renderer.release_geometry(old);
            }
        }

        if dirty.contains(DirtyParameters::RESOLUTION) {
            if let Some(old) = self.framebuffer.take() {
                renderer.release_framebuffer(old);
            }
            self.framebuffer = Some(renderer.create_framebuffer(self.resolution)?);
        }

        if dirty.contains(DirtyParameters::IMAGE) {
            let area = self.resolution.area();
            if !self.gather_image {
                self.image = Vec::new();
            } else if self.image.len() < area {
                self.image = vec![0; area];
            }
        }

        if dirty.contains(DirtyParameters::NOISE) {
            self.noise_color = Color::from_rgba8(self.noise.color).to_array();
        }

        self.dirty.take();
        Ok(())
    }
}

impl Drop for RenderRequest {
    fn drop(&mut self) {
        if self.lifecycle == Lifecycle::Ready {
            log::warn!("render request dropped without dispose; its GPU resources are leaked");
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{IVec2, UVec2};
    use vantage_world::{Item, ObjectLayer, TileId, TileLayer, TileSheet, Tileset};

    use super::*;
    use crate::resources::ResourceKind;
    use crate::time::NOISE_TIME_STEP;

    /// 2x1 tiles of 2x2 px: tile 0 opaque green, tile 1 opaque blue.
    fn tileset() -> Tileset {
        let mut pixels = Vec::new();
        for _row in 0..2 {
            pixels.extend_from_slice(&[0, 255, 0, 255, 0, 255, 0, 255]);
            pixels.extend_from_slice(&[0, 0, 255, 255, 0, 0, 255, 255]);
        }
        Tileset::new("test", UVec2::splat(2)).with_sheet(TileSheet::Rgba { width: 4, height: 2, pixels })
    }

    /// One 8x8 ground layer around the origin and one item near the camera.
    fn world() -> World {
        let mut world = World::new(tileset());
        world
            .push_tile_layer(TileLayer::new("ground", IVec2::new(-4, -4), 8, 8))
            .fill(Some(TileId(0)));
        world
            .push_object_layer(ObjectLayer::new("items"))
            .push(Item::new(Vec2::new(0.5, 0.5), TileId(1)));
        world
    }

    fn ready(renderer: &mut Renderer, world: &World, w: u32, h: u32) -> RenderRequest {
        let mut req = RenderRequest::new();
        req.set_resolution(w, h).unwrap();
        req.set_gather_image(true);
        req.init(renderer, world).unwrap();
        req
    }

    fn snapshot(r: &Renderer) -> [u64; 4] {
        [ResourceKind::Texture, ResourceKind::Program, ResourceKind::Geometry, ResourceKind::Framebuffer]
            .map(|k| r.stats(k).created)
    }

    // ── setters ─────────────────────────────────────────────────────────────

    #[test]
    fn defaults_match_documented_camera() {
        let req = RenderRequest::new();
        assert_eq!(req.position(), Vec3::new(0.0, 0.0, 10.0));
        assert_eq!(req.size(), Vec2::new(16.0, 16.0));
        assert_eq!((req.resolution().width(), req.resolution().height()), (1024, 1024));
        assert!(!req.gather_image());
        assert_eq!(req.noise(), NoiseSettings::default());
        assert!(req.image().is_empty());
    }

    #[test]
    fn setters_report_the_flags_they_raise() {
        let mut req = RenderRequest::new();
        req.dirty.take();

        assert!(req.set_position(Vec3::new(1.0, 2.0, 10.0)).unwrap().is_empty());
        assert_eq!(req.set_size(Vec2::splat(4.0)).unwrap(), DirtyParameters::SIZE);
        assert_eq!(
            req.set_resolution(32, 32).unwrap(),
            DirtyParameters::RESOLUTION | DirtyParameters::IMAGE
        );
        assert_eq!(req.set_gather_image(true), DirtyParameters::IMAGE);
        assert_eq!(req.set_noise(NoiseSettings::default()).unwrap(), DirtyParameters::NOISE);
        assert_eq!(req.dirty(), DirtyParameters::all());
    }

    #[test]
    fn out_of_range_resolution_keeps_previous() {
        let mut req = RenderRequest::new();
        for (w, h) in [(15, 15), (15, 100), (100, 4097), (0, 0), (5000, 16)] {
            let err = req.set_resolution(w, h).unwrap_err();
            assert_eq!(err, ConfigError::ResolutionOutOfRange { width: w, height: h });
            assert_eq!((req.resolution().width(), req.resolution().height()), (1024, 1024));
        }
        assert!(req.set_resolution(16, 4096).is_ok());
    }

    #[test]
    fn tiny_sizes_clamp_and_non_finite_sizes_fail() {
        let mut req = RenderRequest::new();
        req.set_size(Vec2::new(0.0, -3.0)).unwrap();
        assert_eq!(req.size(), Vec2::splat(MIN_VIEW_SIZE));

        assert!(req.set_size(Vec2::new(f32::NAN, 1.0)).is_err());
        assert!(req.set_size(Vec2::new(1.0, f32::INFINITY)).is_err());
        assert_eq!(req.size(), Vec2::splat(MIN_VIEW_SIZE));
    }

    #[test]
    fn oversized_view_is_rejected_and_keeps_previous() {
        let mut req = RenderRequest::new();
        req.set_size(Vec2::new(40.0, 20.0)).unwrap();
        req.dirty.take();

        for size in [Vec2::splat(1e10), Vec2::new(MAX_VIEW_SIZE + 1.0, 4.0), Vec2::new(4.0, 5000.0)] {
            let err = req.set_size(size).unwrap_err();
            assert!(matches!(err, ConfigError::SizeTooLarge { .. }), "{size}: {err}");
            assert_eq!(req.size(), Vec2::new(40.0, 20.0));
            assert!(req.dirty().is_empty());
        }
        assert!(req.set_size(Vec2::splat(MAX_VIEW_SIZE)).is_ok());
    }

    #[test]
    fn largest_view_still_draws() {
        let world = world();
        let mut renderer = Renderer::software();
        let mut req = ready(&mut renderer, &world, 16, 16);
        req.set_size(Vec2::splat(MAX_VIEW_SIZE)).unwrap();
        req.draw(&mut renderer, &world).unwrap();
        assert_eq!(req.grid_view().cols, 514);
        req.dispose(&mut renderer);
    }

    #[test]
    fn altitude_outside_depth_range_is_rejected() {
        let mut req = RenderRequest::new();
        for z in [500.0, view::FAR, view::NEAR, 0.0, -5.0] {
            let err = req.set_position(Vec3::new(1.0, 1.0, z)).unwrap_err();
            assert!(matches!(err, ConfigError::AltitudeOutOfRange { .. }), "{z}: {err}");
            assert_eq!(req.position(), RenderRequest::DEFAULT_POSITION);
        }
        assert!(req.set_position(Vec3::new(1.0, 1.0, 99.0)).is_ok());
        assert!(req.set_position(Vec3::new(1.0, 1.0, 0.5)).is_ok());
    }

    #[test]
    fn non_finite_noise_is_rejected() {
        let mut req = RenderRequest::new();
        let bad = NoiseSettings { speed: f32::NAN, ..Default::default() };
        assert!(req.set_noise(bad).is_err());
        assert_eq!(req.noise().speed, 1.0);
    }

    // ── lifecycle ───────────────────────────────────────────────────────────

    #[test]
    fn draw_before_init_and_double_init_fail() {
        let mut renderer = Renderer::software();
        let world = world();
        let mut req = RenderRequest::new();
        req.set_resolution(16, 16).unwrap();
        assert!(req.draw(&mut renderer, &world).is_err());

        req.init(&mut renderer, &world).unwrap();
        assert!(req.init(&mut renderer, &world).is_err());
        req.dispose(&mut renderer);
    }

    #[test]
    fn failed_init_is_not_retried_and_disposes_cleanly() {
        let broken = World::new(Tileset::new("broken", UVec2::splat(2)).with_sheet(TileSheet::Rgba {
            width: 4,
            height: 4,
            pixels: vec![0; 3],
        }));
        let mut renderer = Renderer::software();
        let mut req = RenderRequest::new();

        assert!(req.init(&mut renderer, &broken).is_err());
        let err = req.init(&mut renderer, &world()).unwrap_err();
        assert!(format!("{err:#}").contains("already initialized"));

        req.dispose(&mut renderer);
        for kind in [ResourceKind::Texture, ResourceKind::Program, ResourceKind::Geometry] {
            assert_eq!(renderer.stats(kind).live(), 0, "{kind:?}");
        }
    }

    #[test]
    fn dispose_releases_everything_once() {
        let mut renderer = Renderer::software();
        let world = world();
        let mut a = ready(&mut renderer, &world, 16, 16);
        let mut b = ready(&mut renderer, &world, 32, 32);
        a.draw(&mut renderer, &world).unwrap();
        b.draw(&mut renderer, &world).unwrap();

        a.dispose(&mut renderer);
        assert_eq!(renderer.stats(ResourceKind::Texture).live(), 1, "b still holds the atlas");
        b.dispose(&mut renderer);
        b.dispose(&mut renderer);

        for kind in [ResourceKind::Texture, ResourceKind::Program, ResourceKind::Geometry, ResourceKind::Framebuffer] {
            assert_eq!(renderer.stats(kind).live(), 0, "{kind:?}");
        }
        assert!(a.draw(&mut renderer, &world).is_err());
    }

    #[test]
    fn requests_share_read_only_resources() {
        let mut renderer = Renderer::software();
        let world = world();
        let mut a = ready(&mut renderer, &world, 16, 16);
        let mut b = ready(&mut renderer, &world, 16, 16);

        // One atlas, three programs, quad plus one 18x18 grid; two framebuffers.
        assert_eq!(snapshot(&renderer), [1, 3, 2, 2]);
        a.dispose(&mut renderer);
        b.dispose(&mut renderer);
    }

    // ── reconciliation ──────────────────────────────────────────────────────

    #[test]
    fn setters_defer_rebuilds_to_next_draw() {
        let mut renderer = Renderer::software();
        let world = world();
        let mut req = ready(&mut renderer, &world, 16, 16);
        let before = snapshot(&renderer);

        req.set_size(Vec2::splat(6.0)).unwrap();
        req.set_size(Vec2::splat(8.0)).unwrap();
        req.set_resolution(32, 32).unwrap();
        req.set_resolution(48, 48).unwrap();
        req.set_position(Vec3::new(3.0, 1.0, 10.0)).unwrap();
        assert_eq!(snapshot(&renderer), before, "setters never touch the device");

        req.draw(&mut renderer, &world).unwrap();
        let after = snapshot(&renderer);
        assert_eq!(after[0], before[0]);
        assert_eq!(after[1], before[1]);
        assert_eq!(after[2], before[2] + 1, "one grid rebuild");
        assert_eq!(after[3], before[3] + 1, "one framebuffer rebuild");
        assert_eq!(req.image().len(), 48 * 48);
        req.dispose(&mut renderer);
    }

    #[test]
    fn repeated_draws_are_stable() {
        let mut renderer = Renderer::software();
        let world = world();
        let mut req = ready(&mut renderer, &world, 16, 16);
        req.set_position(Vec3::new(1.25, -0.5, 10.0)).unwrap();

        req.draw(&mut renderer, &world).unwrap();
        let vp = req.view_projection();
        let stats = [ResourceKind::Geometry, ResourceKind::Framebuffer].map(|k| renderer.stats(k));

        req.draw(&mut renderer, &world).unwrap();
        assert_eq!(req.view_projection(), vp);
        assert_eq!([ResourceKind::Geometry, ResourceKind::Framebuffer].map(|k| renderer.stats(k)), stats);
        assert!(req.dirty().is_empty());
        req.dispose(&mut renderer);
    }

    #[test]
    fn same_size_reuses_grid_geometry() {
        let mut renderer = Renderer::software();
        let world = world();
        let mut req = ready(&mut renderer, &world, 16, 16);
        let created = renderer.stats(ResourceKind::Geometry).created;

        // 16.0 and 15.5 both need an 18x18 grid.
        req.set_size(Vec2::splat(15.5)).unwrap();
        req.draw(&mut renderer, &world).unwrap();
        assert_eq!(renderer.stats(ResourceKind::Geometry).created, created);
        assert_eq!(renderer.stats(ResourceKind::Geometry).live(), 2);
        req.dispose(&mut renderer);
    }

    #[test]
    fn image_follows_gather_flag() {
        let mut renderer = Renderer::software();
        let world = world();
        for (w, h) in [(16, 16), (17, 31), (64, 48)] {
            let mut req = ready(&mut renderer, &world, w, h);
            req.draw(&mut renderer, &world).unwrap();
            assert_eq!(req.image().len(), (w * h) as usize);

            req.set_gather_image(false);
            req.draw(&mut renderer, &world).unwrap();
            assert!(req.image().is_empty());
            assert_eq!(req.image.capacity(), 0, "buffer is released");
            req.dispose(&mut renderer);
        }
    }

    #[test]
    fn image_storage_never_shrinks() {
        let mut renderer = Renderer::software();
        let world = world();
        let mut req = ready(&mut renderer, &world, 64, 64);
        req.draw(&mut renderer, &world).unwrap();

        req.set_resolution(16, 16).unwrap();
        req.draw(&mut renderer, &world).unwrap();
        assert_eq!(req.image().len(), 256);
        assert_eq!(req.image.len(), 64 * 64);
        req.dispose(&mut renderer);
    }

    // ── passes ──────────────────────────────────────────────────────────────

    #[test]
    fn objects_outside_view_produce_no_sprites() {
        let mut renderer = Renderer::software();
        let mut world = world();
        world
            .object_layer_mut("items")
            .unwrap()
            .push(Item::new(Vec2::new(100.0, 100.0), TileId(1)));

        let mut req = ready(&mut renderer, &world, 16, 16);
        req.draw(&mut renderer, &world).unwrap();
        assert_eq!(req.last_frame().counts(), (1, 1, 0));

        req.set_position(Vec3::new(100.0, 100.0, 10.0)).unwrap();
        req.draw(&mut renderer, &world).unwrap();
        assert_eq!(req.last_frame().counts(), (1, 1, 0), "only the far item is visible");

        req.set_position(Vec3::new(-500.0, 0.0, 10.0)).unwrap();
        req.draw(&mut renderer, &world).unwrap();
        assert_eq!(req.last_frame().counts(), (1, 0, 0));
        req.dispose(&mut renderer);
    }

    #[test]
    fn noise_time_advances_per_frame() {
        let mut renderer = Renderer::software();
        let world = world();
        let mut req = ready(&mut renderer, &world, 16, 16);
        req.draw(&mut renderer, &world).unwrap();
        assert_eq!(req.noise_time(), 0.0, "disabled noise keeps time");

        let speed = 3.0;
        req.set_noise(NoiseSettings { enabled: true, speed, ..Default::default() }).unwrap();
        let frames = 7;
        for _ in 0..frames {
            req.draw(&mut renderer, &world).unwrap();
        }
        assert_relative_eq!(req.noise_time(), frames as f64 * NOISE_TIME_STEP * speed as f64, epsilon = 1e-9);
        assert_eq!(req.last_frame().counts().2, 1);
        req.dispose(&mut renderer);
    }

    // ── end to end ──────────────────────────────────────────────────────────

    #[test]
    fn visible_tile_renders_non_zero_image() {
        let mut renderer = Renderer::software();
        let world = world();
        let mut req = RenderRequest::new();
        req.init(&mut renderer, &world).unwrap();
        req.set_resolution(64, 64).unwrap();
        req.set_gather_image(true);
        req.draw(&mut renderer, &world).unwrap();

        let image = req.image();
        assert_eq!(image.len(), 4096);
        assert!(image.iter().any(|&p| p != 0));
        req.dispose(&mut renderer);
    }

    #[test]
    fn image_shows_tiles_and_objects_in_layer_order() {
        let mut renderer = Renderer::software();
        let world = world();
        let mut req = ready(&mut renderer, &world, 64, 64);
        req.draw(&mut renderer, &world).unwrap();

        let green = crate::device::pack_bgra(0, 255, 0, 255);
        let blue = crate::device::pack_bgra(0, 0, 255, 255);
        let image = req.image();
        // 16x16 tiles at 64 px: 4 px per tile. The item covers tile (0, 0),
        // just up-right of the center.
        assert_eq!(image[29 * 64 + 33], blue);
        // Tile (-1, -1) is plain ground.
        assert_eq!(image[29 * 64 + 30], green);
        // The ground layer ends at x = 4; past it the frame stays clear.
        assert_eq!(image[29 * 64 + 60], 0);
        req.dispose(&mut renderer);
    }

    #[test]
    fn invalid_resolution_leaves_default() {
        let mut req = RenderRequest::new();
        assert!(req.set_resolution(15, 15).is_err());
        assert_eq!(req.resolution(), Resolution::default());
    }
}
