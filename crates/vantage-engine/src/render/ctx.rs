use anyhow::{Context, Result};
use vantage_world::Tileset;

use crate::coords::Resolution;
use crate::device::{
    AtlasLayout, FramebufferId, GeometryDesc, GeometryId, GpuInit, GraphicsDevice, ProgramId,
    ProgramKind, SoftwareDevice, TextureData, TextureId, WgpuDevice,
};
use crate::resources::{OwnedTable, Release, ResourceKind, ResourceStats, SharedTable};
use crate::scene::{DrawList, TilesetBinding};

use super::atlas::build_atlas;

/// Shared rendering context: one device plus the resource managers in front
/// of it.
///
/// Render requests borrow this mutably for `init`/`draw`/`dispose`. Shared
/// kinds (textures, programs, geometries) are cached by construction
/// parameters and reference-counted; framebuffers belong to one request.
pub struct Renderer {
    device: Box<dyn GraphicsDevice>,
    textures: SharedTable<TextureId, String, AtlasLayout>,
    programs: SharedTable<ProgramId, ProgramKind>,
    geometries: SharedTable<GeometryId, GeometryDesc>,
    framebuffers: OwnedTable<FramebufferId, Resolution>,
}

impl Renderer {
    pub fn new(device: impl GraphicsDevice + 'static) -> Self {
        log::info!("renderer on {}", device.name());
        Self {
            device: Box::new(device),
            textures: SharedTable::new(),
            programs: SharedTable::new(),
            geometries: SharedTable::new(),
            framebuffers: OwnedTable::new(),
        }
    }

    /// CPU rasterizer; needs no GPU.
    pub fn software() -> Self {
        Self::new(SoftwareDevice::new())
    }

    /// Headless wgpu device. Blocks until the adapter and device are ready.
    pub fn headless(init: &GpuInit) -> Result<Self> {
        let device = pollster::block_on(WgpuDevice::new(init))?;
        Ok(Self::new(device))
    }

    #[inline]
    pub fn device_name(&self) -> &str {
        self.device.name()
    }

    // ── textures ────────────────────────────────────────────────────────────

    /// Atlas texture for `tileset`, packed and uploaded on first use only.
    pub fn acquire_atlas(&mut self, tileset: &Tileset) -> Result<TilesetBinding> {
        self.acquire_texture(&tileset.name, || build_atlas(tileset))
    }

    /// Texture cached under `key`; `build` runs on a cache miss.
    pub fn acquire_texture(
        &mut self,
        key: &str,
        build: impl FnOnce() -> Result<(TextureData, AtlasLayout)>,
    ) -> Result<TilesetBinding> {
        let device = &mut self.device;
        let texture = self.textures.acquire(&key.to_owned(), |key| {
            let (data, layout) = build()?;
            let id = device
                .create_texture(&data)
                .with_context(|| format!("failed to create texture '{key}'"))?;
            log::debug!("texture '{key}' created ({}x{})", data.width, data.height);
            Ok((id, layout))
        })?;
        let layout = *self
            .textures
            .info(texture)
            .context("texture table lost a live entry")?;
        Ok(TilesetBinding { texture, layout })
    }

    pub fn release_texture(&mut self, id: TextureId) {
        match self.textures.release(id) {
            Release::Retained => {}
            Release::Destroy(key) => {
                self.device.destroy_texture(id);
                log::debug!("texture '{key}' destroyed");
            }
            Release::Unknown => log::warn!("release of unknown texture {id:?}"),
        }
    }

    // ── programs ────────────────────────────────────────────────────────────

    pub fn acquire_program(&mut self, kind: ProgramKind) -> Result<ProgramId> {
        let device = &mut self.device;
        self.programs.acquire(&kind, |kind| {
            let id = device
                .create_program(*kind)
                .with_context(|| format!("failed to create {kind:?} program"))?;
            log::debug!("{kind:?} program created");
            Ok((id, ()))
        })
    }

    pub fn release_program(&mut self, id: ProgramId) {
        match self.programs.release(id) {
            Release::Retained => {}
            Release::Destroy(kind) => {
                self.device.destroy_program(id);
                log::debug!("{kind:?} program destroyed");
            }
            Release::Unknown => log::warn!("release of unknown program {id:?}"),
        }
    }

    // ── geometries ──────────────────────────────────────────────────────────

    pub fn acquire_geometry(&mut self, desc: GeometryDesc) -> Result<GeometryId> {
        let device = &mut self.device;
        self.geometries.acquire(&desc, |desc| {
            let id = device
                .create_geometry(*desc)
                .with_context(|| format!("failed to create geometry {desc:?}"))?;
            log::debug!("geometry {desc:?} created");
            Ok((id, ()))
        })
    }

    pub fn release_geometry(&mut self, id: GeometryId) {
        match self.geometries.release(id) {
            Release::Retained => {}
            Release::Destroy(desc) => {
                self.device.destroy_geometry(id);
                log::debug!("geometry {desc:?} destroyed");
            }
            Release::Unknown => log::warn!("release of unknown geometry {id:?}"),
        }
    }

    // ── framebuffers ────────────────────────────────────────────────────────

    pub fn create_framebuffer(&mut self, size: Resolution) -> Result<FramebufferId> {
        let id = self
            .device
            .create_framebuffer(size)
            .with_context(|| format!("failed to create {}x{} framebuffer", size.width(), size.height()))?;
        self.framebuffers.insert(id, size);
        log::debug!("framebuffer {}x{} created", size.width(), size.height());
        Ok(id)
    }

    pub fn release_framebuffer(&mut self, id: FramebufferId) {
        match self.framebuffers.remove(id) {
            Some(size) => {
                self.device.destroy_framebuffer(id);
                log::debug!("framebuffer {}x{} destroyed", size.width(), size.height());
            }
            None => log::warn!("release of unknown framebuffer {id:?}"),
        }
    }

    // ── frames ──────────────────────────────────────────────────────────────

    pub fn execute(&mut self, target: FramebufferId, list: &DrawList) -> Result<()> {
        self.device.execute(target, list).context("frame submission failed")
    }

    pub fn read_pixels(&mut self, target: FramebufferId, out: &mut [u32]) -> Result<()> {
        self.device.read_pixels(target, out).context("framebuffer readback failed")
    }

    pub fn stats(&self, kind: ResourceKind) -> ResourceStats {
        match kind {
            ResourceKind::Texture => self.textures.stats(),
            ResourceKind::Program => self.programs.stats(),
            ResourceKind::Geometry => self.geometries.stats(),
            ResourceKind::Framebuffer => self.framebuffers.stats(),
        }
    }
}
