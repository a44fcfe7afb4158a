use anyhow::{Context, Result};
use slotmap::SlotMap;
use wgpu::util::DeviceExt;

use crate::coords::Resolution;
use crate::scene::{DrawCmd, DrawList};

use super::geometry::build_mesh;
use super::graphics::GraphicsDevice;
use super::init::GpuInit;
use super::pipelines::{
    atlas_uniform_size, create_bind_group_layout, create_pipeline, draw_uniform_size, DrawUniform,
    TARGET_FORMAT,
};
use super::readback::ReadbackBuffer;
use super::types::{
    FramebufferId, GeometryDesc, GeometryId, ProgramId, ProgramKind, TextureData,
    TextureId,
};

/// Headless wgpu device: no surface, every target is an off-screen texture.
///
/// Owns:
/// - Adapter/Device/Queue
/// - one bind group layout shared by all programs
/// - slot maps for textures, pipelines, geometries and framebuffers
/// - per-frame uniform and cell buffers, grown on demand
pub struct WgpuDevice {
    name: String,

    device: wgpu::Device,
    queue: wgpu::Queue,

    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    sampler: wgpu::Sampler,
    /// Bound when a frame has no tileset (noise-only frames).
    fallback_texture: GpuTexture,

    textures: SlotMap<TextureId, GpuTexture>,
    programs: SlotMap<ProgramId, wgpu::RenderPipeline>,
    geometries: SlotMap<GeometryId, GpuGeometry>,
    framebuffers: SlotMap<FramebufferId, GpuTarget>,

    atlas_ubo: wgpu::Buffer,
    draw_ubo: Option<wgpu::Buffer>,
    draw_capacity: usize,
    cell_buffer: Option<wgpu::Buffer>,
    cell_capacity: usize,
    /// `DrawUniform` size rounded up to the dynamic offset alignment.
    uniform_stride: usize,
    staging: Vec<u8>,
}

struct GpuTexture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

struct GpuGeometry {
    vbo: wgpu::Buffer,
    ibo: wgpu::Buffer,
    index_count: u32,
}

struct GpuTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    readback: Option<ReadbackBuffer>,
}

impl WgpuDevice {
    /// Acquires an adapter and device without any window or surface.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu; hosts usually
    /// wrap this in `pollster::block_on`.
    pub async fn new(init: &GpuInit) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: init.backends,
            ..Default::default()
        });

        let mut options = wgpu::RequestAdapterOptions {
            power_preference: init.power_preference,
            compatible_surface: None,
            force_fallback_adapter: false,
        };
        let adapter = match instance.request_adapter(&options).await {
            Ok(adapter) => adapter,
            Err(err) if init.allow_fallback_adapter => {
                log::warn!("no hardware adapter ({err}); trying fallback adapter");
                options.force_fallback_adapter = true;
                instance
                    .request_adapter(&options)
                    .await
                    .context("failed to find a fallback GPU adapter")?
            }
            Err(err) => return Err(err).context("failed to find a suitable GPU adapter"),
        };

        let info = adapter.get_info();
        let name = format!("wgpu/{:?} ({})", info.backend, info.name);
        log::info!("using {name}");

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("vantage device"),
                required_features: init.required_features,
                required_limits: init.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let bind_group_layout = create_bind_group_layout(&device);
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("vantage pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        // Pixel-art atlas: nearest filtering, no mips.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("vantage atlas sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let fallback_texture = upload_texture(
            &device,
            &queue,
            &TextureData { width: 1, height: 1, pixels: vec![0; 4] },
            "vantage fallback texture",
        );

        let atlas_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("vantage atlas ubo"),
            size: atlas_uniform_size().get(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let align = device.limits().min_uniform_buffer_offset_alignment as usize;
        let uniform_stride = (draw_uniform_size().get() as usize).div_ceil(align) * align;

        Ok(Self {
            name,
            device,
            queue,
            bind_group_layout,
            pipeline_layout,
            sampler,
            fallback_texture,
            textures: SlotMap::with_key(),
            programs: SlotMap::with_key(),
            geometries: SlotMap::with_key(),
            framebuffers: SlotMap::with_key(),
            atlas_ubo,
            draw_ubo: None,
            draw_capacity: 0,
            cell_buffer: None,
            cell_capacity: 0,
            uniform_stride,
            staging: Vec::new(),
        })
    }

    fn ensure_draw_capacity(&mut self, required: usize) {
        if required <= self.draw_capacity && self.draw_ubo.is_some() {
            return;
        }
        let new_cap = required.next_power_of_two().max(64);
        self.draw_ubo = Some(self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("vantage draw ubo"),
            size: (new_cap * self.uniform_stride) as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.draw_capacity = new_cap;
    }

    fn ensure_cell_capacity(&mut self, required: usize) {
        if required <= self.cell_capacity && self.cell_buffer.is_some() {
            return;
        }
        let new_cap = required.next_power_of_two().max(1024);
        self.cell_buffer = Some(self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("vantage cell buffer"),
            size: (new_cap * std::mem::size_of::<u32>()) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.cell_capacity = new_cap;
    }

    fn write_frame_uniforms(&mut self, list: &DrawList) {
        let size = draw_uniform_size().get() as usize;
        self.staging.clear();
        self.staging.resize(list.len() * self.uniform_stride, 0);
        for (i, cmd) in list.items().iter().enumerate() {
            let u = draw_uniform(cmd);
            self.staging[i * self.uniform_stride..][..size].copy_from_slice(bytemuck::bytes_of(&u));
        }

        if let Some(ubo) = self.draw_ubo.as_ref() {
            if !self.staging.is_empty() {
                self.queue.write_buffer(ubo, 0, &self.staging);
            }
        }
        if let Some(cells) = self.cell_buffer.as_ref() {
            if !list.tile_data().is_empty() {
                self.queue.write_buffer(cells, 0, bytemuck::cast_slice(list.tile_data()));
            }
        }

        let layout = list.tileset().map(|b| b.layout).unwrap_or_default();
        self.queue.write_buffer(&self.atlas_ubo, 0, bytemuck::bytes_of(&layout));
    }
}

impl GraphicsDevice for WgpuDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn create_texture(&mut self, data: &TextureData) -> Result<TextureId> {
        anyhow::ensure!(
            data.pixels.len() == data.width as usize * data.height as usize * 4,
            "texture data is {} bytes, expected {}x{} RGBA8",
            data.pixels.len(),
            data.width,
            data.height
        );
        let max = self.device.limits().max_texture_dimension_2d;
        anyhow::ensure!(
            data.width <= max && data.height <= max,
            "texture {}x{} exceeds device limit {max}",
            data.width,
            data.height
        );
        let texture = upload_texture(&self.device, &self.queue, data, "vantage atlas");
        Ok(self.textures.insert(texture))
    }

    fn destroy_texture(&mut self, id: TextureId) {
        self.textures.remove(id);
    }

    fn create_program(&mut self, kind: ProgramKind) -> Result<ProgramId> {
        let pipeline = create_pipeline(&self.device, &self.pipeline_layout, kind);
        Ok(self.programs.insert(pipeline))
    }

    fn destroy_program(&mut self, id: ProgramId) {
        self.programs.remove(id);
    }

    fn create_geometry(&mut self, desc: GeometryDesc) -> Result<GeometryId> {
        let mesh = build_mesh(desc);
        let vbo = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("vantage geometry vbo"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let ibo = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("vantage geometry ibo"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let index_count = u32::try_from(mesh.indices.len()).context("geometry too large")?;
        Ok(self.geometries.insert(GpuGeometry { vbo, ibo, index_count }))
    }

    fn destroy_geometry(&mut self, id: GeometryId) {
        self.geometries.remove(id);
    }

    fn create_framebuffer(&mut self, size: Resolution) -> Result<FramebufferId> {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("vantage framebuffer"),
            size: wgpu::Extent3d {
                width: size.width(),
                height: size.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok(self.framebuffers.insert(GpuTarget { texture, view, readback: None }))
    }

    fn destroy_framebuffer(&mut self, id: FramebufferId) {
        self.framebuffers.remove(id);
    }

    fn execute(&mut self, target: FramebufferId, list: &DrawList) -> Result<()> {
        anyhow::ensure!(self.framebuffers.contains_key(target), "unknown framebuffer {target:?}");

        // Mutating methods must happen before borrowing pipelines/buffers immutably.
        self.ensure_draw_capacity(list.len().max(1));
        self.ensure_cell_capacity(list.tile_data().len().max(1));
        self.write_frame_uniforms(list);

        let atlas_view = match list.tileset() {
            Some(binding) => {
                &self
                    .textures
                    .get(binding.texture)
                    .context("draw list binds an unknown atlas texture")?
                    .view
            }
            None => &self.fallback_texture.view,
        };
        let Some(draw_ubo) = self.draw_ubo.as_ref() else { return Ok(()) };
        let Some(cell_buffer) = self.cell_buffer.as_ref() else { return Ok(()) };
        let Some(fb) = self.framebuffers.get(target) else { return Ok(()) };

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("vantage frame bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: draw_ubo,
                        offset: 0,
                        size: Some(draw_uniform_size()),
                    }),
                },
                wgpu::BindGroupEntry { binding: 1, resource: self.atlas_ubo.as_entire_binding() },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(atlas_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry { binding: 4, resource: cell_buffer.as_entire_binding() },
            ],
        });

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("vantage frame encoder"),
        });

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("vantage frame pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &fb.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(list.clear_color().to_wgpu()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            let size = fb.texture.size();
            let vw = list.viewport().x.clamp(1, size.width);
            let vh = list.viewport().y.clamp(1, size.height);
            rpass.set_viewport(0.0, 0.0, vw as f32, vh as f32, 0.0, 1.0);

            for (i, cmd) in list.items().iter().enumerate() {
                let pipeline = self
                    .programs
                    .get(cmd.program())
                    .context("draw command uses an unknown program")?;
                let geometry = self
                    .geometries
                    .get(cmd.geometry())
                    .context("draw command uses an unknown geometry")?;

                let offset = u32::try_from(i * self.uniform_stride).context("too many draws")?;
                rpass.set_pipeline(pipeline);
                rpass.set_bind_group(0, &bind_group, &[offset]);
                rpass.set_vertex_buffer(0, geometry.vbo.slice(..));
                rpass.set_index_buffer(geometry.ibo.slice(..), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..geometry.index_count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn read_pixels(&mut self, target: FramebufferId, out: &mut [u32]) -> Result<()> {
        let fb = self.framebuffers.get_mut(target).context("unknown framebuffer")?;
        let size = fb.texture.size();
        let readback = fb
            .readback
            .get_or_insert_with(|| ReadbackBuffer::new(&self.device, size.width, size.height));
        readback.read(&self.device, &self.queue, &fb.texture, out)
    }
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    data: &TextureData,
    label: &str,
) -> GpuTexture {
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: data.width.max(1),
                height: data.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        &data.pixels,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    GpuTexture { _texture: texture, view }
}

fn draw_uniform(cmd: &DrawCmd) -> DrawUniform {
    let mut u = DrawUniform {
        mvp: cmd.mvp().to_cols_array_2d(),
        color: [0.0; 4],
        params: [0.0; 4],
        grid: [0; 4],
    };
    match cmd {
        DrawCmd::Tiles(t) => {
            u.grid = [t.grid.cols, t.grid.rows, t.cells.start as u32, 0];
        }
        DrawCmd::Sprite(s) => {
            u.grid[3] = s.tile.0;
        }
        DrawCmd::Noise(n) => {
            u.color = n.color;
            u.params = [n.time, n.mean_offset, 0.0, 0.0];
        }
    }
    u
}
