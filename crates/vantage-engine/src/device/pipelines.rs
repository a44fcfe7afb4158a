//! wgpu pipeline setup shared by the three programs.

use bytemuck::{Pod, Zeroable};

use super::geometry::MeshVertex;
use super::types::{AtlasLayout, ProgramKind};

/// Color target format of every framebuffer. Non-sRGB so readback bytes are the
/// exact values written by the shaders.
pub(crate) const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8Unorm;

const COMMON_WGSL: &str = include_str!("shaders/common.wgsl");

// ── blend ─────────────────────────────────────────────────────────────────

pub(crate) fn premul_alpha_blend() -> wgpu::BlendState {
    let component = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState { color: component, alpha: component }
}

// ── uniforms ──────────────────────────────────────────────────────────────

/// Per-command uniform block; must match `struct Draw` in `common.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct DrawUniform {
    pub mvp: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub params: [f32; 4],
    pub grid: [u32; 4],
}

const fn non_zero_size<T>() -> std::num::NonZeroU64 {
    match std::num::NonZeroU64::new(std::mem::size_of::<T>() as u64) {
        Some(size) => size,
        None => panic!("uniform block must not be zero-sized"),
    }
}

pub(crate) const fn draw_uniform_size() -> std::num::NonZeroU64 {
    const SIZE: std::num::NonZeroU64 = non_zero_size::<DrawUniform>();
    SIZE
}

pub(crate) const fn atlas_uniform_size() -> std::num::NonZeroU64 {
    const SIZE: std::num::NonZeroU64 = non_zero_size::<AtlasLayout>();
    SIZE
}

// ── layout ────────────────────────────────────────────────────────────────

pub(crate) fn create_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let visibility = wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT;
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("vantage bgl"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: Some(draw_uniform_size()),
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: Some(atlas_uniform_size()),
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 3,
                visibility,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 4,
                visibility,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: true },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
    })
}

// ── pipelines ─────────────────────────────────────────────────────────────

fn program_source(kind: ProgramKind) -> (&'static str, &'static str) {
    match kind {
        ProgramKind::Tiles => ("vantage tiles", include_str!("shaders/tiles.wgsl")),
        ProgramKind::Sprite => ("vantage sprite", include_str!("shaders/sprite.wgsl")),
        ProgramKind::Noise => ("vantage noise", include_str!("shaders/noise.wgsl")),
    }
}

pub(crate) fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    kind: ProgramKind,
) -> wgpu::RenderPipeline {
    let (label, body) = program_source(kind);
    let source = format!("{COMMON_WGSL}\n{body}");

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),

        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[MeshVertex::layout()],
        },

        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: TARGET_FORMAT,
                blend: Some(premul_alpha_blend()),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),

        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // Facing rotations and mirrored projections may flip winding.
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },

        // Painter's order: passes are recorded back-to-front.
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}
