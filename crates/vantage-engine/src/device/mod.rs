//! Graphics devices.
//!
//! [`GraphicsDevice`] is the seam between render requests and the backend:
//! - [`WgpuDevice`]: headless wgpu, off-screen targets, buffer readback
//! - [`SoftwareDevice`]: CPU rasterizer with the same shading rules
//!
//! Both consume the same [`DrawList`](crate::scene::DrawList) stream.

mod geometry;
mod gpu;
mod graphics;
mod init;
mod pipelines;
mod readback;
mod software;
mod types;

pub use gpu::WgpuDevice;
pub use graphics::{pack_bgra, GraphicsDevice};
pub use init::GpuInit;
pub use software::{grain, SoftwareDevice};
pub use types::{
    AtlasLayout, FramebufferId, GeometryDesc, GeometryId, ProgramId, ProgramKind, TextureData,
    TextureId,
};
