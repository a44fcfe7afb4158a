//! Render requests and everything they draw with.
//!
//! - [`Renderer`]: device plus resource managers, shared by all requests
//! - [`RenderRequest`]: one camera, its dirty state and framebuffer
//! - `passes`: tile, object and noise layers recorded into a draw list
//! - `view`: projection, view and padded grid math
//! - `atlas`: tileset packing

pub mod atlas;
mod ctx;
pub mod dirty;
pub mod passes;
mod request;
pub mod view;

pub use ctx::Renderer;
pub use dirty::{DirtyParameters, Parameter};
pub use passes::{LayerPrograms, NoiseSettings};
pub use request::RenderRequest;
