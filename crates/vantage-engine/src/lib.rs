//! Vantage engine crate.
//!
//! Off-screen rendering of a tile world for observation pipelines: each
//! [`RenderRequest`] is one camera that draws tiles, objects and a noise
//! overlay into its own framebuffer and can read the pixels back.

pub mod coords;
pub mod device;
pub mod error;
pub mod logging;
pub mod paint;
pub mod render;
pub mod resources;
pub mod scene;
pub mod time;

pub use error::ConfigError;
pub use render::{NoiseSettings, RenderRequest, Renderer};
