//! Per-frame draw stream.
//!
//! Layer passes record into a `DrawList`; a `GraphicsDevice` replays it into
//! one framebuffer. Keeping the stream device-agnostic lets the same request
//! drive the wgpu and software devices.

mod cmd;
mod list;

pub use cmd::{DrawCmd, NoiseCmd, SpriteCmd, TilesCmd};
pub use list::{DrawList, TilesetBinding};
