//! Coordinate and geometry types shared by the render request and devices.
//!
//! World space:
//! - one unit per tile
//! - +X right, +Y up, +Z toward the camera
//!
//! Pixel space (framebuffers, readback):
//! - origin top-left, row 0 is the top of the image

mod resolution;

pub use resolution::{Resolution, MAX_RESOLUTION, MIN_RESOLUTION};
pub use vantage_world::{GridRect, Rect};
