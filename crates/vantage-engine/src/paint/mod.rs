//! Color representation shared by the render request and devices.

pub mod color;

pub use color::Color;
