use glam::UVec2;

use crate::error::ConfigError;

/// Smallest accepted framebuffer edge in pixels.
pub const MIN_RESOLUTION: u32 = 16;
/// Largest accepted framebuffer edge in pixels.
pub const MAX_RESOLUTION: u32 = 4096;

/// Framebuffer size in pixels. Both axes are always within
/// [`MIN_RESOLUTION`, `MAX_RESOLUTION`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Resolution {
    width: u32,
    height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Result<Self, ConfigError> {
        let range = MIN_RESOLUTION..=MAX_RESOLUTION;
        if range.contains(&width) && range.contains(&height) {
            Ok(Self { width, height })
        } else {
            Err(ConfigError::ResolutionOutOfRange { width, height })
        }
    }

    #[inline]
    pub const fn width(self) -> u32 {
        self.width
    }

    #[inline]
    pub const fn height(self) -> u32 {
        self.height
    }

    /// Pixel count.
    #[inline]
    pub const fn area(self) -> usize {
        self.width as usize * self.height as usize
    }

    #[inline]
    pub const fn as_uvec2(self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self { width: 1024, height: 1024 }
    }
}
