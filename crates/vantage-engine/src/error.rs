use thiserror::Error;

/// Rejected parameter change. The request keeps its previous value.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error("resolution {width}x{height} is out of range; each axis must be within [16, 4096]")]
    ResolutionOutOfRange { width: u32, height: u32 },

    #[error("view size must be finite, got {width}x{height}")]
    NonFiniteSize { width: f32, height: f32 },

    #[error("view size {width}x{height} is too large; each axis must be at most {max}")]
    SizeTooLarge { width: f32, height: f32, max: f32 },

    #[error("noise speed and mean offset must be finite, got speed {speed}, mean offset {mean_offset}")]
    NonFiniteNoise { speed: f32, mean_offset: f32 },

    #[error("camera position must be finite")]
    NonFinitePosition,

    #[error("camera altitude {z} is outside the depth range ({min}, {max})")]
    AltitudeOutOfRange { z: f32, min: f32, max: f32 },
}
