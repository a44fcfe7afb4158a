//! Gathered images to PNG.

use std::path::Path;

use anyhow::{Context, Result};
use image::RgbaImage;

/// Converts premultiplied BGRA pixels (one `u32` each) to straight RGBA.
pub fn to_rgba(pixels: &[u32], width: u32, height: u32) -> Result<RgbaImage> {
    let mut bytes = Vec::with_capacity(pixels.len() * 4);
    for &p in pixels {
        let [b, g, r, a] = p.to_le_bytes();
        let unpremul = |c: u8| {
            if a == 0 {
                0
            } else {
                ((c as u32 * 255 + a as u32 / 2) / a as u32).min(255) as u8
            }
        };
        bytes.extend_from_slice(&[unpremul(r), unpremul(g), unpremul(b), a]);
    }
    RgbaImage::from_raw(width, height, bytes)
        .with_context(|| format!("{} pixels do not fill {width}x{height}", pixels.len()))
}

pub fn write_png(path: &Path, pixels: &[u32], width: u32, height: u32) -> Result<()> {
    to_rgba(pixels, width, height)?
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_transparent_red_unpremultiplies() {
        let px = u32::from_le_bytes([0, 0, 128, 128]);
        let img = to_rgba(&[px], 1, 1).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0, 128]);
    }

    #[test]
    fn transparent_pixels_stay_black() {
        let img = to_rgba(&[0], 1, 1).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 0]);
    }

    #[test]
    fn size_mismatch_fails() {
        assert!(to_rgba(&[0; 3], 2, 2).is_err());
    }
}
