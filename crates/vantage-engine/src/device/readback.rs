//! Framebuffer → host copy for the wgpu device.

use anyhow::{Context, Result};
use std::sync::mpsc::channel;

/// wgpu requires buffer rows aligned to this many bytes.
const ROW_ALIGN: u32 = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
const BYTES_PER_PIXEL: u32 = 4;

/// Staging buffer reused across readbacks of one framebuffer.
pub(crate) struct ReadbackBuffer {
    buffer: wgpu::Buffer,
    padded_bpr: u32,
}

impl ReadbackBuffer {
    pub(crate) fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let padded_bpr = (width * BYTES_PER_PIXEL).div_ceil(ROW_ALIGN) * ROW_ALIGN;
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("vantage readback"),
            size: u64::from(padded_bpr) * u64::from(height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        Self { buffer, padded_bpr }
    }

    /// Copies `texture` into the staging buffer, waits for the GPU, then
    /// unpacks tightly packed pixels into `out`.
    pub(crate) fn read(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        texture: &wgpu::Texture,
        out: &mut [u32],
    ) -> Result<()> {
        let size = texture.size();
        let (width, height) = (size.width, size.height);
        anyhow::ensure!(
            out.len() == width as usize * height as usize,
            "readback target holds {} pixels, framebuffer has {}x{}",
            out.len(),
            width,
            height
        );

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("vantage readback encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(self.padded_bpr),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = self.buffer.slice(..);
        let (sender, receiver) = channel();
        slice.map_async(wgpu::MapMode::Read, move |res| {
            drop(sender.send(res));
        });
        device
            .poll(wgpu::PollType::Wait { submission_index: None, timeout: None })
            .context("device lost while waiting for readback")?;
        receiver
            .recv()
            .context("readback map callback dropped")?
            .context("failed to map readback buffer")?;

        {
            let data = slice.get_mapped_range();
            unpad_rows(&data, self.padded_bpr as usize, width as usize, out);
        }
        self.buffer.unmap();
        Ok(())
    }
}

/// Copies `width`-pixel rows out of `data`, whose rows start every
/// `padded_bpr` bytes, into the tightly packed `out`.
///
/// Bgra8Unorm stores B, G, R, A per texel, which is already the packed
/// little-endian `u32` layout.
fn unpad_rows(data: &[u8], padded_bpr: usize, width: usize, out: &mut [u32]) {
    let row_bytes = width * BYTES_PER_PIXEL as usize;
    for (dst, src) in out.chunks_exact_mut(width).zip(data.chunks(padded_bpr)) {
        for (px, bytes) in dst.iter_mut().zip(src[..row_bytes].chunks_exact(4)) {
            *px = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn padded_bpr(width: u32) -> usize {
        ((width * BYTES_PER_PIXEL).div_ceil(ROW_ALIGN) * ROW_ALIGN) as usize
    }

    #[test]
    fn rows_are_unpadded_at_the_aligned_stride() {
        let (width, height) = (17usize, 3usize);
        let stride = padded_bpr(width as u32);
        assert_eq!(stride, 256);

        // Pixel (x, y) holds B = x, G = y, R = 7, A = 255; padding is 0xEE.
        let mut data = vec![0xEE; stride * height];
        for y in 0..height {
            for x in 0..width {
                let at = y * stride + x * 4;
                data[at..at + 4].copy_from_slice(&[x as u8, y as u8, 7, 255]);
            }
        }

        let mut out = vec![0; width * height];
        unpad_rows(&data, stride, width, &mut out);

        for y in 0..height {
            for x in 0..width {
                let expected = u32::from_le_bytes([x as u8, y as u8, 7, 255]);
                assert_eq!(out[y * width + x], expected, "pixel ({x}, {y})");
            }
        }
        assert!(out.iter().all(|&p| p >> 24 == 0xFF), "no padding bytes leak in");
    }

    #[test]
    fn aligned_rows_need_no_padding() {
        let width = 64u32;
        assert_eq!(padded_bpr(width), 256);
        let data: Vec<u8> = (0..256u32 * 2).map(|i| i as u8).collect();
        let mut out = vec![0; 128];
        unpad_rows(&data, 256, 64, &mut out);
        assert_eq!(out[64], u32::from_le_bytes([0, 1, 2, 3]));
        assert_eq!(out[127], u32::from_le_bytes([252, 253, 254, 255]));
    }
}
