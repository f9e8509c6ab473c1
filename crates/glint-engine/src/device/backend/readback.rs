//! GPU to CPU pixel copies.

use anyhow::{Context, Result, bail};

const BYTES_PER_PIXEL: u32 = 4;

/// Row pitch of a texture-to-buffer copy of `width` pixels.
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (width * BYTES_PER_PIXEL).div_ceil(align) * align
}

/// Copies a `width` x `height` region whose top-left memory corner is
/// `(x, top)` and returns tightly packed RGBA8 rows, last memory row first.
pub fn read_region(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    (x, top): (u32, u32),
    (width, height): (u32, u32),
) -> Result<Vec<u8>> {
    let format = texture.format();
    let bgra = match format {
        wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => false,
        wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb => true,
        other => bail!("pixel readback from {other:?} is not supported"),
    };
    if width == 0 || height == 0 {
        return Ok(Vec::new());
    }

    let padded = padded_bytes_per_row(width);
    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("glint readback staging"),
        size: (padded * height) as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("glint readback encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d { x, y: top, z: 0 },
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &staging,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device
        .poll(wgpu::PollType::wait_indefinitely())
        .context("failed to poll device during readback")?;
    rx.recv()
        .context("readback map callback dropped")?
        .context("failed to map readback buffer")?;

    let pixels = {
        let mapped = slice.get_mapped_range();
        unpack_rows(&mapped, width, height, padded, bgra)
    };
    staging.unmap();
    Ok(pixels)
}

/// Strips row padding, reverses row order and swizzles BGRA to RGBA.
pub fn unpack_rows(data: &[u8], width: u32, height: u32, padded: u32, bgra: bool) -> Vec<u8> {
    let row_len = (width * BYTES_PER_PIXEL) as usize;
    let mut out = Vec::with_capacity(row_len * height as usize);
    for row in (0..height as usize).rev() {
        let start = row * padded as usize;
        out.extend_from_slice(&data[start..start + row_len]);
    }
    if bgra {
        for px in out.chunks_exact_mut(BYTES_PER_PIXEL as usize) {
            px.swap(0, 2);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_aligned_for_copies() {
        assert_eq!(padded_bytes_per_row(1), 256);
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
    }

    #[test]
    fn unpack_strips_padding_and_reverses_rows() {
        // 1x2 region, 8-byte pitch.
        let data = [1, 2, 3, 4, 0, 0, 0, 0, 5, 6, 7, 8, 0, 0, 0, 0];
        assert_eq!(unpack_rows(&data, 1, 2, 8, false), vec![5, 6, 7, 8, 1, 2, 3, 4]);
    }

    #[test]
    fn unpack_swizzles_bgra() {
        let data = [10, 20, 30, 40];
        assert_eq!(unpack_rows(&data, 1, 1, 4, true), vec![30, 20, 10, 40]);
    }
}
