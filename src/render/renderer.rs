//! Frame to RGB buffer rendering.

use crate::palette::ColorTable;
use crate::trace::Frame;

/// Errors from resolving a frame's pixels through a color table.
///
/// The pixel variants indicate the frame was rendered against the wrong
/// table, or before colors were assigned.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("cannot allocate an RGB buffer for {pixels} pixels")]
    OutOfMemory { pixels: usize },
    #[error("pixel {pixel:08x} is not in the color table")]
    UnknownPixel { pixel: u32 },
    #[error("pixel {pixel:08x} has no color assigned")]
    Unassigned { pixel: u32 },
}

/// Bytes per rendered pixel.
pub const RGB_CHANNELS: usize = 3;

/// Resolve every pixel of `frame` into a row-major RGB buffer.
pub fn render_frame(frame: &Frame, table: &ColorTable) -> Result<Vec<u8>, RenderError> {
    let mut rgb = rgb_buffer(frame.pixel_count())?;
    for &pixel in &frame.pixels {
        let entry = table
            .get(pixel)
            .ok_or(RenderError::UnknownPixel { pixel })?;
        let color = entry.color.ok_or(RenderError::Unassigned { pixel })?;
        rgb.extend_from_slice(&color.to_array());
    }
    Ok(rgb)
}

/// Empty buffer with room for `pixels` RGB triples.
fn rgb_buffer(pixels: usize) -> Result<Vec<u8>, RenderError> {
    let mut rgb = Vec::new();
    pixels
        .checked_mul(RGB_CHANNELS)
        .ok_or(RenderError::OutOfMemory { pixels })
        .and_then(|bytes| {
            rgb.try_reserve_exact(bytes)
                .map_err(|_| RenderError::OutOfMemory { pixels })
        })?;
    Ok(rgb)
}
