//! Least-significant-bit watermarking of the luma plane.
//!
//! RGB pixels go through YCbCr, get their luma LSB replaced, and come
//! back to RGB. Converting back to 8-bit RGB can shift the recomputed
//! luma by one, so each pixel is then settled: a uniform ±1 shift of
//! R, G and B moves luma by exactly one without touching chroma, and a
//! one- or two-step green nudge covers pixels pinned at both 0 and 255.
//! After settling, [`WatermarkEmbedder::extract`] reads the plane back bit
//! for bit until something else modifies luma.

use super::plane::WatermarkPlane;
use crate::buffer::PixelBuffer;
use crate::color::{luma, ColorSpaceConverter};
use crate::error::ShapeError;

/// Embeds and extracts one-bit-per-pixel luma watermarks.
pub struct WatermarkEmbedder;

impl WatermarkEmbedder {
    /// Embeds `plane` into `buffer`; dimensions must match exactly.
    ///
    /// Gray buffers carry the bit in the sample itself; RGBA buffers
    /// embed in RGB and keep alpha.
    pub fn embed(buffer: &PixelBuffer, plane: &WatermarkPlane) -> Result<PixelBuffer, ShapeError> {
        buffer.ensure_same_dimensions(plane.height(), plane.width())?;

        let out = match buffer.channels() {
            1 => {
                let mut out = buffer.clone();
                for (v, &bit) in out.as_bytes_mut().iter_mut().zip(plane.bits()) {
                    *v = (*v & !1) | bit;
                }
                out
            }
            3 => embed_rgb(buffer, plane)?,
            4 => {
                let (rgb, alpha) = split_alpha(buffer)?;
                join_alpha(&embed_rgb(&rgb, plane)?, &alpha)?
            }
            other => return Err(ShapeError::UnsupportedChannels(other)),
        };

        tracing::debug!(
            height = plane.height(),
            width = plane.width(),
            ones = plane.count_ones(),
            "Embedded luma watermark"
        );
        Ok(out)
    }

    /// Reads the luma LSB of every pixel.
    pub fn extract(buffer: &PixelBuffer) -> Result<WatermarkPlane, ShapeError> {
        let bits = match buffer.channels() {
            1 => buffer.as_bytes().iter().map(|v| v & 1).collect(),
            3 | 4 => buffer
                .as_bytes()
                .chunks_exact(buffer.channels())
                .map(|px| luma(px[0], px[1], px[2]) & 1)
                .collect(),
            other => return Err(ShapeError::UnsupportedChannels(other)),
        };
        WatermarkPlane::new(bits, buffer.height(), buffer.width())
    }
}

fn embed_rgb(rgb: &PixelBuffer, plane: &WatermarkPlane) -> Result<PixelBuffer, ShapeError> {
    let mut ycc = ColorSpaceConverter::to_ycbcr(rgb)?;
    for (y, &bit) in ycc.y_mut().iter_mut().zip(plane.bits()) {
        *y = (*y & !1) | bit;
    }

    let mut out = ColorSpaceConverter::to_rgb(&ycc)?;
    for (px, &bit) in out.as_bytes_mut().chunks_exact_mut(3).zip(plane.bits()) {
        settle(px, bit);
    }
    Ok(out)
}

/// Adjusts an RGB pixel until its luma LSB equals `bit`.
fn settle(px: &mut [u8], bit: u8) {
    if luma(px[0], px[1], px[2]) & 1 == bit {
        return;
    }

    for delta in [1i16, -1] {
        let shifted: Vec<i16> = px.iter().map(|&v| i16::from(v) + delta).collect();
        if shifted.iter().all(|v| (0..=255).contains(v)) {
            for (slot, v) in px.iter_mut().zip(shifted) {
                *slot = v as u8;
            }
            return;
        }
    }

    // Green moves luma by 0.587 per step, so one of two steps in the
    // open direction always crosses a rounding boundary.
    for delta in [1i16, 2, -1, -2] {
        let g = i16::from(px[1]) + delta;
        if (0..=255).contains(&g) && luma(px[0], g as u8, px[2]) & 1 == bit {
            px[1] = g as u8;
            return;
        }
    }
    debug_assert!(false, "luma parity could not be settled for {px:?}");
}

fn split_alpha(buffer: &PixelBuffer) -> Result<(PixelBuffer, Vec<u8>), ShapeError> {
    let mut rgb = Vec::with_capacity(buffer.pixel_count() * 3);
    let mut alpha = Vec::with_capacity(buffer.pixel_count());
    for px in buffer.as_bytes().chunks_exact(4) {
        rgb.extend_from_slice(&px[..3]);
        alpha.push(px[3]);
    }
    Ok((PixelBuffer::new(rgb, buffer.height(), buffer.width(), 3)?, alpha))
}

fn join_alpha(rgb: &PixelBuffer, alpha: &[u8]) -> Result<PixelBuffer, ShapeError> {
    let mut data = Vec::with_capacity(alpha.len() * 4);
    for (px, &a) in rgb.as_bytes().chunks_exact(3).zip(alpha) {
        data.extend_from_slice(px);
        data.push(a);
    }
    PixelBuffer::new(data, rgb.height(), rgb.width(), 4)
}
